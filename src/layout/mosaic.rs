//! Mosaic grid: variable-width tiles packed into labelled section blocks.
//!
//! ## Packing
//!
//! ```text
//!  meta-column 0                 meta-column 1
//! ┌───────────────────────┐     ┌───────────────────────┐
//! │ SECTION A             │     │ SECTION C             │
//! │ [ 2 ][ 2 ]            │     │ [1][1][ 2 ]           │
//! │ [1][1][1]             │     │ ...                   │
//! │ SECTION B             │     │                       │
//! │ [     4     ]         │     │                       │
//! └───────────────────────┘     └───────────────────────┘
//! ```
//!
//! Tiles are placed in order along a 4-unit row. A tile that would cross the
//! row end starts the next row instead of splitting. Each section starts a
//! fresh row below the previous section, under its own label. Once a
//! meta-column holds `max_rows_per_column` rows, the next row opens a new
//! meta-column to the right.

use super::{BLOCK_UNITS, GridPlan, GridStyle, LayoutRegime, Placement, SectionLabel, Tile};

/// Cursor over the current meta-column.
struct Cursor<'s> {
    style: &'s GridStyle,
    column: u32,
    column_x: u32,
    /// Top of the next free row.
    y: u32,
    /// Rows used in the current meta-column.
    column_rows: u32,
    /// Next free unit in the open row.
    unit: u32,
    /// Rows started across the whole plan.
    total_rows: u32,
}

impl<'s> Cursor<'s> {
    fn new(style: &'s GridStyle) -> Self {
        Self {
            style,
            column: 0,
            column_x: style.margin(BLOCK_UNITS),
            y: style.header_height,
            column_rows: 0,
            unit: 0,
            total_rows: 0,
        }
    }

    fn row_open(&self) -> bool {
        self.unit > 0
    }

    /// Close the open row, if any.
    fn finish_row(&mut self) {
        if self.row_open() {
            self.y += self.style.card_height + self.style.gap;
            self.column_rows += 1;
            self.total_rows += 1;
            self.unit = 0;
        }
    }

    fn column_full(&self) -> bool {
        self.column_rows >= self.style.max_rows_per_column
    }

    fn next_column(&mut self) {
        self.column += 1;
        self.column_x += self.style.block_width() + self.style.column_gap;
        self.y = self.style.header_height;
        self.column_rows = 0;
        self.unit = 0;
    }
}

pub(super) fn plan(tiles: &[Tile], style: &GridStyle) -> GridPlan {
    let mut cursor = Cursor::new(style);
    let mut placements = Vec::with_capacity(tiles.len());
    let mut labels = Vec::new();
    let mut section: Option<&str> = None;

    for (index, tile) in tiles.iter().enumerate() {
        let units = tile.footprint.units();

        if section != Some(tile.section) {
            // Close the previous block and leave room for this one's label
            if section.is_some() {
                cursor.finish_row();
                cursor.y += style.group_gap;
            }
            if cursor.column_full() {
                cursor.next_column();
            }
            labels.push(SectionLabel {
                text: tile.section.to_string(),
                x: cursor.column_x,
                y: cursor.y,
                width: style.block_width(),
            });
            cursor.y += style.label_height;
            section = Some(tile.section);
        }

        if cursor.unit + units > BLOCK_UNITS {
            cursor.finish_row();
            if cursor.column_full() {
                cursor.next_column();
            }
        }
        if !cursor.row_open() && cursor.column_full() {
            cursor.next_column();
        }

        placements.push(Placement {
            index,
            x: cursor.column_x + cursor.unit * (style.card_width + style.gap),
            y: cursor.y,
            width: style.tile_width(units),
            height: style.card_height,
            footprint: tile.footprint,
            column: cursor.column,
            unit: cursor.unit,
            row: cursor.total_rows,
        });
        cursor.unit += units;
    }
    cursor.finish_row();

    let margin = style.margin(BLOCK_UNITS);
    let width = placements
        .iter()
        .map(|p| p.x + p.width)
        .chain(labels.iter().map(|l| l.x + l.width))
        .max()
        .unwrap_or(0)
        + margin;
    let height = placements
        .iter()
        .map(|p| p.y + p.height)
        .max()
        .unwrap_or(style.header_height)
        + style.bottom_margin;

    GridPlan {
        regime: LayoutRegime::Mosaic,
        width,
        height,
        columns: BLOCK_UNITS * (cursor.column + 1),
        rows: cursor.total_rows,
        placements,
        labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Footprint;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn tile(section: &str, units: u32) -> Tile<'_> {
        let footprint = match units {
            1 => Footprint::One,
            2 => Footprint::Two,
            _ => Footprint::Four,
        };
        Tile { section, footprint }
    }

    fn units_of(plan: &GridPlan) -> Vec<(u32, u32)> {
        plan.placements.iter().map(|p| (p.row, p.unit)).collect()
    }

    #[test]
    fn test_fills_rows_in_order() {
        let style = GridStyle::default();
        let tiles = [tile("A", 2), tile("A", 1), tile("A", 1), tile("A", 4)];
        let plan = plan(&tiles, &style);
        assert_eq!(units_of(&plan), vec![(0, 0), (0, 2), (0, 3), (1, 0)]);
        assert_eq!(plan.rows, 2);
        assert_eq!(plan.labels.len(), 1);
    }

    #[test]
    fn test_wraps_instead_of_splitting() {
        let style = GridStyle::default();
        // 4-wide at cursor 1, 2-wide at cursor 3
        let tiles = [tile("A", 1), tile("A", 4), tile("A", 1), tile("A", 1), tile("A", 1), tile("A", 2)];
        let plan = plan(&tiles, &style);
        assert_eq!(
            units_of(&plan),
            vec![(0, 0), (1, 0), (2, 0), (2, 1), (2, 2), (3, 0)]
        );
    }

    #[test]
    fn test_sections_start_new_blocks() {
        let style = GridStyle::default();
        let tiles = [tile("A", 1), tile("B", 1), tile("B", 2)];
        let plan = plan(&tiles, &style);

        assert_eq!(plan.labels.len(), 2);
        assert_eq!(plan.labels[0].text, "A");
        assert_eq!(plan.labels[1].text, "B");

        let a = plan.placements[0];
        let b = plan.placements[1];
        assert_eq!(a.y, style.header_height + style.label_height);
        assert_eq!(plan.labels[1].y, a.y + style.card_height + style.gap + style.group_gap);
        assert_eq!(b.y, plan.labels[1].y + style.label_height);
        assert_eq!(b.unit, 0);
        assert_eq!(plan.placements[2].unit, 1);
    }

    #[test]
    fn test_meta_column_break() {
        let style = GridStyle {
            max_rows_per_column: 2,
            ..GridStyle::default()
        };
        let tiles: Vec<_> = (0..3).map(|_| tile("A", 4)).collect();
        let plan = plan(&tiles, &style);

        assert_eq!(plan.placements[0].column, 0);
        assert_eq!(plan.placements[1].column, 0);
        assert_eq!(plan.placements[2].column, 1);
        assert_eq!(plan.placements[2].y, style.header_height);
        assert_eq!(
            plan.placements[2].x,
            plan.placements[0].x + style.block_width() + style.column_gap
        );
        assert_eq!(plan.columns, 8);
    }

    #[test]
    fn test_new_section_moves_to_next_column_when_full() {
        let style = GridStyle {
            max_rows_per_column: 1,
            ..GridStyle::default()
        };
        let tiles = [tile("A", 4), tile("B", 1)];
        let plan = plan(&tiles, &style);
        assert_eq!(plan.placements[1].column, 1);
        assert_eq!(plan.labels[1].y, style.header_height);
        assert!(plan.first_overlap().is_none());
    }

    #[test]
    fn test_canvas_is_bounding_box() {
        let style = GridStyle::default();
        let tiles = [tile("A", 1), tile("A", 2)];
        let plan = plan(&tiles, &style);
        let right = plan.labels[0].x + style.block_width();
        assert_eq!(plan.width, right + style.margin(BLOCK_UNITS));
        assert_eq!(
            plan.height,
            plan.placements[0].y + style.card_height + style.bottom_margin
        );
    }

    #[test]
    fn test_random_sequences_pack_without_overlap() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let sections = ["Featured", "Daily", "Jam Tracks", "Cars", "Lego"];
        let sizes = [1, 2, 4];

        for round in 0..200 {
            let style = GridStyle {
                max_rows_per_column: rng.random_range(1..10),
                ..GridStyle::default()
            };
            let len = rng.random_range(1..60);
            let mut section = 0;
            let tiles: Vec<_> = (0..len)
                .map(|_| {
                    if rng.random_range(0..5) == 0 {
                        section = (section + 1) % sections.len();
                    }
                    tile(sections[section], sizes[rng.random_range(0..3)])
                })
                .collect();

            let first = plan(&tiles, &style);
            let second = plan(&tiles, &style);
            assert_eq!(first, second, "round {} is not deterministic", round);
            assert_eq!(first.first_overlap(), None, "round {} overlaps", round);

            for p in &first.placements {
                assert!(
                    p.unit + p.footprint.units() <= BLOCK_UNITS,
                    "round {}: tile {} crosses the block edge",
                    round,
                    p.index
                );
                assert!(p.x + p.width <= first.width);
                assert!(p.y + p.height <= first.height);
            }
        }
    }
}
