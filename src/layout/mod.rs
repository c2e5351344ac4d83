//! # Grid Planner
//!
//! Turns the sorted entry list into a canvas size and one pixel placement per
//! entry. Three regimes:
//!
//! | Regime | Used for | Placement |
//! |--------|----------|-----------|
//! | [`LayoutRegime::Uniform`] | one flat list | row-major, every card one cell |
//! | [`LayoutRegime::Sectioned`] | several sections, no tile sizes | same as uniform, sections are contiguous because entries arrive sorted |
//! | [`LayoutRegime::Mosaic`] | tile sizes present | 1/2/4-unit tiles packed into 4-unit rows, one labelled block per section, meta-columns when a column runs out of rows |
//!
//! Plans are a pure function of the tiles and the [`GridStyle`]: the composer
//! plans once before rendering (to size the canvas and header) and again when
//! pasting cards, and the two plans must be identical.

mod mosaic;
mod uniform;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{Entry, Footprint};

/// Width of a mosaic row, in footprint units.
pub const BLOCK_UNITS: u32 = 4;

/// Grid planning errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Nothing to lay out.
    #[error("cannot lay out an empty catalog")]
    EmptyCatalog,
    /// A card was rendered at a size its final cell does not have.
    #[error("rendered card size does not match its planned cell")]
    PlanMismatch,
}

/// Layout regime, see the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutRegime {
    Uniform,
    Sectioned,
    Mosaic,
}

impl LayoutRegime {
    /// Mosaic when every entry carries layout hints, sectioned when the
    /// entries span more than one section, uniform otherwise.
    pub fn detect(entries: &[Entry]) -> Self {
        if !entries.is_empty() && entries.iter().all(|e| e.layout.is_some()) {
            return LayoutRegime::Mosaic;
        }
        let first = entries.first().map(|e| e.section.as_str());
        if entries.iter().any(|e| Some(e.section.as_str()) != first) {
            LayoutRegime::Sectioned
        } else {
            LayoutRegime::Uniform
        }
    }
}

/// Pixel constants for every regime.
///
/// These are cosmetic; the packing itself only relies on cards never
/// overlapping and margins growing with the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridStyle {
    /// Single-unit card size.
    pub card_width: u32,
    pub card_height: u32,
    /// Space between neighbouring cards.
    pub gap: u32,
    /// Space above the first row (logo and date).
    pub header_height: u32,
    /// Side margin before per-column growth.
    pub base_margin: u32,
    /// Extra side margin per column.
    pub margin_per_column: u32,
    pub bottom_margin: u32,
    /// Height reserved above each mosaic section block for its label.
    pub label_height: u32,
    /// Space after each mosaic section block.
    pub group_gap: u32,
    /// Space between mosaic meta-columns.
    pub column_gap: u32,
    /// Rows a mosaic meta-column holds before the next one starts.
    pub max_rows_per_column: u32,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            card_width: 300,
            card_height: 545,
            gap: 5,
            header_height: 355,
            base_margin: 20,
            margin_per_column: 8,
            bottom_margin: 40,
            label_height: 70,
            group_gap: 30,
            column_gap: 60,
            max_rows_per_column: 8,
        }
    }
}

impl GridStyle {
    /// Pixel width of a tile `units` wide, gaps between units included.
    pub fn tile_width(&self, units: u32) -> u32 {
        units * self.card_width + units.saturating_sub(1) * self.gap
    }

    /// Pixel width of a full 4-unit mosaic block.
    pub fn block_width(&self) -> u32 {
        self.tile_width(BLOCK_UNITS)
    }

    /// Side margin for a grid `columns` wide.
    pub fn margin(&self, columns: u32) -> u32 {
        self.base_margin + columns * self.margin_per_column
    }
}

/// What the planner needs to know about one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile<'a> {
    pub section: &'a str,
    pub footprint: Footprint,
}

impl<'a> From<&'a Entry> for Tile<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            section: &entry.section,
            footprint: entry.footprint(),
        }
    }
}

/// Where one card goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// Index into the planned entry list.
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub footprint: Footprint,
    /// Meta-column (always 0 outside the mosaic regime).
    pub column: u32,
    /// First unit occupied within the 4-unit row (column index outside mosaic).
    pub unit: u32,
    pub row: u32,
}

impl Placement {
    pub fn intersects(&self, other: &Placement) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Section label drawn above a mosaic block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionLabel {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
}

/// Canvas size plus every placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridPlan {
    pub regime: LayoutRegime,
    pub width: u32,
    pub height: u32,
    /// Cells per row (uniform) or units per row times meta-columns (mosaic).
    pub columns: u32,
    /// Total rows across all blocks.
    pub rows: u32,
    pub placements: Vec<Placement>,
    pub labels: Vec<SectionLabel>,
}

impl GridPlan {
    /// First pair of placements whose boxes overlap, if any.
    pub fn first_overlap(&self) -> Option<(usize, usize)> {
        for (i, a) in self.placements.iter().enumerate() {
            for b in &self.placements[i + 1..] {
                if a.intersects(b) {
                    return Some((a.index, b.index));
                }
            }
        }
        None
    }

    pub fn placement(&self, index: usize) -> Option<&Placement> {
        self.placements.iter().find(|p| p.index == index)
    }
}

/// Plan a catalog's entries.
pub fn plan(entries: &[Entry], regime: LayoutRegime, style: &GridStyle) -> Result<GridPlan, LayoutError> {
    let tiles: Vec<Tile> = entries.iter().map(Tile::from).collect();
    plan_tiles(&tiles, regime, style)
}

/// Plan raw tiles. Entries are placed in the given order.
pub fn plan_tiles(tiles: &[Tile], regime: LayoutRegime, style: &GridStyle) -> Result<GridPlan, LayoutError> {
    if tiles.is_empty() {
        return Err(LayoutError::EmptyCatalog);
    }
    Ok(match regime {
        LayoutRegime::Uniform | LayoutRegime::Sectioned => uniform::plan(tiles.len(), regime, style),
        LayoutRegime::Mosaic => mosaic::plan(tiles, style),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiles(sections: &[&'static str]) -> Vec<Tile<'static>> {
        sections
            .iter()
            .map(|s| Tile {
                section: s,
                footprint: Footprint::One,
            })
            .collect()
    }

    #[test]
    fn test_empty_is_an_error() {
        for regime in [LayoutRegime::Uniform, LayoutRegime::Sectioned, LayoutRegime::Mosaic] {
            assert_eq!(
                plan_tiles(&[], regime, &GridStyle::default()),
                Err(LayoutError::EmptyCatalog)
            );
        }
    }

    #[test]
    fn test_tile_width() {
        let style = GridStyle::default();
        assert_eq!(style.tile_width(1), 300);
        assert_eq!(style.tile_width(2), 605);
        assert_eq!(style.block_width(), 1215);
    }

    #[test]
    fn test_intersects() {
        let a = Placement {
            index: 0,
            x: 0,
            y: 0,
            width: 10,
            height: 10,
            footprint: Footprint::One,
            column: 0,
            unit: 0,
            row: 0,
        };
        let touching = Placement { index: 1, x: 10, ..a };
        let overlapping = Placement { index: 2, x: 9, y: 9, ..a };
        assert!(!a.intersects(&touching));
        assert!(a.intersects(&overlapping));
    }

    #[test]
    fn test_sectioned_matches_uniform_geometry() {
        let style = GridStyle::default();
        let t = tiles(&["A", "A", "B", "B", "B"]);
        let uniform = plan_tiles(&t, LayoutRegime::Uniform, &style).unwrap();
        let sectioned = plan_tiles(&t, LayoutRegime::Sectioned, &style).unwrap();
        assert_eq!(uniform.placements, sectioned.placements);
        assert_eq!(sectioned.regime, LayoutRegime::Sectioned);
    }
}
