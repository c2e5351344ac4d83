//! Uniform grid: near-square, row-major, one cell per card.

use super::{GridPlan, GridStyle, LayoutRegime, Placement};
use crate::catalog::Footprint;

/// Smallest `c` with `c * c >= n`.
fn ceil_sqrt(n: u32) -> u32 {
    let mut c = (n as f64).sqrt() as u32;
    while c * c < n {
        c += 1;
    }
    while c > 0 && (c - 1) * (c - 1) >= n {
        c -= 1;
    }
    c
}

/// Extra columns so larger shops come out wide rather than tall.
fn column_bias(n: u32) -> u32 {
    match n {
        0..=6 => 0,
        7..=8 => 1,
        _ => 2,
    }
}

/// Column and row count for `n` cards.
pub fn grid_size(n: u32) -> (u32, u32) {
    let columns = ceil_sqrt(n) + column_bias(n);
    let rows = n.div_ceil(columns.max(1));
    (columns, rows)
}

pub(super) fn plan(n: usize, regime: LayoutRegime, style: &GridStyle) -> GridPlan {
    let (columns, rows) = grid_size(n as u32);
    let margin = style.margin(columns);
    let step_x = style.card_width + style.gap;
    let step_y = style.card_height + style.gap;

    let placements = (0..n)
        .map(|index| {
            let col = index as u32 % columns;
            let row = index as u32 / columns;
            Placement {
                index,
                x: margin + col * step_x,
                y: style.header_height + row * step_y,
                width: style.card_width,
                height: style.card_height,
                footprint: Footprint::One,
                column: 0,
                unit: col,
                row,
            }
        })
        .collect();

    GridPlan {
        regime,
        width: 2 * margin + columns * style.card_width + (columns - 1) * style.gap,
        height: style.header_height + rows * style.card_height + (rows - 1) * style.gap + style.bottom_margin,
        columns,
        rows,
        placements,
        labels: Vec::new(),
    }
}
