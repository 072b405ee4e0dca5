//! Hex-offset lattice geometry
//!
//! Rows are packed `ROW_HEIGHT` apart; every other row is shifted right by
//! one bubble radius. Which rows carry the shift is tracked by [`RowParity`]
//! so that a descent (every row moving down by one) keeps the same cells
//! adjacent.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::error::SimError;
use super::grid::Grid;
use crate::consts::*;

/// Which rows are shifted right by half a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowParity {
    #[default]
    OddShifted,
    EvenShifted,
}

impl RowParity {
    #[inline]
    pub fn is_shifted(&self, row: usize) -> bool {
        match self {
            RowParity::OddShifted => row % 2 == 1,
            RowParity::EvenShifted => row % 2 == 0,
        }
    }

    /// Parity after every row moved down one index
    pub fn flipped(&self) -> Self {
        match self {
            RowParity::OddShifted => RowParity::EvenShifted,
            RowParity::EvenShifted => RowParity::OddShifted,
        }
    }
}

/// Lattice center of a cell (no row-wave offset)
#[inline]
pub fn cell_center(row: usize, col: usize, parity: RowParity) -> Vec2 {
    let shift = if parity.is_shifted(row) { BUBBLE_RADIUS } else { 0.0 };
    Vec2::new(
        SIDE_MARGIN + BUBBLE_RADIUS + col as f32 * 2.0 * BUBBLE_RADIUS + shift,
        TOP_MARGIN + BUBBLE_RADIUS + row as f32 * ROW_HEIGHT,
    )
}

/// Nearest row index for a y coordinate (may be negative or past the last row)
#[inline]
pub fn row_at(y: f32) -> isize {
    ((y - TOP_MARGIN - BUBBLE_RADIUS) / ROW_HEIGHT).round() as isize
}

/// In-bounds neighbors of a cell, at most six.
///
/// Order: left, right, upper pair, lower pair.
pub fn neighbors(row: usize, col: usize, parity: RowParity) -> Vec<(usize, usize)> {
    let r = row as isize;
    let c = col as isize;
    // Column pair in the adjacent rows
    let (a, b) = if parity.is_shifted(row) { (c, c + 1) } else { (c - 1, c) };

    let candidates = [
        (r, c - 1),
        (r, c + 1),
        (r - 1, a),
        (r - 1, b),
        (r + 1, a),
        (r + 1, b),
    ];

    candidates
        .into_iter()
        .filter(|&(nr, nc)| {
            nr >= 0 && nc >= 0 && (nr as usize) < MAX_ROWS && (nc as usize) < GRID_COLS
        })
        .map(|(nr, nc)| (nr as usize, nc as usize))
        .collect()
}

/// Empty neighbor of `contacted` closest to `point`.
///
/// Positions include the grid's row-wave offsets so the snap agrees with
/// what the projectile actually touched. Ties keep neighbor order.
pub fn nearest_empty_cell(
    point: Vec2,
    grid: &Grid,
    contacted: (usize, usize),
) -> Result<(usize, usize), SimError> {
    let (row, col) = contacted;
    neighbors(row, col, grid.parity())
        .into_iter()
        .filter(|&(r, c)| !grid.is_occupied(r, c))
        .map(|(r, c)| ((r, c), grid.position(r, c).distance_squared(point)))
        .fold(None, |best: Option<((usize, usize), f32)>, (cell, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((cell, d)),
        })
        .map(|(cell, _)| cell)
        .ok_or(SimError::NoSlotAvailable)
}

/// Last-resort slot: the empty column of `row` closest to `point`
pub fn nearest_empty_in_row(point: Vec2, grid: &Grid, row: usize) -> Option<usize> {
    if row >= MAX_ROWS {
        return None;
    }
    (0..GRID_COLS)
        .filter(|&c| !grid.is_occupied(row, c))
        .map(|c| (c, (grid.position(row, c).x - point.x).abs()))
        .fold(None, |best: Option<(usize, f32)>, (c, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((c, d)),
        })
        .map(|(c, _)| c)
}

/// Closest empty in-bounds cell, scanning rows outward from `start_row`.
///
/// Rows are tried by distance from `start_row`, the lower row first at equal
/// distance. `None` only when every cell of the lattice is taken.
pub fn nearest_empty_slot(point: Vec2, grid: &Grid, start_row: usize) -> Option<(usize, usize)> {
    let start = start_row.min(MAX_ROWS - 1);
    let mut rows: Vec<usize> = (0..MAX_ROWS).collect();
    rows.sort_by_key(|&r| (r.abs_diff(start), r < start));
    rows.into_iter()
        .find_map(|r| nearest_empty_in_row(point, grid, r).map(|c| (r, c)))
}
