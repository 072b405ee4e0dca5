//! The bubble lattice
//!
//! `MAX_ROWS` x `GRID_COLS` cells, row 0 is the ceiling. The grid is only
//! mutated through the simulation (placement, matching, descent); callers
//! read it for rendering.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bubble::{Bubble, BubbleColor};
use super::candidate::row_bubble;
use super::error::SimError;
use super::geometry::{RowParity, cell_center, neighbors};
use super::matching::remove_floating;
use crate::consts::*;
use crate::level::{LevelConfig, RowWave};

/// One lattice slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub bubble: Option<Bubble>,
    /// Cached lattice center (no wave offset)
    pub center: Vec2,
}

impl Cell {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bubble.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
    parity: RowParity,
    /// Lateral row-wave displacement per row
    row_offsets: Vec<f32>,
    /// Set once a descent pushes occupied cells past the last row
    overflowed: bool,
}

impl Default for Grid {
    fn default() -> Self {
        Self::with_parity(RowParity::default())
    }
}

impl Grid {
    /// Empty grid
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parity(parity: RowParity) -> Self {
        let rows = (0..MAX_ROWS)
            .map(|r| {
                (0..GRID_COLS)
                    .map(|c| Cell {
                        bubble: None,
                        center: cell_center(r, c, parity),
                    })
                    .collect()
            })
            .collect();
        Self {
            rows,
            parity,
            row_offsets: vec![0.0; MAX_ROWS],
            overflowed: false,
        }
    }

    #[inline]
    pub fn parity(&self) -> RowParity {
        self.parity
    }

    #[inline]
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    #[inline]
    pub fn bubble(&self, row: usize, col: usize) -> Option<Bubble> {
        self.cell(row, col).and_then(|c| c.bubble)
    }

    #[inline]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.bubble(row, col).is_some()
    }

    /// Overwrite a cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, row: usize, col: usize, bubble: Option<Bubble>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            cell.bubble = bubble;
        }
    }

    /// Empty a cell, returning what was there
    pub fn take(&mut self, row: usize, col: usize) -> Option<Bubble> {
        self.rows
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .and_then(|cell| cell.bubble.take())
    }

    /// Write a landed bubble into an empty slot
    pub fn place(&mut self, row: usize, col: usize, bubble: Bubble) -> Result<(), SimError> {
        if row >= MAX_ROWS {
            return Err(SimError::GridFull);
        }
        if col >= GRID_COLS || self.is_occupied(row, col) {
            return Err(SimError::NoSlotAvailable);
        }
        self.set(row, col, Some(bubble));
        Ok(())
    }

    #[inline]
    pub fn neighbors(&self, row: usize, col: usize) -> Vec<(usize, usize)> {
        neighbors(row, col, self.parity)
    }

    #[inline]
    pub fn row_offset(&self, row: usize) -> f32 {
        self.row_offsets.get(row).copied().unwrap_or(0.0)
    }

    /// Current position of a cell: lattice center plus row-wave offset
    pub fn position(&self, row: usize, col: usize) -> Vec2 {
        let center = self
            .cell(row, col)
            .map(|c| c.center)
            .unwrap_or_else(|| cell_center(row, col, self.parity));
        center + Vec2::new(self.row_offset(row), 0.0)
    }

    /// Recompute lateral row offsets for the wave at `clock_secs`
    pub fn apply_row_wave(&mut self, wave: &RowWave, clock_secs: f32) {
        for (row, offset) in self.row_offsets.iter_mut().enumerate() {
            *offset = wave.offset(row, clock_secs);
        }
    }

    /// Occupied cells in row-major order
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, Bubble)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, cell)| cell.bubble.map(|b| (r, c, b)))
        })
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied().count()
    }

    /// Deepest row holding any bubble
    pub fn lowest_occupied_row(&self) -> Option<usize> {
        self.occupied().map(|(r, _, _)| r).max()
    }

    /// Distinct colors still on the grid, in `BubbleColor::ALL` order
    pub fn colors_present(&self) -> Vec<BubbleColor> {
        let mut present = [false; BubbleColor::ALL.len()];
        for (_, _, bubble) in self.occupied() {
            if let Some(color) = bubble.color {
                present[color as usize] = true;
            }
        }
        BubbleColor::ALL
            .into_iter()
            .filter(|&c| present[c as usize])
            .collect()
    }

    fn refresh_centers(&mut self) {
        for (r, row) in self.rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                cell.center = cell_center(r, c, self.parity);
            }
        }
    }
}

/// Build the opening grid for a level.
///
/// Row 0 is always full; rows below it up to `initial_rows` are filled at
/// `density`. Anything left without a path to the ceiling is pruned.
pub fn generate_initial_grid<R: Rng>(level: &LevelConfig, rng: &mut R) -> Grid {
    let mut grid = Grid::new();
    let rows = level.initial_rows.min(MAX_ROWS);

    for row in 0..rows {
        for col in 0..GRID_COLS {
            let fill = row == 0 || rng.random::<f32>() < level.density;
            if fill {
                grid.set(row, col, Some(row_bubble(level, rng)));
            }
        }
    }

    let pruned = remove_floating(&mut grid);
    log::info!(
        "Generated grid: {} rows, {} bubbles ({} unsupported pruned)",
        rows,
        grid.occupied_count(),
        pruned.len()
    );
    grid
}

/// Shift every row down one index and inject a fresh row 0.
///
/// Returns how many occupied cells fell off the bottom. Any loss marks the
/// grid as overflowed, which the failure check reports.
pub fn drop_new_row<R: Rng>(grid: &mut Grid, level: &LevelConfig, rng: &mut R) -> usize {
    let discarded = grid
        .rows
        .pop()
        .map(|row| row.iter().filter(|c| !c.is_empty()).count())
        .unwrap_or(0);
    if discarded > 0 {
        grid.overflowed = true;
        log::debug!("Descent discarded {} bubbles past the last row", discarded);
    }

    let fresh = (0..GRID_COLS)
        .map(|_| Cell {
            bubble: Some(row_bubble(level, rng)),
            center: Vec2::ZERO,
        })
        .collect();
    grid.rows.insert(0, fresh);
    grid.parity = grid.parity.flipped();
    grid.refresh_centers();

    discarded
}

/// True iff no cell is occupied
pub fn grid_cleared(grid: &Grid) -> bool {
    grid.occupied().next().is_none()
}

/// True iff a bubble sits at or below `failure_row`, or a descent overflowed
pub fn grid_reached_failure_line(grid: &Grid, failure_row: usize) -> bool {
    grid.overflowed || grid.occupied().any(|(r, _, _)| r >= failure_row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::bubble::SpecialKind;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn red() -> Bubble {
        Bubble::normal(BubbleColor::Red)
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new();
        assert!(grid_cleared(&grid));
        assert_eq!(grid.occupied_count(), 0);
        assert!(!grid_reached_failure_line(&grid, DEFAULT_FAILURE_ROW));
    }

    #[test]
    fn test_place_and_take() {
        let mut grid = Grid::new();
        assert_eq!(grid.place(3, 4, red()), Ok(()));
        assert_eq!(grid.place(3, 4, red()), Err(SimError::NoSlotAvailable));
        assert_eq!(grid.place(MAX_ROWS, 0, red()), Err(SimError::GridFull));
        assert_eq!(grid.take(3, 4), Some(red()));
        assert!(grid_cleared(&grid));
    }

    #[test]
    fn test_set_out_of_bounds_is_noop() {
        let mut grid = Grid::new();
        grid.set(MAX_ROWS, 0, Some(red()));
        grid.set(0, GRID_COLS, Some(red()));
        assert!(grid_cleared(&grid));
    }

    #[test]
    fn test_failure_line() {
        let mut grid = Grid::new();
        grid.set(DEFAULT_FAILURE_ROW - 1, 0, Some(red()));
        assert!(!grid_reached_failure_line(&grid, DEFAULT_FAILURE_ROW));
        grid.set(DEFAULT_FAILURE_ROW, 0, Some(red()));
        assert!(grid_reached_failure_line(&grid, DEFAULT_FAILURE_ROW));
    }

    #[test]
    fn test_initial_grid_deterministic_and_supported() {
        let level = LevelConfig::default();
        let a = generate_initial_grid(&level, &mut Pcg32::seed_from_u64(7));
        let b = generate_initial_grid(&level, &mut Pcg32::seed_from_u64(7));
        let cells_a: Vec<_> = a.occupied().collect();
        let cells_b: Vec<_> = b.occupied().collect();
        assert_eq!(cells_a, cells_b);

        // Row 0 is full, nothing below initial_rows
        assert!((0..GRID_COLS).all(|c| a.is_occupied(0, c)));
        assert!(a.lowest_occupied_row().unwrap() < level.initial_rows);

        // Nothing floats
        let mut copy = a.clone();
        assert!(remove_floating(&mut copy).is_empty());
    }

    #[test]
    fn test_drop_new_row_preserves_adjacency() {
        let mut grid = Grid::new();
        grid.set(0, 3, Some(red()));
        grid.set(1, 3, Some(red()));
        assert!(grid.neighbors(0, 3).contains(&(1, 3)));
        let before = grid.position(1, 3) - grid.position(0, 3);

        let level = LevelConfig::default();
        drop_new_row(&mut grid, &level, &mut Pcg32::seed_from_u64(1));

        assert!(grid.neighbors(1, 3).contains(&(2, 3)));
        let after = grid.position(2, 3) - grid.position(1, 3);
        assert!((before - after).length() < 1e-4);
        assert!((grid.position(1, 3).y - grid.position(0, 3).y - ROW_HEIGHT).abs() < 1e-4);
    }

    #[test]
    fn test_drop_keeps_specials() {
        let mut grid = Grid::new();
        grid.set(2, 2, Some(Bubble::obstacle()));
        grid.set(2, 3, Some(Bubble::special(BubbleColor::Blue, SpecialKind::Freeze)));
        let level = LevelConfig::default();
        drop_new_row(&mut grid, &level, &mut Pcg32::seed_from_u64(3));
        assert_eq!(grid.bubble(3, 2), Some(Bubble::obstacle()));
        assert_eq!(grid.bubble(3, 3).map(|b| b.kind), Some(SpecialKind::Freeze));
        assert!((0..GRID_COLS).all(|c| grid.is_occupied(0, c)));
    }

    #[test]
    fn test_drop_at_max_rows_breaches_failure_line() {
        let mut grid = Grid::new();
        grid.set(MAX_ROWS - 1, 5, Some(red()));
        // Failure row past the lattice so only the overflow can trip it
        let failure_row = MAX_ROWS;
        assert!(!grid_reached_failure_line(&grid, failure_row));

        let level = LevelConfig::default();
        let lost = drop_new_row(&mut grid, &level, &mut Pcg32::seed_from_u64(9));
        assert_eq!(lost, 1);
        assert!(grid.overflowed());
        assert!(grid_reached_failure_line(&grid, failure_row));
    }

    #[test]
    fn test_row_wave_moves_positions() {
        let mut grid = Grid::new();
        let wave = RowWave {
            amplitude: 6.0,
            speed: 2.0,
        };
        grid.apply_row_wave(&wave, 0.4);
        let expected = wave.offset(2, 0.4);
        assert!((grid.position(2, 0).x - grid.cell(2, 0).unwrap().center.x - expected).abs() < 1e-5);
    }

    #[test]
    fn test_colors_present() {
        let mut grid = Grid::new();
        grid.set(0, 0, Some(Bubble::normal(BubbleColor::Green)));
        grid.set(0, 1, Some(Bubble::obstacle()));
        grid.set(0, 2, Some(red()));
        assert_eq!(grid.colors_present(), vec![BubbleColor::Red, BubbleColor::Green]);
    }

    fn arb_cells() -> impl Strategy<Value = Vec<(usize, usize)>> {
        prop::collection::vec((0..MAX_ROWS, 0..GRID_COLS), 0..60)
    }

    proptest! {
        #[test]
        fn prop_cleared_iff_all_empty(cells in arb_cells()) {
            let mut grid = Grid::new();
            for &(r, c) in &cells {
                grid.set(r, c, Some(red()));
            }
            let all_empty = (0..MAX_ROWS).all(|r| (0..GRID_COLS).all(|c| !grid.is_occupied(r, c)));
            prop_assert_eq!(grid_cleared(&grid), all_empty);
            prop_assert_eq!(all_empty, cells.is_empty());
        }

        #[test]
        fn prop_drop_shifts_rows_by_one(cells in arb_cells(), seed in any::<u64>()) {
            let mut grid = Grid::new();
            for &(r, c) in &cells {
                grid.set(r, c, Some(Bubble::normal(BubbleColor::ALL[(r + c) % 6])));
            }
            let before = grid.clone();
            let level = LevelConfig::default();
            let lost = drop_new_row(&mut grid, &level, &mut Pcg32::seed_from_u64(seed));

            for (r, c, bubble) in before.occupied() {
                if r + 1 < MAX_ROWS {
                    prop_assert_eq!(grid.bubble(r + 1, c), Some(bubble));
                }
            }
            let expected_lost = before.occupied().filter(|&(r, _, _)| r + 1 >= MAX_ROWS).count();
            prop_assert_eq!(lost, expected_lost);
            prop_assert_eq!(grid.overflowed(), expected_lost > 0);
        }
    }
}
