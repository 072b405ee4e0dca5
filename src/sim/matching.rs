//! Cluster matching and floating cleanup
//!
//! After a bubble lands, its same-color cluster pops when it reaches
//! `MIN_CLUSTER`, bombs clear their surroundings, and anything that lost its
//! path to the ceiling falls.

use std::collections::{BTreeSet, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::bubble::{Bubble, BubbleColor, SpecialKind};
use super::grid::Grid;
use crate::consts::*;

/// A cell emptied by a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearedCell {
    pub row: usize,
    pub col: usize,
    pub bubble: Bubble,
}

/// A removed special whose effect the caller applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredSpecial {
    pub row: usize,
    pub col: usize,
    pub kind: SpecialKind,
}

/// Outcome of one placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Where the bubble landed
    pub placed: (usize, usize),
    /// Popped by color match or blast
    pub removed: Vec<ClearedCell>,
    /// Dropped for losing the path to the ceiling
    pub floating: Vec<ClearedCell>,
    /// Bombs that went off, placed one first
    pub detonations: Vec<(usize, usize)>,
    pub triggered: Vec<TriggeredSpecial>,
    /// Count-based bonus, one per floating bubble
    pub combo_bonus: u32,
}

impl MatchResult {
    /// Bubbles that left the grid
    pub fn cleared_count(&self) -> usize {
        self.removed.len() + self.floating.len()
    }

    /// The shot popped nothing
    pub fn is_miss(&self) -> bool {
        self.cleared_count() == 0
    }
}

/// Maximal cluster around `start` whose members match `color`.
///
/// `start` is always included. Rainbows join any color and are traversed
/// through; obstacles are never joined.
pub fn find_cluster(grid: &Grid, start: (usize, usize), color: BubbleColor) -> Vec<(usize, usize)> {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    let mut cluster = Vec::new();

    while let Some((r, c)) = queue.pop_front() {
        cluster.push((r, c));
        for n in grid.neighbors(r, c) {
            if seen.contains(&n) {
                continue;
            }
            if grid.bubble(n.0, n.1).is_some_and(|b| b.matches(color)) {
                seen.insert(n);
                queue.push_back(n);
            }
        }
    }
    cluster
}

/// Cluster formed by the bubble just placed at `(row, col)`.
///
/// A placed rainbow tries every color next to it and keeps the largest
/// cluster, ties going to the earlier color in `BubbleColor::ALL`.
pub fn placement_cluster(grid: &Grid, row: usize, col: usize) -> Vec<(usize, usize)> {
    let Some(bubble) = grid.bubble(row, col) else {
        return Vec::new();
    };

    match bubble.kind {
        SpecialKind::Obstacle => Vec::new(),
        SpecialKind::Rainbow => {
            let mut adjacent: Vec<BubbleColor> = grid
                .neighbors(row, col)
                .into_iter()
                .filter_map(|(r, c)| grid.bubble(r, c))
                .filter(|b| !matches!(b.kind, SpecialKind::Rainbow | SpecialKind::Obstacle))
                .filter_map(|b| b.color)
                .collect();
            adjacent.sort();
            adjacent.dedup();
            if adjacent.is_empty() {
                adjacent.extend(bubble.color);
            }

            adjacent
                .into_iter()
                .map(|color| find_cluster(grid, (row, col), color))
                .fold(Vec::new(), |best, cluster| {
                    if cluster.len() > best.len() { cluster } else { best }
                })
        }
        _ => match bubble.color {
            Some(color) => find_cluster(grid, (row, col), color),
            None => vec![(row, col)],
        },
    }
}

/// Every cell within `radius` neighbor rings of `center`, occupied or not
pub fn blast_area(grid: &Grid, center: (usize, usize), radius: usize) -> Vec<(usize, usize)> {
    let mut seen = HashSet::from([center]);
    let mut frontier = vec![center];
    let mut area = vec![center];

    for _ in 0..radius {
        let mut next = Vec::new();
        for (r, c) in frontier {
            for n in grid.neighbors(r, c) {
                if seen.insert(n) {
                    next.push(n);
                    area.push(n);
                }
            }
        }
        frontier = next;
    }
    area
}

/// Occupied cells with a path to an occupied ceiling cell
pub fn anchored_cells(grid: &Grid) -> HashSet<(usize, usize)> {
    let mut anchored: HashSet<(usize, usize)> =
        (0..GRID_COLS).filter(|&c| grid.is_occupied(0, c)).map(|c| (0, c)).collect();
    let mut queue: VecDeque<(usize, usize)> = anchored.iter().copied().collect();

    while let Some((r, c)) = queue.pop_front() {
        for n in grid.neighbors(r, c) {
            if grid.is_occupied(n.0, n.1) && anchored.insert(n) {
                queue.push_back(n);
            }
        }
    }
    anchored
}

/// Remove every occupied cell not anchored to the ceiling, in row-major order
pub fn remove_floating(grid: &mut Grid) -> Vec<ClearedCell> {
    let anchored = anchored_cells(grid);
    let loose: Vec<(usize, usize)> = grid
        .occupied()
        .map(|(r, c, _)| (r, c))
        .filter(|cell| !anchored.contains(cell))
        .collect();

    loose
        .into_iter()
        .filter_map(|(row, col)| grid.take(row, col).map(|bubble| ClearedCell { row, col, bubble }))
        .collect()
}

/// Resolve the bubble just placed at `(row, col)`
pub fn resolve_placement(grid: &mut Grid, row: usize, col: usize) -> MatchResult {
    let mut doomed: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut detonations = Vec::new();

    let cluster = placement_cluster(grid, row, col);
    if cluster.len() >= MIN_CLUSTER {
        doomed.extend(cluster.iter().copied());
    }
    if grid.bubble(row, col).is_some_and(|b| b.kind == SpecialKind::Bomb) {
        doomed.insert((row, col));
    }

    // Every bomb caught in the removal goes off, including chained ones
    let mut pending: Vec<(usize, usize)> = doomed
        .iter()
        .copied()
        .filter(|&(r, c)| grid.bubble(r, c).is_some_and(|b| b.kind == SpecialKind::Bomb))
        .collect();
    // Placed bomb first
    pending.sort_by_key(|&cell| cell != (row, col));
    pending.reverse();
    let mut detonated = HashSet::new();
    while let Some(bomb) = pending.pop() {
        if !detonated.insert(bomb) {
            continue;
        }
        detonations.push(bomb);
        for (r, c) in blast_area(grid, bomb, BOMB_RADIUS) {
            let Some(b) = grid.bubble(r, c) else { continue };
            if doomed.insert((r, c)) && b.kind == SpecialKind::Bomb {
                pending.push((r, c));
            }
        }
    }

    let removed: Vec<ClearedCell> = doomed
        .into_iter()
        .filter_map(|(r, c)| grid.take(r, c).map(|bubble| ClearedCell { row: r, col: c, bubble }))
        .collect();

    let floating = remove_floating(grid);

    let triggered = removed
        .iter()
        .chain(floating.iter())
        .filter(|cell| cell.bubble.kind.is_trigger())
        .map(|cell| TriggeredSpecial {
            row: cell.row,
            col: cell.col,
            kind: cell.bubble.kind,
        })
        .collect();

    if !removed.is_empty() {
        log::debug!(
            "Placement at ({}, {}): {} popped, {} dropped, {} bombs",
            row,
            col,
            removed.len(),
            floating.len(),
            detonations.len()
        );
    }

    MatchResult {
        placed: (row, col),
        combo_bonus: floating.len() as u32,
        removed,
        floating,
        detonations,
        triggered,
    }
}
