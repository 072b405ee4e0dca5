//! Candidate generation
//!
//! Row fill and shooter bubbles are drawn from the level's explicit
//! `SpawnChances` weights through an injected random source.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bubble::{Bubble, BubbleColor, SpecialKind};
use super::grid::Grid;
use crate::consts::LOOKAHEAD;
use crate::level::{LevelConfig, SpawnChances};

/// Uniform pick from a palette (falls back to every color when empty)
pub fn pick_color<R: Rng>(palette: &[BubbleColor], rng: &mut R) -> BubbleColor {
    let palette = if palette.is_empty() {
        &BubbleColor::ALL[..]
    } else {
        palette
    };
    palette[rng.random_range(0..palette.len())]
}

/// Weighted special roll; the remainder of the unit interval is `Normal`
pub fn roll_special<R: Rng>(weights: &[(SpecialKind, f32)], rng: &mut R) -> SpecialKind {
    let roll = rng.random::<f32>();
    let mut acc = 0.0;
    for &(kind, weight) in weights {
        acc += weight.max(0.0);
        if roll < acc {
            return kind;
        }
    }
    SpecialKind::Normal
}

/// Bubble for a generated or injected grid row (may be an obstacle)
pub fn row_bubble<R: Rng>(level: &LevelConfig, rng: &mut R) -> Bubble {
    let kind = roll_special(&level.spawn.row_weights(), rng);
    if kind == SpecialKind::Obstacle {
        return Bubble::obstacle();
    }
    Bubble::special(pick_color(&level.palette, rng), kind)
}

/// Next shooter bubble.
///
/// Colors are limited to the ones still on the grid so every shot can
/// match something; an empty grid falls back to the full palette.
pub fn shooter_bubble<R: Rng>(level: &LevelConfig, grid: &Grid, rng: &mut R) -> Bubble {
    let palette = shooter_palette(level, grid);
    let kind = roll_special(&level.spawn.shooter_weights(), rng);
    Bubble::special(pick_color(&palette, rng), kind)
}

fn shooter_palette(level: &LevelConfig, grid: &Grid) -> Vec<BubbleColor> {
    let present = grid.colors_present();
    let live: Vec<BubbleColor> = level
        .palette
        .iter()
        .copied()
        .filter(|c| present.contains(c))
        .collect();
    if live.is_empty() {
        level.palette.clone()
    } else {
        live
    }
}

/// Upcoming shooter bubbles, always `LOOKAHEAD` long
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateQueue {
    items: VecDeque<Bubble>,
}

impl CandidateQueue {
    pub fn new<R: Rng>(level: &LevelConfig, grid: &Grid, rng: &mut R) -> Self {
        let items = (0..LOOKAHEAD)
            .map(|_| shooter_bubble(level, grid, rng))
            .collect();
        Self { items }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bubble> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the head and replenish the tail
    pub fn pop<R: Rng>(&mut self, level: &LevelConfig, grid: &Grid, rng: &mut R) -> Bubble {
        let head = self
            .items
            .pop_front()
            .unwrap_or_else(|| shooter_bubble(level, grid, rng));
        while self.items.len() < LOOKAHEAD {
            self.items.push_back(shooter_bubble(level, grid, rng));
        }
        head
    }

    /// Exchange the first two candidates
    pub fn swap(&mut self) {
        if self.items.len() >= 2 {
            self.items.swap(0, 1);
        }
    }

    /// Recolor plain queued bubbles whose color left the grid
    pub fn retarget<R: Rng>(&mut self, level: &LevelConfig, grid: &Grid, rng: &mut R) {
        let present = grid.colors_present();
        if present.is_empty() {
            return;
        }
        let palette = shooter_palette(level, grid);
        for bubble in self.items.iter_mut() {
            let stale = bubble.kind == SpecialKind::Normal
                && bubble.color.is_some_and(|c| !present.contains(&c));
            if stale {
                bubble.color = Some(pick_color(&palette, rng));
            }
        }
    }
}

impl SpawnChances {
    /// Weights for shooter bubbles (never obstacles)
    pub fn shooter_weights(&self) -> [(SpecialKind, f32); 4] {
        [
            (SpecialKind::Bomb, self.bomb),
            (SpecialKind::Rainbow, self.rainbow),
            (SpecialKind::Freeze, self.freeze),
            (SpecialKind::Aim, self.aim),
        ]
    }

    /// Weights for grid rows
    pub fn row_weights(&self) -> [(SpecialKind, f32); 5] {
        [
            (SpecialKind::Obstacle, self.obstacle),
            (SpecialKind::Bomb, self.bomb),
            (SpecialKind::Rainbow, self.rainbow),
            (SpecialKind::Freeze, self.freeze),
            (SpecialKind::Aim, self.aim),
        ]
    }
}
