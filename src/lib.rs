//! Hex Burst - simulation core for a hex-grid bubble shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, projectile collision, matching, descent)
//! - `level`: Data-driven level configuration

pub mod level;
pub mod sim;

pub use level::{Difficulty, LevelConfig, LevelError, RowWave, SpawnChances};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Bubble radius in playfield pixels
    pub const BUBBLE_RADIUS: f32 = 16.0;
    /// Vertical distance between row centers (R * sqrt(3), hex packing)
    pub const ROW_HEIGHT: f32 = 27.712_813;

    /// Lattice dimensions
    pub const GRID_COLS: usize = 12;
    pub const MAX_ROWS: usize = 14;
    /// Default row index at which an occupied cell ends the current life
    pub const DEFAULT_FAILURE_ROW: usize = 12;

    /// Playfield margins
    pub const SIDE_MARGIN: f32 = 8.0;
    pub const TOP_MARGIN: f32 = 8.0;
    /// Full width: margins plus GRID_COLS bubbles plus the half-column shift
    pub const PLAYFIELD_WIDTH: f32 =
        2.0 * SIDE_MARGIN + (2 * GRID_COLS + 1) as f32 * BUBBLE_RADIUS;
    /// Horizontal bounds for the projectile center
    pub const LEFT_BOUND: f32 = SIDE_MARGIN + BUBBLE_RADIUS;
    pub const RIGHT_BOUND: f32 = PLAYFIELD_WIDTH - SIDE_MARGIN - BUBBLE_RADIUS;
    /// Projectile center y at which it sticks to the ceiling
    pub const CEILING_Y: f32 = TOP_MARGIN + BUBBLE_RADIUS;
    /// Shooter sits two bubbles below the last lattice row
    pub const SHOOTER_Y: f32 =
        TOP_MARGIN + BUBBLE_RADIUS + MAX_ROWS as f32 * ROW_HEIGHT + 2.0 * BUBBLE_RADIUS;

    /// Contact distance is 2R minus this overlap
    pub const OVERLAP_TOLERANCE: f32 = 3.0;
    /// Longest distance a projectile may move in one collision step (anti-tunneling)
    pub const MAX_STEP_DISTANCE: f32 = BUBBLE_RADIUS / 2.0;
    /// Frame deltas above this are clamped (ms)
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Default projectile speed (pixels/s)
    pub const DEFAULT_PROJECTILE_SPEED: f32 = 900.0;
    /// Shallowest allowed aim angle above horizontal (radians)
    pub const MIN_AIM_ANGLE: f32 = 0.15;

    /// Smallest same-color cluster that pops
    pub const MIN_CLUSTER: usize = 3;
    /// Neighbor rings cleared by a bomb
    pub const BOMB_RADIUS: usize = 1;
    /// Shooter look-ahead
    pub const LOOKAHEAD: usize = 2;
    /// Descent interval multiplier while a freeze is active
    pub const FREEZE_SLOWDOWN: f64 = 2.0;
    /// Phase difference between consecutive rows of the row wave (radians)
    pub const WAVE_ROW_PHASE: f32 = 0.6;
}

/// Clamp an aim angle (radians, 0 = right, PI/2 = straight up) so shots never run flat
#[inline]
pub fn clamp_aim(angle: f32) -> f32 {
    use std::f32::consts::PI;
    angle.clamp(consts::MIN_AIM_ANGLE, PI - consts::MIN_AIM_ANGLE)
}

/// Unit direction for an aim angle in screen space (y grows downward)
#[inline]
pub fn aim_direction(angle: f32) -> Vec2 {
    let angle = clamp_aim(angle);
    Vec2::new(angle.cos(), -angle.sin())
}

/// Aim angle that points from `origin` toward `target`
#[inline]
pub fn aim_angle_toward(origin: Vec2, target: Vec2) -> f32 {
    (origin.y - target.y).atan2(target.x - origin.x)
}

/// Launch position of every shot
#[inline]
pub fn shooter_origin() -> Vec2 {
    Vec2::new(consts::PLAYFIELD_WIDTH / 2.0, consts::SHOOTER_Y)
}
