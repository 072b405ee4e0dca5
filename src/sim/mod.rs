//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied time only
//! - Injected RNG only
//! - Stable iteration order (row-major)
//! - No rendering or platform dependencies

pub mod bubble;
pub mod candidate;
pub mod collision;
pub mod descent;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod matching;
pub mod state;
pub mod tick;

pub use bubble::{Bubble, BubbleColor, SpecialKind};
pub use candidate::CandidateQueue;
pub use collision::{Contact, Impact, Projectile, place_projectile, predict_path, resolve_slot};
pub use descent::DescentController;
pub use error::SimError;
pub use geometry::{RowParity, cell_center, nearest_empty_cell, nearest_empty_slot, neighbors};
pub use grid::{
    Cell, Grid, drop_new_row, generate_initial_grid, grid_cleared, grid_reached_failure_line,
};
pub use matching::{ClearedCell, MatchResult, TriggeredSpecial, resolve_placement};
pub use state::{SimPhase, SimState};
pub use tick::{TickReport, idle_aim, tick};
