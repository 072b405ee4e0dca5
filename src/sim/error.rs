//! Simulation error kinds
//!
//! None of these are fatal: `tick` maps them to a no-op or a failure
//! transition, and `fire` hands them back to the caller.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimError {
    /// Every neighbor of the contacted bubble is taken or out of bounds
    #[error("no empty cell next to the contacted bubble")]
    NoSlotAvailable,
    /// The bubble would land at or below the last lattice row
    #[error("grid is full")]
    GridFull,
    /// A projectile is already in flight
    #[error("a projectile is already in flight")]
    InvalidFireWhileActive,
    /// The level is cleared or failed
    #[error("level is over")]
    LevelOver,
}
