//! Simulation state
//!
//! Everything the engine mutates lives in one owned value. Nothing is
//! global, so independent instances can run side by side.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bubble::Bubble;
use super::candidate::CandidateQueue;
use super::collision::Projectile;
use super::descent::DescentController;
use super::error::SimError;
use super::grid::{Grid, generate_initial_grid};
use crate::level::LevelConfig;
use crate::shooter_origin;

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimPhase {
    Playing,
    /// Grid emptied (never reached in endless levels)
    Cleared,
    /// Failure line breached; the caller decides whether to restart
    Failed,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct SimState<R = Pcg32> {
    pub(crate) level: LevelConfig,
    pub(crate) grid: Grid,
    pub(crate) projectile: Option<Projectile>,
    pub(crate) queue: CandidateQueue,
    pub(crate) descent: DescentController,
    pub(crate) rng: R,
    pub(crate) phase: SimPhase,
    /// Descent interval multiplier, set by the caller while a freeze runs
    pub(crate) descent_scale: f64,
    /// Accumulated play time driving the row wave (seconds)
    pub(crate) wave_clock: f32,
}

impl SimState<Pcg32> {
    /// New state for `level`, seeded for reproducibility
    pub fn new(level: LevelConfig, seed: u64) -> Self {
        log::info!("Starting level with seed: {}", seed);
        Self::with_rng(level, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> SimState<R> {
    /// New state drawing all randomness from `rng`
    pub fn with_rng(level: LevelConfig, mut rng: R) -> Self {
        let grid = generate_initial_grid(&level, &mut rng);
        let queue = CandidateQueue::new(&level, &grid, &mut rng);
        Self {
            level,
            grid,
            projectile: None,
            queue,
            descent: DescentController::new(),
            rng,
            phase: SimPhase::Playing,
            descent_scale: 1.0,
            wave_clock: 0.0,
        }
    }

    /// Launch the head candidate at `aim_angle` (radians, PI/2 = straight up)
    pub fn fire(&mut self, aim_angle: f32, now_ms: f64) -> Result<Projectile, SimError> {
        if self.phase != SimPhase::Playing {
            return Err(SimError::LevelOver);
        }
        if self.projectile.is_some() {
            return Err(SimError::InvalidFireWhileActive);
        }

        let bubble = self.queue.pop(&self.level, &self.grid, &mut self.rng);
        let projectile = Projectile::new(
            shooter_origin(),
            aim_angle,
            self.level.projectile_speed,
            bubble,
            now_ms,
        );
        log::debug!("Fired {:?} at angle {:.3}", bubble, aim_angle);
        self.projectile = Some(projectile.clone());
        Ok(projectile)
    }

    /// Exchange the two queued candidates
    pub fn swap_candidates(&mut self) -> Result<(), SimError> {
        if self.phase != SimPhase::Playing {
            return Err(SimError::LevelOver);
        }
        if self.projectile.is_some() {
            return Err(SimError::InvalidFireWhileActive);
        }
        self.queue.swap();
        Ok(())
    }

    /// Fresh grid and queue for the same level (after a lost life)
    pub fn restart(&mut self) {
        self.grid = generate_initial_grid(&self.level, &mut self.rng);
        self.queue = CandidateQueue::new(&self.level, &self.grid, &mut self.rng);
        self.projectile = None;
        self.descent = DescentController::new();
        self.phase = SimPhase::Playing;
        self.descent_scale = 1.0;
        self.wave_clock = 0.0;
        log::info!("Level restarted");
    }

    /// Descent interval multiplier (e.g. `FREEZE_SLOWDOWN` during a freeze)
    pub fn set_descent_scale(&mut self, scale: f64) {
        self.descent_scale = scale;
    }

    pub fn effective_descent_interval(&self) -> Option<f64> {
        self.level.effective_descent_interval(self.descent_scale)
    }

    /// Milliseconds until the next row drop
    pub fn time_until_drop(&self, now_ms: f64) -> Option<f64> {
        self.descent
            .time_until_drop(now_ms, self.effective_descent_interval())
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn projectile(&self) -> Option<&Projectile> {
        self.projectile.as_ref()
    }

    /// Upcoming shooter bubbles, head first
    pub fn next_candidates(&self) -> impl Iterator<Item = &Bubble> {
        self.queue.iter()
    }

    #[inline]
    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    #[inline]
    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.phase != SimPhase::Playing
    }

    /// Test/editor hook: replace the grid wholesale
    pub fn set_grid(&mut self, grid: Grid) {
        self.grid = grid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::LOOKAHEAD;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_new_state() {
        let state = SimState::new(LevelConfig::default(), 12345);
        assert_eq!(state.phase(), SimPhase::Playing);
        assert!(state.projectile().is_none());
        assert_eq!(state.next_candidates().count(), LOOKAHEAD);
        assert!(state.grid().occupied_count() > 0);
    }

    #[test]
    fn test_fire_consumes_head() {
        let mut state = SimState::new(LevelConfig::default(), 1);
        let queued: Vec<Bubble> = state.next_candidates().copied().collect();
        let shot = state.fire(FRAC_PI_2, 0.0).unwrap();
        assert_eq!(shot.bubble, queued[0]);
        assert_eq!(*state.next_candidates().next().unwrap(), queued[1]);
        assert_eq!(state.next_candidates().count(), LOOKAHEAD);
        assert_eq!(state.projectile(), Some(&shot));
    }

    #[test]
    fn test_fire_while_active_rejected() {
        let mut state = SimState::new(LevelConfig::default(), 2);
        let first = state.fire(FRAC_PI_2, 0.0).unwrap();
        let queued: Vec<Bubble> = state.next_candidates().copied().collect();

        assert_eq!(state.fire(1.0, 5.0), Err(SimError::InvalidFireWhileActive));
        // Nothing changed
        assert_eq!(state.projectile(), Some(&first));
        let after: Vec<Bubble> = state.next_candidates().copied().collect();
        assert_eq!(queued, after);
        assert_eq!(state.swap_candidates(), Err(SimError::InvalidFireWhileActive));
    }

    #[test]
    fn test_fire_after_level_over_rejected() {
        let mut state = SimState::new(LevelConfig::default(), 3);
        state.phase = SimPhase::Failed;
        assert_eq!(state.fire(FRAC_PI_2, 0.0), Err(SimError::LevelOver));
        state.restart();
        assert!(state.fire(FRAC_PI_2, 0.0).is_ok());
    }

    #[test]
    fn test_same_seed_same_state() {
        let a = SimState::new(LevelConfig::for_level(7), 99);
        let b = SimState::new(LevelConfig::for_level(7), 99);
        let ga: Vec<_> = a.grid().occupied().collect();
        let gb: Vec<_> = b.grid().occupied().collect();
        assert_eq!(ga, gb);
        let qa: Vec<_> = a.next_candidates().collect();
        let qb: Vec<_> = b.next_candidates().collect();
        assert_eq!(qa, qb);
    }

    #[test]
    fn test_descent_scale() {
        let mut state = SimState::new(LevelConfig::default(), 4);
        let base = state.effective_descent_interval().unwrap();
        state.set_descent_scale(crate::consts::FREEZE_SLOWDOWN);
        assert_eq!(state.effective_descent_interval(), Some(base * 2.0));
    }
}
