//! Per-frame simulation tick
//!
//! Order within a tick is fixed: descent, row wave, projectile motion and
//! collision, match resolution, terminal checks. A descent that breaches the
//! failure line ends the tick before the projectile moves.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{advance, place_projectile};
use super::error::SimError;
use super::grid::{drop_new_row, grid_cleared, grid_reached_failure_line};
use super::matching::{MatchResult, resolve_placement};
use super::state::{SimPhase, SimState};
use crate::consts::*;
use crate::{aim_angle_toward, shooter_origin};

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Present when the projectile landed this tick
    pub match_result: Option<MatchResult>,
    pub dropped_row: bool,
    /// The life ended this tick
    pub failure_breached: bool,
    /// The grid emptied this tick
    pub cleared: bool,
}

/// Advance the simulation by `delta_ms` ending at `now_ms`
pub fn tick<R: Rng>(state: &mut SimState<R>, delta_ms: f64, now_ms: f64) -> TickReport {
    let mut report = TickReport::default();
    if state.phase != SimPhase::Playing {
        return report;
    }
    let dt = (delta_ms.clamp(0.0, MAX_FRAME_MS) / 1000.0) as f32;

    // Descent
    let interval = state.effective_descent_interval();
    if state.descent.update(now_ms, interval) {
        drop_new_row(&mut state.grid, &state.level, &mut state.rng);
        report.dropped_row = true;
        log::debug!("Row dropped at {:.0}ms", now_ms);

        if grid_reached_failure_line(&state.grid, state.level.failure_row) {
            fail(state, &mut report, "descent");
            return report;
        }
    }

    // Row wave
    if let Some(wave) = state.level.row_wave {
        state.wave_clock += dt;
        state.grid.apply_row_wave(&wave, state.wave_clock);
    }

    // Projectile
    if let Some(mut projectile) = state.projectile.take() {
        match advance(&mut projectile, &state.grid, dt) {
            None => state.projectile = Some(projectile),
            Some(impact) => match place_projectile(&mut state.grid, &projectile, &impact) {
                Ok((row, col)) => {
                    let result = resolve_placement(&mut state.grid, row, col);
                    state.queue.retarget(&state.level, &state.grid, &mut state.rng);
                    report.match_result = Some(result);
                }
                // The bubble is never dropped; the only way to miss is a full lattice
                Err(e) => {
                    debug_assert_eq!(e, SimError::GridFull);
                    fail(state, &mut report, "no room to land");
                    return report;
                }
            },
        }
    }

    // Terminal checks
    if grid_cleared(&state.grid) {
        report.cleared = true;
        if state.level.endless {
            drop_new_row(&mut state.grid, &state.level, &mut state.rng);
            state.descent.reset(now_ms);
            report.dropped_row = true;
            log::info!("Grid cleared, endless level continues");
        } else {
            state.phase = SimPhase::Cleared;
            state.projectile = None;
            log::info!("Level cleared");
        }
    } else if grid_reached_failure_line(&state.grid, state.level.failure_row) {
        fail(state, &mut report, "placement");
    }

    report
}

fn fail<R: Rng>(state: &mut SimState<R>, report: &mut TickReport, cause: &str) {
    state.phase = SimPhase::Failed;
    state.projectile = None;
    report.failure_breached = true;
    log::info!("Failure line breached ({})", cause);
}

/// Idle/demo aim: target the lowest bubble matching the next shot's color.
///
/// Falls back to `fallback` when nothing on the grid matches.
pub fn idle_aim<R: Rng>(state: &SimState<R>, fallback: f32) -> f32 {
    let Some(color) = state.next_candidates().next().and_then(|b| b.color) else {
        return fallback;
    };
    let origin = shooter_origin();
    let target = state
        .grid()
        .occupied()
        .filter(|(_, _, b)| b.matches(color))
        .map(|(r, c, _)| state.grid().position(r, c))
        .fold(None, |best: Option<Vec2>, p| match best {
            Some(b) if b.y >= p.y => Some(b),
            _ => Some(p),
        });

    target
        .map(|t| aim_angle_toward(origin, t + Vec2::new(0.0, BUBBLE_RADIUS)))
        .unwrap_or(fallback)
}
