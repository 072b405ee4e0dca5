//! Hex Burst headless runner
//!
//! Plays a level with the idle aiming policy and logs what happens each shot.
//! Run with `RUST_LOG=debug` for per-placement detail.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use hex_burst::consts::FREEZE_SLOWDOWN;
use hex_burst::sim::{SimPhase, SimState, SpecialKind, idle_aim, tick};
use hex_burst::{Difficulty, LevelConfig};

/// Frame length of the simulated display loop (ms)
const FRAME_MS: f64 = 1000.0 / 60.0;
/// Freeze effect length once triggered (ms)
const FREEZE_MS: f64 = 8_000.0;
/// Frames to wait for a shot before giving up on it
const MAX_FLIGHT_FRAMES: u32 = 600;

#[derive(Debug, Parser)]
#[command(name = "hex-burst", about = "Play a bubble-shooter level headlessly")]
struct Args {
    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Level JSON file (overrides --difficulty and --level-number)
    #[arg(long)]
    level: Option<PathBuf>,
    /// Difficulty preset: easy, normal, hard
    #[arg(long)]
    difficulty: Option<String>,
    /// Standard progression level number
    #[arg(long, default_value_t = 1)]
    level_number: u32,
    /// Maximum shots before stopping
    #[arg(long, default_value_t = 60)]
    shots: u32,
}

fn load_level(args: &Args) -> Result<LevelConfig> {
    if let Some(path) = &args.level {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading level file {}", path.display()))?;
        return LevelConfig::from_json(&json)
            .with_context(|| format!("parsing level file {}", path.display()));
    }
    if let Some(name) = &args.difficulty {
        let Some(difficulty) = Difficulty::from_str(name) else {
            bail!("unknown difficulty '{}'", name);
        };
        return Ok(LevelConfig::from_difficulty(difficulty));
    }
    Ok(LevelConfig::for_level(args.level_number))
}

fn main() -> Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    let args = Args::parse();
    let level = load_level(&args)?;
    level.validate().context("level failed validation")?;
    log::info!("Hex Burst (headless) starting, {} colors", level.palette.len());

    let mut state = SimState::new(level, args.seed);
    let mut now = 0.0;
    let mut freeze_until: Option<f64> = None;
    let mut popped = 0usize;
    let mut dropped = 0usize;
    let mut shots = 0u32;

    tick(&mut state, 0.0, now);
    'shots: while shots < args.shots && state.phase() == SimPhase::Playing {
        let angle = idle_aim(&state, std::f32::consts::FRAC_PI_2);
        if state.fire(angle, now).is_err() {
            break;
        }
        shots += 1;

        for _ in 0..MAX_FLIGHT_FRAMES {
            now += FRAME_MS;
            if freeze_until.is_some_and(|t| now >= t) {
                freeze_until = None;
                state.set_descent_scale(1.0);
            }

            let report = tick(&mut state, FRAME_MS, now);
            if report.dropped_row {
                println!("  row dropped");
            }
            if let Some(result) = &report.match_result {
                popped += result.removed.len();
                dropped += result.floating.len();
                println!(
                    "shot {:>3}: landed {:?}, popped {}, dropped {}",
                    shots,
                    result.placed,
                    result.removed.len(),
                    result.floating.len()
                );
                for special in &result.triggered {
                    if special.kind == SpecialKind::Freeze {
                        freeze_until = Some(now + FREEZE_MS);
                        state.set_descent_scale(FREEZE_SLOWDOWN);
                    }
                    println!("           triggered {:?}", special.kind);
                }
            }
            if report.failure_breached || report.cleared || state.projectile().is_none() {
                if state.is_over() {
                    break 'shots;
                }
                continue 'shots;
            }
        }
        log::warn!("Shot {} never resolved", shots);
    }

    let outcome = match state.phase() {
        SimPhase::Playing => "still playing",
        SimPhase::Cleared => "cleared",
        SimPhase::Failed => "failed",
    };
    println!(
        "\n{} after {} shots: {} popped, {} dropped, {} left on the grid",
        outcome,
        shots,
        popped,
        dropped,
        state.grid().occupied_count()
    );
    Ok(())
}
