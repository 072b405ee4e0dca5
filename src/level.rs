//! Level configuration
//!
//! Immutable per-level parameters. Levels can be built in code, from a
//! `Difficulty` preset, from a level number, or loaded from JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::bubble::BubbleColor;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "med" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Number of colors in play
    pub fn palette_size(&self) -> usize {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Normal => 4,
            Difficulty::Hard => 6,
        }
    }

    /// Milliseconds between row drops
    pub fn descent_interval_ms(&self) -> f64 {
        match self {
            Difficulty::Easy => 30_000.0,
            Difficulty::Normal => 20_000.0,
            Difficulty::Hard => 12_000.0,
        }
    }

    /// Fill chance for rows below the ceiling
    pub fn density(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Normal => 0.8,
            Difficulty::Hard => 0.9,
        }
    }
}

/// Per-bubble spawn probabilities for special kinds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnChances {
    pub bomb: f32,
    pub rainbow: f32,
    pub freeze: f32,
    pub aim: f32,
    /// Grid rows only; shooters never get obstacles
    pub obstacle: f32,
}

impl Default for SpawnChances {
    fn default() -> Self {
        Self {
            bomb: 0.03,
            rainbow: 0.03,
            freeze: 0.02,
            aim: 0.02,
            obstacle: 0.0,
        }
    }
}

impl SpawnChances {
    /// All specials disabled
    pub fn none() -> Self {
        Self {
            bomb: 0.0,
            rainbow: 0.0,
            freeze: 0.0,
            aim: 0.0,
            obstacle: 0.0,
        }
    }

    fn all(&self) -> [f32; 5] {
        [self.bomb, self.rainbow, self.freeze, self.aim, self.obstacle]
    }
}

/// Lateral sinusoidal sway of the rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowWave {
    /// Peak displacement (pixels)
    pub amplitude: f32,
    /// Angular speed (radians/s)
    pub speed: f32,
}

impl RowWave {
    /// Horizontal offset of `row` at `clock_secs`
    #[inline]
    pub fn offset(&self, row: usize, clock_secs: f32) -> f32 {
        self.amplitude * (clock_secs * self.speed + row as f32 * WAVE_ROW_PHASE).sin()
    }
}

/// Level parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Colors in play
    pub palette: Vec<BubbleColor>,
    pub spawn: SpawnChances,
    /// Row drop cadence; None disables descent
    pub descent_interval_ms: Option<f64>,
    pub time_limit_secs: Option<u32>,
    pub row_wave: Option<RowWave>,
    /// Clearing the grid injects a new row instead of ending the level
    pub endless: bool,
    /// Rows filled at the start
    pub initial_rows: usize,
    /// Fill chance for starting rows below the ceiling
    pub density: f32,
    /// First row index that ends the life when occupied
    pub failure_row: usize,
    /// Projectile speed (pixels/s)
    pub projectile_speed: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self::from_difficulty(Difficulty::default())
    }
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("invalid level json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("palette is empty")]
    EmptyPalette,
    #[error("spawn chance out of range: {0}")]
    InvalidChance(f32),
    #[error("spawn chances sum to {0}, above 1")]
    ChanceOverflow(f32),
    #[error("failure row {0} outside 1..={max}", max = MAX_ROWS)]
    InvalidFailureRow(usize),
    #[error("initial rows {0} must be in 1..failure row")]
    InvalidInitialRows(usize),
    #[error("density {0} outside 0..=1")]
    InvalidDensity(f32),
    #[error("projectile speed must be positive, got {0}")]
    InvalidSpeed(f32),
}

impl LevelConfig {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self {
            palette: BubbleColor::ALL[..difficulty.palette_size()].to_vec(),
            spawn: SpawnChances::default(),
            descent_interval_ms: Some(difficulty.descent_interval_ms()),
            time_limit_secs: None,
            row_wave: None,
            endless: false,
            initial_rows: 5,
            density: difficulty.density(),
            failure_row: DEFAULT_FAILURE_ROW,
            projectile_speed: DEFAULT_PROJECTILE_SPEED,
        }
    }

    /// Level `n` (1-based) of the standard progression
    pub fn for_level(n: u32) -> Self {
        let n = n.max(1);
        let difficulty = match n {
            1..=3 => Difficulty::Easy,
            4..=9 => Difficulty::Normal,
            _ => Difficulty::Hard,
        };
        let mut level = Self::from_difficulty(difficulty);

        // More starting rows every third level, capped well above the failure line
        level.initial_rows = (4 + (n as usize - 1) / 3).min(8);
        // Descent speeds up 5% per level, floor at 6s
        if let Some(interval) = level.descent_interval_ms {
            let scaled = interval * 0.95f64.powi(n as i32 - 1);
            level.descent_interval_ms = Some(scaled.max(6_000.0));
        }
        // Obstacles from level 6, swaying rows from level 8
        if n >= 6 {
            level.spawn.obstacle = (0.02 * (n - 5) as f32).min(0.1);
        }
        if n >= 8 {
            level.row_wave = Some(RowWave {
                amplitude: 4.0 + (n - 8) as f32,
                speed: 1.5,
            });
        }
        // Every fifth level is timed
        if n % 5 == 0 {
            level.time_limit_secs = Some(120);
        }
        level
    }

    /// Parse and validate a JSON level; omitted fields take defaults
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        if self.palette.is_empty() {
            return Err(LevelError::EmptyPalette);
        }
        let chances = self.spawn.all();
        if let Some(&bad) = chances.iter().find(|c| !(0.0..=1.0).contains(*c)) {
            return Err(LevelError::InvalidChance(bad));
        }
        let total: f32 = chances.iter().sum();
        if total > 1.0 {
            return Err(LevelError::ChanceOverflow(total));
        }
        if self.failure_row == 0 || self.failure_row > MAX_ROWS {
            return Err(LevelError::InvalidFailureRow(self.failure_row));
        }
        if self.initial_rows == 0 || self.initial_rows >= self.failure_row {
            return Err(LevelError::InvalidInitialRows(self.initial_rows));
        }
        if !(0.0..=1.0).contains(&self.density) {
            return Err(LevelError::InvalidDensity(self.density));
        }
        if self.projectile_speed.is_nan() || self.projectile_speed <= 0.0 {
            return Err(LevelError::InvalidSpeed(self.projectile_speed));
        }
        Ok(())
    }

    /// Descent interval after the caller's slow-down multiplier
    pub fn effective_descent_interval(&self, scale: f64) -> Option<f64> {
        self.descent_interval_ms.map(|ms| ms * scale.max(0.0))
    }

    /// Seconds left on a timed level, floored at zero
    pub fn time_remaining(&self, elapsed_ms: f64) -> Option<f64> {
        self.time_limit_secs
            .map(|limit| (limit as f64 - elapsed_ms / 1000.0).max(0.0))
    }
}
