//! Periodic row descent timing

use serde::{Deserialize, Serialize};

/// Decides when the next row drops.
///
/// The controller only tracks the last drop time; the effective interval
/// (already scaled for any freeze the caller is running) is passed in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescentController {
    last_drop_ms: Option<f64>,
}

impl DescentController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from `now_ms`
    pub fn reset(&mut self, now_ms: f64) {
        self.last_drop_ms = Some(now_ms);
    }

    pub fn last_drop_ms(&self) -> Option<f64> {
        self.last_drop_ms
    }

    /// Returns true when a row should drop at `now_ms`.
    ///
    /// The first call only records a baseline. `None` interval never fires.
    pub fn update(&mut self, now_ms: f64, interval_ms: Option<f64>) -> bool {
        let Some(last) = self.last_drop_ms else {
            self.last_drop_ms = Some(now_ms);
            return false;
        };
        let Some(interval) = interval_ms else {
            return false;
        };
        if now_ms - last >= interval {
            self.last_drop_ms = Some(now_ms);
            true
        } else {
            false
        }
    }

    /// Milliseconds until the next drop, for HUD countdowns
    pub fn time_until_drop(&self, now_ms: f64, interval_ms: Option<f64>) -> Option<f64> {
        let interval = interval_ms?;
        let last = self.last_drop_ms.unwrap_or(now_ms);
        Some((interval - (now_ms - last)).max(0.0))
    }
}
