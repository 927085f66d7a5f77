//! Scoring of tracked objects.
//!
//! The score fuses four terms, all scaled by the smoothing factor:
//! - the configured base confidence,
//! - a flat bonus when all six transform lookups of the cycle succeeded,
//! - a downward parabola in the window duration that is positive between the
//!   two roots of the [`IdealDuration`],
//! - a penalty proportional to the change in seen width.

use crate::config::BankArgument;
use crate::frames::TransformStatus;
use serde::{Deserialize, Serialize};

/// Leading coefficient of the window-duration parabola.
pub const PARABOLA_COEFFICIENT: f64 = -10.0 / 3.0;
/// Added when every transform lookup succeeded.
pub const TRANSFORM_BONUS: f64 = 0.5;
/// Score change per metre of width difference.
pub const WIDTH_PENALTY_PER_METRE: f64 = -5.0;

/// Window durations (s) between which the duration term is positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealDuration {
    pub root_1: f64,
    pub root_2: f64,
}

impl Default for IdealDuration {
    fn default() -> Self {
        Self {
            root_1: 0.35,
            root_2: 0.65,
        }
    }
}

impl IdealDuration {
    /// Roots bracketing a calibrated target window length.
    pub fn from_target_seconds(target: f64) -> Self {
        Self {
            root_1: target * 0.6,
            root_2: target * 1.4,
        }
    }

    /// Duration at which the parabola peaks.
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.root_1 + self.root_2)
    }

    /// The duration term for a window of `dt` seconds.
    pub fn score(&self, dt: f64) -> f64 {
        PARABOLA_COEFFICIENT * (dt - self.root_1) * (dt - self.root_2)
    }
}

pub fn calculate_confidence(
    argument: &BankArgument,
    ideal: &IdealDuration,
    dt: f64,
    seen_width: f64,
    old_seen_width: f64,
    status: &TransformStatus,
) -> f64 {
    let transform_term = if status.all_succeeded() {
        TRANSFORM_BONUS
    } else {
        0.0
    };
    let width_term = WIDTH_PENALTY_PER_METRE * (seen_width - old_seen_width).abs();

    argument.ema_alpha * (argument.base_confidence + transform_term + ideal.score(dt) + width_term)
}
