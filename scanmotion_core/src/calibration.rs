// scanmotion_core/src/calibration.rs

use crate::config::BankArgument;
use crate::confidence::IdealDuration;
use crate::error::BankError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// When the rate probe stops counting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationLimits {
    pub max_messages: u32,
    pub max_seconds: f64,
}

impl Default for CalibrationLimits {
    fn default() -> Self {
        Self {
            max_messages: 100,
            max_seconds: 5.0,
        }
    }
}

/// The result of a finished rate probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub hz: f64,
    pub received_messages: u32,
    pub elapsed_seconds: f64,
    pub nr_scans_in_bank: usize,
    pub ideal: IdealDuration,
}

impl Calibration {
    /// Overrides the window capacity of `argument`.
    pub fn apply_to(&self, argument: &mut BankArgument) {
        argument.nr_scans_in_bank = self.nr_scans_in_bank;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibratorState {
    WaitingForFirst,
    Counting { started_at: f64, received: u32 },
    Steady(Calibration),
}

/// Measures the incoming scan rate and sizes the window so that it spans
/// `target_seconds`.
#[derive(Debug, Clone)]
pub struct WindowCalibrator {
    target_seconds: f64,
    limits: CalibrationLimits,
    state: CalibratorState,
}

impl WindowCalibrator {
    pub fn new(target_seconds: f64, limits: CalibrationLimits) -> Result<Self, BankError> {
        if !(target_seconds.is_finite() && target_seconds > 0.0) {
            return Err(BankError::InvalidConfiguration(format!(
                "optimize_nr_scans_in_bank must be a positive duration, got {}",
                target_seconds
            )));
        }
        if !(limits.max_seconds.is_finite() && limits.max_seconds > 0.0) || limits.max_messages == 0 {
            return Err(BankError::InvalidConfiguration(format!(
                "invalid rate probe limits {:?}",
                limits
            )));
        }
        Ok(Self {
            target_seconds,
            limits,
            state: CalibratorState::WaitingForFirst,
        })
    }

    pub fn target_seconds(&self) -> f64 {
        self.target_seconds
    }

    pub fn state(&self) -> &CalibratorState {
        &self.state
    }

    pub fn is_steady(&self) -> bool {
        matches!(self.state, CalibratorState::Steady(_))
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        match &self.state {
            CalibratorState::Steady(calibration) => Some(calibration),
            _ => None,
        }
    }

    /// Records one message received at `now`.
    ///
    /// Returns the calibration on the observation that completes the probe,
    /// and `None` before and after.
    pub fn observe(&mut self, now: f64) -> Option<Calibration> {
        match self.state {
            CalibratorState::WaitingForFirst => {
                debug!("Rate probe started at t={:.3}", now);
                self.state = CalibratorState::Counting {
                    started_at: now,
                    received: 0,
                };
                None
            }
            CalibratorState::Counting {
                started_at,
                received,
            } => {
                let received = received + 1;
                let elapsed = now - started_at;
                let limit_reached =
                    elapsed >= self.limits.max_seconds || received >= self.limits.max_messages;

                if !(limit_reached && elapsed > 0.0) {
                    self.state = CalibratorState::Counting {
                        started_at,
                        received,
                    };
                    return None;
                }

                let hz = f64::from(received) / elapsed;
                let calibration = Calibration {
                    hz,
                    received_messages: received,
                    elapsed_seconds: elapsed,
                    nr_scans_in_bank: nr_scans_for(self.target_seconds, hz),
                    ideal: IdealDuration::from_target_seconds(self.target_seconds),
                };
                info!(
                    "Received {} messages in {:.3}s, rate {:.2} Hz, nr_scans_in_bank = {}",
                    received, elapsed, hz, calibration.nr_scans_in_bank
                );
                self.state = CalibratorState::Steady(calibration);
                Some(calibration)
            }
            CalibratorState::Steady(_) => None,
        }
    }
}

/// Window capacity that spans `target_seconds` at `hz`.
///
/// An exact integer number of periods gets one extra slot (n periods need
/// n + 1 scans); otherwise the count is rounded up. Never below 2.
pub fn nr_scans_for(target_seconds: f64, hz: f64) -> usize {
    let periods = target_seconds * hz;
    let scans = if periods.fract() == 0.0 {
        periods + 1.0
    } else {
        periods.ceil()
    };
    if scans.is_finite() {
        (scans as usize).max(2)
    } else {
        2
    }
}
