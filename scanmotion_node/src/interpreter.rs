// scanmotion_node/src/interpreter.rs

//! Ingress: turns incoming scan messages into bank calls.
//!
//! A message carries one scan (single-scan mode) or one scan per stream
//! (array mode). The interpreter owns one bank per stream and, when the
//! window length is to be calibrated, first runs a rate probe that consumes
//! messages without feeding any bank.

use crate::config::IngressConfig;
use crate::error::NodeError;
use rayon::prelude::*;
use scanmotion_core::bank::Bank;
use scanmotion_core::calibration::WindowCalibrator;
use scanmotion_core::confidence::IdealDuration;
use scanmotion_core::config::{BankArgument, PublishSettings};
use scanmotion_core::error::BankError;
use scanmotion_core::messages::{MovingObject, ScanRecord};
use scanmotion_core::types::TfProvider;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Where the interpreter is in its lifecycle. Moves forward only.
#[derive(Debug, Clone)]
pub enum IngressPhase {
    /// Measuring the scan rate; messages do not reach any bank.
    Calibrating(WindowCalibrator),
    Steady,
}

/// The outcome of one message for one stream.
#[derive(Debug, Clone)]
pub struct StreamReport {
    pub stream: usize,
    /// Timestamp of the scan that produced the report.
    pub stamp: f64,
    pub publish: PublishSettings,
    pub result: Result<Vec<MovingObject>, BankError>,
    /// The newest smoothed scan, when `publish.publish_ema` is set.
    pub smoothed: Option<ScanRecord>,
}

pub struct Interpreter {
    tf: Arc<dyn TfProvider>,
    topic: String,
    template: BankArgument,
    ideal: IdealDuration,
    phase: IngressPhase,
    banks: Vec<Bank>,
    array_mode: bool,
}

impl Interpreter {
    pub fn new(
        tf: Arc<dyn TfProvider>,
        template: BankArgument,
        ingress: &IngressConfig,
    ) -> Result<Self, NodeError> {
        template.validate()?;

        let phase = if ingress.optimize_nr_scans_in_bank != 0.0 {
            let calibrator = WindowCalibrator::new(
                ingress.optimize_nr_scans_in_bank,
                ingress.calibration_limits(),
            )?;
            info!(
                "Measuring the rate of '{}' to size a {}s window",
                ingress.subscribe_topic, ingress.optimize_nr_scans_in_bank
            );
            IngressPhase::Calibrating(calibrator)
        } else {
            IngressPhase::Steady
        };

        Ok(Self {
            tf,
            topic: ingress.subscribe_topic.clone(),
            template,
            ideal: IdealDuration::default(),
            phase,
            banks: Vec::new(),
            array_mode: false,
        })
    }

    pub fn phase(&self) -> &IngressPhase {
        &self.phase
    }

    /// The argument new banks are created from.
    pub fn template(&self) -> &BankArgument {
        &self.template
    }

    pub fn ideal_duration(&self) -> &IdealDuration {
        &self.ideal
    }

    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    /// Whether banks exist and every one of them has halted.
    pub fn all_halted(&self) -> bool {
        !self.banks.is_empty() && self.banks.iter().all(Bank::is_halted)
    }

    /// Handles one message received at `now`.
    pub fn on_message(&mut self, scans: &[ScanRecord], now: f64) -> Vec<StreamReport> {
        if let IngressPhase::Calibrating(calibrator) = &mut self.phase {
            if let Some(calibration) = calibrator.observe(now) {
                calibration.apply_to(&mut self.template);
                self.ideal = calibration.ideal;
                self.phase = IngressPhase::Steady;
            }
            return Vec::new();
        }
        if scans.is_empty() {
            return Vec::new();
        }

        if self.banks.is_empty() {
            self.array_mode = scans.len() > 1;
            self.banks = (0..scans.len())
                .map(|_| Bank::new(self.tf.clone()).with_ideal_duration(self.ideal))
                .collect();
            debug!("Created {} bank(s) for '{}'", self.banks.len(), self.topic);
        }
        if scans.len() != self.banks.len() {
            warn!(
                "Message on '{}' has {} scans, expected {}",
                self.topic,
                scans.len(),
                self.banks.len()
            );
        }

        let template = &self.template;
        let array_mode = self.array_mode;
        let reports: Vec<StreamReport> = self
            .banks
            .par_iter_mut()
            .zip(scans.par_iter())
            .enumerate()
            .map(|(stream, (bank, scan))| {
                let argument = stream_argument(template, stream, array_mode);
                let publish = argument.publish.clone();

                let result = if bank.is_initialized() {
                    bank.submit_scan(scan)
                } else {
                    bank.init(argument, scan).map(|()| Vec::new())
                };
                let smoothed = if publish.publish_ema && result.is_ok() {
                    bank.newest_scan().cloned()
                } else {
                    None
                };

                StreamReport {
                    stream,
                    stamp: scan.timestamp,
                    publish,
                    result,
                    smoothed,
                }
            })
            .collect();

        for report in &reports {
            if let Err(err) = &report.result {
                log_rejection(&self.topic, report.stream, err);
            }
        }
        reports
    }
}

/// The argument of stream `index`, suffixed in array mode.
fn stream_argument(template: &BankArgument, index: usize, array_mode: bool) -> BankArgument {
    let mut argument = template.clone();
    if array_mode {
        argument.publish = template.publish.for_stream(index);
    }
    argument
}

fn log_rejection(topic: &str, stream: usize, err: &BankError) {
    match err {
        // Already reported when the bank halted.
        BankError::Halted(_) => debug!("'{}' stream {}: {}", topic, stream, err),
        _ if err.is_fatal() => error!("'{}' stream {} stopped: {}", topic, stream, err),
        _ => warn!("'{}' stream {}: scan rejected: {}", topic, stream, err),
    }
}
