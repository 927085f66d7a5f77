// scanmotion_core/src/prelude.rs

// --- Core Abstractions ---
pub use crate::bank::Bank;
pub use crate::error::{BankError, TfError};
pub use crate::types::TfProvider;

// --- Data Structures ---
pub use crate::config::{BankArgument, PublishSettings};
pub use crate::frames::{FrameKinematics, FrameRole, TransformStatus};
pub use crate::messages::{MovingObject, ScanRecord};

// --- Window Sizing and Scoring ---
pub use crate::calibration::{nr_scans_for, Calibration, CalibrationLimits, WindowCalibrator};
pub use crate::confidence::{calculate_confidence, IdealDuration};

// --- Transform Buffer ---
pub use crate::tf_buffer::{StampedTransform, TfBuffer};
