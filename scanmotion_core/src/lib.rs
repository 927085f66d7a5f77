// scanmotion_core/src/lib.rs

// This file defines the public modules of the library.
pub mod bank;
pub mod calibration;
pub mod confidence;
pub mod config;
pub mod error;
pub mod frames;
pub mod messages;
pub mod prelude;
pub mod segmentation;
pub mod serde_helpers;
pub mod tf_buffer;
pub mod tracking;
pub mod types;

pub use error::{BankError, TfError};
