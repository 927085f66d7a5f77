// scanmotion_node/src/error.rs

use scanmotion_core::{BankError, TfError};
use thiserror::Error;

/// Errors of the node process.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not dump configuration: {0}")]
    ConfigDump(#[from] toml::ser::Error),

    #[error("Transform error: {0}")]
    Tf(#[from] TfError),

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error("Scan source error: {0}")]
    Source(String),

    #[error("All {0} streams halted")]
    AllStreamsHalted(usize),
}

impl From<figment::Error> for NodeError {
    fn from(err: figment::Error) -> Self {
        NodeError::Config(Box::new(err))
    }
}
