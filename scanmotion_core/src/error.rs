// scanmotion_core/src/error.rs

/// Result type alias for bank operations.
pub type Result<T> = std::result::Result<T, BankError>;

/// Everything a `Bank` can refuse to do.
///
/// Only the variants reported by [`BankError::is_fatal`] stop a stream. The
/// others reject a single call and leave the bank as it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BankError {
    /// A scan was submitted before `init` succeeded.
    #[error("Bank not initialized")]
    NotInitialized,

    /// The scan cannot be interpreted (empty, non-finite geometry, ...).
    #[error("Malformed scan: {0}")]
    MalformedScan(String),

    /// The scan is well formed but does not fit the window it is added to.
    #[error("Scan geometry mismatch: {0}")]
    ScanGeometryMismatch(String),

    /// The bank argument violates one of its invariants.
    #[error("Invalid bank configuration: {0}")]
    InvalidConfiguration(String),

    /// A scan older than the newest scan in the window.
    #[error("Non-monotonic timestamp: {next} arrived after {newest}")]
    NonMonotonicTimestamp {
        /// Timestamp of the newest scan in the window.
        newest: f64,
        /// Timestamp of the rejected scan.
        next: f64,
    },

    /// The bank stopped after a fatal error and refuses further work.
    #[error("Bank halted: {0}")]
    Halted(String),
}

impl BankError {
    /// Whether the error stops the affected stream for good.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BankError::InvalidConfiguration(_)
                | BankError::NonMonotonicTimestamp { .. }
                | BankError::Halted(_)
        )
    }
}

/// Errors when feeding the transform buffer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TfError {
    #[error("Non-finite stamp {stamp} for {parent} -> {child}")]
    NonFiniteStamp {
        parent: String,
        child: String,
        stamp: f64,
    },

    #[error("Frame '{0}' cannot be its own parent")]
    SelfParent(String),

    #[error("Empty frame id")]
    EmptyFrameId,
}
