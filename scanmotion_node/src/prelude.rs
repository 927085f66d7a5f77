// scanmotion_node/src/prelude.rs

// Re-export the entire scanmotion_core prelude so binaries can reach the
// pure types (`Bank`, `ScanRecord`, `TfBuffer`, ...) from one place.
pub use scanmotion_core::prelude::*;

// Node-specific types.
pub use crate::cli::Cli;
pub use crate::config::{IngressConfig, NodeConfig, SimulationConfig};
pub use crate::error::NodeError;
pub use crate::interpreter::{IngressPhase, Interpreter, StreamReport};
pub use crate::publish::{JsonLinesSink, ReportSink, TracingSink};
pub use crate::runner::{run, run_with, RunSummary};
pub use crate::source::{ReplaySource, ScanSource, SimulatedScanner};
