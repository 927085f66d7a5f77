// scanmotion_node/src/lib.rs

// The host side of scanmotion: configuration, scan sources, the ingress
// state machine and the report sinks around the core banks.
pub mod cli;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod prelude;
pub mod publish;
pub mod runner;
pub mod source;

pub use error::NodeError;
