// scanmotion_node/src/source/mod.rs

//! Where scans come from. A source hands out one batch per sensor sweep
//! (one scan per stream) and feeds the transforms that go with it into the
//! shared buffer before returning.

mod replay;
mod simulated;

pub use replay::{ReplayLine, ReplaySource};
pub use simulated::SimulatedScanner;

use crate::error::NodeError;
use scanmotion_core::messages::ScanRecord;
use scanmotion_core::tf_buffer::TfBuffer;

/// The contract for anything that produces scan batches.
pub trait ScanSource {
    /// The next batch, or `None` once the source is exhausted.
    fn next_batch(&mut self, tf: &TfBuffer) -> Result<Option<Vec<ScanRecord>>, NodeError>;
}
