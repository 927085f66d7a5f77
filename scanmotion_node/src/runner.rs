// scanmotion_node/src/runner.rs

use crate::cli::Cli;
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::interpreter::Interpreter;
use crate::publish::{JsonLinesSink, ReportSink, TracingSink};
use crate::source::{ReplaySource, ScanSource, SimulatedScanner};
use scanmotion_core::tf_buffer::TfBuffer;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;
use tracing::info;

/// Counts of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub objects: usize,
}

/// Builds the source and sinks named on the command line and runs them.
pub fn run(config: &NodeConfig, cli: &Cli) -> Result<RunSummary, NodeError> {
    let source: Box<dyn ScanSource + Send> = match &cli.replay {
        Some(path) => Box::new(ReplaySource::open(path)?),
        None => Box::new(SimulatedScanner::new(&config.simulation)?),
    };

    let mut sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(TracingSink)];
    if let Some(path) = &cli.json {
        if path == Path::new("-") {
            sinks.push(Box::new(JsonLinesSink::new(io::stdout().lock())));
        } else {
            sinks.push(Box::new(JsonLinesSink::new(BufWriter::new(File::create(path)?))));
        }
    }

    run_with(config, source, sinks, cli.cycles)
}

/// Feeds every batch of `source` through the interpreter into `sinks`.
///
/// The source runs on its own thread, at most `subscribe_buffer_size`
/// batches ahead of the banks.
pub fn run_with(
    config: &NodeConfig,
    mut source: Box<dyn ScanSource + Send>,
    mut sinks: Vec<Box<dyn ReportSink>>,
    max_batches: Option<usize>,
) -> Result<RunSummary, NodeError> {
    let tf = Arc::new(TfBuffer::new(config.tf.cache_seconds));
    let mut interpreter = Interpreter::new(tf.clone(), config.bank.clone(), &config.ingress)?;
    let (sender, receiver) = mpsc::sync_channel(config.ingress.subscribe_buffer_size.max(1));

    thread::scope(|scope| {
        let producer_tf = tf.clone();
        let producer = scope.spawn(move || -> Result<(), NodeError> {
            while let Some(batch) = source.next_batch(&producer_tf)? {
                // The receiver is gone once the consumer stops early.
                if sender.send(batch).is_err() {
                    break;
                }
            }
            Ok(())
        });

        let mut summary = RunSummary::default();
        let consumed = (|| -> Result<(), NodeError> {
            for batch in receiver {
                let Some(first) = batch.first() else {
                    continue;
                };
                let now = first.timestamp;

                for report in interpreter.on_message(&batch, now) {
                    summary.objects += report.result.as_ref().map_or(0, Vec::len);
                    for sink in sinks.iter_mut() {
                        sink.publish(&report)?;
                    }
                }
                summary.batches += 1;

                if interpreter.all_halted() {
                    return Err(NodeError::AllStreamsHalted(interpreter.banks().len()));
                }
                if max_batches.is_some_and(|max| summary.batches >= max) {
                    break;
                }
            }
            for sink in sinks.iter_mut() {
                sink.flush()?;
            }
            Ok(())
        })();

        let produced = producer
            .join()
            .map_err(|_| NodeError::Source("scan source thread panicked".into()))?;
        consumed?;
        produced?;

        info!(
            "Processed {} batches, {} moving objects reported",
            summary.batches, summary.objects
        );
        Ok(summary)
    })
}
