// scanmotion_node/src/source/replay.rs

use super::ScanSource;
use crate::error::NodeError;
use scanmotion_core::messages::ScanRecord;
use scanmotion_core::tf_buffer::{StampedTransform, TfBuffer};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// One line of a recording: a batch of scans and the transforms published
/// since the previous batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayLine {
    pub scans: Vec<ScanRecord>,
    #[serde(default)]
    pub transforms: Vec<StampedTransform>,
}

/// Plays back JSON-lines recordings.
pub struct ReplaySource {
    pending: VecDeque<PathBuf>,
    current: Option<(String, Box<dyn BufRead + Send>)>,
    line_number: usize,
}

impl ReplaySource {
    /// Opens a recording file, or every `*.jsonl` file below a directory in
    /// file-name order.
    pub fn open(path: &Path) -> Result<Self, NodeError> {
        let pending: VecDeque<PathBuf> = if path.is_dir() {
            WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| {
                    !e.file_type().is_dir()
                        && e.path().extension().map_or(false, |ext| ext == "jsonl")
                })
                .map(|e| e.into_path())
                .collect()
        } else {
            VecDeque::from([path.to_path_buf()])
        };

        if pending.is_empty() {
            return Err(NodeError::Source(format!(
                "no .jsonl recordings found in {:?}",
                path
            )));
        }
        info!("Replaying {} recording(s) from {:?}", pending.len(), path);
        Ok(Self {
            pending,
            current: None,
            line_number: 0,
        })
    }

    /// Plays back an already open stream.
    pub fn from_reader(name: &str, reader: impl BufRead + Send + 'static) -> Self {
        Self {
            pending: VecDeque::new(),
            current: Some((name.to_string(), Box::new(reader))),
            line_number: 0,
        }
    }

    /// Next non-empty line across all recordings.
    fn next_line(&mut self) -> Result<Option<(String, String)>, NodeError> {
        loop {
            if self.current.is_none() {
                let Some(path) = self.pending.pop_front() else {
                    return Ok(None);
                };
                debug!("Opening recording {:?}", path);
                let reader = BufReader::new(File::open(&path)?);
                self.current = Some((path.display().to_string(), Box::new(reader)));
                self.line_number = 0;
            }

            if let Some((name, reader)) = self.current.as_mut() {
                let mut line = String::new();
                if reader.read_line(&mut line)? == 0 {
                    self.current = None;
                    continue;
                }
                self.line_number += 1;
                if !line.trim().is_empty() {
                    return Ok(Some((name.clone(), line)));
                }
            }
        }
    }
}

impl ScanSource for ReplaySource {
    fn next_batch(&mut self, tf: &TfBuffer) -> Result<Option<Vec<ScanRecord>>, NodeError> {
        let Some((name, line)) = self.next_line()? else {
            return Ok(None);
        };
        let parsed: ReplayLine = serde_json::from_str(&line).map_err(|e| {
            NodeError::Source(format!("{}:{}: {}", name, self.line_number, e))
        })?;

        for transform in &parsed.transforms {
            tf.insert(transform)?;
        }
        Ok(Some(parsed.scans))
    }
}
