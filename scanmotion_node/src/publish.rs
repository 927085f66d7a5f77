// scanmotion_node/src/publish.rs

use crate::error::NodeError;
use crate::interpreter::StreamReport;
use scanmotion_core::messages::{MovingObject, ScanRecord};
use serde::Serialize;
use std::io::Write;
use tracing::info;

/// Base name of the node; stream suffixes are appended to it.
pub const NODE_NAME: &str = "scanmotion";

/// The contract for anything that consumes stream reports.
pub trait ReportSink {
    fn publish(&mut self, report: &StreamReport) -> Result<(), NodeError>;

    fn flush(&mut self) -> Result<(), NodeError> {
        Ok(())
    }
}

/// Logs every reported object at `info`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn publish(&mut self, report: &StreamReport) -> Result<(), NodeError> {
        let Ok(objects) = &report.result else {
            return Ok(());
        };
        if !report.publish.publish_objects {
            return Ok(());
        }
        for object in objects {
            info!(
                topic = %report.publish.topic_objects,
                stamp = object.timestamp,
                frame = %object.velocity_frame,
                "Moving object at ({:.2}, {:.2}), {:.2} m/s, confidence {:.2}",
                object.position.x,
                object.position.y,
                object.speed,
                object.confidence
            );
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ObjectsLine<'a> {
    topic: &'a str,
    node: String,
    stamp: f64,
    objects: &'a [MovingObject],
}

#[derive(Serialize)]
struct EmaLine<'a> {
    topic: &'a str,
    node: String,
    stamp: f64,
    scan: &'a ScanRecord,
}

/// Writes one JSON object per line: the detections of every cycle, and the
/// smoothed scan when the stream publishes it.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line<T: Serialize>(&mut self, line: &T) -> Result<(), NodeError> {
        serde_json::to_writer(&mut self.writer, line)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn publish(&mut self, report: &StreamReport) -> Result<(), NodeError> {
        let Ok(objects) = &report.result else {
            return Ok(());
        };
        let settings = &report.publish;
        let node = format!("{}{}", NODE_NAME, settings.node_name_suffix);

        if settings.publish_objects {
            self.write_line(&ObjectsLine {
                topic: &settings.topic_objects,
                node: node.clone(),
                stamp: report.stamp,
                objects,
            })?;
        }
        if settings.publish_ema {
            if let Some(scan) = &report.smoothed {
                self.write_line(&EmaLine {
                    topic: &settings.topic_ema,
                    node,
                    stamp: report.stamp,
                    scan,
                })?;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), NodeError> {
        Ok(self.writer.flush()?)
    }
}
