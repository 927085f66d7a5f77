// scanmotion_core/src/config.rs

use crate::error::BankError;
use crate::frames::FrameRole;
use serde::{Deserialize, Serialize};

// =========================================================================
// == Bank Argument ==
// =========================================================================

/// # BankArgument
/// Everything a `Bank` needs to know, supplied once at initialization and
/// read-only afterwards. Field names match the keys of the `[bank]` section
/// of the node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BankArgument {
    /// Weight of the newest scan when smoothing ranges, in `(0, 1]`.
    /// Also scales every confidence value.
    pub ema_alpha: f64,
    /// Capacity of the window. At least 2.
    pub nr_scans_in_bank: usize,

    // --- Segmentation ---
    pub object_threshold_edge_max_delta_range: f64,
    pub object_threshold_min_nr_points: usize,
    pub object_threshold_max_distance: f64,

    // --- Tracking and reporting ---
    pub object_threshold_min_speed: f64,
    pub object_threshold_max_delta_width_in_points: usize,
    pub object_threshold_bank_tracking_max_delta_distance: f64,
    pub object_threshold_min_confidence: f64,
    /// How much we trust the sensor itself.
    pub base_confidence: f64,

    // --- Frames ---
    pub map_frame: String,
    pub fixed_frame: String,
    pub base_frame: String,
    /// The frame reported velocities are expressed in.
    pub velocity_frame: FrameRole,

    pub publish: PublishSettings,
}

impl Default for BankArgument {
    fn default() -> Self {
        Self {
            ema_alpha: 1.0,
            nr_scans_in_bank: 11,
            object_threshold_edge_max_delta_range: 0.15,
            object_threshold_min_nr_points: 5,
            object_threshold_max_distance: 6.5,
            object_threshold_min_speed: 0.1,
            object_threshold_max_delta_width_in_points: 5,
            object_threshold_bank_tracking_max_delta_distance: 0.4,
            object_threshold_min_confidence: 0.67,
            base_confidence: 0.3,
            map_frame: "map".to_string(),
            fixed_frame: "odom".to_string(),
            base_frame: "base_link".to_string(),
            velocity_frame: FrameRole::Fixed,
            publish: PublishSettings::default(),
        }
    }
}

impl BankArgument {
    /// Checks the invariants the bank relies on.
    pub fn validate(&self) -> Result<(), BankError> {
        let invalid = |msg: String| Err(BankError::InvalidConfiguration(msg));

        if self.nr_scans_in_bank < 2 {
            return invalid(format!(
                "nr_scans_in_bank must be at least 2, got {}",
                self.nr_scans_in_bank
            ));
        }
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return invalid(format!("ema_alpha must be in (0, 1], got {}", self.ema_alpha));
        }
        if self.object_threshold_min_nr_points == 0 {
            return invalid("object_threshold_min_nr_points must be at least 1".into());
        }

        let thresholds = [
            (
                "object_threshold_edge_max_delta_range",
                self.object_threshold_edge_max_delta_range,
            ),
            (
                "object_threshold_max_distance",
                self.object_threshold_max_distance,
            ),
            ("object_threshold_min_speed", self.object_threshold_min_speed),
            (
                "object_threshold_bank_tracking_max_delta_distance",
                self.object_threshold_bank_tracking_max_delta_distance,
            ),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{} must be finite and non-negative, got {}", name, value));
            }
        }
        if !self.object_threshold_min_confidence.is_finite() || !self.base_confidence.is_finite() {
            return invalid("confidence parameters must be finite".into());
        }

        for (name, frame) in [
            ("map_frame", &self.map_frame),
            ("fixed_frame", &self.fixed_frame),
            ("base_frame", &self.base_frame),
        ] {
            if frame.is_empty() {
                return invalid(format!("{} must not be empty", name));
            }
        }
        Ok(())
    }
}

// =========================================================================
// == Publishing Settings ==
// These are carried through the bank untouched for the report sinks.
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishSettings {
    pub publish_objects: bool,
    pub topic_objects: String,
    /// Publish the smoothed newest scan.
    pub publish_ema: bool,
    pub topic_ema: String,
    pub node_name_suffix: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            publish_objects: true,
            topic_objects: "moving_objects".to_string(),
            publish_ema: false,
            topic_ema: "ema".to_string(),
            node_name_suffix: String::new(),
        }
    }
}

impl PublishSettings {
    /// A copy with `_<index>` appended to every topic and to the node suffix,
    /// for one stream of a scan array.
    pub fn for_stream(&self, index: usize) -> Self {
        let suffix = format!("_{}", index);
        Self {
            publish_objects: self.publish_objects,
            topic_objects: format!("{}{}", self.topic_objects, suffix),
            publish_ema: self.publish_ema,
            topic_ema: format!("{}{}", self.topic_ema, suffix),
            node_name_suffix: format!("{}{}", self.node_name_suffix, suffix),
        }
    }
}
