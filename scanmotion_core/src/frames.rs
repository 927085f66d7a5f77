// scanmotion_core/src/frames.rs

use crate::config::BankArgument;
use crate::types::TfProvider;
use nalgebra::{Isometry3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The reference frames a bank can express an object in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameRole {
    /// The sensor's own frame. Always available, never compensates ego-motion.
    Sensor,
    /// The global map frame.
    Map,
    /// The fixed (odometry) frame.
    #[default]
    Fixed,
    /// The robot's base frame.
    Base,
}

impl FrameRole {
    /// The configured frame id for this role.
    pub fn frame_id<'a>(&self, argument: &'a BankArgument, sensor_frame: &'a str) -> &'a str {
        match self {
            FrameRole::Sensor => sensor_frame,
            FrameRole::Map => &argument.map_frame,
            FrameRole::Fixed => &argument.fixed_frame,
            FrameRole::Base => &argument.base_frame,
        }
    }
}

/// Outcome of the six lookups of one detection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TransformStatus {
    pub old_map: bool,
    pub new_map: bool,
    pub old_fixed: bool,
    pub new_fixed: bool,
    pub old_base: bool,
    pub new_base: bool,
}

impl TransformStatus {
    /// A status where every lookup succeeded.
    pub const ALL_SUCCEEDED: TransformStatus = TransformStatus {
        old_map: true,
        new_map: true,
        old_fixed: true,
        new_fixed: true,
        old_base: true,
        new_base: true,
    };

    pub fn all_succeeded(&self) -> bool {
        self.old_map
            && self.new_map
            && self.old_fixed
            && self.new_fixed
            && self.old_base
            && self.new_base
    }

    /// Whether both lookups for `role` succeeded. The sensor role always does.
    pub fn resolved(&self, role: FrameRole) -> bool {
        match role {
            FrameRole::Sensor => true,
            FrameRole::Map => self.old_map && self.new_map,
            FrameRole::Fixed => self.old_fixed && self.new_fixed,
            FrameRole::Base => self.old_base && self.new_base,
        }
    }

    /// Number of failed lookups.
    pub fn failures(&self) -> usize {
        [
            self.old_map,
            self.new_map,
            self.old_fixed,
            self.new_fixed,
            self.old_base,
            self.new_base,
        ]
        .iter()
        .filter(|ok| !**ok)
        .count()
    }
}

/// The sensor-to-frame transforms at one timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameTransforms {
    pub map: Option<Isometry3<f64>>,
    pub fixed: Option<Isometry3<f64>>,
    pub base: Option<Isometry3<f64>>,
}

impl FrameTransforms {
    /// Looks up the sensor frame in the map, fixed and base frames at `stamp`.
    pub fn resolve(
        tf: &dyn TfProvider,
        argument: &BankArgument,
        sensor_frame: &str,
        stamp: f64,
    ) -> Self {
        let lookup = |role: FrameRole| {
            let target = role.frame_id(argument, sensor_frame);
            let result = tf.lookup_transform(target, sensor_frame, stamp);
            if result.is_none() {
                debug!(
                    "No transform {} <- {} at t={:.3}",
                    target, sensor_frame, stamp
                );
            }
            result
        };

        Self {
            map: lookup(FrameRole::Map),
            fixed: lookup(FrameRole::Fixed),
            base: lookup(FrameRole::Base),
        }
    }

    /// The transform for `role`; the sensor role is the identity.
    pub fn get(&self, role: FrameRole) -> Option<Isometry3<f64>> {
        match role {
            FrameRole::Sensor => Some(Isometry3::identity()),
            FrameRole::Map => self.map,
            FrameRole::Fixed => self.fixed,
            FrameRole::Base => self.base,
        }
    }
}

/// The transforms for the oldest and newest scan of a window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleTransforms {
    pub old: FrameTransforms,
    pub new: FrameTransforms,
}

impl CycleTransforms {
    /// Performs the six lookups of a detection cycle.
    pub fn resolve(
        tf: &dyn TfProvider,
        argument: &BankArgument,
        sensor_frame: &str,
        old_stamp: f64,
        new_stamp: f64,
    ) -> Self {
        Self {
            old: FrameTransforms::resolve(tf, argument, sensor_frame, old_stamp),
            new: FrameTransforms::resolve(tf, argument, sensor_frame, new_stamp),
        }
    }

    pub fn status(&self) -> TransformStatus {
        TransformStatus {
            old_map: self.old.map.is_some(),
            new_map: self.new.map.is_some(),
            old_fixed: self.old.fixed.is_some(),
            new_fixed: self.new.fixed.is_some(),
            old_base: self.old.base.is_some(),
            new_base: self.new.base.is_some(),
        }
    }

    /// The (old, new) transform pair for `role`, if both were found.
    pub fn pair(&self, role: FrameRole) -> Option<(Isometry3<f64>, Isometry3<f64>)> {
        Some((self.old.get(role)?, self.new.get(role)?))
    }
}

/// An object's motion expressed in one named frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameKinematics {
    pub frame: String,
    pub position: Point3<f64>,
    pub closest_point: Point3<f64>,
    pub delta_position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}
