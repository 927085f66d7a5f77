use crate::error::BankError;
use crate::frames::{FrameKinematics, TransformStatus};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

// =========================================================================
// == Perception-Specific Data Structures ==
// =========================================================================

/// One sweep of a planar ranging sensor.
///
/// Readings are ordered by angle, `angle_min + i * angle_increment`, in the
/// sensor's XY plane (+X forward, counter-clockwise positive). A reading of
/// `inf` or `NaN` means the beam saw nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// The frame the readings are expressed in.
    pub frame_id: String,
    /// Capture time in seconds.
    pub timestamp: f64,
    pub angle_min: f64,
    pub angle_increment: f64,
    pub range_min: f64,
    pub range_max: f64,
    #[serde(with = "crate::serde_helpers::ranges_with_null_as_no_return")]
    pub ranges: Vec<f64>,
}

impl ScanRecord {
    /// Number of readings in the scan.
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Check if the scan carries no readings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Angle of reading `index` in radians.
    #[inline]
    pub fn angle_at(&self, index: usize) -> f64 {
        self.angle_min + index as f64 * self.angle_increment
    }

    /// Whether `range` lies inside the sensor's valid window and is finite.
    #[inline]
    pub fn in_sensor_range(&self, range: f64) -> bool {
        range.is_finite() && range >= self.range_min && range <= self.range_max
    }

    /// Cartesian point in the sensor frame for reading `index` at `range`.
    pub fn point_at(&self, index: usize, range: f64) -> Point3<f64> {
        let (sin, cos) = self.angle_at(index).sin_cos();
        Point3::new(range * cos, range * sin, 0.0)
    }

    /// Rejects records that cannot be segmented.
    pub fn validate(&self) -> Result<(), BankError> {
        if self.ranges.is_empty() {
            return Err(BankError::MalformedScan("scan has no readings".into()));
        }
        if self.frame_id.is_empty() {
            return Err(BankError::MalformedScan("scan has no frame id".into()));
        }
        if !self.timestamp.is_finite() {
            return Err(BankError::MalformedScan(format!(
                "non-finite timestamp {}",
                self.timestamp
            )));
        }
        if !self.angle_min.is_finite()
            || !self.angle_increment.is_finite()
            || self.angle_increment == 0.0
        {
            return Err(BankError::MalformedScan(format!(
                "invalid angular geometry (min {}, increment {})",
                self.angle_min, self.angle_increment
            )));
        }
        if self.range_min.is_nan() || self.range_max.is_nan() || self.range_min > self.range_max {
            return Err(BankError::MalformedScan(format!(
                "invalid range window [{}, {}]",
                self.range_min, self.range_max
            )));
        }
        Ok(())
    }
}

// =========================================================================
// == Public API Messages (Topic Data) ==
// =========================================================================

/// An object seen in both the oldest and the newest scan of a window, with
/// the motion derived from the two observations.
///
/// `position`, `closest_point`, `delta_position` and `velocity` are expressed
/// in `velocity_frame`. The same quantities in the map, fixed and base frames
/// are present only when both lookups for that frame succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingObject {
    /// Timestamp of the newest scan.
    pub timestamp: f64,
    /// Timestamp of the oldest scan the object was matched against.
    pub reference_timestamp: f64,
    /// Window duration used for the velocity.
    pub dt: f64,

    pub sensor_frame: String,
    pub velocity_frame: String,

    // --- Observation in the newest scan (sensor frame) ---
    pub angle_begin: f64,
    pub angle_end: f64,
    pub distance_at_angle_begin: f64,
    pub distance_at_angle_end: f64,
    pub closest_distance: f64,
    pub angle_for_closest_distance: f64,
    pub nr_points: usize,
    pub seen_width: f64,
    pub old_seen_width: f64,

    // --- Kinematics in the velocity frame ---
    pub position: Point3<f64>,
    pub closest_point: Point3<f64>,
    pub delta_position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub velocity_normalized: Vector3<f64>,
    pub speed: f64,

    pub in_map_frame: Option<FrameKinematics>,
    pub in_fixed_frame: Option<FrameKinematics>,
    pub in_base_frame: Option<FrameKinematics>,

    pub transforms: TransformStatus,
    pub confidence: f64,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    pub(crate) fn scan_with(ranges: Vec<f64>, timestamp: f64) -> ScanRecord {
        ScanRecord {
            frame_id: "laser".into(),
            timestamp,
            angle_min: 0.0,
            angle_increment: 0.001,
            range_min: 0.05,
            range_max: 30.0,
            ranges,
        }
    }

    #[test]
    fn test_point_at_follows_angle() {
        let mut scan = scan_with(vec![1.0; 3], 0.0);
        scan.angle_min = -std::f64::consts::FRAC_PI_2;
        scan.angle_increment = std::f64::consts::FRAC_PI_2;

        let right = scan.point_at(0, 2.0);
        assert_abs_diff_eq!(right.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(right.y, -2.0, epsilon = 1e-12);

        let ahead = scan.point_at(1, 2.0);
        assert_abs_diff_eq!(ahead.x, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ahead.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_rejects_malformed_records() {
        assert!(scan_with(vec![1.0], 0.0).validate().is_ok());
        assert!(matches!(
            scan_with(vec![], 0.0).validate(),
            Err(BankError::MalformedScan(_))
        ));
        assert!(scan_with(vec![1.0], f64::NAN).validate().is_err());

        let mut zero_step = scan_with(vec![1.0], 0.0);
        zero_step.angle_increment = 0.0;
        assert!(zero_step.validate().is_err());

        let mut inverted = scan_with(vec![1.0], 0.0);
        inverted.range_min = 5.0;
        inverted.range_max = 1.0;
        assert!(inverted.validate().is_err());

        let mut anonymous = scan_with(vec![1.0], 0.0);
        anonymous.frame_id.clear();
        assert!(anonymous.validate().is_err());
    }

    #[test]
    fn test_in_sensor_range() {
        let scan = scan_with(vec![1.0], 0.0);
        assert!(scan.in_sensor_range(1.0));
        assert!(!scan.in_sensor_range(0.01));
        assert!(!scan.in_sensor_range(f64::INFINITY));
        assert!(!scan.in_sensor_range(f64::NAN));
    }
}
