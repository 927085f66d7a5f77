//! The bank: a bounded window of recent scans of one sensor stream, and the
//! detection cycle that turns it into moving objects.
//!
//! A cycle compares only the oldest and the newest scan of the window. The
//! scans in between set the window duration and nothing else.

use crate::config::BankArgument;
use crate::confidence::{calculate_confidence, IdealDuration};
use crate::error::{BankError, Result};
use crate::frames::{CycleTransforms, FrameKinematics, FrameRole, TransformStatus};
use crate::messages::{MovingObject, ScanRecord};
use crate::segmentation::{segment_scan, SegmentationParams, SegmentedObject};
use crate::tracking::{match_objects, Track, TrackingParams};
use crate::types::TfProvider;
use nalgebra::{Isometry3, Vector3};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, trace};

// =========================================================================
// == Bank ==
// =========================================================================

/// Largest difference (rad) at which two scans count as the same beam layout.
const ANGLE_TOLERANCE: f64 = 1e-9;

pub struct Bank {
    tf: Arc<dyn TfProvider>,
    argument: Option<BankArgument>,
    /// Oldest first. Holds smoothed records.
    window: VecDeque<ScanRecord>,
    /// Set by a fatal error; the bank refuses work from then on.
    halted: Option<BankError>,
    ideal: IdealDuration,
}

impl Bank {
    pub fn new(tf: Arc<dyn TfProvider>) -> Self {
        Self {
            tf,
            argument: None,
            window: VecDeque::new(),
            halted: None,
            ideal: IdealDuration::default(),
        }
    }

    /// Replaces the window durations the confidence model favours.
    pub fn with_ideal_duration(mut self, ideal: IdealDuration) -> Self {
        self.ideal = ideal;
        self
    }

    /// Configures the bank and seeds its window with `first`.
    ///
    /// On error the bank is left exactly as it was. A halted bank stays
    /// halted.
    pub fn init(&mut self, argument: BankArgument, first: &ScanRecord) -> Result<()> {
        if let Some(reason) = &self.halted {
            return Err(BankError::Halted(reason.to_string()));
        }
        argument.validate()?;
        first.validate()?;

        debug!(
            "Bank for '{}' initialized: {} readings, window of {} scans",
            first.frame_id,
            first.len(),
            argument.nr_scans_in_bank
        );
        // Slots are allocated as scans arrive.
        self.window.clear();
        self.window.push_back(first.clone());
        self.argument = Some(argument);
        Ok(())
    }

    /// Adds `scan` as the newest record, evicting the oldest when full.
    pub fn add_scan(&mut self, scan: &ScanRecord) -> Result<()> {
        if let Some(reason) = &self.halted {
            return Err(BankError::Halted(reason.to_string()));
        }
        let argument = self.argument.as_ref().ok_or(BankError::NotInitialized)?;
        scan.validate()?;

        let Some(newest) = self.window.back() else {
            return Err(BankError::NotInitialized);
        };
        if scan.len() != newest.len() {
            return Err(BankError::ScanGeometryMismatch(format!(
                "expected {} readings, got {}",
                newest.len(),
                scan.len()
            )));
        }
        if scan.frame_id != newest.frame_id {
            return Err(BankError::ScanGeometryMismatch(format!(
                "expected frame '{}', got '{}'",
                newest.frame_id, scan.frame_id
            )));
        }
        if (scan.angle_min - newest.angle_min).abs() > ANGLE_TOLERANCE
            || (scan.angle_increment - newest.angle_increment).abs() > ANGLE_TOLERANCE
        {
            return Err(BankError::ScanGeometryMismatch(format!(
                "expected angles {} + i * {}, got {} + i * {}",
                newest.angle_min, newest.angle_increment, scan.angle_min, scan.angle_increment
            )));
        }
        if scan.timestamp < newest.timestamp {
            let err = BankError::NonMonotonicTimestamp {
                newest: newest.timestamp,
                next: scan.timestamp,
            };
            self.halted = Some(err.clone());
            return Err(err);
        }

        let record = smooth(scan, newest, argument.ema_alpha);
        self.window.push_back(record);
        while self.window.len() > argument.nr_scans_in_bank {
            self.window.pop_front();
        }
        Ok(())
    }

    /// Runs one detection cycle over the current window.
    pub fn find_moving_objects(&self) -> Result<Vec<MovingObject>> {
        if let Some(reason) = &self.halted {
            return Err(BankError::Halted(reason.to_string()));
        }
        let argument = self.argument.as_ref().ok_or(BankError::NotInitialized)?;

        let (Some(oldest), Some(newest)) = (self.window.front(), self.window.back()) else {
            return Ok(Vec::new());
        };
        let dt = newest.timestamp - oldest.timestamp;
        if self.window.len() < 2 || dt <= 0.0 {
            return Ok(Vec::new());
        }

        let segmentation = SegmentationParams::from(argument);
        let old_objects = segment_scan(oldest, &segmentation);
        let new_objects = segment_scan(newest, &segmentation);
        if old_objects.is_empty() || new_objects.is_empty() {
            return Ok(Vec::new());
        }

        let sensor_frame = newest.frame_id.as_str();
        let transforms = CycleTransforms::resolve(
            self.tf.as_ref(),
            argument,
            sensor_frame,
            oldest.timestamp,
            newest.timestamp,
        );
        let status = transforms.status();

        let tracking_role = if status.resolved(FrameRole::Fixed) {
            FrameRole::Fixed
        } else {
            FrameRole::Sensor
        };
        let (old_to_common, new_to_common) = transforms
            .pair(tracking_role)
            .unwrap_or((Isometry3::identity(), Isometry3::identity()));

        let tracks = match_objects(
            &old_objects,
            &new_objects,
            &old_to_common,
            &new_to_common,
            dt,
            &TrackingParams::from(argument),
        );

        let velocity_role = if status.resolved(argument.velocity_frame) {
            argument.velocity_frame
        } else {
            FrameRole::Sensor
        };

        let cycle = Cycle {
            argument,
            ideal: &self.ideal,
            oldest,
            newest,
            dt,
            transforms: &transforms,
            status,
            velocity_role,
        };

        let mut objects = Vec::with_capacity(tracks.len());
        for track in &tracks {
            let object = cycle.report(
                track,
                &old_objects[track.old_index],
                &new_objects[track.new_index],
            );
            if object.confidence < argument.object_threshold_min_confidence {
                trace!(
                    "Dropped object at {:.2} rad: confidence {:.3}",
                    object.angle_for_closest_distance,
                    object.confidence
                );
                continue;
            }
            if object.speed < argument.object_threshold_min_speed {
                trace!(
                    "Dropped object at {:.2} rad: speed {:.3} m/s",
                    object.angle_for_closest_distance,
                    object.speed
                );
                continue;
            }
            objects.push(object);
        }

        debug!(
            "'{}' t={:.3} dt={:.3}: {} tracks, {} moving",
            sensor_frame,
            newest.timestamp,
            dt,
            tracks.len(),
            objects.len()
        );
        Ok(objects)
    }

    /// Adds `scan` and runs a detection cycle.
    pub fn submit_scan(&mut self, scan: &ScanRecord) -> Result<Vec<MovingObject>> {
        self.add_scan(scan)?;
        self.find_moving_objects()
    }

    // --- Accessors ---

    pub fn is_initialized(&self) -> bool {
        self.argument.is_some()
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Configured window capacity, or 0 before `init`.
    pub fn capacity(&self) -> usize {
        self.argument.as_ref().map_or(0, |a| a.nr_scans_in_bank)
    }

    /// Newest minus oldest timestamp in the window.
    pub fn window_duration(&self) -> f64 {
        match (self.window.front(), self.window.back()) {
            (Some(oldest), Some(newest)) => newest.timestamp - oldest.timestamp,
            _ => 0.0,
        }
    }

    /// The newest (smoothed) record.
    pub fn newest_scan(&self) -> Option<&ScanRecord> {
        self.window.back()
    }

    pub fn argument(&self) -> Option<&BankArgument> {
        self.argument.as_ref()
    }

    pub fn ideal_duration(&self) -> &IdealDuration {
        &self.ideal
    }
}

/// Exponential smoothing of `scan` against the previous newest record.
fn smooth(scan: &ScanRecord, previous: &ScanRecord, alpha: f64) -> ScanRecord {
    if alpha >= 1.0 {
        return scan.clone();
    }
    let ranges = scan
        .ranges
        .iter()
        .zip(&previous.ranges)
        .map(|(&new, &prev)| {
            if new.is_finite() && prev.is_finite() {
                alpha * new + (1.0 - alpha) * prev
            } else {
                new
            }
        })
        .collect();
    ScanRecord {
        ranges,
        ..scan.clone()
    }
}

/// Per-cycle data shared by every track of the cycle.
struct Cycle<'a> {
    argument: &'a BankArgument,
    ideal: &'a IdealDuration,
    oldest: &'a ScanRecord,
    newest: &'a ScanRecord,
    dt: f64,
    transforms: &'a CycleTransforms,
    status: TransformStatus,
    velocity_role: FrameRole,
}

impl Cycle<'_> {
    fn kinematics(
        &self,
        role: FrameRole,
        old: &SegmentedObject,
        new: &SegmentedObject,
    ) -> Option<FrameKinematics> {
        let (old_tf, new_tf) = self.transforms.pair(role)?;
        let closest_point = new_tf * new.closest_point;
        let delta_position = closest_point - old_tf * old.closest_point;
        Some(FrameKinematics {
            frame: role
                .frame_id(self.argument, &self.newest.frame_id)
                .to_string(),
            position: new_tf * new.position,
            closest_point,
            delta_position,
            velocity: delta_position / self.dt,
        })
    }

    fn report(&self, track: &Track, old: &SegmentedObject, new: &SegmentedObject) -> MovingObject {
        let in_frame = |role| self.kinematics(role, old, new);
        let primary = in_frame(self.velocity_role).unwrap_or_else(|| FrameKinematics {
            frame: self.newest.frame_id.clone(),
            position: new.position,
            closest_point: new.closest_point,
            delta_position: track.delta_position,
            velocity: track.velocity,
        });

        let speed = primary.velocity.norm();
        let velocity_normalized = if speed > 0.0 {
            primary.velocity / speed
        } else {
            Vector3::zeros()
        };

        MovingObject {
            timestamp: self.newest.timestamp,
            reference_timestamp: self.oldest.timestamp,
            dt: self.dt,
            sensor_frame: self.newest.frame_id.clone(),
            velocity_frame: primary.frame,
            angle_begin: new.angle_begin,
            angle_end: new.angle_end,
            distance_at_angle_begin: new.distance_at_angle_begin,
            distance_at_angle_end: new.distance_at_angle_end,
            closest_distance: new.closest_distance,
            angle_for_closest_distance: new.angle_for_closest_distance,
            nr_points: new.nr_points(),
            seen_width: new.seen_width,
            old_seen_width: old.seen_width,
            position: primary.position,
            closest_point: primary.closest_point,
            delta_position: primary.delta_position,
            velocity: primary.velocity,
            velocity_normalized,
            speed,
            in_map_frame: in_frame(FrameRole::Map),
            in_fixed_frame: in_frame(FrameRole::Fixed),
            in_base_frame: in_frame(FrameRole::Base),
            transforms: self.status,
            confidence: calculate_confidence(
                self.argument,
                self.ideal,
                self.dt,
                new.seen_width,
                old.seen_width,
                &self.status,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::TRANSFORM_BONUS;
    use crate::messages::tests::scan_with;
    use crate::tf_buffer::TfBuffer;
    use approx::assert_abs_diff_eq;

    /// `map -> odom -> base_link -> laser`, all identity. The map edge is
    /// left out when `with_map` is false.
    fn tf_tree(with_map: bool) -> Arc<TfBuffer> {
        let tf = TfBuffer::default();
        if with_map {
            tf.insert_static("map", "odom", Isometry3::identity()).unwrap();
        }
        tf.insert_static("odom", "base_link", Isometry3::identity()).unwrap();
        tf.insert_static("base_link", "laser", Isometry3::identity()).unwrap();
        Arc::new(tf)
    }

    fn argument() -> BankArgument {
        BankArgument {
            nr_scans_in_bank: 3,
            object_threshold_bank_tracking_max_delta_distance: 2.5,
            ..Default::default()
        }
    }

    /// 40 readings, an object at 10..=20 at `range`, nothing elsewhere.
    fn object_scan(range: f64, timestamp: f64) -> ScanRecord {
        let ranges = (0..40)
            .map(|i| if (10..=20).contains(&i) { range } else { f64::INFINITY })
            .collect();
        scan_with(ranges, timestamp)
    }

    fn approaching(bank: &mut Bank) -> Vec<MovingObject> {
        bank.init(argument(), &object_scan(5.0, 0.0)).unwrap();
        assert!(bank.submit_scan(&object_scan(4.0, 0.25)).unwrap().is_empty());
        bank.submit_scan(&object_scan(3.0, 0.5)).unwrap()
    }

    fn chord(range: f64) -> f64 {
        2.0 * range * (0.005f64).sin()
    }

    #[test]
    fn test_approaching_object_is_reported() {
        let mut bank = Bank::new(tf_tree(true));
        let objects = approaching(&mut bank);

        assert_eq!(objects.len(), 1);
        let object = &objects[0];
        assert_abs_diff_eq!(object.speed, 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(object.dt, 0.5);
        assert_eq!(object.velocity_frame, "odom");
        assert_eq!(object.nr_points, 11);
        assert!(object.transforms.all_succeeded());
        assert!(object.in_map_frame.is_some());
        assert!(object.in_base_frame.is_some());

        let expected = 0.3 + 0.5 + 0.075 - 5.0 * (chord(5.0) - chord(3.0));
        assert_abs_diff_eq!(object.confidence, expected, epsilon = 1e-9);
        assert!(object.confidence > 0.67);
        assert_abs_diff_eq!(object.velocity_normalized.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_failed_lookup_costs_the_bonus_only() {
        let permissive = BankArgument {
            object_threshold_min_confidence: 0.0,
            ..argument()
        };

        let mut full = Bank::new(tf_tree(true));
        let mut partial = Bank::new(tf_tree(false));
        for bank in [&mut full, &mut partial] {
            bank.init(permissive.clone(), &object_scan(5.0, 0.0)).unwrap();
            bank.add_scan(&object_scan(4.0, 0.25)).unwrap();
            bank.add_scan(&object_scan(3.0, 0.5)).unwrap();
        }
        let ok = full.find_moving_objects().unwrap();
        let degraded = partial.find_moving_objects().unwrap();

        assert_eq!(degraded.len(), 1);
        let object = &degraded[0];
        assert!(!object.transforms.old_map && !object.transforms.new_map);
        assert!(object.in_map_frame.is_none());
        assert_abs_diff_eq!(object.speed, ok[0].speed, epsilon = 1e-12);
        assert_abs_diff_eq!(
            ok[0].confidence - object.confidence,
            TRANSFORM_BONUS * permissive.ema_alpha,
            epsilon = 1e-12
        );

        // With the default threshold the degraded object is filtered out.
        let mut strict = Bank::new(tf_tree(false));
        assert!(approaching(&mut strict).is_empty());
    }

    #[test]
    fn test_ego_motion_is_compensated() {
        // The base drives 1 m toward a static object over the window.
        let tf = TfBuffer::default();
        tf.insert_static("map", "odom", Isometry3::identity()).unwrap();
        tf.insert_static("base_link", "laser", Isometry3::identity()).unwrap();
        for (stamp, x) in [(0.0, 0.0), (0.25, 0.5), (0.5, 1.0)] {
            tf.insert_isometry("odom", "base_link", stamp, Isometry3::translation(x, 0.0, 0.0))
                .unwrap();
        }
        let tf = Arc::new(tf);

        let run = |velocity_frame| {
            let mut bank = Bank::new(tf.clone());
            let argument = BankArgument {
                velocity_frame,
                ..argument()
            };
            bank.init(argument, &object_scan(5.0, 0.0)).unwrap();
            bank.add_scan(&object_scan(4.5, 0.25)).unwrap();
            bank.submit_scan(&object_scan(4.0, 0.5)).unwrap()
        };

        assert!(run(FrameRole::Fixed).is_empty());

        let in_sensor = run(FrameRole::Sensor);
        assert_eq!(in_sensor.len(), 1);
        assert_eq!(in_sensor[0].velocity_frame, "laser");
        assert_abs_diff_eq!(in_sensor[0].speed, 2.0, epsilon = 1e-9);
        let fixed = in_sensor[0].in_fixed_frame.as_ref().unwrap();
        assert!(fixed.velocity.norm() < 0.1);
    }

    #[test]
    fn test_insufficient_history_yields_nothing() {
        let mut bank = Bank::new(tf_tree(true));
        assert_eq!(bank.find_moving_objects(), Err(BankError::NotInitialized));
        assert_eq!(
            bank.add_scan(&object_scan(5.0, 0.0)),
            Err(BankError::NotInitialized)
        );

        bank.init(argument(), &object_scan(5.0, 0.0)).unwrap();
        assert!(bank.find_moving_objects().unwrap().is_empty());

        // Equal timestamps are accepted but give no duration.
        assert!(bank.submit_scan(&object_scan(4.0, 0.0)).unwrap().is_empty());
        assert_eq!(bank.window_len(), 2);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut bank = Bank::new(tf_tree(true));
        bank.init(argument(), &object_scan(5.0, 0.0)).unwrap();
        for i in 1..6 {
            bank.add_scan(&object_scan(5.0, i as f64 * 0.1)).unwrap();
        }
        assert_eq!(bank.window_len(), 3);
        assert_eq!(bank.capacity(), 3);
        assert_abs_diff_eq!(bank.window_duration(), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(bank.newest_scan().unwrap().timestamp, 0.5);
    }

    #[test]
    fn test_decreasing_timestamp_halts() {
        let mut bank = Bank::new(tf_tree(true));
        bank.init(argument(), &object_scan(5.0, 1.0)).unwrap();

        let err = bank.add_scan(&object_scan(5.0, 0.5)).unwrap_err();
        assert!(matches!(err, BankError::NonMonotonicTimestamp { .. }));
        assert!(err.is_fatal());
        assert!(bank.is_halted());

        assert!(matches!(
            bank.add_scan(&object_scan(5.0, 2.0)),
            Err(BankError::Halted(_))
        ));
        assert!(matches!(bank.find_moving_objects(), Err(BankError::Halted(_))));
    }

    #[test]
    fn test_halted_bank_cannot_be_reinitialized() {
        let mut bank = Bank::new(tf_tree(true));
        bank.init(argument(), &object_scan(5.0, 1.0)).unwrap();
        assert!(bank.add_scan(&object_scan(5.0, 0.5)).is_err());

        assert!(matches!(
            bank.init(argument(), &object_scan(5.0, 2.0)),
            Err(BankError::Halted(_))
        ));
        assert!(bank.is_halted());
        assert!(matches!(bank.find_moving_objects(), Err(BankError::Halted(_))));
    }

    #[test]
    fn test_large_capacity_allocates_lazily() {
        let mut bank = Bank::new(tf_tree(true));
        let huge = BankArgument {
            nr_scans_in_bank: usize::MAX / 2,
            ..argument()
        };
        assert!(huge.validate().is_ok());
        bank.init(huge, &object_scan(5.0, 0.0)).unwrap();
        bank.add_scan(&object_scan(5.0, 0.1)).unwrap();
        assert_eq!(bank.window_len(), 2);
        assert_eq!(bank.capacity(), usize::MAX / 2);
    }

    /// The approaching-object window against `tf`, with every confidence kept.
    fn approaching_with(tf: Arc<TfBuffer>, velocity_frame: FrameRole) -> Vec<MovingObject> {
        let mut bank = Bank::new(tf);
        let argument = BankArgument {
            object_threshold_min_confidence: 0.0,
            velocity_frame,
            ..argument()
        };
        bank.init(argument, &object_scan(5.0, 0.0)).unwrap();
        bank.add_scan(&object_scan(4.0, 0.25)).unwrap();
        bank.submit_scan(&object_scan(3.0, 0.5)).unwrap()
    }

    #[test]
    fn test_missing_fixed_frame_falls_back_to_sensor() {
        // No `odom -> base_link` edge: map and fixed lookups fail.
        let tf = TfBuffer::default();
        tf.insert_static("map", "odom", Isometry3::identity()).unwrap();
        tf.insert_static("base_link", "laser", Isometry3::identity()).unwrap();

        let objects = approaching_with(Arc::new(tf), FrameRole::Fixed);
        assert_eq!(objects.len(), 1);
        let object = &objects[0];
        assert_eq!(object.velocity_frame, "laser");
        assert!(object.in_fixed_frame.is_none());
        assert!(object.in_map_frame.is_none());
        assert!(object.in_base_frame.is_some());
        assert!(!object.transforms.old_fixed && !object.transforms.new_fixed);
        assert_abs_diff_eq!(object.speed, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unresolved_velocity_frame_falls_back_to_sensor() {
        let objects = approaching_with(tf_tree(false), FrameRole::Map);
        assert_eq!(objects.len(), 1);
        let object = &objects[0];
        assert_eq!(object.velocity_frame, "laser");
        assert!(object.in_map_frame.is_none());
        // Tracking still ran in the fixed frame.
        assert!(object.in_fixed_frame.is_some());
        assert_abs_diff_eq!(object.speed, 4.0, epsilon = 1e-9);

        let resolved = approaching_with(tf_tree(true), FrameRole::Map);
        assert_eq!(resolved[0].velocity_frame, "map");
        assert_abs_diff_eq!(resolved[0].speed, object.speed, epsilon = 1e-12);
    }

    #[test]
    fn test_mismatched_scans_are_rejected() {
        let mut bank = Bank::new(tf_tree(true));
        bank.init(argument(), &object_scan(5.0, 0.0)).unwrap();

        let short = scan_with(vec![1.0; 10], 0.1);
        assert!(matches!(
            bank.add_scan(&short),
            Err(BankError::ScanGeometryMismatch(_))
        ));

        let mut other_frame = object_scan(5.0, 0.1);
        other_frame.frame_id = "laser_rear".into();
        assert!(matches!(
            bank.add_scan(&other_frame),
            Err(BankError::ScanGeometryMismatch(_))
        ));

        let mut rotated = object_scan(5.0, 0.1);
        rotated.angle_min += 0.01;
        assert!(matches!(
            bank.add_scan(&rotated),
            Err(BankError::ScanGeometryMismatch(_))
        ));

        let mut finer = object_scan(5.0, 0.1);
        finer.angle_increment *= 0.5;
        assert!(matches!(
            bank.add_scan(&finer),
            Err(BankError::ScanGeometryMismatch(_))
        ));

        let mut malformed = object_scan(5.0, 0.1);
        malformed.angle_increment = f64::NAN;
        assert!(matches!(
            bank.add_scan(&malformed),
            Err(BankError::MalformedScan(_))
        ));

        // Rejections leave the window and the bank usable.
        assert_eq!(bank.window_len(), 1);
        assert!(!bank.is_halted());
        assert!(bank.add_scan(&object_scan(5.0, 0.1)).is_ok());
    }

    #[test]
    fn test_failed_init_leaves_bank_unchanged() {
        let mut bank = Bank::new(tf_tree(true));
        let bad = BankArgument {
            nr_scans_in_bank: 1,
            ..argument()
        };
        assert!(matches!(
            bank.init(bad, &object_scan(5.0, 0.0)),
            Err(BankError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            bank.init(argument(), &scan_with(vec![], 0.0)),
            Err(BankError::MalformedScan(_))
        ));
        assert!(!bank.is_initialized());
        assert_eq!(bank.window_len(), 0);

        bank.init(argument(), &object_scan(5.0, 0.0)).unwrap();
        let before = bank.argument().cloned();
        let bad = BankArgument {
            ema_alpha: 0.0,
            ..argument()
        };
        assert!(bank.init(bad, &object_scan(5.0, 1.0)).is_err());
        assert_eq!(bank.argument().cloned(), before);
        assert_eq!(bank.window_len(), 1);
    }

    #[test]
    fn test_ranges_are_smoothed() {
        let mut bank = Bank::new(tf_tree(true));
        let argument = BankArgument {
            ema_alpha: 0.5,
            ..argument()
        };
        bank.init(argument, &scan_with(vec![2.0, 2.0, 1.0], 0.0)).unwrap();
        bank.add_scan(&scan_with(vec![4.0, f64::INFINITY, 3.0], 0.1)).unwrap();

        let newest = bank.newest_scan().unwrap();
        assert_abs_diff_eq!(newest.ranges[0], 3.0);
        assert!(newest.ranges[1].is_infinite());
        assert_abs_diff_eq!(newest.ranges[2], 2.0);
        assert_abs_diff_eq!(newest.timestamp, 0.1);
    }

    #[test]
    fn test_ideal_duration_is_per_bank() {
        let ideal = IdealDuration::from_target_seconds(1.0);
        let bank = Bank::new(tf_tree(true)).with_ideal_duration(ideal);
        assert_eq!(bank.ideal_duration(), &ideal);
        assert_eq!(Bank::new(tf_tree(true)).ideal_duration(), &IdealDuration::default());
    }
}
