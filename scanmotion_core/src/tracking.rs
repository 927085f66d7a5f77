// scanmotion_core/src/tracking.rs

use crate::config::BankArgument;
use crate::segmentation::SegmentedObject;
use nalgebra::{Isometry3, Vector3};

/// Thresholds used by [`match_objects`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingParams {
    /// Max distance between the closest points of a matched pair (m).
    pub max_delta_distance: f64,
    /// Max difference in point count of a matched pair.
    pub max_delta_width_in_points: usize,
}

impl From<&BankArgument> for TrackingParams {
    fn from(argument: &BankArgument) -> Self {
        Self {
            max_delta_distance: argument.object_threshold_bank_tracking_max_delta_distance,
            max_delta_width_in_points: argument.object_threshold_max_delta_width_in_points,
        }
    }
}

/// One object followed from the oldest to the newest scan of a window.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Index into the old object slice.
    pub old_index: usize,
    /// Index into the new object slice.
    pub new_index: usize,
    /// Distance between the closest points in the tracking frame.
    pub distance: f64,
    /// New closest point minus old closest point, in the tracking frame.
    pub delta_position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    /// New seen width minus old seen width (m).
    pub width_delta: f64,
}

/// Matches every new object against the old ones.
///
/// Both slices are brought into a common tracking frame with `old_to_common`
/// and `new_to_common`. New objects are visited in order; each takes the
/// nearest old object that is still free, within `max_delta_distance` and
/// within `max_delta_width_in_points`. An old object is used at most once, and
/// new objects without a partner produce no track.
pub fn match_objects(
    old: &[SegmentedObject],
    new: &[SegmentedObject],
    old_to_common: &Isometry3<f64>,
    new_to_common: &Isometry3<f64>,
    dt: f64,
    params: &TrackingParams,
) -> Vec<Track> {
    let old_closest: Vec<_> = old.iter().map(|o| old_to_common * o.closest_point).collect();
    let mut taken = vec![false; old.len()];
    let mut tracks = Vec::new();

    for (new_index, new_object) in new.iter().enumerate() {
        let new_closest = new_to_common * new_object.closest_point;

        let mut best: Option<(usize, f64)> = None;
        for (old_index, old_object) in old.iter().enumerate() {
            if taken[old_index] {
                continue;
            }
            if new_object.nr_points().abs_diff(old_object.nr_points())
                > params.max_delta_width_in_points
            {
                continue;
            }
            let distance = (new_closest - old_closest[old_index]).norm();
            if distance > params.max_delta_distance {
                continue;
            }
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((old_index, distance));
            }
        }

        if let Some((old_index, distance)) = best {
            taken[old_index] = true;
            let old_object = &old[old_index];
            let delta_position = new_closest - old_closest[old_index];
            tracks.push(Track {
                old_index,
                new_index,
                distance,
                delta_position,
                velocity: delta_position / dt,
                width_delta: new_object.seen_width - old_object.seen_width,
            });
        }
    }

    tracks
}
