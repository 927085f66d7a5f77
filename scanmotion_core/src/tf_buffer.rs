// scanmotion_core/src/tf_buffer.rs

use crate::error::TfError;
use crate::types::TfProvider;
use nalgebra::{Isometry3, Vector3};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::warn;

// =========================================================================
// == TF Buffer Infrastructure (The "Service") ==
// =========================================================================

/// How long dynamic transforms are kept, in seconds.
pub const DEFAULT_CACHE_SECONDS: f64 = 10.0;

/// Deeper trees are treated as a cycle.
const MAX_TREE_DEPTH: usize = 64;

/// A planar transform record as it appears in replay files.
///
/// Describes the pose of `child` in `parent`, i.e. the transform that maps
/// `child` points into `parent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedTransform {
    pub parent: String,
    pub child: String,
    pub stamp: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// Rotation about +Z in radians.
    #[serde(default)]
    pub yaw: f64,
    /// Static transforms hold for every stamp.
    #[serde(default)]
    pub is_static: bool,
}

impl StampedTransform {
    pub fn planar(parent: &str, child: &str, stamp: f64, x: f64, y: f64, yaw: f64) -> Self {
        Self {
            parent: parent.to_string(),
            child: child.to_string(),
            stamp,
            x,
            y,
            z: 0.0,
            yaw,
            is_static: false,
        }
    }

    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::new(Vector3::new(self.x, self.y, self.z), Vector3::z() * self.yaw)
    }
}

#[derive(Debug, Clone)]
enum EdgeHistory {
    Static(Isometry3<f64>),
    /// Samples sorted by stamp.
    Dynamic(VecDeque<(f64, Isometry3<f64>)>),
}

#[derive(Debug, Clone)]
struct Edge {
    parent: String,
    history: EdgeHistory,
}

impl Edge {
    fn sample(&self, stamp: f64) -> Option<Isometry3<f64>> {
        match &self.history {
            EdgeHistory::Static(transform) => Some(*transform),
            EdgeHistory::Dynamic(samples) => interpolate(samples, stamp),
        }
    }
}

/// Interpolates between the two samples around `stamp`. Never extrapolates.
fn interpolate(samples: &VecDeque<(f64, Isometry3<f64>)>, stamp: f64) -> Option<Isometry3<f64>> {
    let (first, _) = samples.front()?;
    let (last, _) = samples.back()?;
    if !stamp.is_finite() || stamp < *first || stamp > *last {
        return None;
    }

    let idx = samples.partition_point(|(t, _)| *t < stamp);
    let (t1, after) = samples[idx];
    if t1 == stamp || idx == 0 {
        return Some(after);
    }
    let (t0, before) = samples[idx - 1];
    let frac = (stamp - t0) / (t1 - t0);
    Some(before.lerp_slerp(&after, frac))
}

/// A time-indexed transform tree.
///
/// Every frame has at most one parent. Writers take a short write lock;
/// lookups share a read lock, so any number of banks can query one buffer
/// concurrently.
#[derive(Debug)]
pub struct TfBuffer {
    cache_seconds: f64,
    /// Keyed by child frame id.
    edges: RwLock<HashMap<String, Edge>>,
}

impl Default for TfBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SECONDS)
    }
}

impl TfBuffer {
    pub fn new(cache_seconds: f64) -> Self {
        Self {
            cache_seconds,
            edges: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a replay-file record.
    pub fn insert(&self, transform: &StampedTransform) -> Result<(), TfError> {
        if transform.is_static {
            self.insert_static(&transform.parent, &transform.child, transform.to_isometry())
        } else {
            self.insert_isometry(
                &transform.parent,
                &transform.child,
                transform.stamp,
                transform.to_isometry(),
            )
        }
    }

    /// Adds a sample of the pose of `child` in `parent` at `stamp`.
    pub fn insert_isometry(
        &self,
        parent: &str,
        child: &str,
        stamp: f64,
        parent_from_child: Isometry3<f64>,
    ) -> Result<(), TfError> {
        check_edge(parent, child)?;
        if !stamp.is_finite() {
            return Err(TfError::NonFiniteStamp {
                parent: parent.to_string(),
                child: child.to_string(),
                stamp,
            });
        }

        let mut edges = self.edges.write();
        let edge = edges.entry(child.to_string()).or_insert_with(|| Edge {
            parent: parent.to_string(),
            history: EdgeHistory::Dynamic(VecDeque::new()),
        });
        if edge.parent != parent {
            warn!(
                "Frame '{}' re-parented from '{}' to '{}', dropping its history",
                child, edge.parent, parent
            );
            edge.parent = parent.to_string();
            edge.history = EdgeHistory::Dynamic(VecDeque::new());
        }
        if let EdgeHistory::Static(_) = edge.history {
            warn!("Static transform {} -> {} replaced by a dynamic one", parent, child);
            edge.history = EdgeHistory::Dynamic(VecDeque::new());
        }

        if let EdgeHistory::Dynamic(samples) = &mut edge.history {
            let in_order = samples.back().map_or(true, |(last, _)| *last < stamp);
            if in_order {
                samples.push_back((stamp, parent_from_child));
            } else {
                let idx = samples.partition_point(|(t, _)| *t < stamp);
                if samples.get(idx).is_some_and(|(t, _)| *t == stamp) {
                    samples[idx] = (stamp, parent_from_child);
                } else {
                    samples.insert(idx, (stamp, parent_from_child));
                }
            }

            if let Some((newest, _)) = samples.back() {
                let cutoff = newest - self.cache_seconds;
                while samples.front().is_some_and(|(t, _)| *t < cutoff) {
                    samples.pop_front();
                }
            }
        }
        Ok(())
    }

    /// Adds a transform that holds at every stamp.
    pub fn insert_static(
        &self,
        parent: &str,
        child: &str,
        parent_from_child: Isometry3<f64>,
    ) -> Result<(), TfError> {
        check_edge(parent, child)?;
        self.edges.write().insert(
            child.to_string(),
            Edge {
                parent: parent.to_string(),
                history: EdgeHistory::Static(parent_from_child),
            },
        );
        Ok(())
    }

    /// Number of frames that have a parent.
    pub fn len(&self) -> usize {
        self.edges.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.read().is_empty()
    }

    /// Walks from `frame` up to its root, returning the root and the pose of
    /// `frame` in it.
    fn pose_in_root(
        edges: &HashMap<String, Edge>,
        frame: &str,
        stamp: f64,
    ) -> Option<(String, Isometry3<f64>)> {
        let mut current = frame;
        let mut root_from_frame = Isometry3::identity();
        for _ in 0..MAX_TREE_DEPTH {
            match edges.get(current) {
                None => return Some((current.to_string(), root_from_frame)),
                Some(edge) => {
                    root_from_frame = edge.sample(stamp)? * root_from_frame;
                    current = edge.parent.as_str();
                }
            }
        }
        warn!("Transform tree above '{}' is too deep or cyclic", frame);
        None
    }
}

fn check_edge(parent: &str, child: &str) -> Result<(), TfError> {
    if parent.is_empty() || child.is_empty() {
        return Err(TfError::EmptyFrameId);
    }
    if parent == child {
        return Err(TfError::SelfParent(child.to_string()));
    }
    Ok(())
}

impl TfProvider for TfBuffer {
    fn lookup_transform(&self, target: &str, source: &str, stamp: f64) -> Option<Isometry3<f64>> {
        if target == source {
            return Some(Isometry3::identity());
        }

        let edges = self.edges.read();
        let (source_root, root_from_source) = Self::pose_in_root(&edges, source, stamp)?;
        let (target_root, root_from_target) = Self::pose_in_root(&edges, target, stamp)?;
        if source_root != target_root {
            return None;
        }

        // T_target_source = (T_root_target)^-1 * T_root_source
        Some(root_from_target.inverse() * root_from_source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point3;
    use std::f64::consts::FRAC_PI_2;
    use std::sync::Arc;

    const EPSILON: f64 = 1e-9;

    fn odom_buffer() -> TfBuffer {
        let tf = TfBuffer::default();
        tf.insert_static("map", "odom", Isometry3::identity()).unwrap();
        tf.insert_static(
            "base_link",
            "laser",
            StampedTransform::planar("base_link", "laser", 0.0, 0.2, 0.0, 0.0).to_isometry(),
        )
        .unwrap();
        tf.insert(&StampedTransform::planar("odom", "base_link", 0.0, 0.0, 0.0, 0.0))
            .unwrap();
        tf.insert(&StampedTransform::planar("odom", "base_link", 1.0, 1.0, 0.0, FRAC_PI_2))
            .unwrap();
        tf
    }

    #[test]
    fn test_lookup_composes_through_the_tree() {
        let tf = odom_buffer();
        let odom_from_laser = tf.lookup_transform("odom", "laser", 1.0).unwrap();

        // Base at (1, 0) facing +Y, laser 0.2 ahead of the base.
        let p = odom_from_laser * Point3::new(1.0, 0.0, 0.0);
        assert_abs_diff_eq!(p.x, 1.0, epsilon = EPSILON);
        assert_abs_diff_eq!(p.y, 1.2, epsilon = EPSILON);

        let map_from_laser = tf.lookup_transform("map", "laser", 1.0).unwrap();
        let q = map_from_laser * Point3::origin();
        assert_abs_diff_eq!(q.y, 0.2, epsilon = EPSILON);
    }

    #[test]
    fn test_lookup_interpolates_between_samples() {
        let tf = odom_buffer();
        let odom_from_base = tf.lookup_transform("odom", "base_link", 0.5).unwrap();

        assert_abs_diff_eq!(odom_from_base.translation.vector.x, 0.5, epsilon = EPSILON);
        assert_abs_diff_eq!(
            odom_from_base.rotation.angle(),
            FRAC_PI_2 / 2.0,
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_lookup_never_extrapolates() {
        let tf = odom_buffer();
        assert!(tf.lookup_transform("odom", "laser", 1.5).is_none());
        assert!(tf.lookup_transform("odom", "laser", -0.1).is_none());
        assert!(tf.lookup_transform("odom", "laser", f64::NAN).is_none());
        // Static-only chains hold at any time.
        assert!(tf.lookup_transform("base_link", "laser", 100.0).is_some());
    }

    #[test]
    fn test_lookup_inverse_and_unknown_frames() {
        let tf = odom_buffer();
        let forward = tf.lookup_transform("odom", "base_link", 1.0).unwrap();
        let backward = tf.lookup_transform("base_link", "odom", 1.0).unwrap();
        let round_trip = forward * backward;
        assert_abs_diff_eq!(round_trip.translation.vector.norm(), 0.0, epsilon = EPSILON);

        assert!(tf.lookup_transform("odom", "camera", 0.5).is_none());
        assert_eq!(
            tf.lookup_transform("camera", "camera", 0.5),
            Some(Isometry3::identity())
        );
    }

    #[test]
    fn test_out_of_order_samples_are_sorted_and_old_ones_pruned() {
        let tf = TfBuffer::new(1.0);
        tf.insert(&StampedTransform::planar("odom", "base_link", 2.0, 2.0, 0.0, 0.0))
            .unwrap();
        tf.insert(&StampedTransform::planar("odom", "base_link", 1.5, 1.5, 0.0, 0.0))
            .unwrap();
        let mid = tf.lookup_transform("odom", "base_link", 1.75).unwrap();
        assert_abs_diff_eq!(mid.translation.vector.x, 1.75, epsilon = EPSILON);

        tf.insert(&StampedTransform::planar("odom", "base_link", 3.0, 3.0, 0.0, 0.0))
            .unwrap();
        // 1.5 fell out of the one second cache.
        assert!(tf.lookup_transform("odom", "base_link", 1.75).is_none());
        assert!(tf.lookup_transform("odom", "base_link", 2.5).is_some());
    }

    #[test]
    fn test_invalid_edges_are_rejected() {
        let tf = TfBuffer::default();
        assert_eq!(
            tf.insert_static("odom", "odom", Isometry3::identity()),
            Err(TfError::SelfParent("odom".into()))
        );
        assert_eq!(
            tf.insert_static("", "odom", Isometry3::identity()),
            Err(TfError::EmptyFrameId)
        );
        assert!(tf
            .insert_isometry("odom", "base_link", f64::INFINITY, Isometry3::identity())
            .is_err());
        assert!(tf.is_empty());
    }

    #[test]
    fn test_concurrent_lookups() {
        let tf = Arc::new(odom_buffer());
        std::thread::scope(|scope| {
            for _ in 0..4 {
                let tf = Arc::clone(&tf);
                scope.spawn(move || {
                    for i in 0..100 {
                        let stamp = i as f64 / 100.0;
                        assert!(tf.lookup_transform("map", "laser", stamp).is_some());
                    }
                });
            }
        });
    }
}
