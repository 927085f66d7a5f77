//! Splitting a scan into candidate objects.
//!
//! A candidate is a run of consecutive valid readings in which neighbouring
//! ranges differ by no more than the edge threshold. Invalid readings (no
//! return, outside the sensor window, beyond the configured maximum distance)
//! end a run without starting a new one.

use crate::config::BankArgument;
use crate::messages::ScanRecord;
use nalgebra::{Point3, Vector3};

/// Thresholds used by [`segment_scan`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentationParams {
    pub edge_max_delta_range: f64,
    pub min_nr_points: usize,
    pub max_distance: f64,
}

impl From<&BankArgument> for SegmentationParams {
    fn from(argument: &BankArgument) -> Self {
        Self {
            edge_max_delta_range: argument.object_threshold_edge_max_delta_range,
            min_nr_points: argument.object_threshold_min_nr_points,
            max_distance: argument.object_threshold_max_distance,
        }
    }
}

/// A contiguous run of points hypothesized to belong to one physical object.
///
/// Points are in the sensor frame of the scan they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedObject {
    /// First reading of the run.
    pub index_begin: usize,
    /// Last reading of the run (inclusive).
    pub index_end: usize,
    pub points: Vec<Point3<f64>>,
    pub angle_begin: f64,
    pub angle_end: f64,
    pub distance_at_angle_begin: f64,
    pub distance_at_angle_end: f64,
    pub closest_index: usize,
    pub closest_distance: f64,
    pub angle_for_closest_distance: f64,
    pub closest_point: Point3<f64>,
    /// Centroid of the points.
    pub position: Point3<f64>,
    /// Distance between the first and the last point.
    pub seen_width: f64,
}

impl SegmentedObject {
    #[inline]
    pub fn nr_points(&self) -> usize {
        self.points.len()
    }

    fn from_run(scan: &ScanRecord, begin: usize, ranges: &[f64]) -> Self {
        let end = begin + ranges.len() - 1;
        let points: Vec<Point3<f64>> = ranges
            .iter()
            .enumerate()
            .map(|(offset, &range)| scan.point_at(begin + offset, range))
            .collect();

        let (closest_offset, closest_distance) = ranges
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (offset, range)| {
                if range < best.1 {
                    (offset, range)
                } else {
                    best
                }
            });

        let sum = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        let position = Point3::from(sum / points.len() as f64);
        let seen_width = (points[points.len() - 1] - points[0]).norm();

        Self {
            index_begin: begin,
            index_end: end,
            angle_begin: scan.angle_at(begin),
            angle_end: scan.angle_at(end),
            distance_at_angle_begin: ranges[0],
            distance_at_angle_end: ranges[ranges.len() - 1],
            closest_index: begin + closest_offset,
            closest_distance,
            angle_for_closest_distance: scan.angle_at(begin + closest_offset),
            closest_point: points[closest_offset],
            position,
            seen_width,
            points,
        }
    }
}

/// Segments `scan` into candidate objects ordered by increasing angle.
///
/// Pure function of its inputs: calling it twice on the same scan yields the
/// same objects.
pub fn segment_scan(scan: &ScanRecord, params: &SegmentationParams) -> Vec<SegmentedObject> {
    let mut objects = Vec::new();
    let mut run_begin = 0;
    let mut run: Vec<f64> = Vec::new();

    let close = |begin: usize, run: &mut Vec<f64>, objects: &mut Vec<SegmentedObject>| {
        if !run.is_empty() && run.len() >= params.min_nr_points {
            objects.push(SegmentedObject::from_run(scan, begin, run));
        }
        run.clear();
    };

    for (i, &range) in scan.ranges.iter().enumerate() {
        let valid = scan.in_sensor_range(range) && range <= params.max_distance;
        if !valid {
            close(run_begin, &mut run, &mut objects);
            continue;
        }

        if let Some(&previous) = run.last() {
            if (range - previous).abs() > params.edge_max_delta_range {
                close(run_begin, &mut run, &mut objects);
            }
        }
        if run.is_empty() {
            run_begin = i;
        }
        run.push(range);
    }
    close(run_begin, &mut run, &mut objects);

    objects
}
