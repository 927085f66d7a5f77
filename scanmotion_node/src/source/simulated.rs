// scanmotion_node/src/source/simulated.rs

use super::ScanSource;
use crate::config::{ObstacleConfig, SimulationConfig};
use crate::error::NodeError;
use nalgebra::{Isometry3, Vector2, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use scanmotion_core::messages::ScanRecord;
use scanmotion_core::tf_buffer::TfBuffer;
use std::f64::consts::TAU;
use tracing::info;

pub const MAP_FRAME: &str = "map";
pub const ODOM_FRAME: &str = "odom";
pub const BASE_FRAME: &str = "base_link";

/// A planar base carrying one or more 2D lidars through a world of moving
/// circles.
///
/// The world frame is `odom`, and `map` coincides with it. Every batch holds
/// one scan per mounted sensor, all taken at the same stamp.
pub struct SimulatedScanner {
    config: SimulationConfig,
    rng: ChaCha8Rng,
    noise: Option<Normal<f64>>,
    mounts: Vec<(String, Isometry3<f64>)>,
    step: u64,
    /// Base pose in odom: x, y, yaw.
    pose: (f64, f64, f64),
    statics_published: bool,
}

impl SimulatedScanner {
    pub fn new(config: &SimulationConfig) -> Result<Self, NodeError> {
        if !(config.rate_hz.is_finite() && config.rate_hz > 0.0) {
            return Err(NodeError::Source(format!(
                "simulation.rate_hz must be positive, got {}",
                config.rate_hz
            )));
        }
        if config.beams < 2 || config.sensors == 0 {
            return Err(NodeError::Source(
                "simulation needs at least one sensor with two beams".into(),
            ));
        }

        let noise = if config.range_noise_stddev > 0.0 {
            let normal = Normal::new(0.0, config.range_noise_stddev)
                .map_err(|e| NodeError::Source(format!("range noise: {}", e)))?;
            Some(normal)
        } else {
            None
        };

        // --- Deterministic PRNG ---
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mounts = (0..config.sensors)
            .map(|i| {
                let name = if config.sensors == 1 {
                    "laser".to_string()
                } else {
                    format!("laser_{}", i)
                };
                let yaw = TAU * i as f64 / config.sensors as f64;
                let mount = planar_isometry(
                    config.mount_offset * yaw.cos(),
                    config.mount_offset * yaw.sin(),
                    yaw,
                );
                (name, mount)
            })
            .collect();

        info!(
            "Simulating {} sensor(s) at {} Hz for {}s, {} obstacle(s)",
            config.sensors,
            config.rate_hz,
            config.duration_seconds,
            config.obstacles.len()
        );

        Ok(Self {
            config: config.clone(),
            rng,
            noise,
            mounts,
            step: 0,
            pose: (0.0, 0.0, 0.0),
            statics_published: false,
        })
    }

    /// Frame ids of the mounted sensors, in stream order.
    pub fn sensor_frames(&self) -> impl Iterator<Item = &str> {
        self.mounts.iter().map(|(name, _)| name.as_str())
    }

    fn publish_statics(&mut self, tf: &TfBuffer) -> Result<(), NodeError> {
        tf.insert_static(MAP_FRAME, ODOM_FRAME, Isometry3::identity())?;
        for (name, mount) in &self.mounts {
            tf.insert_static(BASE_FRAME, name, *mount)?;
        }
        self.statics_published = true;
        Ok(())
    }

    fn scan(&mut self, frame_id: &str, odom_from_sensor: &Isometry3<f64>, stamp: f64) -> ScanRecord {
        let fov = self.config.fov_deg.to_radians();
        let angle_min = -fov / 2.0;
        let angle_increment = fov / (self.config.beams - 1) as f64;

        let origin = Vector2::new(
            odom_from_sensor.translation.vector.x,
            odom_from_sensor.translation.vector.y,
        );
        let sensor_yaw = odom_from_sensor.rotation.euler_angles().2;
        let centers: Vec<(Vector2<f64>, f64)> = self
            .config
            .obstacles
            .iter()
            .map(|o| (obstacle_center(o, stamp), o.radius))
            .collect();

        let ranges = (0..self.config.beams)
            .map(|i| {
                let angle = sensor_yaw + angle_min + i as f64 * angle_increment;
                let direction = Vector2::new(angle.cos(), angle.sin());
                let hit = centers
                    .iter()
                    .filter_map(|(center, radius)| ray_circle(&origin, &direction, center, *radius))
                    .fold(f64::INFINITY, f64::min);
                if hit > self.config.range_max {
                    return f64::INFINITY;
                }
                match &self.noise {
                    Some(noise) => (hit + noise.sample(&mut self.rng)).max(0.0),
                    None => hit,
                }
            })
            .collect();

        ScanRecord {
            frame_id: frame_id.to_string(),
            timestamp: stamp,
            angle_min,
            angle_increment,
            range_min: self.config.range_min,
            range_max: self.config.range_max,
            ranges,
        }
    }
}

impl ScanSource for SimulatedScanner {
    fn next_batch(&mut self, tf: &TfBuffer) -> Result<Option<Vec<ScanRecord>>, NodeError> {
        let dt = 1.0 / self.config.rate_hz;
        let stamp = self.step as f64 / self.config.rate_hz;
        if stamp > self.config.duration_seconds {
            return Ok(None);
        }
        if !self.statics_published {
            self.publish_statics(tf)?;
        }

        let (x, y, yaw) = self.pose;
        let odom_from_base = planar_isometry(x, y, yaw);
        tf.insert_isometry(ODOM_FRAME, BASE_FRAME, stamp, odom_from_base)?;

        let mounts = self.mounts.clone();
        let batch = mounts
            .iter()
            .map(|(name, mount)| self.scan(name, &(odom_from_base * mount), stamp))
            .collect();

        // Advance the base with its body-frame velocity.
        let [vx, vy] = self.config.ego_velocity;
        let (sin, cos) = yaw.sin_cos();
        self.pose = (
            x + (vx * cos - vy * sin) * dt,
            y + (vx * sin + vy * cos) * dt,
            yaw + self.config.ego_yaw_rate * dt,
        );
        self.step += 1;

        Ok(Some(batch))
    }
}

fn planar_isometry(x: f64, y: f64, yaw: f64) -> Isometry3<f64> {
    Isometry3::new(Vector3::new(x, y, 0.0), Vector3::z() * yaw)
}

fn obstacle_center(obstacle: &ObstacleConfig, stamp: f64) -> Vector2<f64> {
    Vector2::from(obstacle.position) + Vector2::from(obstacle.velocity) * stamp
}

/// Distance along a unit ray to the first intersection with a circle.
fn ray_circle(
    origin: &Vector2<f64>,
    direction: &Vector2<f64>,
    center: &Vector2<f64>,
    radius: f64,
) -> Option<f64> {
    let offset = origin - center;
    let b = direction.dot(&offset);
    let c = offset.norm_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    [-b - root, -b + root].into_iter().find(|t| *t >= 0.0)
}
