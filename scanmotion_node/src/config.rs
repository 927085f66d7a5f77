// scanmotion_node/src/config.rs

use crate::error::NodeError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use scanmotion_core::calibration::CalibrationLimits;
use scanmotion_core::config::BankArgument;
use scanmotion_core::tf_buffer::DEFAULT_CACHE_SECONDS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment overrides, e.g. `SCANMOTION_BANK__EMA_ALPHA=0.5`.
pub const ENV_PREFIX: &str = "SCANMOTION_";

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # NodeConfig
/// Everything the node reads at startup. Built from compiled defaults, then
/// the TOML file, then `SCANMOTION_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    pub ingress: IngressConfig,
    /// Template for every bank the node creates.
    pub bank: BankArgument,
    pub tf: TfConfig,
    pub simulation: SimulationConfig,
}

impl NodeConfig {
    /// The layered configuration sources for `path`.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(NodeConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads and merges the configuration. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, NodeError> {
        Ok(Self::figment(path).extract()?)
    }

    /// The merged configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        Ok(toml::to_string(self)?)
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the sections of scanmotion.toml.
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngressConfig {
    /// Name of the input stream, used in logs.
    pub subscribe_topic: String,
    /// Batches read ahead from the scan source.
    pub subscribe_buffer_size: usize,
    /// Target window length in seconds. Non-zero enables the rate probe,
    /// which then overrides `bank.nr_scans_in_bank`.
    pub optimize_nr_scans_in_bank: f64,
    pub hz_calculation_max_messages: u32,
    pub hz_calculation_max_seconds: f64,
}

impl Default for IngressConfig {
    fn default() -> Self {
        let limits = CalibrationLimits::default();
        Self {
            subscribe_topic: "scan".to_string(),
            subscribe_buffer_size: 10,
            optimize_nr_scans_in_bank: 0.0,
            hz_calculation_max_messages: limits.max_messages,
            hz_calculation_max_seconds: limits.max_seconds,
        }
    }
}

impl IngressConfig {
    pub fn calibration_limits(&self) -> CalibrationLimits {
        CalibrationLimits {
            max_messages: self.hz_calculation_max_messages,
            max_seconds: self.hz_calculation_max_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TfConfig {
    /// History kept per dynamic transform, in seconds.
    pub cache_seconds: f64,
}

impl Default for TfConfig {
    fn default() -> Self {
        Self {
            cache_seconds: DEFAULT_CACHE_SECONDS,
        }
    }
}

/// The scenario of the built-in simulated scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    pub rate_hz: f64,
    pub duration_seconds: f64,
    /// Number of scanners on the base. More than one gives array mode.
    pub sensors: usize,
    /// Forward offset of every scanner from the base origin.
    pub mount_offset: f64,
    pub fov_deg: f64,
    pub beams: usize,
    pub range_min: f64,
    pub range_max: f64,
    pub range_noise_stddev: f64,
    /// Base velocity in its own frame (m/s).
    pub ego_velocity: [f64; 2],
    pub ego_yaw_rate: f64,
    pub obstacles: Vec<ObstacleConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: Some(42),
            rate_hz: 20.0,
            duration_seconds: 30.0,
            sensors: 1,
            mount_offset: 0.2,
            fov_deg: 180.0,
            beams: 361,
            range_min: 0.05,
            range_max: 10.0,
            range_noise_stddev: 0.005,
            ego_velocity: [0.2, 0.0],
            ego_yaw_rate: 0.0,
            obstacles: vec![
                ObstacleConfig {
                    position: [3.0, 1.5],
                    velocity: [0.0, -0.8],
                    radius: 0.25,
                },
                ObstacleConfig {
                    position: [4.0, -1.5],
                    velocity: [0.0, 0.0],
                    radius: 0.3,
                },
            ],
        }
    }
}

/// A circular obstacle moving at constant velocity in the odometry frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObstacleConfig {
    pub position: [f64; 2],
    #[serde(default)]
    pub velocity: [f64; 2],
    pub radius: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use scanmotion_core::frames::FrameRole;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = NodeConfig::load(Path::new("missing.toml")).unwrap();
            assert_eq!(config, NodeConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "scanmotion.toml",
                r#"
                [ingress]
                optimize_nr_scans_in_bank = 0.5

                [bank]
                ema_alpha = 0.8
                velocity_frame = "base"

                [bank.publish]
                publish_ema = true
                "#,
            )?;
            jail.set_env("SCANMOTION_BANK__EMA_ALPHA", "0.6");

            let config = NodeConfig::load(Path::new("scanmotion.toml")).unwrap();
            assert_eq!(config.ingress.optimize_nr_scans_in_bank, 0.5);
            assert_eq!(config.bank.ema_alpha, 0.6);
            assert_eq!(config.bank.velocity_frame, FrameRole::Base);
            assert!(config.bank.publish.publish_ema);
            // Untouched keys keep their defaults.
            assert_eq!(config.bank.nr_scans_in_bank, 11);
            assert_eq!(config.bank.publish.topic_objects, "moving_objects");
            Ok(())
        });
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("scanmotion.toml", "[bank]\nema_alhpa = 0.5\n")?;
            assert!(NodeConfig::load(Path::new("scanmotion.toml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_dump_round_trips_through_figment() {
        Jail::expect_with(|jail| {
            let dumped = NodeConfig::default().to_toml_string().unwrap();
            jail.create_file("dumped.toml", &dumped)?;
            let reloaded = NodeConfig::load(Path::new("dumped.toml")).unwrap();
            assert_eq!(reloaded, NodeConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_shipped_sample_matches_defaults() {
        let sample = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/scanmotion.toml");
        let parsed: NodeConfig = Figment::new().merge(Toml::file(sample)).extract().unwrap();
        assert_eq!(parsed, NodeConfig::default());
    }

    #[test]
    fn test_calibration_limits_follow_ingress() {
        let ingress = IngressConfig {
            hz_calculation_max_messages: 20,
            hz_calculation_max_seconds: 2.0,
            ..Default::default()
        };
        let limits = ingress.calibration_limits();
        assert_eq!(limits.max_messages, 20);
        assert_eq!(limits.max_seconds, 2.0);
    }
}
