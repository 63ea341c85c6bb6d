//! ---
//! sky_section: "01-core-functionality"
//! sky_subsection: "module"
//! sky_type: "source"
//! sky_scope: "code"
//! sky_description: "Shared primitives and utilities for the SkyFeed runtime."
//! sky_version: "v0.1.0"
//! sky_owner: "tbd"
//! ---
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logging::LogFormat;

fn default_trajectory_path() -> PathBuf {
    PathBuf::from("data/trajectory.json")
}

fn default_max_batch() -> usize {
    3
}

fn default_delay_probability() -> f64 {
    0.3
}

fn default_release_probability() -> f64 {
    0.4
}

fn default_max_release() -> usize {
    2
}

fn default_min_step_secs() -> f64 {
    2.0
}

fn default_max_step_secs() -> f64 {
    5.0
}

fn default_noise_amplitude() -> f64 {
    50.0
}

fn default_min_altitude() -> f64 {
    100.0
}

fn default_max_altitude() -> f64 {
    5000.0
}

fn default_api_enabled() -> bool {
    true
}

fn default_api_listen() -> SocketAddr {
    "0.0.0.0:5000".parse().expect("valid default api address")
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Primary configuration object for the SkyFeed runtime.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "SKYFEED_CONFIG";

    /// Load configuration from disk, respecting the `SKYFEED_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Settings for the trajectory telemetry engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Path to the GeoJSON-like trajectory dataset.
    #[serde(default = "default_trajectory_path")]
    pub trajectory_path: PathBuf,
    /// Fixed RNG seed. When absent the daemon seeds from entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Upper bound of the per-call batch size draw.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
    /// Chance for a freshly generated point to be withheld.
    #[serde(default = "default_delay_probability")]
    pub delay_probability: f64,
    /// Chance for a call to drain withheld points.
    #[serde(default = "default_release_probability")]
    pub release_probability: f64,
    /// Upper bound of withheld points released per call.
    #[serde(default = "default_max_release")]
    pub max_release: usize,
    /// Lower bound of the synthetic clock step, in seconds.
    #[serde(default = "default_min_step_secs")]
    pub min_step_secs: f64,
    /// Upper bound of the synthetic clock step, in seconds (exclusive).
    #[serde(default = "default_max_step_secs")]
    pub max_step_secs: f64,
    /// Half-width of the uniform altitude noise band, in metres.
    #[serde(default = "default_noise_amplitude")]
    pub noise_amplitude: f64,
    #[serde(default = "default_min_altitude")]
    pub min_altitude: f64,
    #[serde(default = "default_max_altitude")]
    pub max_altitude: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trajectory_path: default_trajectory_path(),
            random_seed: None,
            max_batch: default_max_batch(),
            delay_probability: default_delay_probability(),
            release_probability: default_release_probability(),
            max_release: default_max_release(),
            min_step_secs: default_min_step_secs(),
            max_step_secs: default_max_step_secs(),
            noise_amplitude: default_noise_amplitude(),
            min_altitude: default_min_altitude(),
            max_altitude: default_max_altitude(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_batch == 0 {
            return Err(anyhow!("simulation.max_batch must be at least 1"));
        }
        if self.max_release == 0 {
            return Err(anyhow!("simulation.max_release must be at least 1"));
        }
        for (name, value) in [
            ("simulation.delay_probability", self.delay_probability),
            ("simulation.release_probability", self.release_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must lie within [0, 1], got {}", name, value));
            }
        }
        if self.min_step_secs <= 0.0 || self.min_step_secs >= self.max_step_secs {
            return Err(anyhow!(
                "simulation clock step range [{}, {}) is not a positive ordered interval",
                self.min_step_secs,
                self.max_step_secs
            ));
        }
        if self.noise_amplitude < 0.0 {
            return Err(anyhow!("simulation.noise_amplitude must not be negative"));
        }
        if self.min_altitude >= self.max_altitude {
            return Err(anyhow!(
                "simulation altitude band [{}, {}] is not ordered",
                self.min_altitude,
                self.max_altitude
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,
    #[serde(default = "default_api_listen")]
    pub listen: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            listen: default_api_listen(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Toggles the `/metrics` scrape route on the API server.
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_yields_defaults() {
        let config: AppConfig = "".parse().expect("defaults must validate");
        assert_eq!(config.simulation.max_batch, 3);
        assert_eq!(config.simulation.delay_probability, 0.3);
        assert_eq!(config.simulation.release_probability, 0.4);
        assert_eq!(config.simulation.min_altitude, 100.0);
        assert_eq!(config.simulation.max_altitude, 5000.0);
        assert!(config.api.enabled);
        assert_eq!(config.api.listen.port(), 5000);
    }

    #[test]
    fn partial_simulation_section_is_merged_with_defaults() {
        let config: AppConfig = r#"
            [simulation]
            random_seed = 7
            max_batch = 5
        "#
        .parse()
        .expect("partial config must parse");
        assert_eq!(config.simulation.random_seed, Some(7));
        assert_eq!(config.simulation.max_batch, 5);
        assert_eq!(config.simulation.max_release, 2);
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let result = r#"
            [simulation]
            delay_probability = 1.5
        "#
        .parse::<AppConfig>();
        assert!(result.is_err());
    }

    #[test]
    fn inverted_clock_step_range_is_rejected() {
        let result = r#"
            [simulation]
            min_step_secs = 6.0
            max_step_secs = 5.0
        "#
        .parse::<AppConfig>();
        assert!(result.is_err());
    }

    #[test]
    fn inverted_altitude_band_is_rejected() {
        let result = r#"
            [simulation]
            min_altitude = 6000.0
        "#
        .parse::<AppConfig>();
        assert!(result.is_err());
    }

    #[test]
    fn load_with_source_reports_effective_path() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "[api]\nlisten = \"127.0.0.1:9100\"").expect("write config");
        file.flush().expect("flush config");
        let loaded =
            AppConfig::load_with_source(&[file.path().to_path_buf()]).expect("load config");
        assert_eq!(loaded.source, file.path());
        assert_eq!(loaded.config.api.listen.port(), 9100);
    }

    #[test]
    fn missing_candidates_produce_error() {
        let result = AppConfig::load(&[PathBuf::from("does/not/exist.toml")]);
        assert!(result.is_err());
    }
}
