//! Dashboard configuration loaded from TOML
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration that matches the built-in constants.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "PUMPGUARD_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "pumpguard.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a dashboard deployment.
///
/// Load with `DashboardConfig::load()` which searches:
/// 1. `$PUMPGUARD_CONFIG`
/// 2. `./pumpguard.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl DashboardConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded dashboard config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded dashboard config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check every value, collecting all violations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.server.addr.trim().is_empty() {
            errors.push("server.addr must not be empty".to_string());
        }
        if !self.simulation.interval_secs.is_finite() || self.simulation.interval_secs <= 0.0 {
            errors.push(format!(
                "simulation.interval_secs must be > 0 (got {})",
                self.simulation.interval_secs
            ));
        }
        if !self.inference.timeout_secs.is_finite() || self.inference.timeout_secs <= 0.0 {
            errors.push(format!(
                "inference.timeout_secs must be > 0 (got {})",
                self.inference.timeout_secs
            ));
        }
        if self.inference.max_forecast_steps == 0 {
            errors.push("inference.max_forecast_steps must be > 0".to_string());
        }
        if !self.analytics.anomaly_z_threshold.is_finite() || self.analytics.anomaly_z_threshold <= 0.0 {
            errors.push(format!(
                "analytics.anomaly_z_threshold must be > 0 (got {})",
                self.analytics.anomaly_z_threshold
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Overridden by `PUMPGUARD_SERVER_ADDR` or `--addr`.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    "0.0.0.0:5000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

/// Historical data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV with the 12 channels and 3 fault flags
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("data/Cleared_df0.csv")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

/// Model artifact locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_forecast_dir")]
    pub forecast_dir: PathBuf,

    #[serde(default = "default_breakdown_dir")]
    pub breakdown_dir: PathBuf,
}

fn default_forecast_dir() -> PathBuf {
    PathBuf::from("models/Forecast")
}
fn default_breakdown_dir() -> PathBuf {
    PathBuf::from("models/Breakdown")
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            forecast_dir: default_forecast_dir(),
            breakdown_dir: default_breakdown_dir(),
        }
    }
}

/// Replay clock settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seconds between simulated observations
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,

    /// Number of rows visible at startup (clamped to the dataset size)
    #[serde(default = "default_start_index")]
    pub start_index: usize,

    /// Start the replay as soon as the server is up
    #[serde(default)]
    pub autostart: bool,
}

fn default_interval_secs() -> f64 {
    defaults::SIMULATION_INTERVAL_SECS
}
fn default_start_index() -> usize {
    defaults::SIMULATION_START_INDEX
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            start_index: default_start_index(),
            autostart: false,
        }
    }
}

impl SimulationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs)
    }
}

/// Model inference limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Upper bound on a single forecast or breakdown computation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// Cap on the `steps` query parameter of `/api/predictions`
    #[serde(default = "default_max_forecast_steps")]
    pub max_forecast_steps: usize,
}

fn default_timeout_secs() -> f64 {
    30.0
}
fn default_max_forecast_steps() -> usize {
    1_000
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_forecast_steps: default_max_forecast_steps(),
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

/// Statistics tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Default z-score threshold for `/api/anomalies`
    #[serde(default = "default_anomaly_z")]
    pub anomaly_z_threshold: f64,
}

fn default_anomaly_z() -> f64 {
    defaults::ANOMALY_Z_THRESHOLD
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            anomaly_z_threshold: default_anomaly_z(),
        }
    }
}
