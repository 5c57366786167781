//! Application configuration.
//!
//! Loaded from `config.toml` in the platform data directory; a missing file
//! means defaults.

use crate::sensors::ant::tracker::DEFAULT_EVENT_CAPACITY;
use crate::sensors::ant::EMITTER_TRANSMISSION_TYPE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Virtual power meter settings
    pub emitter: EmitterSettings,
    /// Receive-side settings
    pub tracker: TrackerSettings,
    /// Simulated rider driving the virtual power meter
    pub simulation: SimulationSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            emitter: EmitterSettings::default(),
            tracker: TrackerSettings::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

/// Identity of the virtual power meter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterSettings {
    /// ANT+ device number
    pub device_id: u16,
    /// Transmission type of the broadcast channel
    pub transmission_type: u8,
    /// Hardware revision (page 80)
    pub hw_revision: u8,
    /// Manufacturer ID (page 80), 0x00FF is the development ID
    pub manufacturer_id: u16,
    /// Model number (page 80)
    pub model_number: u16,
    /// Software revision (page 81)
    pub sw_revision: f32,
    /// Serial number (page 81)
    pub serial_number: u32,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            device_id: 1337,
            transmission_type: EMITTER_TRANSMISSION_TYPE,
            hw_revision: 0,
            manufacturer_id: 0x00FF,
            model_number: 0,
            sw_revision: 1.1,
            serial_number: 0,
        }
    }
}

/// Receive-side settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Snapshots buffered per subscriber
    pub event_capacity: usize,
    /// Forget scanned sensors silent for this long; `None` keeps them
    pub stale_after_secs: Option<u64>,
}

impl TrackerSettings {
    pub fn stale_after(&self) -> Option<Duration> {
        self.stale_after_secs.map(Duration::from_secs)
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            stale_after_secs: None,
        }
    }
}

/// Simulated rider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Interval between power updates in milliseconds
    pub update_interval_ms: u64,
    /// Peak simulated power in watts
    pub max_power: f64,
    /// Simulated cadence in RPM, omitted from pages when unset
    pub cadence: Option<f64>,
}

impl SimulationSettings {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms.max(1))
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            update_interval_ms: 250,
            max_power: 300.0,
            cadence: None,
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "antpower", "AntPower")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = load_config_from(&get_config_path())?;
    config.data_dir = get_data_dir();
    Ok(config)
}

/// Load application configuration from `path`, defaults if it is missing.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save application configuration to `path`.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
