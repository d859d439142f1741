//! Runner configuration
//!
//! Loaded from a JSON file; every field has a default so a partial file (or
//! no file at all) is enough to start.

use std::path::Path;
use std::time::Duration;

use hub_sim::SimHubConfig;
use hublink_core::ConnectionString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable overriding the configured connection string
pub const CONNECTION_STRING_ENV: &str = "HUBLINK_CONNECTION_STRING";

/// Largest accepted per-reading sensor step
pub const MAX_SENSOR_STEP: f64 = 1e6;

/// Sensor random-walk parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub initial_temperature: f64,
    pub initial_humidity: f64,
    /// Largest change per reading, in degrees
    pub temperature_step: f64,
    /// Largest change per reading, in percent
    pub humidity_step: f64,
    /// Chance of a button press per reading (0.0 to 1.0)
    pub button_probability: f64,
}

impl SensorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("sensors.initial_temperature", self.initial_temperature),
            ("sensors.initial_humidity", self.initial_humidity),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
        }
        for (name, step) in [
            ("sensors.temperature_step", self.temperature_step),
            ("sensors.humidity_step", self.humidity_step),
        ] {
            if !(0.0..=MAX_SENSOR_STEP).contains(&step) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 0 and {}, got {}",
                    name, MAX_SENSOR_STEP, step
                )));
            }
        }
        Ok(())
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 21.0,
            initial_humidity: 45.0,
            temperature_step: 0.5,
            humidity_step: 1.0,
            button_probability: 0.05,
        }
    }
}

/// LED states the cloud side keeps the device in
///
/// File format: `{ "led1": true, "led2": false }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectedLeds {
    pub led1: bool,
    pub led2: bool,
}

impl Default for ExpectedLeds {
    fn default() -> Self {
        Self {
            led1: true,
            led2: false,
        }
    }
}

impl ExpectedLeds {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Pairs of LED id and expected state
    pub fn by_led(&self) -> [(i32, bool); 2] {
        [(1, self.led1), (2, self.led2)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub connection_string: String,
    /// Telemetry period (ms)
    pub send_interval_ms: u64,
    /// Work pump period (ms)
    pub pump_interval_ms: u64,
    /// Stop after this many seconds; run until interrupted if unset
    pub duration_secs: Option<u64>,
    /// Seed for sensors and command feed, for reproducible runs
    pub seed: Option<u64>,
    /// Chance of a random cloud command per pump tick (0.0 to 1.0)
    pub command_probability: f64,
    /// LED states to enforce from reported telemetry; no reconciliation if unset
    pub expected_leds: Option<ExpectedLeds>,
    /// File re-read for expected LED states every `expected_refresh_ms`
    pub expected_states_file: Option<String>,
    pub expected_refresh_ms: u64,
    pub sensors: SensorConfig,
    pub hub: SimHubConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            connection_string: "HostName=sim.hublink.local;DeviceId=thing-1;SharedAccessKey=c2ltdWxhdGVk"
                .to_string(),
            send_interval_ms: 5000,
            pump_interval_ms: 100,
            duration_secs: None,
            seed: None,
            command_probability: 0.0,
            expected_leds: Some(ExpectedLeds::default()),
            expected_states_file: None,
            expected_refresh_ms: 5000,
            sensors: SensorConfig::default(),
            hub: SimHubConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply the connection string from the environment, if set
    pub fn with_env_overrides(self) -> Self {
        self.with_connection_override(std::env::var(CONNECTION_STRING_ENV).ok())
    }

    /// Replace the connection string when `value` is a non-empty string
    pub fn with_connection_override(mut self, value: Option<String>) -> Self {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.connection_string = value;
        }
        self
    }

    /// Check the configuration can drive a run
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConnectionString::parse(&self.connection_string)
            .map_err(|e| ConfigError::Invalid(format!("connection_string: {}", e)))?;

        if self.send_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "send_interval_ms must be positive".to_string(),
            ));
        }
        if self.pump_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "pump_interval_ms must be positive".to_string(),
            ));
        }
        if self.expected_refresh_ms == 0 {
            return Err(ConfigError::Invalid(
                "expected_refresh_ms must be positive".to_string(),
            ));
        }
        for (name, p) in [
            ("command_probability", self.command_probability),
            ("sensors.button_probability", self.sensors.button_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 0 and 1, got {}",
                    name, p
                )));
            }
        }
        self.sensors.validate()
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }

    pub fn pump_interval(&self) -> Duration {
        Duration::from_millis(self.pump_interval_ms)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }

    pub fn expected_refresh(&self) -> Duration {
        Duration::from_millis(self.expected_refresh_ms)
    }
}
