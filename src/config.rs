//! Configuration system using Figment.
//!
//! Strongly-typed configuration for the hub, loaded from (in order of
//! increasing precedence):
//! 1. Built-in defaults
//! 2. A TOML file (`sensord.toml` by default)
//! 3. Environment variables prefixed with `SENSORD_`
//!
//! # Example
//! ```no_run
//! use sensord::config::HubConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HubConfig::load()?;
//! println!("log level: {}", config.application.log_level);
//! # Ok(())
//! # }
//! ```

use crate::types::SensorKind;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default poll cadence, matching the sensors' boot-time delay.
pub const DEFAULT_DELAY_MS: i32 = 30;

/// Top-level hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Application settings.
    pub application: ApplicationConfig,
    /// Per-sensor definitions.
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorDefinition>,
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name.
    pub name: String,
    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

/// One sensor definition in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorDefinition {
    /// Which sensor this entry configures.
    pub kind: SensorKind,
    /// Whether the sensor starts sampling at boot.
    #[serde(default)]
    pub enabled: bool,
    /// Poll cadence used when the sensor is enabled without an explicit
    /// delay write. Must be positive; a non-positive delay would put the
    /// scheduler straight into the halted state.
    #[serde(default = "default_delay")]
    pub default_delay_ms: i32,
}

fn default_delay() -> i32 {
    DEFAULT_DELAY_MS
}

fn default_sensors() -> Vec<SensorDefinition> {
    SensorKind::ALL
        .into_iter()
        .map(|kind| SensorDefinition {
            kind,
            enabled: false,
            default_delay_ms: DEFAULT_DELAY_MS,
        })
        .collect()
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig {
                name: "sensord".to_string(),
                log_level: "info".to_string(),
            },
            sensors: default_sensors(),
        }
    }
}

impl HubConfig {
    /// Load configuration from `sensord.toml` and environment variables.
    ///
    /// Environment variables override file values with prefix `SENSORD_`,
    /// using `__` as the section separator.
    /// Example: `SENSORD_APPLICATION__LOG_LEVEL=debug`.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from("sensord.toml")
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file is fine; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(HubConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SENSORD_").split("__"))
            .extract()
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        let mut kinds = std::collections::HashSet::new();
        for sensor in &self.sensors {
            if !kinds.insert(sensor.kind) {
                return Err(format!("Duplicate sensor definition: {}", sensor.kind));
            }
            if sensor.default_delay_ms <= 0 {
                return Err(format!(
                    "Invalid default_delay_ms {} for {}. Must be positive",
                    sensor.default_delay_ms, sensor.kind
                ));
            }
        }

        Ok(())
    }

    /// Look up the definition for one sensor kind, if present.
    pub fn sensor(&self, kind: SensorKind) -> Option<&SensorDefinition> {
        self.sensors.iter().find(|s| s.kind == kind)
    }
}
