//! Tracing infrastructure.
//!
//! Structured, async-aware logging for the hub, built on `tracing` and
//! `tracing-subscriber`:
//! - Structured events with per-sensor fields
//! - Multiple output formats (pretty, compact, JSON)
//! - Environment-based filtering via `RUST_LOG`
//! - Integration with the configuration system
//!
//! # Example
//! ```no_run
//! use sensord::{config::HubConfig, telemetry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HubConfig::load()?;
//! telemetry::init_from_config(&config)?;
//! tracing::info!("hub starting");
//! # Ok(())
//! # }
//! ```

use crate::config::HubConfig;
use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Output format for tracing.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Pretty-printed format with colors (for development).
    Pretty,
    /// Compact format without colors (for production).
    Compact,
    /// JSON format for log aggregation.
    Json,
}

/// Tracing configuration options.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Level,
    /// Output format.
    pub format: OutputFormat,
    /// Whether to include thread names.
    pub with_thread_names: bool,
    /// Whether to enable ANSI colors (Pretty format only).
    pub with_ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: OutputFormat::Compact,
            with_thread_names: true,
            with_ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create telemetry config from hub configuration.
    pub fn from_hub_config(config: &HubConfig) -> Result<Self, String> {
        let level = parse_log_level(&config.application.log_level)?;
        Ok(Self {
            level,
            ..Default::default()
        })
    }

    /// Set output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable or disable ANSI colors.
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.with_ansi = enabled;
        self
    }
}

/// Initialize tracing from hub configuration.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_from_config(config: &HubConfig) -> Result<(), String> {
    let telemetry = TelemetryConfig::from_hub_config(config)?;
    init(telemetry)
}

/// Initialize the global subscriber with explicit options.
///
/// Fails if a global subscriber is already installed.
pub fn init(config: TelemetryConfig) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string().to_lowercase()));

    let layer = match config.format {
        OutputFormat::Pretty => fmt::layer()
            .pretty()
            .with_thread_names(config.with_thread_names)
            .with_ansi(config.with_ansi)
            .boxed(),
        OutputFormat::Compact => fmt::layer()
            .compact()
            .with_thread_names(config.with_thread_names)
            .with_ansi(false)
            .boxed(),
        OutputFormat::Json => fmt::layer().json().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| format!("failed to install tracing subscriber: {e}"))
}

fn parse_log_level(level: &str) -> Result<Level, String> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(format!("unknown log level '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_levels() {
        assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
        assert_eq!(parse_log_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("warn").unwrap(), Level::WARN);
        assert_eq!(parse_log_level("error").unwrap(), Level::ERROR);
        assert!(parse_log_level("loud").is_err());
    }

    #[test]
    fn telemetry_config_tracks_hub_log_level() {
        let mut hub = crate::config::HubConfig::default();
        hub.application.log_level = "debug".into();
        let telemetry = TelemetryConfig::from_hub_config(&hub).unwrap();
        assert_eq!(telemetry.level, Level::DEBUG);
    }
}
