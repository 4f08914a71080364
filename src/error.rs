//! Custom error types for the runtime.
//!
//! The control-plane contract is deliberately silent: malformed writes and
//! invalid copy-out destinations still look successful to the external
//! caller, with only a log line recording the failure. Internally, however,
//! every fallible path returns a typed [`SensorError`] so the engine and the
//! tests can observe exactly what went wrong. The facade is the one place
//! where these results are swallowed.

use crate::types::SensorKind;
use thiserror::Error;

/// Convenience alias for results using the runtime error type.
pub type HubResult<T> = std::result::Result<T, SensorError>;

/// Errors produced by the sensor runtime.
#[derive(Error, Debug)]
pub enum SensorError {
    /// Configuration file or environment could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration loaded but failed semantic validation.
    #[error("Configuration validation error: {0}")]
    Validation(String),

    /// A control value could not be parsed.
    #[error("Malformed '{attribute}' value: {value:?}")]
    Malformed {
        /// Control attribute the write targeted.
        attribute: &'static str,
        /// The rejected input text.
        value: String,
    },

    /// Backend call failed (sampling, batch negotiation, flush).
    #[error("Backend error for {kind}: {source}")]
    Backend {
        /// Sensor the call was issued for.
        kind: SensorKind,
        /// Underlying backend failure.
        #[source]
        source: anyhow::Error,
    },

    /// Sensor was never registered (probe failed at init) or is unknown.
    #[error("Sensor {0} is not registered")]
    NotRegistered(SensorKind),

    /// Copy-out destination buffer is empty; nothing was written.
    #[error("Empty copy-out destination for {0}")]
    EmptyDestination(SensorKind),
}

impl SensorError {
    pub(crate) fn backend(kind: SensorKind, source: anyhow::Error) -> Self {
        SensorError::Backend { kind, source }
    }
}
