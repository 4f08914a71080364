//! # sensord
//!
//! A virtual-sensor runtime: derived sensors (orientation, magnetic rotation
//! vector) exposed through a uniform control/data surface, polling a
//! sensor-fusion backend on a per-sensor cadence and buffering results for
//! batched delivery.
//!
//! ## Crate Structure
//!
//! - **`backend`**: Capability traits for the external collaborators (the
//!   fusion backend that produces samples and the reporter that delivers
//!   them), plus mock implementations for tests and the demo binary.
//! - **`batch`**: The batch ledger — accumulated batch state for every
//!   sensor behind one subsystem-wide lock, with read-and-clear timestamp
//!   tracking.
//! - **`config`**: Figment-based configuration (TOML file + environment
//!   overrides) with post-load validation.
//! - **`control`**: The textual control facade (`enable`, `delay`, `status`,
//!   `data`, `batch`, `batch_data`, `flush`) with its silent-failure
//!   contract.
//! - **`engine`**: `SensorRuntime`, the single generic per-sensor engine
//!   wiring scheduler, ledger and backend together.
//! - **`error`**: `SensorError` and the `HubResult` alias.
//! - **`hub`**: Subsystem init/teardown and sensor registration.
//! - **`scheduler`**: The self-rearming poll timer and its state machine.
//! - **`telemetry`**: Tracing subscriber setup.
//! - **`types`**: Sensor kinds, samples, batch descriptors and wire forms.

pub mod backend;
pub mod batch;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod hub;
pub mod scheduler;
pub mod telemetry;
pub mod types;

pub use error::{HubResult, SensorError};
pub use types::{BatchConfig, BatchData, BatchReportKind, BatchStatus, SensorKind, SensorSample};
