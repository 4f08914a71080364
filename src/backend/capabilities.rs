//! Backend capability traits.
//!
//! Instead of one monolithic driver trait, the collaborators are split into
//! focused capabilities the runtime composes:
//!
//! - A fusion backend implements `SampleSource + BatchBackend`
//! - A consumer-delivery path implements `EventReporter`
//!
//! Each capability trait:
//! - Is async (uses `#[async_trait]`)
//! - Is thread-safe (requires `Send + Sync`)
//! - Uses `anyhow::Result` for errors
//! - Focuses on one thing
//!
//! Backend calls are assumed bounded and non-blocking from the runtime's
//! perspective; if a backend can stall, that bound is the backend's contract.

use crate::types::{BatchConfig, BatchData, BatchReportKind, SensorKind, SensorSample};
use anyhow::Result;
use async_trait::async_trait;

/// Capability: on-demand sample production.
///
/// # Contract
/// - `probe` is called once per sensor at subsystem init; an `Err` leaves
///   that sensor unregistered and never started.
/// - `read_sample` returns a decoded sample whose variant matches `kind`.
/// - `reset_in_progress` is a cheap, non-blocking status check; while it
///   returns `true` the scheduler skips sampling but keeps rescheduling.
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Check that the backend can serve this sensor kind.
    ///
    /// # Returns
    /// - Ok(()) if the sensor can be registered
    /// - Err if the backend cannot provide this sensor (fatal for the
    ///   sensor's availability; the hub does not retry)
    async fn probe(&self, kind: SensorKind) -> Result<()>;

    /// Fetch one decoded sample.
    ///
    /// # Returns
    /// - Ok(sample) on success; the variant matches `kind`
    /// - Err on backend failure (the tick is skipped, not propagated)
    async fn read_sample(&self, kind: SensorKind) -> Result<SensorSample>;

    /// Whether the backend is mid-reset.
    ///
    /// Ticks that land during a reset skip sampling but still re-arm.
    fn reset_in_progress(&self) -> bool;
}

/// Capability: batch negotiation and draining.
///
/// # Contract
/// - `configure_batch` installs batch parameters; it does not start or stop
///   sampling. Failures are logged by the caller, not surfaced externally.
/// - `flush` immediately drains whatever the backend has accumulated,
///   independent of poll interval or batch timeout. A flush with nothing
///   accumulated returns an empty batch (`record_count == 0`) rather than
///   blocking or erroring.
#[async_trait]
pub trait BatchBackend: Send + Sync {
    /// Negotiate batch parameters with the backend.
    async fn configure_batch(&self, kind: SensorKind, config: BatchConfig) -> Result<()>;

    /// Drain accumulated data now.
    async fn flush(&self, kind: SensorKind) -> Result<BatchData>;
}

/// Combined trait for fusion backends, for trait objects.
///
/// Implement [`SampleSource`] and [`BatchBackend`]; this comes for free via
/// the blanket impl.
pub trait FusionBackend: SampleSource + BatchBackend {}

impl<T: SampleSource + BatchBackend> FusionBackend for T {}

/// Capability: delivery of samples and batches to the consumer.
///
/// # Contract
/// - `report_batch` is invoked under the subsystem-wide batch lock, so
///   implementations must be bounded; queue and return, do not wait on the
///   consumer.
/// - Delivery failures are logged by the runtime and never break scheduling.
#[async_trait]
pub trait EventReporter: Send + Sync {
    /// Deliver one polled sample.
    async fn report_sample(&self, kind: SensorKind, sample: SensorSample) -> Result<()>;

    /// Deliver a completed batch (or a timestamp-only marker).
    async fn report_batch(
        &self,
        kind: SensorKind,
        report: BatchReportKind,
        data: &BatchData,
    ) -> Result<()>;
}
