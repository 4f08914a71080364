//! Per-sensor runtime engine.
//!
//! [`SensorRuntime`] is the one generic engine the redesign calls for: it
//! wires a [`PollScheduler`], the shared [`BatchLedger`] and the backend
//! capability traits together for a single [`SensorKind`]. There is no
//! per-sensor code; everything kind-specific is the `kind` value itself and
//! the sample variant the backend returns.

use crate::backend::{EventReporter, FusionBackend};
use crate::batch::BatchLedger;
use crate::error::{HubResult, SensorError};
use crate::scheduler::PollScheduler;
use crate::types::{BatchConfig, BatchData, BatchReportKind, BatchStatus, SensorKind, SensorSample};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Runtime state and operations for one registered sensor.
///
/// Exactly one instance exists per kind for the subsystem lifetime; the hub
/// creates it at init and drops it at teardown.
pub struct SensorRuntime {
    kind: SensorKind,
    backend: Arc<dyn FusionBackend>,
    reporter: Arc<dyn EventReporter>,
    scheduler: PollScheduler,
    ledger: Arc<BatchLedger>,
    last_sample: RwLock<SensorSample>,
    /// Opaque diagnostic passthrough for the `status` attribute.
    status: AtomicI32,
    /// Handed to the tick loop so a dropped runtime (hub teardown) ends the
    /// loop even without an explicit disable.
    weak_self: Weak<SensorRuntime>,
}

impl SensorRuntime {
    /// Create the runtime for one sensor. The scheduler starts idle.
    pub fn new(
        kind: SensorKind,
        default_delay_ms: i32,
        backend: Arc<dyn FusionBackend>,
        reporter: Arc<dyn EventReporter>,
        ledger: Arc<BatchLedger>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            kind,
            backend,
            reporter,
            scheduler: PollScheduler::new(kind, default_delay_ms),
            ledger,
            last_sample: RwLock::new(SensorSample::zeroed(kind)),
            status: AtomicI32::new(0),
            weak_self: weak.clone(),
        })
    }

    /// Which sensor this runtime drives.
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Whether sampling is active.
    pub fn is_enabled(&self) -> bool {
        self.scheduler.is_enabled()
    }

    /// Current poll interval in milliseconds.
    pub fn delay_ms(&self) -> i32 {
        self.scheduler.delay_ms()
    }

    /// Update the poll interval; takes effect at the next re-arm decision.
    pub fn set_delay_ms(&self, delay_ms: i32) {
        self.scheduler.set_delay_ms(delay_ms);
    }

    /// Opaque diagnostic value.
    pub fn status(&self) -> i32 {
        self.status.load(Ordering::SeqCst)
    }

    /// Set the opaque diagnostic value.
    pub fn set_status(&self, status: i32) {
        self.status.store(status, Ordering::SeqCst);
    }

    /// Start or stop sampling.
    ///
    /// Enabling while already enabled re-arms from scratch. Disabling
    /// cancels a pending tick; one already in flight completes but does not
    /// reschedule.
    pub fn enable(&self, on: bool) {
        if !on {
            self.scheduler.disable();
            return;
        }
        let weak = self.weak_self.clone();
        self.scheduler.enable(move || {
            let weak = weak.clone();
            async move {
                if let Some(runtime) = weak.upgrade() {
                    runtime.tick().await;
                }
            }
        });
    }

    /// One scheduled poll: fetch a sample and deliver it.
    ///
    /// Skipped (without being an error) while the backend is mid-reset or
    /// when the read fails; rescheduling is the scheduler's business either
    /// way.
    async fn tick(&self) {
        if self.backend.reset_in_progress() {
            debug!(sensor = %self.kind, "tick skipped: backend reset in progress");
            return;
        }

        let sample = match self.backend.read_sample(self.kind).await {
            Ok(sample) => sample,
            Err(e) => {
                warn!(sensor = %self.kind, error = %e, "tick skipped: sample read failed");
                return;
            }
        };

        *self.last_sample.write().await = sample;

        // The delivered-samples diagnostic counts deliveries, not attempts.
        match self.reporter.report_sample(self.kind, sample).await {
            Ok(()) => self.ledger.note_sample_reported(self.kind).await,
            Err(e) => {
                warn!(sensor = %self.kind, error = %e, "sample delivery failed");
            }
        }
    }

    /// Most recent decoded value.
    ///
    /// While enabled this refreshes from the backend first (the read-back
    /// path updates the cache); a failed refresh or a disabled sensor
    /// returns the cached value unchanged.
    pub async fn last_sample(&self) -> SensorSample {
        if self.is_enabled() {
            match self.backend.read_sample(self.kind).await {
                Ok(sample) => *self.last_sample.write().await = sample,
                Err(e) => {
                    debug!(sensor = %self.kind, error = %e, "read-back refresh failed, serving cached sample");
                }
            }
        }
        *self.last_sample.read().await
    }

    /// Negotiate batch parameters with the backend.
    ///
    /// Does not start or stop sampling. A failed negotiation is logged and
    /// surfaced only as the internal error; the control plane still reports
    /// success.
    pub async fn configure_batch(&self, config: BatchConfig) -> HubResult<()> {
        debug!(
            sensor = %self.kind,
            flags = config.flags,
            period_ns = config.period_ns,
            timeout_ms = config.timeout_ms,
            "configuring batch"
        );
        self.backend
            .configure_batch(self.kind, config)
            .await
            .map_err(|e| {
                warn!(sensor = %self.kind, error = %e, "batch negotiation failed");
                SensorError::backend(self.kind, e)
            })
    }

    /// Batch descriptor fields plus the pending timestamp (read-and-clear).
    pub async fn read_batch_status(&self) -> BatchStatus {
        self.ledger.read_status(self.kind).await
    }

    /// Bounded copy of the latest batch payload into a caller-owned buffer.
    pub async fn copy_batch_out(&self, dest: &mut [u8]) -> HubResult<usize> {
        self.ledger.copy_out(self.kind, dest).await
    }

    /// Drain the backend now, independent of poll interval and batch
    /// timeout.
    ///
    /// An empty drain still produces a delivery with `record_count == 0`.
    pub async fn flush(&self) -> HubResult<()> {
        let data = self
            .backend
            .flush(self.kind)
            .await
            .map_err(|e| SensorError::backend(self.kind, e))?;
        self.accept_batch(BatchReportKind::FlushComplete, data).await
    }

    /// Install a completed batch from the backend delivery path and forward
    /// it to the consumer.
    pub async fn accept_batch(&self, report: BatchReportKind, data: BatchData) -> HubResult<()> {
        self.ledger
            .accept(self.kind, report, data, self.reporter.as_ref())
            .await
    }

    /// Record the timestamp of the latest batch-relevant event
    /// (last-write-wins).
    pub async fn record_timestamp(&self, timestamp: u32) {
        self.ledger.record_timestamp(self.kind, timestamp).await;
    }

    /// Re-emit the stored batch descriptor as a timestamp-only marker.
    pub async fn timestamp_report(&self) -> HubResult<()> {
        self.ledger
            .timestamp_report(self.kind, self.reporter.as_ref())
            .await
    }
}
