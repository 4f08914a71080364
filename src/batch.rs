//! Batch ledger: accumulated batch state for every sensor, behind one lock.
//!
//! All batch state across all sensor kinds lives under a single async mutex.
//! This is coarse-grained on purpose: consumers may rely on read-then-clear
//! atomicity spanning sensors, so the guarantee is "at most one batch
//! operation in flight across the whole subsystem at a time". The known
//! contention cost is an accepted trade-off, documented here rather than
//! relaxed.
//!
//! The lock is held across the reporter forward in [`BatchLedger::accept`];
//! reporter implementations are required to be bounded (queue and return),
//! so the critical section stays short.

use crate::backend::EventReporter;
use crate::error::{HubResult, SensorError};
use crate::types::{BatchData, BatchReportKind, BatchStatus, SensorKind};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Pending-timestamp cell for one sensor.
///
/// Single writer per tick, last-write-wins: a new event arriving before the
/// old timestamp is read silently discards the old one. `0` means "no unread
/// timestamp".
#[derive(Debug, Default)]
pub struct TimestampTracker {
    pending: u32,
}

impl TimestampTracker {
    /// Overwrite the pending timestamp unconditionally.
    pub fn record(&mut self, timestamp: u32) {
        self.pending = timestamp;
    }

    /// Read and clear. Not idempotent: the second of two back-to-back takes
    /// returns 0.
    pub fn take(&mut self) -> u32 {
        std::mem::take(&mut self.pending)
    }
}

#[derive(Debug, Default)]
struct BatchSlot {
    data: BatchData,
    timestamp: TimestampTracker,
    reported_count: u32,
}

fn slot_index(kind: SensorKind) -> usize {
    match kind {
        SensorKind::Orientation => 0,
        SensorKind::MagRotationVector => 1,
    }
}

/// Batch state for the whole subsystem.
///
/// One slot per sensor kind, created at init and living until teardown.
pub struct BatchLedger {
    table: Mutex<[BatchSlot; 2]>,
}

impl BatchLedger {
    /// Create the ledger with an empty slot per sensor kind.
    pub fn new() -> Self {
        Self {
            table: Mutex::new([BatchSlot::default(), BatchSlot::default()]),
        }
    }

    /// Install a completed batch and forward it to the consumer.
    ///
    /// The stored descriptor is replaced before delivery; the forward happens
    /// under the ledger lock so no status read or copy-out can interleave.
    pub async fn accept(
        &self,
        kind: SensorKind,
        report: BatchReportKind,
        data: BatchData,
        reporter: &dyn EventReporter,
    ) -> HubResult<()> {
        let mut table = self.table.lock().await;
        let slot = &mut table[slot_index(kind)];
        slot.data = data;
        debug!(
            sensor = %kind,
            payload_size = slot.data.payload_size,
            record_count = slot.data.record_count,
            "batch accepted"
        );
        reporter
            .report_batch(kind, report, &slot.data)
            .await
            .map_err(|e| SensorError::backend(kind, e))
    }

    /// Re-emit the stored descriptor as a timestamp-only completion marker.
    pub async fn timestamp_report(
        &self,
        kind: SensorKind,
        reporter: &dyn EventReporter,
    ) -> HubResult<()> {
        let table = self.table.lock().await;
        let slot = &table[slot_index(kind)];
        reporter
            .report_batch(kind, BatchReportKind::TimestampOnly, &slot.data)
            .await
            .map_err(|e| SensorError::backend(kind, e))
    }

    /// Current descriptor fields plus the pending timestamp.
    ///
    /// Clears the timestamp as a side effect: an immediate second read with
    /// no intervening event reports a timestamp of 0.
    pub async fn read_status(&self, kind: SensorKind) -> BatchStatus {
        let mut table = self.table.lock().await;
        let slot = &mut table[slot_index(kind)];
        BatchStatus {
            payload_size: slot.data.payload_size,
            record_count: slot.data.record_count,
            reported_count: slot.reported_count,
            timestamp: slot.timestamp.take(),
        }
    }

    /// Copy the most recent batch payload into a caller-owned buffer.
    ///
    /// The copy is bounded by the destination length; the stored batch is
    /// never modified. An empty destination is a logged no-op: the caller
    /// owns the buffer and the ledger never retains it past this call.
    pub async fn copy_out(&self, kind: SensorKind, dest: &mut [u8]) -> HubResult<usize> {
        let table = self.table.lock().await;
        let slot = &table[slot_index(kind)];

        if dest.is_empty() {
            warn!(sensor = %kind, "copy-out skipped: empty destination buffer");
            return Err(SensorError::EmptyDestination(kind));
        }

        let len = dest.len().min(slot.data.payload.len());
        dest[..len].copy_from_slice(&slot.data.payload[..len]);
        Ok(len)
    }

    /// Record the timestamp of the latest batch-relevant event.
    pub async fn record_timestamp(&self, kind: SensorKind, timestamp: u32) {
        let mut table = self.table.lock().await;
        table[slot_index(kind)].timestamp.record(timestamp);
    }

    /// Count one delivered sample for the status diagnostic.
    pub async fn note_sample_reported(&self, kind: SensorKind) {
        let mut table = self.table.lock().await;
        let slot = &mut table[slot_index(kind)];
        slot.reported_count = slot.reported_count.wrapping_add(1);
    }
}

impl Default for BatchLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::RecordingReporter;

    #[test]
    fn timestamp_tracker_is_read_and_clear() {
        let mut tracker = TimestampTracker::default();
        tracker.record(42);
        assert_eq!(tracker.take(), 42);
        assert_eq!(tracker.take(), 0);
    }

    #[test]
    fn timestamp_tracker_is_last_write_wins() {
        let mut tracker = TimestampTracker::default();
        tracker.record(1);
        tracker.record(2);
        assert_eq!(tracker.take(), 2);
    }

    #[tokio::test]
    async fn accept_replaces_descriptor_and_forwards() {
        let ledger = BatchLedger::new();
        let reporter = RecordingReporter::new();

        let data = BatchData {
            payload_size: 16,
            record_count: 4,
            payload: vec![7; 16],
        };
        ledger
            .accept(
                SensorKind::Orientation,
                BatchReportKind::Accumulated,
                data,
                &reporter,
            )
            .await
            .unwrap();

        let status = ledger.read_status(SensorKind::Orientation).await;
        assert_eq!(status.payload_size, 16);
        assert_eq!(status.record_count, 4);
        assert_eq!(reporter.batches(SensorKind::Orientation).len(), 1);
    }

    #[tokio::test]
    async fn status_read_clears_timestamp_once() {
        let ledger = BatchLedger::new();
        ledger.record_timestamp(SensorKind::Orientation, 12345).await;

        let first = ledger.read_status(SensorKind::Orientation).await;
        assert_eq!(first.timestamp, 12345);

        let second = ledger.read_status(SensorKind::Orientation).await;
        assert_eq!(second.timestamp, 0);
        // Descriptor fields are unaffected by the clear.
        assert_eq!(second.payload_size, first.payload_size);
        assert_eq!(second.record_count, first.record_count);
    }

    #[tokio::test]
    async fn timestamps_are_tracked_per_sensor() {
        let ledger = BatchLedger::new();
        ledger.record_timestamp(SensorKind::Orientation, 111).await;
        ledger
            .record_timestamp(SensorKind::MagRotationVector, 222)
            .await;

        assert_eq!(
            ledger.read_status(SensorKind::MagRotationVector).await.timestamp,
            222
        );
        assert_eq!(ledger.read_status(SensorKind::Orientation).await.timestamp, 111);
    }

    #[tokio::test]
    async fn copy_out_is_bounded_and_leaves_state_alone() {
        let ledger = BatchLedger::new();
        let reporter = RecordingReporter::new();
        ledger
            .accept(
                SensorKind::MagRotationVector,
                BatchReportKind::Accumulated,
                BatchData {
                    payload_size: 8,
                    record_count: 2,
                    payload: vec![1, 2, 3, 4, 5, 6, 7, 8],
                },
                &reporter,
            )
            .await
            .unwrap();

        let mut small = [0u8; 4];
        let copied = ledger
            .copy_out(SensorKind::MagRotationVector, &mut small)
            .await
            .unwrap();
        assert_eq!(copied, 4);
        assert_eq!(small, [1, 2, 3, 4]);

        let mut large = [0u8; 16];
        let copied = ledger
            .copy_out(SensorKind::MagRotationVector, &mut large)
            .await
            .unwrap();
        assert_eq!(copied, 8);

        let status = ledger.read_status(SensorKind::MagRotationVector).await;
        assert_eq!(status.payload_size, 8);
        assert_eq!(status.record_count, 2);
    }

    #[tokio::test]
    async fn copy_out_with_empty_destination_is_a_no_op() {
        let ledger = BatchLedger::new();
        let mut empty: [u8; 0] = [];
        let err = ledger
            .copy_out(SensorKind::Orientation, &mut empty)
            .await
            .expect_err("empty destination must be rejected");
        assert!(matches!(err, SensorError::EmptyDestination(_)));
    }

    #[tokio::test]
    async fn reported_count_accumulates() {
        let ledger = BatchLedger::new();
        for _ in 0..3 {
            ledger.note_sample_reported(SensorKind::Orientation).await;
        }
        let status = ledger.read_status(SensorKind::Orientation).await;
        assert_eq!(status.reported_count, 3);
        // The other sensor's diagnostic is untouched.
        let other = ledger.read_status(SensorKind::MagRotationVector).await;
        assert_eq!(other.reported_count, 0);
    }

    #[tokio::test]
    async fn timestamp_report_resends_stored_descriptor() {
        let ledger = BatchLedger::new();
        let reporter = RecordingReporter::new();
        ledger
            .accept(
                SensorKind::Orientation,
                BatchReportKind::Accumulated,
                BatchData {
                    payload_size: 12,
                    record_count: 3,
                    payload: vec![0; 12],
                },
                &reporter,
            )
            .await
            .unwrap();

        ledger
            .timestamp_report(SensorKind::Orientation, &reporter)
            .await
            .unwrap();

        let batches = reporter.batches(SensorKind::Orientation);
        assert_eq!(batches.len(), 2);
        match &batches[1] {
            crate::backend::mock::Delivery::Batch {
                report,
                payload_size,
                ..
            } => {
                assert_eq!(*report, BatchReportKind::TimestampOnly);
                assert_eq!(*payload_size, 12);
            }
            other => panic!("unexpected delivery: {other:?}"),
        }
    }
}
