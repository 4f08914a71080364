//! Mock backend implementations.
//!
//! Simulated collaborators for testing without a fusion core, and for the
//! demo binary. All mocks use async-safe primitives only.
//!
//! - [`MockFusion`] — sample source + batch backend with controllable reset
//!   state, scripted probe failures and a drainable accumulation buffer
//! - [`RecordingReporter`] — event reporter that records every delivery

use crate::types::{BatchConfig, BatchData, BatchReportKind, SensorKind, SensorSample};
use anyhow::{bail, Result};
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Simulated fusion backend.
///
/// Samples are random integers in a small range so polled values visibly
/// change between ticks. The reset flag and probe failures are controlled by
/// the test.
pub struct MockFusion {
    resetting: AtomicBool,
    /// Kinds whose probe is scripted to fail.
    unavailable: Mutex<Vec<SensorKind>>,
    /// Batch parameters seen per sensor, most recent last.
    batch_configs: Mutex<Vec<(SensorKind, BatchConfig)>>,
    /// Data handed back by the next flush, per sensor.
    pending_flush: Mutex<HashMap<SensorKind, BatchData>>,
}

impl MockFusion {
    /// Create a mock backend with every sensor available.
    pub fn new() -> Self {
        Self {
            resetting: AtomicBool::new(false),
            unavailable: Mutex::new(Vec::new()),
            batch_configs: Mutex::new(Vec::new()),
            pending_flush: Mutex::new(HashMap::new()),
        }
    }

    /// Mark a sensor kind as unavailable; its probe will fail.
    pub fn fail_probe(&self, kind: SensorKind) {
        self.unavailable.lock().unwrap().push(kind);
    }

    /// Enter or leave the reset-in-progress state.
    pub fn set_resetting(&self, resetting: bool) {
        self.resetting.store(resetting, Ordering::SeqCst);
    }

    /// Stage data to be returned by the next `flush` for `kind`.
    pub fn stage_flush_data(&self, kind: SensorKind, data: BatchData) {
        self.pending_flush.lock().unwrap().insert(kind, data);
    }

    /// Batch configurations received so far, in call order.
    pub fn batch_configs(&self) -> Vec<(SensorKind, BatchConfig)> {
        self.batch_configs.lock().unwrap().clone()
    }
}

impl Default for MockFusion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::SampleSource for MockFusion {
    async fn probe(&self, kind: SensorKind) -> Result<()> {
        if self.unavailable.lock().unwrap().contains(&kind) {
            bail!("{kind} not present on this device");
        }
        Ok(())
    }

    async fn read_sample(&self, kind: SensorKind) -> Result<SensorSample> {
        let mut rng = rand::thread_rng();
        let sample = match kind {
            SensorKind::Orientation => SensorSample::Orientation {
                yaw: rng.gen_range(0..36000),
                pitch: rng.gen_range(-9000..9000),
                roll: rng.gen_range(-18000..18000),
            },
            SensorKind::MagRotationVector => SensorSample::RotationVector {
                x: rng.gen_range(-10000..10000),
                y: rng.gen_range(-10000..10000),
                z: rng.gen_range(-10000..10000),
                s: rng.gen_range(0..10000),
            },
        };
        Ok(sample)
    }

    fn reset_in_progress(&self) -> bool {
        self.resetting.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl super::BatchBackend for MockFusion {
    async fn configure_batch(&self, kind: SensorKind, config: BatchConfig) -> Result<()> {
        if config.period_ns < 0 {
            bail!("negative batch period");
        }
        self.batch_configs.lock().unwrap().push((kind, config));
        Ok(())
    }

    async fn flush(&self, kind: SensorKind) -> Result<BatchData> {
        let staged = self.pending_flush.lock().unwrap().remove(&kind);
        Ok(staged.unwrap_or_else(BatchData::empty))
    }
}

/// One delivery captured by [`RecordingReporter`].
#[derive(Debug, Clone)]
pub enum Delivery {
    /// A polled sample was emitted.
    Sample {
        /// Sensor the sample came from.
        kind: SensorKind,
        /// The emitted sample.
        sample: SensorSample,
    },
    /// A batch (or timestamp marker) was emitted.
    Batch {
        /// Sensor the batch belongs to.
        kind: SensorKind,
        /// Delivery reason.
        report: BatchReportKind,
        /// Descriptor fields of the delivered batch.
        payload_size: i32,
        /// Record count of the delivered batch.
        record_count: i32,
    },
}

/// Event reporter that records deliveries for inspection.
#[derive(Default)]
pub struct RecordingReporter {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in order.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }

    /// Number of sample deliveries for one sensor.
    pub fn sample_count(&self, kind: SensorKind) -> usize {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter(|d| matches!(d, Delivery::Sample { kind: k, .. } if *k == kind))
            .count()
    }

    /// Batch deliveries for one sensor, in order.
    pub fn batches(&self, kind: SensorKind) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter(|d| matches!(d, Delivery::Batch { kind: k, .. } if *k == kind))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl super::EventReporter for RecordingReporter {
    async fn report_sample(&self, kind: SensorKind, sample: SensorSample) -> Result<()> {
        self.deliveries
            .lock()
            .unwrap()
            .push(Delivery::Sample { kind, sample });
        Ok(())
    }

    async fn report_batch(
        &self,
        kind: SensorKind,
        report: BatchReportKind,
        data: &BatchData,
    ) -> Result<()> {
        self.deliveries.lock().unwrap().push(Delivery::Batch {
            kind,
            report,
            payload_size: data.payload_size,
            record_count: data.record_count,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BatchBackend, EventReporter, SampleSource};

    #[tokio::test]
    async fn probe_fails_only_for_unavailable_kinds() {
        let fusion = MockFusion::new();
        fusion.fail_probe(SensorKind::MagRotationVector);

        assert!(fusion.probe(SensorKind::Orientation).await.is_ok());
        assert!(fusion.probe(SensorKind::MagRotationVector).await.is_err());
    }

    #[tokio::test]
    async fn samples_match_requested_kind() {
        let fusion = MockFusion::new();
        for kind in SensorKind::ALL {
            let sample = fusion.read_sample(kind).await.unwrap();
            assert_eq!(sample.kind(), kind);
        }
    }

    #[tokio::test]
    async fn flush_without_staged_data_is_empty() {
        let fusion = MockFusion::new();
        let data = fusion.flush(SensorKind::Orientation).await.unwrap();
        assert_eq!(data.record_count, 0);
        assert!(data.payload.is_empty());
    }

    #[tokio::test]
    async fn recorder_keeps_delivery_order() {
        let reporter = RecordingReporter::new();
        reporter
            .report_sample(
                SensorKind::Orientation,
                SensorSample::zeroed(SensorKind::Orientation),
            )
            .await
            .unwrap();
        reporter
            .report_batch(
                SensorKind::Orientation,
                BatchReportKind::Accumulated,
                &BatchData {
                    payload_size: 8,
                    record_count: 2,
                    payload: vec![0; 8],
                },
            )
            .await
            .unwrap();

        let deliveries = reporter.deliveries();
        assert_eq!(deliveries.len(), 2);
        assert!(matches!(deliveries[0], Delivery::Sample { .. }));
        assert!(matches!(
            deliveries[1],
            Delivery::Batch {
                record_count: 2,
                ..
            }
        ));
    }
}
