//! Control facade: the textual per-sensor control/data surface.
//!
//! One [`SensorControl`] per registered sensor translates attribute reads
//! and writes into engine operations. It performs no business logic beyond
//! dispatch and numeric encode/decode.
//!
//! The external contract is deliberately silent: every `write_*` method
//! "succeeds" no matter what, with parse failures and rejected operations
//! recorded only in logs. The `try_*` variants expose the same operations
//! with typed results so tests (and embedders that want more) can observe
//! the failure; the silent methods are thin wrappers over them.
//!
//! Reads return the attribute's wire text, newline-terminated:
//!
//! | attribute    | read                                              | write                     |
//! |--------------|---------------------------------------------------|---------------------------|
//! | `enable`     | `0` / `1`                                         | integer, nonzero enables  |
//! | `delay`      | interval ms                                       | integer ms                |
//! | `status`     | opaque integer                                    | integer                   |
//! | `data`       | sample field list                                 | —                         |
//! | `batch`      | —                                                 | `flags period_ns timeout` |
//! | `batch_data` | `payload_size record_count reported_count ts`     | copy-out into a buffer    |
//! | `flush`      | —                                                 | trigger, value ignored    |

use crate::engine::SensorRuntime;
use crate::error::{HubResult, SensorError};
use std::sync::Arc;
use tracing::warn;

/// Textual control surface for one sensor.
pub struct SensorControl {
    runtime: Arc<SensorRuntime>,
}

impl SensorControl {
    /// Wrap a registered sensor runtime.
    pub fn new(runtime: Arc<SensorRuntime>) -> Self {
        Self { runtime }
    }

    /// The wrapped runtime, for callers needing direct engine access.
    pub fn runtime(&self) -> &Arc<SensorRuntime> {
        &self.runtime
    }

    // --- enable ---

    /// Read the `enable` attribute.
    pub fn read_enable(&self) -> String {
        format!("{}\n", i32::from(self.runtime.is_enabled()))
    }

    /// Write the `enable` attribute; any nonzero integer enables.
    pub fn write_enable(&self, buf: &str) {
        self.swallow(self.try_write_enable(buf));
    }

    /// Typed variant of [`Self::write_enable`].
    pub fn try_write_enable(&self, buf: &str) -> HubResult<()> {
        let value: i64 = parse_int("enable", buf)?;
        self.runtime.enable(value != 0);
        Ok(())
    }

    // --- delay ---

    /// Read the `delay` attribute (milliseconds).
    pub fn read_delay(&self) -> String {
        format!("{}\n", self.runtime.delay_ms())
    }

    /// Write the `delay` attribute. A value of 0 (or less) halts the
    /// scheduler at the next tick boundary.
    pub fn write_delay(&self, buf: &str) {
        self.swallow(self.try_write_delay(buf));
    }

    /// Typed variant of [`Self::write_delay`]. Values outside the `i32`
    /// interval range are malformed, not truncated.
    pub fn try_write_delay(&self, buf: &str) -> HubResult<()> {
        let value: i32 = parse_int("delay", buf)?;
        self.runtime.set_delay_ms(value);
        Ok(())
    }

    // --- status ---

    /// Read the `status` attribute (opaque diagnostic).
    pub fn read_status(&self) -> String {
        format!("{}\n", self.runtime.status())
    }

    /// Write the `status` attribute.
    pub fn write_status(&self, buf: &str) {
        self.swallow(self.try_write_status(buf));
    }

    /// Typed variant of [`Self::write_status`].
    pub fn try_write_status(&self, buf: &str) -> HubResult<()> {
        let value: i32 = parse_int("status", buf)?;
        self.runtime.set_status(value);
        Ok(())
    }

    // --- data ---

    /// Read the `data` attribute: the decoded last sample, refreshed from
    /// the backend while the sensor is enabled.
    pub async fn read_data(&self) -> String {
        format!("{}\n", self.runtime.last_sample().await)
    }

    // --- batch ---

    /// Write the `batch` attribute: `flags period_ns timeout`.
    pub async fn write_batch(&self, buf: &str) {
        let result = self.try_write_batch(buf).await;
        self.swallow(result);
    }

    /// Typed variant of [`Self::write_batch`].
    pub async fn try_write_batch(&self, buf: &str) -> HubResult<()> {
        let mut fields = buf.split_whitespace();
        let flags: i32 = next_int(&mut fields, "batch", buf)?;
        let period_ns: i64 = next_int(&mut fields, "batch", buf)?;
        let timeout_ms: i32 = next_int(&mut fields, "batch", buf)?;

        self.runtime
            .configure_batch(crate::types::BatchConfig {
                flags,
                period_ns,
                timeout_ms,
            })
            .await
    }

    // --- batch_data ---

    /// Read the `batch_data` attribute:
    /// `payload_size record_count reported_count timestamp`.
    ///
    /// Clears the pending timestamp as a side effect.
    pub async fn read_batch_data(&self) -> String {
        format!("{}\n", self.runtime.read_batch_status().await)
    }

    /// Write path of `batch_data`: copy the latest batch payload into a
    /// caller-owned buffer.
    ///
    /// The original surface took a raw address encoded as hex text; here the
    /// caller hands over a sized buffer instead and the copy is bounded by
    /// its length. An empty buffer is a logged no-op.
    pub async fn write_batch_data(&self, dest: &mut [u8]) {
        let result = self.try_copy_batch_out(dest).await.map(|_| ());
        self.swallow(result);
    }

    /// Typed variant of [`Self::write_batch_data`]; returns bytes copied.
    pub async fn try_copy_batch_out(&self, dest: &mut [u8]) -> HubResult<usize> {
        self.runtime.copy_batch_out(dest).await
    }

    // --- flush ---

    /// Write the `flush` attribute. The value is ignored; any write forces
    /// an immediate batch emission.
    pub async fn write_flush(&self, _buf: &str) {
        let result = self.try_flush().await;
        self.swallow(result);
    }

    /// Typed variant of [`Self::write_flush`].
    pub async fn try_flush(&self) -> HubResult<()> {
        self.runtime.flush().await
    }

    /// The silent-failure contract: prior state stays as it was, the caller
    /// sees success, and only the log records what happened.
    fn swallow(&self, result: HubResult<()>) {
        if let Err(e) = result {
            warn!(sensor = %self.runtime.kind(), error = %e, "control write ignored");
        }
    }
}

fn parse_int<T: std::str::FromStr>(attribute: &'static str, buf: &str) -> HubResult<T> {
    buf.trim().parse::<T>().map_err(|_| SensorError::Malformed {
        attribute,
        value: buf.to_string(),
    })
}

fn next_int<'a, T: std::str::FromStr>(
    fields: &mut impl Iterator<Item = &'a str>,
    attribute: &'static str,
    buf: &str,
) -> HubResult<T> {
    fields
        .next()
        .and_then(|f| f.parse::<T>().ok())
        .ok_or_else(|| SensorError::Malformed {
            attribute,
            value: buf.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockFusion, RecordingReporter};
    use crate::backend::{EventReporter, FusionBackend};
    use crate::batch::BatchLedger;
    use crate::types::{BatchConfig, SensorKind};

    fn control(kind: SensorKind) -> (SensorControl, Arc<MockFusion>) {
        let fusion = Arc::new(MockFusion::new());
        let runtime = SensorRuntime::new(
            kind,
            30,
            Arc::clone(&fusion) as Arc<dyn FusionBackend>,
            Arc::new(RecordingReporter::new()) as Arc<dyn EventReporter>,
            Arc::new(BatchLedger::new()),
        );
        (SensorControl::new(runtime), fusion)
    }

    #[tokio::test]
    async fn enable_roundtrip() {
        let (ctl, _) = control(SensorKind::Orientation);
        assert_eq!(ctl.read_enable(), "0\n");

        ctl.write_enable("1\n");
        assert_eq!(ctl.read_enable(), "1\n");

        ctl.write_enable("0");
        assert_eq!(ctl.read_enable(), "0\n");
    }

    #[tokio::test]
    async fn malformed_write_leaves_state_unchanged() {
        let (ctl, _) = control(SensorKind::Orientation);
        ctl.write_delay("25");
        assert_eq!(ctl.read_delay(), "25\n");

        // Still looks successful to the caller; only the log knows.
        ctl.write_delay("fast please");
        assert_eq!(ctl.read_delay(), "25\n");

        let err = ctl.try_write_delay("fast please").expect_err("typed view");
        assert!(matches!(err, SensorError::Malformed { attribute: "delay", .. }));
    }

    #[tokio::test]
    async fn out_of_range_delay_is_malformed_not_truncated() {
        let (ctl, _) = control(SensorKind::Orientation);
        ctl.write_delay("25");

        // 2^32 would truncate to 0 through a blind narrowing cast, which
        // would silently halt the scheduler. It must be rejected instead.
        ctl.write_delay("4294967296");
        assert_eq!(ctl.read_delay(), "25\n");

        let err = ctl.try_write_delay("4294967296").expect_err("typed view");
        assert!(matches!(err, SensorError::Malformed { attribute: "delay", .. }));

        let err = ctl.try_write_status("4294967296").expect_err("typed view");
        assert!(matches!(err, SensorError::Malformed { attribute: "status", .. }));
    }

    #[tokio::test]
    async fn status_is_passthrough() {
        let (ctl, _) = control(SensorKind::MagRotationVector);
        ctl.write_status(" 3 \n");
        assert_eq!(ctl.read_status(), "3\n");
    }

    #[tokio::test]
    async fn data_read_has_kind_specific_field_count() {
        let (ortn, _) = control(SensorKind::Orientation);
        let line = ortn.read_data().await;
        assert_eq!(line.trim().split_whitespace().count(), 3);

        let (mag, _) = control(SensorKind::MagRotationVector);
        let line = mag.read_data().await;
        assert_eq!(line.trim().split_whitespace().count(), 4);
    }

    #[tokio::test]
    async fn batch_write_parses_three_fields() {
        let (ctl, fusion) = control(SensorKind::Orientation);
        ctl.write_batch("1 20000000 0\n").await;

        let configs = fusion.batch_configs();
        assert_eq!(configs.len(), 1);
        assert_eq!(
            configs[0].1,
            BatchConfig {
                flags: 1,
                period_ns: 20_000_000,
                timeout_ms: 0
            }
        );
    }

    #[tokio::test]
    async fn short_batch_write_is_rejected_before_the_backend() {
        let (ctl, fusion) = control(SensorKind::Orientation);
        ctl.write_batch("1 20000000\n").await;
        assert!(fusion.batch_configs().is_empty());

        let err = ctl
            .try_write_batch("1 20000000")
            .await
            .expect_err("typed view");
        assert!(matches!(err, SensorError::Malformed { attribute: "batch", .. }));
    }

    #[tokio::test]
    async fn batch_data_read_clears_timestamp() {
        let (ctl, _) = control(SensorKind::Orientation);
        ctl.runtime().record_timestamp(12345).await;

        assert_eq!(ctl.read_batch_data().await, "0 0 0 12345\n");
        assert_eq!(ctl.read_batch_data().await, "0 0 0 0\n");
    }

    #[tokio::test]
    async fn empty_copy_out_destination_is_silent_no_op() {
        let (ctl, _) = control(SensorKind::MagRotationVector);
        let mut empty: [u8; 0] = [];
        // Success-shaped externally.
        ctl.write_batch_data(&mut empty).await;

        let err = ctl
            .try_copy_batch_out(&mut empty)
            .await
            .expect_err("typed view");
        assert!(matches!(err, SensorError::EmptyDestination(_)));
    }
}
