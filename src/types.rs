//! Core data types shared between the scheduler, batch ledger and control
//! facade.
//!
//! The runtime is a single generic engine parameterized by [`SensorKind`];
//! everything type-specific about a sensor (its decoded sample shape and its
//! wire encoding) lives here so the engine itself stays kind-agnostic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a virtual sensor handled by the hub.
///
/// Each kind gets exactly one runtime state for the lifetime of the
/// subsystem; the set is closed by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Fused orientation (yaw / pitch / roll).
    Orientation,
    /// Geomagnetic rotation vector (x / y / z / s).
    MagRotationVector,
}

impl SensorKind {
    /// All sensor kinds the hub can register.
    pub const ALL: [SensorKind; 2] = [SensorKind::Orientation, SensorKind::MagRotationVector];

    /// Stable lowercase name, used in logs and config.
    pub fn name(self) -> &'static str {
        match self {
            SensorKind::Orientation => "orientation",
            SensorKind::MagRotationVector => "mag_rotation_vector",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded sample from the fusion backend.
///
/// The variant always matches the kind of the sensor it was read for;
/// [`SensorSample::kind`] recovers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorSample {
    /// Orientation angles in backend-native integer units.
    Orientation {
        /// Heading component.
        yaw: i32,
        /// Elevation component.
        pitch: i32,
        /// Bank component.
        roll: i32,
    },
    /// Rotation-vector components in backend-native integer units.
    RotationVector {
        /// X component.
        x: i32,
        /// Y component.
        y: i32,
        /// Z component.
        z: i32,
        /// Scalar component.
        s: i32,
    },
}

impl SensorSample {
    /// Zero-valued sample for a kind, used as the initial cached value.
    pub fn zeroed(kind: SensorKind) -> Self {
        match kind {
            SensorKind::Orientation => SensorSample::Orientation {
                yaw: 0,
                pitch: 0,
                roll: 0,
            },
            SensorKind::MagRotationVector => SensorSample::RotationVector {
                x: 0,
                y: 0,
                z: 0,
                s: 0,
            },
        }
    }

    /// The sensor kind this sample belongs to.
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorSample::Orientation { .. } => SensorKind::Orientation,
            SensorSample::RotationVector { .. } => SensorKind::MagRotationVector,
        }
    }
}

impl fmt::Display for SensorSample {
    /// Space-separated field list, the `data` attribute wire form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorSample::Orientation { yaw, pitch, roll } => {
                write!(f, "{yaw} {pitch} {roll}")
            }
            SensorSample::RotationVector { x, y, z, s } => {
                write!(f, "{x} {y} {z} {s}")
            }
        }
    }
}

/// Batch negotiation parameters forwarded to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchConfig {
    /// Backend-defined mode flags.
    pub flags: i32,
    /// Requested sampling period in nanoseconds.
    pub period_ns: i64,
    /// Max batching latency; forwarded, never enforced locally.
    pub timeout_ms: i32,
}

/// The latest completed batch for one sensor: descriptor plus payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchData {
    /// Payload size as reported by the backend.
    pub payload_size: i32,
    /// Number of records in the payload.
    pub record_count: i32,
    /// Raw record bytes, copied out on demand.
    pub payload: Vec<u8>,
}

impl BatchData {
    /// An empty batch, as delivered by a flush with nothing accumulated.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Why a batch is being delivered to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchReportKind {
    /// The backend completed a batch on its own schedule.
    Accumulated,
    /// Delivery triggered by an explicit flush request.
    FlushComplete,
    /// Timestamp-only completion marker; payload is the stored descriptor.
    TimestampOnly,
}

/// Snapshot returned by the batch-status query.
///
/// Reading a status clears the pending timestamp, so two back-to-back reads
/// with no intervening event differ only in `timestamp` (second read sees 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStatus {
    /// Payload size of the stored batch.
    pub payload_size: i32,
    /// Record count of the stored batch.
    pub record_count: i32,
    /// Samples delivered since subsystem start.
    pub reported_count: u32,
    /// Pending event timestamp; 0 means none unread.
    pub timestamp: u32,
}

impl fmt::Display for BatchStatus {
    /// `payload_size record_count reported_count timestamp`, the
    /// `batch_data` attribute wire form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.payload_size, self.record_count, self.reported_count, self.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_wire_form_matches_field_order() {
        let ortn = SensorSample::Orientation {
            yaw: 10,
            pitch: -3,
            roll: 7,
        };
        assert_eq!(ortn.to_string(), "10 -3 7");

        let rv = SensorSample::RotationVector {
            x: 1,
            y: 2,
            z: 3,
            s: 4,
        };
        assert_eq!(rv.to_string(), "1 2 3 4");
    }

    #[test]
    fn zeroed_sample_tracks_kind() {
        for kind in SensorKind::ALL {
            assert_eq!(SensorSample::zeroed(kind).kind(), kind);
        }
    }

    #[test]
    fn batch_status_wire_form() {
        let status = BatchStatus {
            payload_size: 16,
            record_count: 4,
            reported_count: 9,
            timestamp: 12345,
        };
        assert_eq!(status.to_string(), "16 4 9 12345");
    }
}
