//! Subsystem lifecycle: registration, lookup and teardown.
//!
//! The hub owns one [`SensorRuntime`] per sensor kind that probed
//! successfully at init, plus the shared [`BatchLedger`]. Registration is a
//! one-shot: a sensor whose probe fails is left unregistered and never
//! started, with no retry. That sensor is simply absent from the control
//! surface; the others are unaffected.

use crate::backend::{EventReporter, FusionBackend};
use crate::batch::BatchLedger;
use crate::config::HubConfig;
use crate::engine::SensorRuntime;
use crate::types::SensorKind;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// The sensor subsystem: every registered virtual sensor plus shared state.
pub struct SensorHub {
    sensors: HashMap<SensorKind, Arc<SensorRuntime>>,
    ledger: Arc<BatchLedger>,
}

impl SensorHub {
    /// Initialize the subsystem from configuration.
    ///
    /// Probes the backend once per configured sensor. Probe failure is fatal
    /// for that sensor's availability (logged at error level, no retry) and
    /// harmless for the rest. Sensors marked enabled in config are armed
    /// immediately with their configured default delay.
    pub async fn new(
        config: &HubConfig,
        backend: Arc<dyn FusionBackend>,
        reporter: Arc<dyn EventReporter>,
    ) -> Self {
        let ledger = Arc::new(BatchLedger::new());
        let mut sensors = HashMap::new();

        for def in &config.sensors {
            if let Err(e) = backend.probe(def.kind).await {
                error!(sensor = %def.kind, error = %e, "sensor registration failed, leaving uninitialized");
                continue;
            }

            let runtime = SensorRuntime::new(
                def.kind,
                def.default_delay_ms,
                Arc::clone(&backend),
                Arc::clone(&reporter),
                Arc::clone(&ledger),
            );
            if def.enabled {
                runtime.enable(true);
            }
            info!(
                sensor = %def.kind,
                enabled = def.enabled,
                delay_ms = def.default_delay_ms,
                "sensor registered"
            );
            sensors.insert(def.kind, runtime);
        }

        Self { sensors, ledger }
    }

    /// Look up a registered sensor.
    pub fn sensor(&self, kind: SensorKind) -> Option<&Arc<SensorRuntime>> {
        self.sensors.get(&kind)
    }

    /// Kinds that registered successfully, in declaration order.
    pub fn registered(&self) -> Vec<SensorKind> {
        SensorKind::ALL
            .into_iter()
            .filter(|kind| self.sensors.contains_key(kind))
            .collect()
    }

    /// The subsystem-wide batch ledger.
    pub fn ledger(&self) -> &Arc<BatchLedger> {
        &self.ledger
    }

    /// Disable every scheduler. Pending ticks are cancelled; in-flight
    /// ticks complete without rescheduling.
    pub fn shutdown(&self) {
        for runtime in self.sensors.values() {
            runtime.enable(false);
        }
        info!("sensor hub shut down");
    }
}
