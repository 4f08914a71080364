//! Demo binary: run the hub against the mock fusion backend.
//!
//! Enables every registered sensor, polls for a bounded duration while
//! printing what the consumer would see, then drains each sensor with a
//! flush and shuts down.

use clap::Parser;
use sensord::backend::mock::{MockFusion, RecordingReporter};
use sensord::backend::EventReporter;
use sensord::config::HubConfig;
use sensord::control::SensorControl;
use sensord::hub::SensorHub;
use sensord::telemetry;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sensord", about = "Virtual-sensor runtime demo")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "sensord.toml")]
    config: String,

    /// How long to poll before flushing and exiting, in milliseconds.
    #[arg(short, long, default_value_t = 500)]
    duration_ms: u64,

    /// Poll interval applied to every sensor, in milliseconds.
    #[arg(long, default_value_t = 30)]
    delay_ms: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = HubConfig::load_from(&cli.config)?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    telemetry::init_from_config(&config).map_err(|e| anyhow::anyhow!(e))?;

    let fusion = Arc::new(MockFusion::new());
    let reporter = Arc::new(RecordingReporter::new());
    let hub = SensorHub::new(
        &config,
        fusion,
        Arc::clone(&reporter) as Arc<dyn EventReporter>,
    )
    .await;

    let controls: Vec<SensorControl> = hub
        .registered()
        .into_iter()
        .filter_map(|kind| hub.sensor(kind).cloned())
        .map(SensorControl::new)
        .collect();

    for ctl in &controls {
        ctl.write_delay(&cli.delay_ms.to_string());
        ctl.write_enable("1");
    }

    sleep(Duration::from_millis(cli.duration_ms)).await;

    for ctl in &controls {
        let kind = ctl.runtime().kind();
        info!(sensor = %kind, data = ctl.read_data().await.trim(), "last sample");
        ctl.write_flush("1").await;
        info!(sensor = %kind, batch_data = ctl.read_batch_data().await.trim(), "batch status");
    }

    info!(
        deliveries = reporter.deliveries().len(),
        "polling window complete"
    );
    hub.shutdown();
    Ok(())
}
