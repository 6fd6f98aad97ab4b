//! Startup wiring for the UPS monitor.
//!
//! Validates the configuration, configures the sensor, builds the sinks and
//! hands everything to the tick loop. Ctrl-C cancels the run.

pub mod scheduler;

pub use scheduler::{HostSource, LoopOptions, Monitor, RunSummary};

use tokio_util::sync::CancellationToken;
use tracing::info;
use ups_config::{validate_calibration, validate_monitor, UpsConfig};
use ups_core::Result;
use ups_report::{ConsoleSink, CsvLog, PlotSink, Sinks};
use ups_system::HostProbe;

/// Run the monitor until Ctrl-C, the chart's quit key or `max_ticks`.
///
/// Configuration and calibration problems are returned before any tick runs.
pub async fn run(config: &UpsConfig, max_ticks: Option<u64>) -> Result<RunSummary> {
    validate_monitor(&config.monitor)?;
    validate_calibration(&config.calibration)?;

    let sensor = &config.calibration.sensor;
    info!(
        "Sensor {} at 0x{:02X}, {:?} power, interval {:.1}s",
        sensor.device_path().display(),
        sensor.address,
        sensor.power_source,
        config.monitor.interval_secs
    );

    let acquirer = open_sensor(config)?;
    let cancel = CancellationToken::new();
    spawn_ctrl_c(cancel.clone());

    let sinks = build_sinks(config, &cancel)?;
    let options = LoopOptions {
        interval: config.monitor.interval()?,
        max_ticks,
        max_consecutive_failures: config.monitor.max_consecutive_failures,
    };

    Monitor::new(acquirer, &config.calibration, HostProbe::new(), sinks, options)
        .run(cancel)
        .await
}

#[cfg(target_os = "linux")]
fn open_sensor(
    config: &UpsConfig,
) -> Result<ups_sensor::SampleAcquirer<ups_sensor::LinuxTransport>> {
    ups_sensor::connect_linux(&config.calibration.sensor)
}

#[cfg(not(target_os = "linux"))]
fn open_sensor(_config: &UpsConfig) -> Result<ups_sensor::SampleAcquirer<NoBus>> {
    Err(ups_core::UpsError::Calibration(
        "I2C access needs Linux /dev/i2c-N".into(),
    ))
}

/// Placeholder transport type on platforms without `/dev/i2c-N`.
#[cfg(not(target_os = "linux"))]
struct NoBus;

#[cfg(not(target_os = "linux"))]
impl ups_sensor::I2cTransport for NoBus {
    fn write_block(&mut self, _reg: u8, _bytes: &[u8]) -> Result<()> {
        Err(ups_core::UpsError::SensorUnavailable("no I2C bus".into()))
    }

    fn read_block(&mut self, _reg: u8, _buf: &mut [u8]) -> Result<usize> {
        Err(ups_core::UpsError::SensorUnavailable("no I2C bus".into()))
    }
}

/// Console line (unless the chart owns the terminal), CSV log, chart.
fn build_sinks(config: &UpsConfig, cancel: &CancellationToken) -> Result<Sinks> {
    let mut sinks = Sinks::new().with(CsvLog::open(&config.monitor.log_path)?);
    if config.monitor.plot {
        sinks.push(PlotSink::spawn(cancel.clone())?);
    } else {
        sinks.push(ConsoleSink::stdout());
    }
    Ok(sinks)
}

fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted; stopping");
            cancel.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ups_core::UpsError;

    #[tokio::test]
    async fn invalid_interval_is_rejected_before_touching_the_bus() {
        let mut config = UpsConfig::default();
        config.monitor.interval_secs = 0.0;
        let err = run(&config, Some(1)).await.unwrap_err();
        assert!(matches!(err, UpsError::Config(_)));
    }

    #[tokio::test]
    async fn bad_curve_is_a_calibration_error() {
        let mut config = UpsConfig::default();
        config.calibration.battery.curve.reverse();
        let err = run(&config, Some(1)).await.unwrap_err();
        assert!(matches!(err, UpsError::Calibration(_)));
    }
}
