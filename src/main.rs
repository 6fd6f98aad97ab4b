//! ups: INA219 UPS power monitor.
//!
//! Run with:  `RUST_LOG=info ups --interval 2 --plot`

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt::writer::BoxMakeWriter, EnvFilter};
use ups_config::{default_path, load as load_config, UpsConfig};

#[derive(Debug, Parser)]
#[command(name = "ups", version, about = "Monitor a battery-backed INA219 UPS over I2C")]
struct Cli {
    /// Seconds between readings.
    #[arg(long)]
    interval: Option<f64>,

    /// Show a live voltage/current/power chart in the terminal.
    #[arg(long)]
    plot: bool,

    /// CSV log file (appended to).
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Stop after this many readings.
    #[arg(long, value_name = "N")]
    ticks: Option<u64>,

    /// Give up after this many failed readings in a row.
    #[arg(long, value_name = "N")]
    max_failures: Option<u32>,
}

impl Cli {
    fn apply(&self, config: &mut UpsConfig) {
        let monitor = &mut config.monitor;
        if let Some(secs) = self.interval {
            monitor.interval_secs = secs;
        }
        if self.plot {
            monitor.plot = true;
        }
        if let Some(path) = &self.log {
            monitor.log_path = path.clone();
        }
        if self.max_failures.is_some() {
            monitor.max_consecutive_failures = self.max_failures;
        }
    }
}

/// Where diagnostics go while the chart holds the terminal.
fn diagnostics_path(config: &UpsConfig) -> PathBuf {
    config.monitor.log_path.with_extension("diag.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.config.clone().unwrap_or_else(default_path);
    let mut config = load_config(&path)
        .with_context(|| format!("loading configuration from '{}'", path.display()))?;
    cli.apply(&mut config);

    // Logs go to stderr so they never interleave with the reading lines. The
    // chart owns the whole terminal, so in plot mode they go to a file.
    let (writer, ansi) = if config.monitor.plot {
        let diag = diagnostics_path(&config);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&diag)
            .with_context(|| format!("opening log file '{}'", diag.display()))?;
        (BoxMakeWriter::new(Mutex::new(file)), false)
    } else {
        (BoxMakeWriter::new(std::io::stderr), true)
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(ansi)
        .init();

    tracing::info!("ups v{} starting", env!("CARGO_PKG_VERSION"));

    let summary = ups_monitor::run(&config, cli.ticks)
        .await
        .context("monitor stopped")?;
    tracing::debug!("{summary:?}");
    Ok(())
}
