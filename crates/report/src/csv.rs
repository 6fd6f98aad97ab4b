//! Append-only CSV log, one row per tick.

use crate::format::NO_READING;
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use ups_core::{DerivedRecord, ReportSink, Result, UpsError, TIMESTAMP_FORMAT};

pub const HEADER: &str = "Timestamp,Load Voltage (V),Current (A),Power (W),Percent (%),\
CPU Temp (°C),CPU Usage (%),Memory Usage (%),Stage,Remaining Time (min)";

/// Column count of [`HEADER`].
pub const COLUMNS: usize = 10;

pub struct CsvLog {
    writer: BufWriter<File>,
    path: PathBuf,
    rows: u64,
}

impl CsvLog {
    /// Open `path` for appending. The header is written only when the file is
    /// new or empty, so restarts keep extending the same table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| UpsError::Report(format!("cannot open '{}': {e}", path.display())))?;
        let mut writer = BufWriter::new(file);
        if needs_header {
            writeln!(writer, "{HEADER}")?;
            writer.flush()?;
        }

        tracing::info!("Logging readings to {}", path.display());
        Ok(Self {
            writer,
            path,
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended by this process.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    fn append(&mut self, row: &str) -> Result<()> {
        writeln!(self.writer, "{row}")?;
        // Flush per row so an interrupted run keeps every completed tick.
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }
}

fn cell(value: Option<f32>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_default()
}

/// One data row. Host sentinels are empty cells.
pub fn format_row(record: &DerivedRecord) -> String {
    let s = &record.sample;
    let remaining = match record.remaining_time.minutes() {
        Some(m) => format!("{m:.2}"),
        None => "indeterminate".to_string(),
    };
    format!(
        "{},{:.3},{:.6},{:.6},{:.1},{},{},{},{},{}",
        record.timestamp().format(TIMESTAMP_FORMAT),
        s.voltage_v,
        s.current_a,
        s.power_w,
        record.battery_pct,
        cell(record.host.cpu_temp_c),
        cell(record.host.cpu_pct),
        cell(record.host.mem_pct),
        record.stage,
        remaining,
    )
}

/// Row for a failed tick: timestamp, empty measurements, marker in `Stage`.
pub fn format_no_reading_row(at: DateTime<Local>) -> String {
    format!("{},,,,,,,,{NO_READING},", at.format(TIMESTAMP_FORMAT))
}

impl ReportSink for CsvLog {
    fn name(&self) -> &str {
        "csv"
    }

    fn report(&mut self, record: &DerivedRecord) -> Result<()> {
        self.append(&format_row(record))
    }

    fn no_reading(&mut self, at: DateTime<Local>, _error: &UpsError) -> Result<()> {
        self.append(&format_no_reading_row(at))
    }

    fn close(&mut self) -> Result<()> {
        self.writer.flush()?;
        tracing::debug!("Closed {} after {} rows", self.path.display(), self.rows);
        Ok(())
    }
}
