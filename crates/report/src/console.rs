use crate::format::{format_optional, format_remaining, NO_READING};
use chrono::{DateTime, Local};
use std::io::{self, Write};
use ups_core::{DerivedRecord, ReportSink, Result, UpsError, TIMESTAMP_FORMAT};

/// Prints one line per tick.
pub struct ConsoleSink<W = io::Stdout> {
    out: W,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Human-readable line for a successful tick.
pub fn format_line(record: &DerivedRecord) -> String {
    let s = &record.sample;
    let host = &record.host;
    format!(
        "{} - Load Voltage: {:.3} V, Current: {:.6} A, Power: {:.3} W, Percent: {:.1}%, \
         CPU Temp: {}°C, CPU Usage: {}%, Memory Usage: {}%, Stage: {}, Remaining Time: {}",
        record.timestamp().format(TIMESTAMP_FORMAT),
        s.voltage_v,
        s.current_a,
        s.power_w,
        record.battery_pct,
        format_optional(host.cpu_temp_c, 1, "n/a"),
        format_optional(host.cpu_pct, 1, "n/a"),
        format_optional(host.mem_pct, 1, "n/a"),
        record.stage,
        format_remaining(record.remaining_time),
    )
}

/// Line for a tick whose sensor read failed.
pub fn format_no_reading(at: DateTime<Local>, error: &UpsError) -> String {
    format!("{} - {NO_READING} ({error})", at.format(TIMESTAMP_FORMAT))
}

impl<W: Write + Send> ReportSink for ConsoleSink<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn report(&mut self, record: &DerivedRecord) -> Result<()> {
        writeln!(self.out, "{}", format_line(record))?;
        Ok(())
    }

    fn no_reading(&mut self, at: DateTime<Local>, error: &UpsError) -> Result<()> {
        writeln!(self.out, "{}", format_no_reading(at, error))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;
    use ups_core::{HostMetrics, PhysicalSample, PowerStage, RemainingTime};

    fn record() -> DerivedRecord {
        DerivedRecord {
            sample: PhysicalSample {
                voltage_v: 11.4,
                current_a: -0.5,
                power_w: -5.7,
                timestamp: Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            },
            battery_pct: 60.0,
            remaining_time: RemainingTime::Estimate(Duration::from_secs(10 * 3600 + 31 * 60)),
            stage: PowerStage::High,
            host: HostMetrics {
                cpu_temp_c: Some(51.0),
                cpu_pct: Some(7.5),
                mem_pct: None,
            },
        }
    }

    #[test]
    fn line_contains_every_field() {
        let line = format_line(&record());
        assert!(line.starts_with("2024-05-01 12:30:00 - Load Voltage: 11.400 V"));
        assert!(line.contains("Current: -0.500000 A"));
        assert!(line.contains("Percent: 60.0%"));
        assert!(line.contains("CPU Temp: 51.0°C"));
        assert!(line.contains("Memory Usage: n/a%"));
        assert!(line.contains("Stage: High"));
        assert!(line.ends_with("Remaining Time: 10h 31m"));
    }

    #[test]
    fn failed_tick_is_marked() {
        let mut sink = ConsoleSink::new(Vec::new());
        let at = Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 2).unwrap();
        sink.no_reading(at, &UpsError::SensorUnavailable("address NACK".into()))
            .unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "2024-05-01 12:30:02 - no reading (sensor unavailable: address NACK)\n"
        );
    }

    #[test]
    fn report_writes_one_line() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.report(&record()).unwrap();
        sink.close().unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 1);
    }
}
