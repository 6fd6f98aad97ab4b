//! Reporting sinks: console line, CSV log and live chart.

pub mod console;
pub mod csv;
pub mod format;
pub mod plot;

pub use console::ConsoleSink;
pub use csv::CsvLog;
pub use plot::PlotSink;

use chrono::{DateTime, Local};
use ups_core::{DerivedRecord, ReportSink, Result, UpsError};

/// Fans each tick out to every configured sink.
///
/// A failing sink is logged and skipped; the others still receive the tick.
#[derive(Default)]
pub struct Sinks {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl Sinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: impl ReportSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn with(mut self, sink: impl ReportSink + 'static) -> Self {
        self.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn each(&mut self, what: &str, mut f: impl FnMut(&mut dyn ReportSink) -> Result<()>) {
        for sink in &mut self.sinks {
            if let Err(e) = f(sink.as_mut()) {
                tracing::warn!("{} sink failed to {what}: {e}", sink.name());
            }
        }
    }
}

impl ReportSink for Sinks {
    fn name(&self) -> &str {
        "all"
    }

    fn report(&mut self, record: &DerivedRecord) -> Result<()> {
        self.each("report", |s| s.report(record));
        Ok(())
    }

    fn no_reading(&mut self, at: DateTime<Local>, error: &UpsError) -> Result<()> {
        self.each("record a missed tick", |s| s.no_reading(at, error));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.each("close", |s| s.close());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Counter {
        calls: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    impl ReportSink for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn report(&mut self, _record: &DerivedRecord) -> Result<()> {
            self.calls.lock().unwrap().push("report");
            if self.fail {
                return Err(UpsError::Report("disk full".into()));
            }
            Ok(())
        }

        fn no_reading(&mut self, _at: DateTime<Local>, _error: &UpsError) -> Result<()> {
            self.calls.lock().unwrap().push("no_reading");
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push("close");
            Ok(())
        }
    }

    #[test]
    fn failing_sink_does_not_starve_others() {
        let failing = Counter {
            fail: true,
            ..Counter::default()
        };
        let healthy = Counter::default();
        let mut sinks = Sinks::new().with(failing.clone()).with(healthy.clone());

        let at = Local::now();
        sinks
            .no_reading(at, &UpsError::SensorUnavailable("nack".into()))
            .unwrap();
        sinks.close().unwrap();

        assert_eq!(*healthy.calls.lock().unwrap(), vec!["no_reading", "close"]);
        assert_eq!(*failing.calls.lock().unwrap(), vec!["no_reading", "close"]);
        assert_eq!(sinks.len(), 2);
    }
}
