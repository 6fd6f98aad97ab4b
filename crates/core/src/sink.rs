use crate::{error::Result, error::UpsError, record::DerivedRecord};
use chrono::{DateTime, Local};

/// Every reporting target (console, CSV log, live chart) implements this trait.
///
/// Sinks receive read-only records; anything they keep is a copy they own.
pub trait ReportSink: Send {
    /// Short identifier used in log lines, e.g. `"csv"`.
    fn name(&self) -> &str;

    /// Called once per successful tick.
    fn report(&mut self, record: &DerivedRecord) -> Result<()>;

    /// Called exactly once per failed tick. No measurement is fabricated.
    fn no_reading(&mut self, at: DateTime<Local>, error: &UpsError) -> Result<()>;

    /// Flush and release resources. Called on every exit path.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
