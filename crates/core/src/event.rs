use crate::record::DerivedRecord;
use chrono::{DateTime, Local};

/// Messages handed to sinks that live on another thread.
///
/// Sources:
/// - Tick loop → `Reading`, `NoReading`
/// - Shutdown path → `Shutdown`
#[derive(Debug, Clone)]
pub enum TickEvent {
    /// A completed tick. The receiver owns this snapshot.
    Reading(DerivedRecord),
    /// The sensor could not be read this tick.
    NoReading {
        at: DateTime<Local>,
        /// Rendered error, kept as text so the event stays `Clone`.
        reason: String,
    },
    /// The loop is exiting; release resources.
    Shutdown,
}
