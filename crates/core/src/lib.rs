pub mod error;
pub mod event;
pub mod record;
pub mod sink;

pub use error::{Result, UpsError};
pub use event::TickEvent;
pub use record::{DerivedRecord, HostMetrics, PhysicalSample, PowerStage, RawSample, RemainingTime};
pub use sink::ReportSink;

/// Timestamp layout shared by the console and the CSV log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
