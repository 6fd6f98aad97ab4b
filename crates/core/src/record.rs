use chrono::{DateTime, Local};
use std::fmt;
use std::time::Duration;

/// Register words captured in one tick, before any unit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// Bus-voltage register, status flags still packed in bits 0..=2.
    pub bus_voltage_raw: u16,
    /// Shunt register as read; reinterpret as `i16` for direction.
    pub shunt_raw: u16,
    /// Power register, present only when the calibration reads it.
    pub power_raw: Option<u16>,
    pub timestamp: DateTime<Local>,
}

/// A sample converted to physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalSample {
    pub voltage_v: f64,
    /// Positive = charging, negative = discharging.
    pub current_a: f64,
    pub power_w: f64,
    pub timestamp: DateTime<Local>,
}

impl PhysicalSample {
    /// `true` while current flows out of the battery.
    #[must_use]
    pub fn is_discharging(&self) -> bool {
        self.current_a < 0.0
    }
}

/// Host OS readings taken alongside each sample.
///
/// `None` marks a metric that could not be read this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HostMetrics {
    pub cpu_temp_c: Option<f32>,
    pub cpu_pct: Option<f32>,
    pub mem_pct: Option<f32>,
}

/// Qualitative load category, ordered from lightest to heaviest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PowerStage {
    Idle,
    Low,
    Moderate,
    High,
}

impl PowerStage {
    pub const ALL: [PowerStage; 4] = [Self::Idle, Self::Low, Self::Moderate, Self::High];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

impl fmt::Display for PowerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extrapolated runtime left on the battery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemainingTime {
    /// Charging, or the draw is too small to extrapolate from.
    Indeterminate,
    Estimate(Duration),
}

impl RemainingTime {
    #[must_use]
    pub fn minutes(&self) -> Option<f64> {
        match self {
            Self::Indeterminate => None,
            Self::Estimate(d) => Some(d.as_secs_f64() / 60.0),
        }
    }
}

/// Everything produced for one successful tick. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub sample: PhysicalSample,
    /// Always within `[0, 100]`.
    pub battery_pct: f64,
    pub remaining_time: RemainingTime,
    pub stage: PowerStage,
    pub host: HostMetrics,
}

impl DerivedRecord {
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Local> {
        self.sample.timestamp
    }
}
