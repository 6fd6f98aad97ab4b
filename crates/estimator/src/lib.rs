//! Turns a physical sample into a [`DerivedRecord`]: charge percentage,
//! remaining runtime and load stage.
//!
//! The only state carried between ticks is [`EstimatorMemory`], which the
//! caller passes in and receives back on every call.

pub mod battery;
pub mod limits;
pub mod runtime;
pub mod stage;
pub mod window;

pub use battery::{battery_percent, smooth_percent};
pub use limits::{check_limits, LimitViolation};
pub use runtime::remaining_time;
pub use stage::classify;
pub use window::DrawWindow;

use ups_config::{BatteryProfile, CalibrationConfig, StageThresholds};
use ups_core::{DerivedRecord, HostMetrics, PhysicalSample};

/// State carried from one tick to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorMemory {
    /// Percentage reported on the previous successful tick.
    pub previous_pct: Option<f64>,
    /// Recent discharge draws; emptied whenever discharge stops.
    pub draw: DrawWindow,
}

impl EstimatorMemory {
    pub fn new(draw_window: usize) -> Self {
        Self {
            previous_pct: None,
            draw: DrawWindow::new(draw_window),
        }
    }
}

/// Immutable estimator built from the run's calibration.
#[derive(Debug, Clone)]
pub struct Estimator {
    battery: BatteryProfile,
    stages: StageThresholds,
}

impl Estimator {
    pub fn new(calibration: &CalibrationConfig) -> Self {
        Self {
            battery: calibration.battery.clone(),
            stages: calibration.stages,
        }
    }

    /// Fresh memory sized for this estimator's draw window.
    pub fn memory(&self) -> EstimatorMemory {
        EstimatorMemory::new(self.battery.draw_window)
    }

    /// Derive one record. Pure apart from the memory threaded through it.
    pub fn estimate(
        &self,
        sample: PhysicalSample,
        host: HostMetrics,
        memory: EstimatorMemory,
    ) -> (DerivedRecord, EstimatorMemory) {
        let EstimatorMemory {
            previous_pct,
            mut draw,
        } = memory;

        let raw_pct = battery_percent(sample.voltage_v, &self.battery.curve);
        let battery_pct = smooth_percent(raw_pct, previous_pct, self.battery.max_pct_step);

        if sample.is_discharging() {
            draw.push(sample.power_w.abs());
        } else {
            draw.clear();
        }
        let draw_w = draw.average().unwrap_or(0.0);
        let remaining_time = remaining_time(battery_pct, sample.current_a, draw_w, &self.battery);

        let stage = classify(sample.power_w, &self.stages);

        let record = DerivedRecord {
            sample,
            battery_pct,
            remaining_time,
            stage,
            host,
        };
        let memory = EstimatorMemory {
            previous_pct: Some(battery_pct),
            draw,
        };
        (record, memory)
    }
}
