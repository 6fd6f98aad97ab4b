use std::collections::VecDeque;
use ups_core::{DerivedRecord, TIMESTAMP_FORMAT};

/// Points kept per series.
pub const WINDOW: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Voltage,
    Current,
    Power,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Self::Voltage, Self::Current, Self::Power];

    pub fn title(self) -> &'static str {
        match self {
            Self::Voltage => "Load Voltage (V)",
            Self::Current => "Current (A)",
            Self::Power => "Power (W)",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Point {
    x: f64,
    voltage_v: f64,
    current_a: f64,
    power_w: f64,
}

impl Point {
    fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Voltage => self.voltage_v,
            Metric::Current => self.current_a,
            Metric::Power => self.power_w,
        }
    }
}

/// Rolling chart data owned by the plot thread.
#[derive(Debug, Default)]
pub struct ChartHistory {
    points: VecDeque<Point>,
    ticks: u64,
    missed: u64,
    status: String,
}

impl ChartHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: &DerivedRecord) {
        if self.points.len() == WINDOW {
            self.points.pop_front();
        }
        let s = &record.sample;
        self.points.push_back(Point {
            x: self.ticks as f64,
            voltage_v: s.voltage_v,
            current_a: s.current_a,
            power_w: s.power_w,
        });
        self.ticks += 1;
        self.status = format!(
            "{}  {:.1}%  {}",
            record.timestamp().format(TIMESTAMP_FORMAT),
            record.battery_pct,
            record.stage
        );
    }

    /// A failed tick leaves a gap on the x axis.
    pub fn mark_missed(&mut self, status: String) {
        self.ticks += 1;
        self.missed += 1;
        self.status = status;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn missed(&self) -> u64 {
        self.missed
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn series(&self, metric: Metric) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.x, p.get(metric))).collect()
    }

    pub fn latest(&self, metric: Metric) -> Option<f64> {
        self.points.back().map(|p| p.get(metric))
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let start = self.points.front().map_or(0.0, |p| p.x);
        let end = self.points.back().map_or(0.0, |p| p.x);
        [start, end.max(start + 1.0)]
    }

    /// Min/max of a series with a little headroom so flat lines stay visible.
    pub fn y_bounds(&self, metric: Metric) -> [f64; 2] {
        let (lo, hi) = self
            .points
            .iter()
            .map(|p| p.get(metric))
            .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if lo > hi {
            return [0.0, 1.0];
        }
        let pad = ((hi - lo) * 0.1).max(1e-3);
        [lo - pad, hi + pad]
    }
}
