use std::fmt;
use ups_config::OperatingLimits;
use ups_core::PhysicalSample;

/// A reading above one of the configured operating limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitViolation {
    Voltage { value: f64, limit: f64 },
    Current { value: f64, limit: f64 },
    Power { value: f64, limit: f64 },
}

impl fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Voltage { value, limit } => {
                write!(f, "voltage {value:.2} V exceeds max limit of {limit} V")
            }
            Self::Current { value, limit } => {
                write!(f, "current {value:.2} A exceeds max limit of {limit} A")
            }
            Self::Power { value, limit } => {
                write!(f, "power {value:.2} W exceeds max limit of {limit} W")
            }
        }
    }
}

/// Every limit the sample exceeds. Current and power compare by magnitude.
#[must_use]
pub fn check_limits(sample: &PhysicalSample, limits: &OperatingLimits) -> Vec<LimitViolation> {
    let mut out = Vec::new();
    if sample.voltage_v > limits.max_voltage_v {
        out.push(LimitViolation::Voltage {
            value: sample.voltage_v,
            limit: limits.max_voltage_v,
        });
    }
    if sample.current_a.abs() > limits.max_current_a {
        out.push(LimitViolation::Current {
            value: sample.current_a,
            limit: limits.max_current_a,
        });
    }
    if sample.power_w.abs() > limits.max_power_w {
        out.push(LimitViolation::Power {
            value: sample.power_w,
            limit: limits.max_power_w,
        });
    }
    out
}
