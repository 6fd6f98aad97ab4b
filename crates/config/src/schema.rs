use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use ups_core::{Result, UpsError};

/// Root configuration structure parsed from `ups.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpsConfig {
    /// Loop pacing and sink toggles.
    pub monitor: MonitorConfig,
    /// Sensor, battery and stage constants. Immutable once the loop starts.
    pub calibration: CalibrationConfig,
}

/// Tick loop settings. Every field can be overridden from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between ticks.
    pub interval_secs: f64,
    /// Open the live terminal chart.
    pub plot: bool,
    /// Append-only CSV log.
    pub log_path: PathBuf,
    /// Abort after this many failed ticks in a row; `None` = never.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 2.0,
            plot: false,
            log_path: PathBuf::from("ina219_data_log.csv"),
            max_consecutive_failures: None,
        }
    }
}

impl MonitorConfig {
    /// Tick interval as a `Duration`.
    pub fn interval(&self) -> Result<Duration> {
        let secs = self.interval_secs;
        if !secs.is_finite() || secs <= 0.0 {
            return Err(UpsError::Config(format!(
                "interval must be a positive number of seconds, got {secs}"
            )));
        }
        Duration::try_from_secs_f64(secs)
            .map_err(|e| UpsError::Config(format!("interval {secs}s is out of range: {e}")))
    }
}

/// Process-wide calibration constants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub sensor: SensorCalibration,
    pub battery: BatteryProfile,
    pub stages: StageThresholds,
    pub limits: OperatingLimits,
}

/// INA219 wiring and scaling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorCalibration {
    /// `N` in `/dev/i2c-N`.
    pub i2c_bus: u8,
    /// 7-bit device address.
    pub address: u16,
    pub registers: RegisterMap,
    /// Shunt resistor in ohms.
    pub shunt_ohms: f64,
    /// Amps per LSB of the shunt register.
    pub current_lsb: f64,
    /// Value written to the configuration register at startup.
    pub config_register: u16,
    /// Where `power_w` comes from. Fixed for the whole run.
    pub power_source: PowerSource,
}

impl Default for SensorCalibration {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            address: 0x41,
            registers: RegisterMap::default(),
            shunt_ohms: 0.1,
            current_lsb: 0.0001,
            // 32 V bus range | ±320 mV shunt gain | 12-bit ADCs | continuous
            config_register: 0x2000 | 0x1800 | 0x0007,
            power_source: PowerSource::Derived,
        }
    }
}

impl SensorCalibration {
    /// Watts per LSB of the power register (fixed 20× the current LSB).
    #[must_use]
    pub fn power_lsb(&self) -> f64 {
        20.0 * self.current_lsb
    }

    /// Calibration register value, `trunc(0.04096 / (current_lsb * shunt_ohms))`.
    ///
    /// Returns `None` when the result does not fit the register.
    #[must_use]
    pub fn calibration_value(&self) -> Option<u16> {
        let denom = self.current_lsb * self.shunt_ohms;
        if !denom.is_finite() || denom <= 0.0 {
            return None;
        }
        // Nudge up so 4095.999… from float rounding truncates to 4096.
        let cal = (0.04096 / denom + 1e-6).trunc();
        if (1.0..=f64::from(u16::MAX)).contains(&cal) {
            Some(cal as u16)
        } else {
            None
        }
    }

    /// Character device for the configured bus.
    #[must_use]
    pub fn device_path(&self) -> PathBuf {
        PathBuf::from(format!("/dev/i2c-{}", self.i2c_bus))
    }
}

/// Register addresses on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterMap {
    pub config: u8,
    pub shunt_voltage: u8,
    pub bus_voltage: u8,
    pub power: u8,
    pub current: u8,
    pub calibration: u8,
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self {
            config: 0x00,
            shunt_voltage: 0x01,
            bus_voltage: 0x02,
            power: 0x03,
            current: 0x04,
            calibration: 0x05,
        }
    }
}

/// Power derivation used for every tick of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PowerSource {
    /// `voltage_v * current_a`.
    #[default]
    Derived,
    /// Read the power register and scale by `power_lsb`.
    Register,
}

/// One point on the voltage → charge curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub voltage_v: f64,
    pub pct: f64,
}

impl CurvePoint {
    pub const fn new(voltage_v: f64, pct: f64) -> Self {
        Self { voltage_v, pct }
    }
}

/// Battery pack model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryProfile {
    /// Ascending in voltage. First point is empty (0 %), last is full (100 %).
    pub curve: Vec<CurvePoint>,
    /// Nominal energy of a full pack.
    pub capacity_wh: f64,
    /// Largest change in displayed percentage per tick; `0` disables smoothing.
    pub max_pct_step: f64,
    /// Draws below this are treated as zero for runtime estimation.
    pub min_draw_w: f64,
    /// Number of discharging ticks averaged for runtime estimation.
    pub draw_window: usize,
}

impl Default for BatteryProfile {
    fn default() -> Self {
        // 3S Li-ion: per-cell 3.00 / 3.30 / 3.60 / 3.70 / 3.80 / 3.95 / 4.10 / 4.20 V
        Self {
            curve: vec![
                CurvePoint::new(9.00, 0.0),
                CurvePoint::new(9.90, 5.0),
                CurvePoint::new(10.80, 20.0),
                CurvePoint::new(11.10, 40.0),
                CurvePoint::new(11.40, 60.0),
                CurvePoint::new(11.85, 80.0),
                CurvePoint::new(12.30, 95.0),
                CurvePoint::new(12.60, 100.0),
            ],
            capacity_wh: 100.0,
            max_pct_step: 5.0,
            min_draw_w: 0.01,
            draw_window: 1,
        }
    }
}

impl BatteryProfile {
    /// Voltage at or below which the pack reads 0 %.
    #[must_use]
    pub fn empty_voltage_v(&self) -> f64 {
        self.curve.first().map_or(0.0, |p| p.voltage_v)
    }

    /// Voltage at or above which the pack reads 100 %.
    #[must_use]
    pub fn full_voltage_v(&self) -> f64 {
        self.curve.last().map_or(0.0, |p| p.voltage_v)
    }
}

/// Lower bounds (watts) of the Low, Moderate and High stages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageThresholds {
    pub low_w: f64,
    pub moderate_w: f64,
    pub high_w: f64,
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            low_w: 0.01,
            moderate_w: 0.5,
            high_w: 2.0,
        }
    }
}

/// Readings above these are logged as warnings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingLimits {
    pub max_voltage_v: f64,
    pub max_current_a: f64,
    pub max_power_w: f64,
}

impl Default for OperatingLimits {
    fn default() -> Self {
        Self {
            max_voltage_v: 15.0,
            max_current_a: 2.0,
            max_power_w: 10.0,
        }
    }
}
