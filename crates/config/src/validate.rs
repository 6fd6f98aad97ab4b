use crate::schema::{BatteryProfile, CalibrationConfig, MonitorConfig, StageThresholds};
use ups_core::{Result, UpsError};

/// Reject a monitor block the tick loop cannot run with.
pub fn validate_monitor(monitor: &MonitorConfig) -> Result<()> {
    monitor.interval()?;
    if monitor.max_consecutive_failures == Some(0) {
        return Err(UpsError::Config(
            "max_consecutive_failures must be at least 1".into(),
        ));
    }
    Ok(())
}

/// Check every calibration invariant the estimator relies on.
pub fn validate_calibration(cal: &CalibrationConfig) -> Result<()> {
    let sensor = &cal.sensor;
    if sensor.address > 0x7F {
        return Err(calibration(format!(
            "I2C address 0x{:02X} is not a 7-bit address",
            sensor.address
        )));
    }
    if !(sensor.current_lsb > 0.0) || !(sensor.shunt_ohms > 0.0) {
        return Err(calibration(
            "current_lsb and shunt_ohms must be positive".into(),
        ));
    }
    if sensor.calibration_value().is_none() {
        return Err(calibration(format!(
            "current_lsb {} with shunt {} Ω does not fit the calibration register",
            sensor.current_lsb, sensor.shunt_ohms
        )));
    }

    validate_curve(&cal.battery)?;
    validate_stages(&cal.stages)?;
    Ok(())
}

fn validate_curve(battery: &BatteryProfile) -> Result<()> {
    let curve = &battery.curve;
    if curve.len() < 2 {
        return Err(calibration(
            "battery curve needs at least two points".into(),
        ));
    }
    if curve.iter().any(|p| !p.voltage_v.is_finite() || !p.pct.is_finite()) {
        return Err(calibration("battery curve contains a non-finite value".into()));
    }
    if curve[0].pct != 0.0 || curve[curve.len() - 1].pct != 100.0 {
        return Err(calibration(
            "battery curve must start at 0 % and end at 100 %".into(),
        ));
    }
    for pair in curve.windows(2) {
        if pair[1].voltage_v <= pair[0].voltage_v {
            return Err(calibration(format!(
                "battery curve voltages must strictly ascend ({} V then {} V)",
                pair[0].voltage_v, pair[1].voltage_v
            )));
        }
        if pair[1].pct < pair[0].pct {
            return Err(calibration(format!(
                "battery curve percentages must not decrease ({} % then {} %)",
                pair[0].pct, pair[1].pct
            )));
        }
    }

    if !(battery.capacity_wh > 0.0) {
        return Err(calibration("capacity_wh must be positive".into()));
    }
    if !(battery.max_pct_step >= 0.0) || !(battery.min_draw_w >= 0.0) {
        return Err(calibration(
            "max_pct_step and min_draw_w must not be negative".into(),
        ));
    }
    if battery.draw_window == 0 {
        return Err(calibration("draw_window must be at least 1".into()));
    }
    Ok(())
}

fn validate_stages(stages: &StageThresholds) -> Result<()> {
    let StageThresholds {
        low_w,
        moderate_w,
        high_w,
    } = *stages;
    if !(0.0 <= low_w && low_w < moderate_w && moderate_w < high_w && high_w.is_finite()) {
        return Err(calibration(format!(
            "stage thresholds must ascend from zero, got {low_w} / {moderate_w} / {high_w} W"
        )));
    }
    Ok(())
}

fn calibration(msg: String) -> UpsError {
    UpsError::Calibration(msg)
}
