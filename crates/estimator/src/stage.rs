use ups_config::StageThresholds;
use ups_core::PowerStage;

/// Map instantaneous power to a load stage by magnitude.
///
/// Intervals are closed below and open above, so a reading exactly on a
/// threshold lands in the higher stage. Charging and discharging share one
/// ladder. NaN reads as `Idle`.
#[must_use]
pub fn classify(power_w: f64, thresholds: &StageThresholds) -> PowerStage {
    let p = power_w.abs();
    if p >= thresholds.high_w {
        PowerStage::High
    } else if p >= thresholds.moderate_w {
        PowerStage::Moderate
    } else if p >= thresholds.low_w {
        PowerStage::Low
    } else {
        PowerStage::Idle
    }
}
