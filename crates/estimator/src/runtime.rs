use std::time::Duration;
use ups_config::BatteryProfile;
use ups_core::RemainingTime;

/// Time left at the present discharge rate.
///
/// `current_a >= 0` means the pack is charging or idle; `draw_w` below the
/// profile's `min_draw_w` is treated as no draw. Both report
/// [`RemainingTime::Indeterminate`] instead of extrapolating.
#[must_use]
pub fn remaining_time(
    battery_pct: f64,
    current_a: f64,
    draw_w: f64,
    profile: &BatteryProfile,
) -> RemainingTime {
    if !(current_a < 0.0) {
        return RemainingTime::Indeterminate;
    }
    let draw_w = draw_w.abs();
    if !(draw_w > 0.0) || draw_w < profile.min_draw_w {
        return RemainingTime::Indeterminate;
    }

    let energy_wh = battery_pct.clamp(0.0, 100.0) / 100.0 * profile.capacity_wh;
    let hours = energy_wh / draw_w;
    match Duration::try_from_secs_f64(hours * 3600.0) {
        Ok(d) => RemainingTime::Estimate(d),
        Err(_) => RemainingTime::Indeterminate,
    }
}
