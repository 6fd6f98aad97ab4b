use ups_config::CurvePoint;

/// Charge percentage for a terminal voltage.
///
/// Piecewise-linear over `curve` (ascending voltages), clamped to the curve
/// ends: at or below the first point reads its percentage (0 %), at or above
/// the last reads 100 %.
#[must_use]
pub fn battery_percent(voltage_v: f64, curve: &[CurvePoint]) -> f64 {
    let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
        return 0.0;
    };
    if voltage_v.is_nan() || voltage_v <= first.voltage_v {
        return clamp_pct(first.pct);
    }
    if voltage_v >= last.voltage_v {
        return clamp_pct(last.pct);
    }

    let pct = curve
        .windows(2)
        .find(|w| voltage_v <= w[1].voltage_v)
        .map(|w| {
            let (lo, hi) = (w[0], w[1]);
            let t = (voltage_v - lo.voltage_v) / (hi.voltage_v - lo.voltage_v);
            lo.pct + t * (hi.pct - lo.pct)
        })
        .unwrap_or(last.pct);
    clamp_pct(pct)
}

/// Limit the change from the previous displayed percentage to `max_step`.
///
/// `max_step <= 0` or no previous value returns `raw` unchanged.
#[must_use]
pub fn smooth_percent(raw: f64, previous: Option<f64>, max_step: f64) -> f64 {
    let Some(prev) = previous else {
        return raw;
    };
    if max_step <= f64::EPSILON {
        return raw;
    }
    let step = (raw - prev).clamp(-max_step, max_step);
    clamp_pct(prev + step)
}

fn clamp_pct(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}
