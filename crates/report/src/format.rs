use std::time::Duration;
use ups_core::RemainingTime;

/// Shown wherever a failed tick would otherwise carry measurements.
pub const NO_READING: &str = "no reading";

const DAY: Duration = Duration::from_secs(24 * 3600);

/// Compact runtime label: `"1h 23m"`, `"45m"`, `"more than 24 hours"`.
pub fn format_remaining(remaining: RemainingTime) -> String {
    let d = match remaining {
        RemainingTime::Indeterminate => return "indeterminate".to_string(),
        RemainingTime::Estimate(d) => d,
    };
    if d > DAY {
        return "more than 24 hours".to_string();
    }
    let m = d.as_secs() / 60;
    if m >= 60 {
        format!("{}h {}m", m / 60, m % 60)
    } else {
        format!("{m}m")
    }
}

/// `Some(v)` with `decimals` places, `None` as `fallback`.
pub fn format_optional(value: Option<f32>, decimals: usize, fallback: &str) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn est(mins: u64) -> RemainingTime {
        RemainingTime::Estimate(Duration::from_secs(mins * 60))
    }

    #[test]
    fn hours_and_minutes() {
        assert_eq!(format_remaining(est(83)), "1h 23m");
        assert_eq!(format_remaining(est(45)), "45m");
    }

    #[test]
    fn beyond_a_day() {
        assert_eq!(format_remaining(est(24 * 60 + 1)), "more than 24 hours");
        assert_eq!(format_remaining(est(24 * 60)), "24h 0m");
    }

    #[test]
    fn indeterminate_label() {
        assert_eq!(format_remaining(RemainingTime::Indeterminate), "indeterminate");
    }

    #[test]
    fn optional_values() {
        assert_eq!(format_optional(Some(48.24), 1, "n/a"), "48.2");
        assert_eq!(format_optional(None, 1, "n/a"), "n/a");
    }
}
