use ups_core::{Result, UpsError};

/// Average usage across all cores (0.0 – 100.0).
pub fn average_usage(per_core: &[f32]) -> Result<f32> {
    if per_core.is_empty() {
        return Err(UpsError::HostMetric("no CPUs reported".into()));
    }
    Ok(per_core.iter().sum::<f32>() / per_core.len() as f32)
}

/// Labels tried in order when picking the CPU temperature sensor.
/// `cpu_thermal` is the Raspberry Pi SoC zone.
const CPU_LABELS: [&str; 4] = ["cpu_thermal", "cpu-thermal", "package id", "coretemp"];

/// Pick the CPU temperature out of `(label, reading)` pairs.
pub fn pick_cpu_temperature<'a>(
    readings: impl IntoIterator<Item = (&'a str, Option<f32>)>,
) -> Option<f32> {
    let readings: Vec<(String, f32)> = readings
        .into_iter()
        .filter_map(|(label, t)| Some((label.to_ascii_lowercase(), t.filter(|t| t.is_finite())?)))
        .collect();

    CPU_LABELS
        .iter()
        .find_map(|want| {
            readings
                .iter()
                .find(|(label, _)| label.contains(want))
                .map(|(_, t)| *t)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_cores() {
        assert_eq!(average_usage(&[10.0, 30.0]).unwrap(), 20.0);
    }

    #[test]
    fn no_cores_is_an_error() {
        assert!(matches!(average_usage(&[]), Err(UpsError::HostMetric(_))));
    }

    #[test]
    fn prefers_pi_thermal_zone() {
        let t = pick_cpu_temperature([
            ("nvme Composite", Some(39.0)),
            ("cpu_thermal temp1", Some(51.5)),
        ]);
        assert_eq!(t, Some(51.5));
    }

    #[test]
    fn falls_back_to_package_sensor() {
        let t = pick_cpu_temperature([("acpitz temp1", Some(27.0)), ("Package id 0", Some(62.0))]);
        assert_eq!(t, Some(62.0));
    }

    #[test]
    fn skips_missing_readings() {
        assert_eq!(pick_cpu_temperature([("cpu_thermal temp1", None)]), None);
        assert_eq!(pick_cpu_temperature([("gpu", Some(40.0))]), None);
    }
}
