use std::path::Path;
use ups_core::{Result, UpsError};

/// Read the CPU temperature from the Linux sysfs thermal interface.
///
/// Prefers a zone whose `type` names the CPU; otherwise the first zone that
/// reads. Returns degrees Celsius.
pub fn read_thermal_zone(root: &Path) -> Result<f32> {
    let mut fallback = None;
    for index in 0..16 {
        let base = root.join(format!("thermal_zone{index}"));
        if !base.exists() {
            continue;
        }

        let kind = std::fs::read_to_string(base.join("type")).unwrap_or_default();
        let Ok(raw) = std::fs::read_to_string(base.join("temp")) else {
            continue;
        };
        let Some(celsius) = parse_millidegrees(&raw) else {
            continue;
        };

        if kind.trim().to_ascii_lowercase().contains("cpu") {
            return Ok(celsius);
        }
        fallback.get_or_insert(celsius);
    }
    fallback.ok_or_else(|| {
        UpsError::HostMetric(format!("no readable thermal zone under {}", root.display()))
    })
}

/// sysfs reports millidegrees, e.g. `"48312\n"`.
fn parse_millidegrees(raw: &str) -> Option<f32> {
    raw.trim().parse::<i64>().ok().map(|m| m as f32 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn zone(root: &Path, index: u32, kind: &str, temp: &str) {
        let dir = root.join(format!("thermal_zone{index}"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), kind).unwrap();
        fs::write(dir.join("temp"), temp).unwrap();
    }

    #[test]
    fn parses_millidegrees() {
        assert_eq!(parse_millidegrees("48312\n"), Some(48.312));
        assert_eq!(parse_millidegrees("garbage"), None);
    }

    #[test]
    fn prefers_cpu_zone() {
        let dir = tempfile::tempdir().unwrap();
        zone(dir.path(), 0, "acpitz\n", "30000\n");
        zone(dir.path(), 1, "cpu-thermal\n", "51000\n");
        assert_eq!(read_thermal_zone(dir.path()).unwrap(), 51.0);
    }

    #[test]
    fn falls_back_to_first_readable_zone() {
        let dir = tempfile::tempdir().unwrap();
        zone(dir.path(), 0, "acpitz\n", "30000\n");
        assert_eq!(read_thermal_zone(dir.path()).unwrap(), 30.0);
    }

    #[test]
    fn empty_root_is_host_metric_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_thermal_zone(dir.path()),
            Err(UpsError::HostMetric(_))
        ));
    }
}
