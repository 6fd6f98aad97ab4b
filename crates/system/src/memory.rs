use ups_core::{Result, UpsError};

/// Used memory as a percentage of total.
pub fn memory_percent(used: u64, total: u64) -> Result<f32> {
    if total == 0 {
        return Err(UpsError::HostMetric("total memory reported as zero".into()));
    }
    Ok((used as f64 / total as f64 * 100.0) as f32)
}
