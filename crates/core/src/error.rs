use thiserror::Error;

/// Top-level error type used across the entire application.
///
/// Recoverable per tick: `SensorUnavailable`, `HostMetric`, `Report`.
/// Fatal at startup: `Calibration`, `Config`.
#[derive(Debug, Error)]
pub enum UpsError {
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),

    #[error("calibration error: {0}")]
    Calibration(String),

    #[error("host metric error: {0}")]
    HostMetric(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("report error: {0}")]
    Report(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl UpsError {
    /// `true` for errors the tick loop survives.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SensorUnavailable(_) | Self::HostMetric(_) | Self::Report(_)
        )
    }
}

pub type Result<T, E = UpsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_and_host_errors_are_recoverable() {
        assert!(UpsError::SensorUnavailable("nack".into()).is_recoverable());
        assert!(UpsError::HostMetric("no thermal zone".into()).is_recoverable());
    }

    #[test]
    fn calibration_error_is_fatal() {
        assert!(!UpsError::Calibration("write failed".into()).is_recoverable());
        assert!(!UpsError::Config("bad toml".into()).is_recoverable());
    }
}
