pub mod schema;
pub mod validate;

pub use schema::{
    BatteryProfile, CalibrationConfig, CurvePoint, MonitorConfig, OperatingLimits, PowerSource,
    RegisterMap, SensorCalibration, StageThresholds, UpsConfig,
};
pub use validate::{validate_calibration, validate_monitor};

use std::path::{Path, PathBuf};
use ups_core::{Result, UpsError};

/// Load configuration from a TOML file.  Returns `UpsConfig::default()` if
/// the file doesn't exist so the monitor always has the compiled-in profile.
pub fn load(path: impl AsRef<Path>) -> Result<UpsConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(
            "Config file not found at '{}'; using compiled-in calibration.",
            path.display()
        );
        return Ok(UpsConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| UpsError::Config(format!("cannot read '{}': {e}", path.display())))?;

    parse(&raw)
}

/// Parse a TOML document. Missing sections fall back to defaults.
pub fn parse(raw: &str) -> Result<UpsConfig> {
    toml::from_str(raw).map_err(|e| UpsError::Config(format!("TOML parse error: {e}")))
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("ups").join("ups.toml")
}
