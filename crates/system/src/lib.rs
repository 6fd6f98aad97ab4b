pub mod cpu;
pub mod memory;
pub mod thermal;

use std::path::{Path, PathBuf};
use sysinfo::{Components, System};
use ups_core::{HostMetrics, Result};

/// Default sysfs thermal root on Linux.
pub const THERMAL_ROOT: &str = "/sys/class/thermal";

/// Polls CPU, memory and temperature once per tick.
///
/// Any metric that fails to read becomes `None` in [`HostMetrics`]; the
/// failure is logged at debug level and never aborts the tick.
pub struct HostProbe {
    sys: System,
    components: Components,
    thermal_root: PathBuf,
}

impl HostProbe {
    pub fn new() -> Self {
        Self::with_thermal_root(THERMAL_ROOT)
    }

    pub fn with_thermal_root(root: impl AsRef<Path>) -> Self {
        let mut sys = System::new();
        // CPU usage is a delta; prime it so the first tick has a baseline.
        sys.refresh_cpu_usage();
        Self {
            sys,
            components: Components::new_with_refreshed_list(),
            thermal_root: root.as_ref().to_path_buf(),
        }
    }

    /// One reading of every host metric.
    pub fn sample(&mut self) -> HostMetrics {
        HostMetrics {
            cpu_temp_c: sentinel("cpu_temp", self.cpu_temperature()),
            cpu_pct: sentinel("cpu_pct", self.cpu_usage()),
            mem_pct: sentinel("mem_pct", self.memory_usage()),
        }
    }

    fn cpu_usage(&mut self) -> Result<f32> {
        self.sys.refresh_cpu_usage();
        let per_core: Vec<f32> = self.sys.cpus().iter().map(|c| c.cpu_usage()).collect();
        cpu::average_usage(&per_core)
    }

    fn memory_usage(&mut self) -> Result<f32> {
        self.sys.refresh_memory();
        memory::memory_percent(self.sys.used_memory(), self.sys.total_memory())
    }

    fn cpu_temperature(&mut self) -> Result<f32> {
        self.components.refresh(false); // false = keep existing sensor list
        let from_sysinfo = cpu::pick_cpu_temperature(
            self.components
                .list()
                .iter()
                .map(|c| (c.label(), c.temperature())),
        );
        match from_sysinfo {
            Some(t) => Ok(t),
            None => thermal::read_thermal_zone(&self.thermal_root),
        }
    }
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn sentinel(metric: &str, value: Result<f32>) -> Option<f32> {
    match value {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("{metric} unavailable: {e}");
            None
        }
    }
}
