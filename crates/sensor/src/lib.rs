//! INA219 register access and sample acquisition.

pub mod acquire;
pub mod convert;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod register;
pub mod transport;

pub use acquire::SampleAcquirer;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryTransport;
pub use register::RegisterInterface;
pub use transport::I2cTransport;

#[cfg(target_os = "linux")]
pub use transport::LinuxTransport;

use ups_config::SensorCalibration;
use ups_core::Result;

/// Configure the device behind `transport` and return a ready acquirer.
///
/// Fails with `UpsError::Calibration` if the startup writes or the read-back
/// check fail; the loop must not start in that case.
pub fn connect<T: I2cTransport>(
    transport: T,
    sensor: &SensorCalibration,
) -> Result<SampleAcquirer<T>> {
    let mut regs = RegisterInterface::new(transport, sensor.registers);
    regs.configure(sensor)?;
    regs.verify_calibration(sensor)?;
    Ok(SampleAcquirer::new(regs, sensor.clone()))
}

/// Open `/dev/i2c-N` for the configured bus and address, then [`connect`].
#[cfg(target_os = "linux")]
pub fn connect_linux(sensor: &SensorCalibration) -> Result<SampleAcquirer<LinuxTransport>> {
    let transport = LinuxTransport::open(sensor.device_path(), sensor.address)
        .map_err(|e| ups_core::UpsError::Calibration(e.to_string()))?;
    connect(transport, sensor)
}
