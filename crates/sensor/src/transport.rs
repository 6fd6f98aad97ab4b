use ups_core::Result;

/// Byte-level access to one device on an I2C bus.
///
/// Implementations talk to a fixed device address; register numbers are the
/// first byte of every transfer. Errors must surface as
/// [`UpsError::SensorUnavailable`](ups_core::UpsError::SensorUnavailable).
pub trait I2cTransport: Send {
    /// Write `bytes` to register `reg`.
    fn write_block(&mut self, reg: u8, bytes: &[u8]) -> Result<()>;

    /// Read up to `buf.len()` bytes from register `reg`.
    /// Returns how many bytes the device actually delivered.
    fn read_block(&mut self, reg: u8, buf: &mut [u8]) -> Result<usize>;
}

#[cfg(target_os = "linux")]
pub use linux::LinuxTransport;

#[cfg(target_os = "linux")]
mod linux {
    use super::I2cTransport;
    use i2cdev::core::I2CDevice;
    use i2cdev::linux::LinuxI2CDevice;
    use std::path::{Path, PathBuf};
    use ups_core::{Result, UpsError};

    /// `/dev/i2c-N` character device bound to one slave address.
    ///
    /// The file descriptor is closed when this value is dropped.
    pub struct LinuxTransport {
        device: LinuxI2CDevice,
        path: PathBuf,
        address: u16,
    }

    impl LinuxTransport {
        pub fn open(path: impl AsRef<Path>, address: u16) -> Result<Self> {
            let path = path.as_ref().to_path_buf();
            let device = LinuxI2CDevice::new(&path, address).map_err(|e| {
                UpsError::SensorUnavailable(format!(
                    "cannot open {} at 0x{address:02X}: {e}",
                    path.display()
                ))
            })?;
            tracing::info!("Opened I2C device {} at 0x{address:02X}", path.display());
            Ok(Self {
                device,
                path,
                address,
            })
        }

        fn unavailable(&self, op: &str, reg: u8, e: impl std::fmt::Display) -> UpsError {
            UpsError::SensorUnavailable(format!(
                "{op} register 0x{reg:02X} on {} at 0x{:02X}: {e}",
                self.path.display(),
                self.address
            ))
        }
    }

    impl I2cTransport for LinuxTransport {
        fn write_block(&mut self, reg: u8, bytes: &[u8]) -> Result<()> {
            self.device
                .smbus_write_i2c_block_data(reg, bytes)
                .map_err(|e| self.unavailable("write", reg, e))
        }

        fn read_block(&mut self, reg: u8, buf: &mut [u8]) -> Result<usize> {
            let len = u8::try_from(buf.len()).unwrap_or(u8::MAX);
            let data = self
                .device
                .smbus_read_i2c_block_data(reg, len)
                .map_err(|e| self.unavailable("read", reg, e))?;
            let n = data.len().min(buf.len());
            buf[..n].copy_from_slice(&data[..n]);
            Ok(n)
        }
    }

    impl Drop for LinuxTransport {
        fn drop(&mut self) {
            tracing::debug!("Released I2C device {}", self.path.display());
        }
    }
}
