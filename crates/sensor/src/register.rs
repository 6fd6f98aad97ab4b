use crate::transport::I2cTransport;
use ups_config::{RegisterMap, SensorCalibration};
use ups_core::{Result, UpsError};

/// 16-bit register access on top of a byte transport.
///
/// Words are big-endian on the wire whatever the host byte order.
pub struct RegisterInterface<T> {
    transport: T,
    registers: RegisterMap,
}

impl<T: I2cTransport> RegisterInterface<T> {
    pub fn new(transport: T, registers: RegisterMap) -> Self {
        Self {
            transport,
            registers,
        }
    }

    pub fn registers(&self) -> &RegisterMap {
        &self.registers
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn read_register16(&mut self, reg: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        let n = self.transport.read_block(reg, &mut buf)?;
        if n < buf.len() {
            return Err(UpsError::SensorUnavailable(format!(
                "short read from register 0x{reg:02X}: {n} of 2 bytes"
            )));
        }
        Ok(u16::from_be_bytes(buf))
    }

    pub fn write_register16(&mut self, reg: u8, value: u16) -> Result<()> {
        self.transport.write_block(reg, &value.to_be_bytes())
    }

    /// Write the calibration register, then the configuration register.
    ///
    /// Must run once before the first sample. Any failure is fatal.
    pub fn configure(&mut self, sensor: &SensorCalibration) -> Result<()> {
        let cal = sensor.calibration_value().ok_or_else(|| {
            UpsError::Calibration(format!(
                "current_lsb {} × shunt {} Ω has no calibration value",
                sensor.current_lsb, sensor.shunt_ohms
            ))
        })?;

        let regs = self.registers;
        self.write_register16(regs.calibration, cal)
            .map_err(|e| UpsError::Calibration(format!("writing calibration register: {e}")))?;
        self.write_register16(regs.config, sensor.config_register)
            .map_err(|e| UpsError::Calibration(format!("writing configuration register: {e}")))?;

        tracing::info!(
            "Sensor configured: calibration 0x{cal:04X}, config 0x{:04X}",
            sensor.config_register
        );
        Ok(())
    }

    /// Read back both startup registers and compare with what was written.
    pub fn verify_calibration(&mut self, sensor: &SensorCalibration) -> Result<()> {
        let regs = self.registers;
        let expected = [
            ("calibration", regs.calibration, sensor.calibration_value()),
            ("configuration", regs.config, Some(sensor.config_register)),
        ];
        for (name, reg, want) in expected {
            let got = self
                .read_register16(reg)
                .map_err(|e| UpsError::Calibration(format!("reading back {name} register: {e}")))?;
            if Some(got) != want {
                return Err(UpsError::Calibration(format!(
                    "{name} register read back 0x{got:04X}, expected 0x{:04X}",
                    want.unwrap_or_default()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTransport;

    fn iface(t: MemoryTransport) -> RegisterInterface<MemoryTransport> {
        RegisterInterface::new(t, RegisterMap::default())
    }

    #[test]
    fn words_are_sent_msb_first() {
        let mut regs = iface(MemoryTransport::new());
        regs.write_register16(0x05, 0x1234).unwrap();
        assert_eq!(regs.transport().bytes(0x05), Some([0x12, 0x34]));
    }

    #[test]
    fn words_are_read_msb_first() {
        let mut regs = iface(MemoryTransport::new().with_word(0x02, 0x2E48));
        assert_eq!(regs.read_register16(0x02).unwrap(), 0x2E48);
    }

    #[test]
    fn write_then_read_back_round_trips() {
        let mut regs = iface(MemoryTransport::new());
        regs.write_register16(0x00, 0x3807).unwrap();
        assert_eq!(regs.read_register16(0x00).unwrap(), 0x3807);
    }

    #[test]
    fn short_read_is_sensor_unavailable() {
        let mut regs = iface(MemoryTransport::new().with_short_reads());
        assert!(matches!(
            regs.read_register16(0x02),
            Err(UpsError::SensorUnavailable(_))
        ));
    }

    #[test]
    fn absent_device_is_sensor_unavailable() {
        let mut regs = iface(MemoryTransport::absent());
        assert!(matches!(
            regs.read_register16(0x01),
            Err(UpsError::SensorUnavailable(_))
        ));
    }

    #[test]
    fn configure_writes_calibration_and_config() {
        let sensor = SensorCalibration::default();
        let mut regs = iface(MemoryTransport::new());
        regs.configure(&sensor).unwrap();
        assert_eq!(regs.transport().bytes(0x05), Some([0x10, 0x00]));
        assert_eq!(regs.transport().bytes(0x00), Some([0x38, 0x07]));
        regs.verify_calibration(&sensor).unwrap();
    }

    #[test]
    fn configure_failure_is_calibration_error() {
        let mut regs = iface(MemoryTransport::absent());
        assert!(matches!(
            regs.configure(&SensorCalibration::default()),
            Err(UpsError::Calibration(_))
        ));
    }

    #[test]
    fn verify_detects_mismatch() {
        let sensor = SensorCalibration::default();
        let mut regs = iface(MemoryTransport::new().with_word(0x05, 0x0004));
        assert!(matches!(
            regs.verify_calibration(&sensor),
            Err(UpsError::Calibration(_))
        ));
    }
}
