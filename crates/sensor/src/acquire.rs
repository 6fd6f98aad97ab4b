use crate::convert::{bus_voltage_flags, to_physical};
use crate::register::RegisterInterface;
use crate::transport::I2cTransport;
use chrono::Local;
use ups_config::{PowerSource, SensorCalibration};
use ups_core::{PhysicalSample, RawSample, Result};

/// Issues the register reads for one measurement.
///
/// Owns the register interface, so dropping the acquirer releases the bus.
pub struct SampleAcquirer<T> {
    regs: RegisterInterface<T>,
    sensor: SensorCalibration,
}

impl<T: I2cTransport> SampleAcquirer<T> {
    /// Wrap an already configured register interface.
    pub fn new(regs: RegisterInterface<T>, sensor: SensorCalibration) -> Self {
        Self { regs, sensor }
    }

    pub fn sensor(&self) -> &SensorCalibration {
        &self.sensor
    }

    pub fn registers(&self) -> &RegisterInterface<T> {
        &self.regs
    }

    /// Read bus voltage, then shunt, then power (register mode only).
    ///
    /// A failed read propagates; nothing is substituted.
    pub fn acquire(&mut self) -> Result<RawSample> {
        let map = *self.regs.registers();
        let timestamp = Local::now();
        let bus_voltage_raw = self.regs.read_register16(map.bus_voltage)?;
        let shunt_raw = self.regs.read_register16(map.shunt_voltage)?;
        let power_raw = match self.sensor.power_source {
            PowerSource::Register => Some(self.regs.read_register16(map.power)?),
            PowerSource::Derived => None,
        };
        Ok(RawSample {
            bus_voltage_raw,
            shunt_raw,
            power_raw,
            timestamp,
        })
    }

    pub fn convert(&self, raw: &RawSample) -> PhysicalSample {
        if bus_voltage_flags(raw.bus_voltage_raw).overflow {
            tracing::warn!(
                "Sensor math overflow flag set (bus register 0x{:04X}); current and power may be clipped",
                raw.bus_voltage_raw
            );
        }
        to_physical(raw, &self.sensor)
    }

    /// `acquire` followed by `convert`.
    pub fn read(&mut self) -> Result<PhysicalSample> {
        let raw = self.acquire()?;
        Ok(self.convert(&raw))
    }
}
