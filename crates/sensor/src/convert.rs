//! Raw register words to physical units.
//!
//! The bus-voltage register packs status flags into its three low bits:
//!
//! ```text
//!  15                              3   2    1     0
//! ┌──────────────────────────────────┬───┬──────┬─────┐
//! │        bus voltage (13 bits)     │ - │ CNVR │ OVF │
//! └──────────────────────────────────┴───┴──────┴─────┘
//! ```
//!
//! Only [`bus_voltage_v`] may strip them.

use ups_config::{PowerSource, SensorCalibration};
use ups_core::{PhysicalSample, RawSample};

/// Volts per bus-voltage LSB once the flag bits are shifted out.
pub const BUS_VOLTAGE_LSB_V: f64 = 0.004;

/// Low bits of the bus-voltage register that carry flags, not magnitude.
pub const BUS_VOLTAGE_FLAG_BITS: u32 = 3;

/// Status bits carried in the bus-voltage register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusVoltageFlags {
    /// CNVR: a new conversion finished since the last power read.
    pub conversion_ready: bool,
    /// OVF: power or current calculations overflowed.
    pub overflow: bool,
}

/// Bus voltage in volts: `(raw >> 3) * 0.004`.
#[must_use]
pub fn bus_voltage_v(raw: u16) -> f64 {
    f64::from(raw >> BUS_VOLTAGE_FLAG_BITS) * BUS_VOLTAGE_LSB_V
}

#[must_use]
pub fn bus_voltage_flags(raw: u16) -> BusVoltageFlags {
    BusVoltageFlags {
        conversion_ready: raw & 0b10 != 0,
        overflow: raw & 0b01 != 0,
    }
}

/// Reinterpret a register word as two's complement.
#[must_use]
pub fn signed(raw: u16) -> i16 {
    raw as i16
}

/// Current in amps; the sign gives the direction.
#[must_use]
pub fn current_a(shunt_raw: u16, current_lsb: f64) -> f64 {
    f64::from(signed(shunt_raw)) * current_lsb
}

/// Power in watts from the power register.
#[must_use]
pub fn register_power_w(power_raw: u16, power_lsb: f64) -> f64 {
    f64::from(signed(power_raw)) * power_lsb
}

/// Convert one tick's registers using a fixed calibration.
///
/// With [`PowerSource::Register`] and no power word present, power falls back
/// to `voltage * current`; the acquirer always reads it in that mode.
#[must_use]
pub fn to_physical(raw: &RawSample, sensor: &SensorCalibration) -> PhysicalSample {
    let voltage_v = bus_voltage_v(raw.bus_voltage_raw);
    let current_a = current_a(raw.shunt_raw, sensor.current_lsb);
    let power_w = match (sensor.power_source, raw.power_raw) {
        (PowerSource::Register, Some(p)) => register_power_w(p, sensor.power_lsb()),
        _ => voltage_v * current_a,
    };
    PhysicalSample {
        voltage_v,
        current_a,
        power_w,
        timestamp: raw.timestamp,
    }
}
