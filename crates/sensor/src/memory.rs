use crate::transport::I2cTransport;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use ups_core::{Result, UpsError};

/// Register file held in memory, laid out MSB-first like the real device.
///
/// Test double for the bus. Reads of registers never written return zero.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    registers: HashMap<u8, [u8; 2]>,
    /// Zero-based read indices that fail.
    failing_reads: HashSet<usize>,
    reads: usize,
    absent: bool,
    short_reads: bool,
    released: Arc<AtomicBool>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device that NACKs every transfer.
    pub fn absent() -> Self {
        let mut transport = Self::default();
        transport.absent = true;
        transport
    }

    /// Preload a 16-bit register value.
    pub fn with_word(mut self, reg: u8, value: u16) -> Self {
        self.set_word(reg, value);
        self
    }

    /// Make the given read calls (counted from zero) fail.
    pub fn failing_reads(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.failing_reads.extend(indices);
        self
    }

    /// Deliver only one byte per read.
    pub fn with_short_reads(mut self) -> Self {
        self.short_reads = true;
        self
    }

    pub fn set_word(&mut self, reg: u8, value: u16) {
        self.registers.insert(reg, value.to_be_bytes());
    }

    /// Raw bytes currently stored for `reg`, as they sit on the wire.
    pub fn bytes(&self, reg: u8) -> Option<[u8; 2]> {
        self.registers.get(&reg).copied()
    }

    /// Number of read transfers attempted so far.
    pub fn read_count(&self) -> usize {
        self.reads
    }

    /// Flag that flips to `true` once this transport is dropped.
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

impl I2cTransport for MemoryTransport {
    fn write_block(&mut self, reg: u8, bytes: &[u8]) -> Result<()> {
        if self.absent {
            return Err(UpsError::SensorUnavailable(format!(
                "write register 0x{reg:02X}: no device"
            )));
        }
        let entry = self.registers.entry(reg).or_insert([0, 0]);
        for (slot, byte) in entry.iter_mut().zip(bytes) {
            *slot = *byte;
        }
        Ok(())
    }

    fn read_block(&mut self, reg: u8, buf: &mut [u8]) -> Result<usize> {
        let index = self.reads;
        self.reads += 1;
        if self.absent || self.failing_reads.contains(&index) {
            return Err(UpsError::SensorUnavailable(format!(
                "read register 0x{reg:02X}: address NACK"
            )));
        }
        let word = self.registers.get(&reg).copied().unwrap_or([0, 0]);
        let n = if self.short_reads { 1 } else { 2 }.min(buf.len());
        buf[..n].copy_from_slice(&word[..n]);
        Ok(n)
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}
