//! Integer register file.
//!
//! Thirty-two 64-bit general-purpose registers. Register `x0` is hardwired
//! to zero: reads return 0 and writes are ignored.

use crate::common::constants::NUM_REGISTERS;

/// Architectural integer register file.
pub struct RegisterFile {
    regs: [u64; NUM_REGISTERS],
}

impl RegisterFile {
    /// Creates a register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self {
            regs: [0; NUM_REGISTERS],
        }
    }

    /// Reads a register value. `x0` always reads zero.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31).
    pub fn read(&self, idx: usize) -> u64 {
        self.regs[idx]
    }

    /// Writes a register value. Writes to `x0` are ignored.
    ///
    /// # Arguments
    ///
    /// * `idx` - Register index (0-31).
    /// * `val` - The 64-bit value to write.
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx != 0 {
            self.regs[idx] = val;
        }
    }

    /// Returns a snapshot of all register values for state dumps.
    pub fn dump(&self) -> [u64; NUM_REGISTERS] {
        self.regs
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
