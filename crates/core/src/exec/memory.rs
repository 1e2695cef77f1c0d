//! Byte-addressable backing memory.
//!
//! A flat little-endian memory image. All accesses are bounds-checked;
//! the caller decides whether an out-of-range access is a fault (data
//! side) or reads as zero (fetch past the image).

use crate::config::MemoryConfig;

/// Flat memory store.
pub struct MemoryStore {
    bytes: Vec<u8>,
}

impl MemoryStore {
    /// Allocates a zero-filled memory of the configured size.
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            bytes: vec![0; config.size_bytes as usize],
        }
    }

    /// Memory size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether `len` bytes starting at `addr` fall inside the image.
    fn in_bounds(&self, addr: u64, len: u64) -> bool {
        addr.checked_add(len)
            .map(|end| end <= self.bytes.len() as u64)
            .unwrap_or(false)
    }

    /// Reads `len` (1, 2, 4, or 8) bytes little-endian.
    ///
    /// # Returns
    ///
    /// The zero-extended value, or `None` when out of bounds.
    pub fn read(&self, addr: u64, len: u64) -> Option<u64> {
        if !self.in_bounds(addr, len) {
            return None;
        }
        let base = addr as usize;
        let mut val: u64 = 0;
        for i in (0..len as usize).rev() {
            val = (val << 8) | u64::from(self.bytes[base + i]);
        }
        Some(val)
    }

    /// Writes the low `len` (1, 2, 4, or 8) bytes of `val` little-endian.
    ///
    /// # Returns
    ///
    /// `true` on success, `false` when out of bounds (memory unchanged).
    pub fn write(&mut self, addr: u64, len: u64, val: u64) -> bool {
        if !self.in_bounds(addr, len) {
            return false;
        }
        let base = addr as usize;
        for i in 0..len as usize {
            self.bytes[base + i] = (val >> (8 * i)) as u8;
        }
        true
    }

    /// Reads one instruction word; fetches past the image read as zero
    /// (which decodes as an illegal instruction).
    pub fn fetch_word(&self, addr: u64) -> u32 {
        self.read(addr, 4).unwrap_or(0) as u32
    }

    /// Copies a byte image into memory starting at `addr`.
    ///
    /// # Returns
    ///
    /// `false` when the image does not fit.
    pub fn load_image(&mut self, addr: u64, image: &[u8]) -> bool {
        if !self.in_bounds(addr, image.len() as u64) {
            return false;
        }
        let base = addr as usize;
        self.bytes[base..base + image.len()].copy_from_slice(image);
        true
    }
}
