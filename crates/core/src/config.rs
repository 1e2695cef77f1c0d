//! Configuration system for the pipeline simulator.
//!
//! This module defines all configuration structures used to parameterize a
//! simulation. It provides:
//! 1. **Defaults:** Baseline cache geometry and memory size constants.
//! 2. **Structures:** Per-cache configuration and the root `SimConfig`.
//! 3. **Validation:** Power-of-two geometry checks performed once, before
//!    any cache is constructed.
//!
//! Configuration is supplied as JSON (see the CLI `--config` flag) or via
//! `SimConfig::default()`.

use serde::Deserialize;

use crate::common::constants::EXCEPTION_HANDLER_PC;
use crate::common::error::ConfigError;

/// Default configuration constants.
mod defaults {
    /// Default total cache size in bytes (4 KiB).
    pub const CACHE_SIZE: u64 = 4096;

    /// Default cache block size in bytes.
    pub const CACHE_BLOCK: u64 = 64;

    /// Default associativity (1 way = direct-mapped).
    pub const CACHE_WAYS: u64 = 1;

    /// Default additional miss latency in cycles.
    pub const MISS_LATENCY: u64 = 10;

    /// Default memory image size in bytes (1 MiB).
    ///
    /// Must cover the exception handler address so redirected fetches stay
    /// in bounds.
    pub const MEMORY_SIZE: u64 = 1024 * 1024;
}

/// Geometry and timing of one cache.
///
/// Immutable after construction. The derived quantities follow the usual
/// decomposition: `num_sets = size_bytes / (block_bytes * ways)`, the block
/// offset occupies the low `log2(block_bytes)` address bits, the set index
/// the next `log2(num_sets)` bits, and the tag the rest.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CacheConfig {
    /// Total cache size in bytes.
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: u64,

    /// Cache block size in bytes. Must be a power of two.
    #[serde(default = "CacheConfig::default_block")]
    pub block_bytes: u64,

    /// Associativity (number of ways). Must be at least 1.
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: u64,

    /// Additional latency in cycles charged on a miss.
    #[serde(default = "CacheConfig::default_miss_latency")]
    pub miss_latency: u64,
}

impl CacheConfig {
    /// Returns the default cache size in bytes.
    fn default_size() -> u64 {
        defaults::CACHE_SIZE
    }

    /// Returns the default block size in bytes.
    fn default_block() -> u64 {
        defaults::CACHE_BLOCK
    }

    /// Returns the default associativity.
    fn default_ways() -> u64 {
        defaults::CACHE_WAYS
    }

    /// Returns the default miss latency in cycles.
    fn default_miss_latency() -> u64 {
        defaults::MISS_LATENCY
    }

    /// Checks the power-of-two geometry invariants.
    ///
    /// # Returns
    ///
    /// `Ok(())` when `block_bytes` is a nonzero power of two, `ways >= 1`,
    /// and the derived set count is a nonzero power of two.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_bytes == 0 || !self.block_bytes.is_power_of_two() {
            return Err(ConfigError::BadBlockSize(self.block_bytes));
        }
        if self.ways == 0 {
            return Err(ConfigError::ZeroWays);
        }
        let sets = self.size_bytes / (self.block_bytes * self.ways);
        if sets == 0 || !sets.is_power_of_two() {
            return Err(ConfigError::BadSetCount(sets));
        }
        Ok(())
    }

    /// Number of sets derived from size, block size, and associativity.
    pub fn num_sets(&self) -> u64 {
        self.size_bytes / (self.block_bytes * self.ways)
    }

    /// Number of address bits consumed by the block offset.
    pub fn block_offset_bits(&self) -> u32 {
        self.block_bytes.trailing_zeros()
    }

    /// Number of address bits consumed by the set index.
    pub fn set_index_bits(&self) -> u32 {
        self.num_sets().trailing_zeros()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::CACHE_SIZE,
            block_bytes: defaults::CACHE_BLOCK,
            ways: defaults::CACHE_WAYS,
            miss_latency: defaults::MISS_LATENCY,
        }
    }
}

/// Flat memory configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MemoryConfig {
    /// Memory image size in bytes.
    #[serde(default = "MemoryConfig::default_size")]
    pub size_bytes: u64,
}

impl MemoryConfig {
    /// Returns the default memory size in bytes.
    fn default_size() -> u64 {
        defaults::MEMORY_SIZE
    }

    /// Checks that the memory covers the fixed exception handler address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_bytes <= EXCEPTION_HANDLER_PC {
            return Err(ConfigError::MemoryTooSmall(self.size_bytes));
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::MEMORY_SIZE,
        }
    }
}

/// Root configuration: split L1 caches plus the backing memory.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct SimConfig {
    /// Instruction cache geometry and timing.
    #[serde(default)]
    pub i_cache: CacheConfig,

    /// Data cache geometry and timing.
    #[serde(default)]
    pub d_cache: CacheConfig,

    /// Backing memory.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl SimConfig {
    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.i_cache.validate()?;
        self.d_cache.validate()?;
        self.memory.validate()
    }
}
