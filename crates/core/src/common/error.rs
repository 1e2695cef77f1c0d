//! Error and status definitions.
//!
//! This module defines the failure vocabulary of the simulator. It provides:
//! 1. **Configuration Errors:** Rejected cache/memory geometry at construction.
//! 2. **Run Errors:** Terminal I/O failures while writing dump files.
//! 3. **Run Status:** The outcome of a bounded or unbounded run.

use std::fmt;
use std::io;

/// Outcome of a simulation run.
///
/// Faults inside the simulated program (illegal instructions, memory
/// faults) are not run outcomes; they redirect the simulated machine to the
/// exception handler and the run continues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The requested number of cycles completed without observing HALT.
    Success,
    /// The halt marker retired in writeback. Terminal.
    Halt,
}

/// Configuration rejected at construction time.
///
/// Cache geometry must satisfy the power-of-two invariants before a cache
/// is built; nothing downstream re-validates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Block size is zero or not a power of two.
    BadBlockSize(u64),
    /// Associativity is zero.
    ZeroWays,
    /// The derived set count is zero or not a power of two.
    BadSetCount(u64),
    /// Memory image too small to contain the exception handler address.
    MemoryTooSmall(u64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BadBlockSize(b) => {
                write!(f, "cache block size {} is not a power of two", b)
            }
            ConfigError::ZeroWays => write!(f, "cache associativity must be at least 1"),
            ConfigError::BadSetCount(s) => {
                write!(f, "derived set count {} is not a power of two", s)
            }
            ConfigError::MemoryTooSmall(size) => {
                write!(
                    f,
                    "memory size {:#x} does not cover the exception handler",
                    size
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Terminal simulator error.
#[derive(Debug)]
pub enum SimError {
    /// Invalid configuration.
    Config(ConfigError),
    /// Failure opening or writing a dump file.
    Io(io::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Config(e) => write!(f, "configuration error: {}", e),
            SimError::Io(e) => write!(f, "dump I/O error: {}", e),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Config(e) => Some(e),
            SimError::Io(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        SimError::Config(e)
    }
}

impl From<io::Error> for SimError {
    fn from(e: io::Error) -> Self {
        SimError::Io(e)
    }
}
