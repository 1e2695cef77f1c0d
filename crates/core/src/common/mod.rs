//! Common types and constants shared across the simulator.

/// Fixed encodings, addresses, and instruction field masks.
pub mod constants;
/// Error and status definitions.
pub mod error;
/// Integer register file.
pub mod reg;

pub use error::{ConfigError, RunStatus, SimError};
pub use reg::RegisterFile;
