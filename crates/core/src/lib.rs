//! Cycle-accurate five-stage RISC-V pipeline simulator.
//!
//! This crate models a classic in-order IF/ID/EX/MEM/WB pipeline with
//! split L1 instruction and data caches. It provides:
//! 1. **Core:** The per-cycle pipeline controller, hazard detection,
//!    operand forwarding, and cache miss timing.
//! 2. **Caches:** A set-associative, write-allocate model with true-LRU
//!    replacement, shared by both cache sides.
//! 3. **Execution:** An RV64I executor behind a narrow per-stage trait,
//!    over a flat byte-addressable memory.
//! 4. **Simulation:** Configuration, program loading, per-cycle pipeline
//!    dumps, and end-of-run statistics.

/// Common types and constants (errors, registers, fixed encodings).
pub mod common;
/// Simulator configuration (cache geometry, memory size, validation).
pub mod config;
/// Pipeline controller, latches, hazards, forwarding, and caches.
pub mod core;
/// Instruction execution collaborators (executor, memory, loader).
pub mod exec;
/// Instruction set definitions and the instruction descriptor.
pub mod isa;
/// Per-cycle and end-of-run output writers.
pub mod output;
/// Statistics collection and reporting.
pub mod stats;

/// Root configuration type; deserialize from JSON or use `Default`.
pub use crate::config::SimConfig;
/// The pipeline controller; owns all timing state.
pub use crate::core::PipelineController;
/// The shipped RV64I executor.
pub use crate::exec::Rv64Executor;
/// Outcome of a run (`Success` or `Halt`).
pub use crate::common::error::RunStatus;
