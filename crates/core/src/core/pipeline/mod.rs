//! Pipeline building blocks: latches, hazard detection, and forwarding.

/// Operand forwarding network.
pub mod forward;
/// Hazard detection predicates.
pub mod hazards;
/// Stage latch structures and display statuses.
pub mod latches;

pub use latches::{PipelineLatches, StageLatch, StageStatus};
