//! The pipeline core: controller, stage latches, hazards, forwarding, and
//! the cache models.

/// The per-cycle stage driver.
pub mod controller;
/// Latches, hazard detection, and forwarding.
pub mod pipeline;
/// Hardware unit models (caches).
pub mod units;

pub use controller::PipelineController;
