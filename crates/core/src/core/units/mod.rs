//! Hardware unit models owned by the pipeline controller.

/// Set-associative cache model with true-LRU replacement.
pub mod cache;

pub use cache::{AccessOutcome, Cache, CacheKind, CacheOp};
