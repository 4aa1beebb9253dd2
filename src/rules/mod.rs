//! Anomaly rules and health threshold evaluation.
//!
//! - **Events**: behavioral events and the per-subject sliding window
//! - **Engine**: domain thresholds and rule evaluation

pub mod engine;
pub mod events;

pub use engine::*;
pub use events::*;
