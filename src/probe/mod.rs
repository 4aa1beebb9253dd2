//! Component health probing.
//!
//! - **Health**: immutable per-component snapshots
//! - **Adapter**: the probe contract and timeout degradation

pub mod adapter;
pub mod health;

pub use adapter::*;
pub use health::*;
