//! Alert events, channels, and delivery.
//!
//! - **Event**: alert instances and severity levels
//! - **Channel**: channel configuration and the delivery capability
//! - **Manager**: cooldown, rate limiting, concurrent dispatch, retry

pub mod channel;
pub mod event;
pub mod manager;

pub use channel::*;
pub use event::*;
pub use manager::*;
