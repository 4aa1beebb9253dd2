//! # Vigil
//!
//! Health-monitoring and alert-delivery engine for distributed financial
//! platforms.
//!
//! ## Architecture
//!
//! The engine consists of several core modules:
//!
//! - **Probe**: component health contract and timeout degradation
//! - **Rules**: domain thresholds and anomaly rules over event windows
//! - **Risk**: behavioral risk scoring and auto-block decisions
//! - **Alerts**: delivery with cooldown, rate limiting, and retry
//! - **Scheduler**: periodic health and performance cycles
//!
//! ## Design Principles
//!
//! - **Deterministic**: evaluation takes explicit timestamps; replays are
//!   exact
//! - **Degrading**: a failing probe or channel never aborts a cycle
//! - **Bounded**: every I/O-shaped call carries a timeout, every store a cap
//! - **Modular**: pure evaluation functions around one stateful manager
//!
//! ## Example
//!
//! ```rust,ignore
//! use vigil::prelude::*;
//!
//! let config = MonitorConfig::default();
//! let engine = RuleEngine::new(config.thresholds, config.rules)?;
//! let manager = Arc::new(AlertManager::new(config.alerts, config.channels, sink)?);
//! let scheduler = MonitoringScheduler::new(config.scheduler, engine, manager);
//!
//! let report = scheduler.run_cycle(Utc::now()).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod alerts;
pub mod config;
pub mod error;
pub mod probe;
pub mod risk;
pub mod rules;
pub mod scheduler;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::alerts::{
        channel::{AlertChannel, AlertSink, ChannelKind, LogSink},
        event::{AlertEvent, AlertSeverity},
        manager::{AlertManager, AlertManagerConfig, DeliveryState, DeliveryStatus, SendOutcome},
    };
    pub use crate::config::MonitorConfig;
    pub use crate::error::{Error, Result};
    pub use crate::probe::{
        adapter::{HealthProbe, StaticProbe},
        health::{ComponentHealth, ComponentStatus},
    };
    pub use crate::risk::scorer::{RiskFactors, RiskLevel};
    pub use crate::rules::{
        engine::{AnomalyRule, DomainThresholds, RuleEngine},
        events::{DomainEvent, EventType, EventWindow},
    };
    pub use crate::scheduler::{CycleReport, MonitoringScheduler, SchedulerConfig};
}

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name
pub const ENGINE_NAME: &str = "vigil";
