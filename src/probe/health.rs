//! Component health snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT STATUS
// ═══════════════════════════════════════════════════════════════════════════════

/// Coarse health state of a monitored component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component operating normally
    Healthy,
    /// Minor issues detected
    Warning,
    /// Component failing or unreachable
    Critical,
    /// No data available
    Unknown,
}

impl ComponentStatus {
    /// Get display string
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Healthy => "HEALTHY",
            ComponentStatus::Warning => "WARNING",
            ComponentStatus::Critical => "CRITICAL",
            ComponentStatus::Unknown => "UNKNOWN",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT HEALTH
// ═══════════════════════════════════════════════════════════════════════════════

/// Point-in-time health snapshot of one monitored component.
///
/// Produced fresh each health-check cycle and never mutated afterwards;
/// a new cycle replaces the snapshot rather than updating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name ("oracle", "staking", "treasury", ...)
    pub component: String,
    /// Coarse status reported by the probe
    pub status: ComponentStatus,
    /// When the snapshot was taken
    pub last_check: DateTime<Utc>,
    /// Probe round-trip time in milliseconds
    pub response_time_ms: u64,
    /// Consecutive probe failures observed for this component
    pub error_count: u64,
    /// Uptime percentage over the component's reporting window [0, 100]
    pub uptime_percent: f64,
    /// Free-form component metrics (balances, queue depths, counters)
    pub metrics: HashMap<String, f64>,
}

impl ComponentHealth {
    /// Create a healthy snapshot with no metrics
    pub fn new(component: impl Into<String>, status: ComponentStatus, now: DateTime<Utc>) -> Self {
        Self {
            component: component.into(),
            status,
            last_check: now,
            response_time_ms: 0,
            error_count: 0,
            uptime_percent: 100.0,
            metrics: HashMap::new(),
        }
    }

    /// Set the probe round-trip time
    pub fn with_response_time(mut self, response_time_ms: u64) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    /// Set the consecutive failure count
    pub fn with_error_count(mut self, error_count: u64) -> Self {
        self.error_count = error_count;
        self
    }

    /// Set the uptime percentage, clamped to [0, 100]
    pub fn with_uptime(mut self, uptime_percent: f64) -> Self {
        self.uptime_percent = uptime_percent.clamp(0.0, 100.0);
        self
    }

    /// Attach a metric
    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    /// Synthesized snapshot for a probe that timed out or failed.
    ///
    /// The probe contract never silently drops a cycle: failures surface
    /// as a critical snapshot carrying the elapsed time and failure count.
    pub fn unreachable(
        component: impl Into<String>,
        elapsed_ms: u64,
        error_count: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            component: component.into(),
            status: ComponentStatus::Critical,
            last_check: now,
            response_time_ms: elapsed_ms,
            error_count,
            uptime_percent: 0.0,
            metrics: HashMap::new(),
        }
    }

    /// Look up a metric by key
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }

    /// Whether the component is serving traffic
    pub fn is_operational(&self) -> bool {
        matches!(self.status, ComponentStatus::Healthy | ComponentStatus::Warning)
    }
}
