//! Alert events and severity levels.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// ALERT SEVERITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Severity levels for alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Low - informational, no action expected
    Low,
    /// Medium - potential issue, review during business hours
    Medium,
    /// High - significant issue, prompt attention required
    High,
    /// Critical - immediate attention required
    Critical,
}

impl AlertSeverity {
    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "LOW",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
            AlertSeverity::Critical => "CRITICAL",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ALERT EVENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Monotonic suffix for generated alert ids.
static NEXT_ALERT_SEQ: AtomicU64 = AtomicU64::new(1);

/// A single alert instance.
///
/// Created by the rule engine or injected manually, consumed exactly once
/// by the alert manager. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Globally unique alert id
    pub alert_id: String,
    /// Component or subject the alert concerns
    pub component: String,
    /// Severity level
    pub severity: AlertSeverity,
    /// Human-readable message
    pub message: String,
    /// Timestamp when triggered
    pub timestamp: DateTime<Utc>,
    /// Free-form context (rule name, observed value, threshold, ...)
    pub metadata: HashMap<String, String>,
}

impl AlertEvent {
    /// Metadata key identifying the rule or check that produced the alert
    pub const RULE_KEY: &'static str = "rule";

    /// Create a new alert with a generated unique id
    pub fn new(
        component: impl Into<String>,
        severity: AlertSeverity,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let component = component.into();
        let seq = NEXT_ALERT_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            alert_id: format!("{}-{}-{}", component, timestamp.timestamp_millis(), seq),
            component,
            severity,
            message: message.into(),
            timestamp,
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach the rule identity used for cooldown fingerprinting
    pub fn with_rule(self, rule: impl Into<String>) -> Self {
        self.with_metadata(Self::RULE_KEY, rule)
    }

    /// Derived key identifying "the same" alert for cooldown purposes.
    ///
    /// Component plus rule identity; alerts carrying no rule metadata fall
    /// back to their message so manual triggers still deduplicate.
    pub fn fingerprint(&self) -> String {
        let identity = self
            .metadata
            .get(Self::RULE_KEY)
            .map(String::as_str)
            .unwrap_or(&self.message);
        format!("{}:{}", self.component, identity)
    }
}
