//! Domain events and the sliding window they are counted over.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::event::AlertSeverity;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT TYPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Types of behavioral events fed into anomaly rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Failed login attempt
    LoginFailure,
    /// Failed two-factor verification
    TwoFactorFailure,
    /// Transaction above the large-amount threshold
    LargeTransaction,
    /// Activity flagged as suspicious by upstream heuristics
    SuspiciousActivity,
    /// Compliance rule match (sanctions, reporting thresholds)
    ComplianceAlert,
    /// Hard security violation (tamper attempt, forged request)
    SecurityViolation,
    /// Withdrawal request
    WithdrawalRequest,
}

impl EventType {
    /// Default severity used when no rule supplies an explicit one
    pub fn default_severity(&self) -> AlertSeverity {
        match self {
            EventType::LoginFailure => AlertSeverity::Medium,
            EventType::TwoFactorFailure => AlertSeverity::High,
            EventType::LargeTransaction => AlertSeverity::Medium,
            EventType::SuspiciousActivity => AlertSeverity::High,
            EventType::ComplianceAlert => AlertSeverity::High,
            EventType::SecurityViolation => AlertSeverity::Critical,
            EventType::WithdrawalRequest => AlertSeverity::Low,
        }
    }

    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::LoginFailure => "login_failure",
            EventType::TwoFactorFailure => "two_factor_failure",
            EventType::LargeTransaction => "large_transaction",
            EventType::SuspiciousActivity => "suspicious_activity",
            EventType::ComplianceAlert => "compliance_alert",
            EventType::SecurityViolation => "security_violation",
            EventType::WithdrawalRequest => "withdrawal_request",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN EVENT
// ═══════════════════════════════════════════════════════════════════════════════

/// A single behavioral event concerning one subject (account, session, node)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// What happened
    pub event_type: EventType,
    /// Subject the event concerns
    pub subject: String,
    /// When it happened
    pub timestamp: DateTime<Utc>,
    /// Free-form context
    pub metadata: HashMap<String, String>,
}

impl DomainEvent {
    /// Create a new event with no metadata
    pub fn new(event_type: EventType, subject: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type,
            subject: subject.into(),
            timestamp,
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT WINDOW
// ═══════════════════════════════════════════════════════════════════════════════

/// Bounded history of events for one subject, ordered by arrival.
///
/// Rules count matching events within a trailing time window; the window
/// boundary is always supplied by the caller so evaluation stays
/// replayable.
#[derive(Debug, Clone)]
pub struct EventWindow {
    events: VecDeque<DomainEvent>,
    max_events: usize,
}

impl EventWindow {
    /// Default capacity per subject
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Create an empty window with the given capacity
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(64)),
            max_events,
        }
    }

    /// Record an event, evicting the oldest when full
    pub fn record(&mut self, event: DomainEvent) {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Count events of the given types within the trailing window ending at
    /// `window_end`
    pub fn count_in_window(
        &self,
        types: &[EventType],
        window_end: DateTime<Utc>,
        window_minutes: u32,
    ) -> usize {
        let window_start = window_end - Duration::minutes(i64::from(window_minutes));
        self.events
            .iter()
            .filter(|e| types.contains(&e.event_type))
            .filter(|e| e.timestamp > window_start && e.timestamp <= window_end)
            .count()
    }

    /// Drop events older than `cutoff`
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) {
        while let Some(front) = self.events.front() {
            if front.timestamp < cutoff {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    /// Most recent event of one of the given types
    pub fn last_of(&self, types: &[EventType]) -> Option<&DomainEvent> {
        self.events.iter().rev().find(|e| types.contains(&e.event_type))
    }

    /// Number of stored events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the window holds no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
