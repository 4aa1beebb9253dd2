//! Rule-based evaluation of health snapshots and behavioral events.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::alerts::event::{AlertEvent, AlertSeverity};
use crate::error::{Error, Result};
use crate::probe::health::{ComponentHealth, ComponentStatus};
use crate::rules::events::{DomainEvent, EventType, EventWindow};

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN THRESHOLDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Metric key reported by the staking pool probe
pub const METRIC_SLASHING_EVENTS: &str = "slashing_events";
/// Metric key reported by the treasury probe
pub const METRIC_TOTAL_ASSETS_USD: &str = "total_assets_usd";
/// Metric key reported by the auth/security probe
pub const METRIC_FAILED_AUTH_1H: &str = "failed_auth_1h";

/// Fixed per-domain health thresholds.
///
/// Each monitored domain gets exactly one threshold check per snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainThresholds {
    /// Maximum acceptable oracle probe round-trip (ms)
    pub oracle_max_response_ms: u64,
    /// Maximum tolerated slashing events before alerting
    pub staking_max_slashing_events: f64,
    /// Minimum treasury balance in USD
    pub treasury_min_balance_usd: f64,
    /// Maximum failed authentications per hour
    pub auth_max_failed_per_hour: f64,
    /// Minimum frontend/backend uptime percentage
    pub web_min_uptime_percent: f64,
}

impl Default for DomainThresholds {
    fn default() -> Self {
        Self {
            oracle_max_response_ms: 5000,
            staking_max_slashing_events: 0.0,
            treasury_min_balance_usd: 10_000.0,
            auth_max_failed_per_hour: 10.0,
            web_min_uptime_percent: 99.0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANOMALY RULE
// ═══════════════════════════════════════════════════════════════════════════════

/// Anomaly rule over a trailing event window.
///
/// Immutable after load; owned by configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyRule {
    /// Rule id, unique within the rule set
    pub id: u64,
    /// Name, used as the alert fingerprint identity
    pub name: String,
    /// Event types this rule counts
    pub event_types: Vec<EventType>,
    /// Whether the rule participates in evaluation
    pub enabled: bool,
    /// Event count at or above which the rule triggers
    pub threshold: f64,
    /// Trailing window length in minutes
    pub window_minutes: u32,
    /// Explicit severity; `None` falls back to the event type's default
    pub severity: Option<AlertSeverity>,
    /// Whether triggering also requests an immediate block of the subject
    pub auto_block: bool,
    /// Whether triggering emits an alert for delivery
    pub notification_required: bool,
}

impl AnomalyRule {
    /// Create an enabled, notifying rule
    pub fn new(
        id: u64,
        name: impl Into<String>,
        event_types: Vec<EventType>,
        threshold: f64,
        window_minutes: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            event_types,
            enabled: true,
            threshold,
            window_minutes,
            severity: None,
            auto_block: false,
            notification_required: true,
        }
    }

    /// Set an explicit severity
    pub fn with_severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Request auto-blocking when the rule triggers
    pub fn with_auto_block(mut self) -> Self {
        self.auto_block = true;
        self
    }

    /// Whether the rule applies to the given event type
    pub fn matches(&self, event_type: EventType) -> bool {
        self.event_types.contains(&event_type)
    }

    /// Effective severity for an alert on `event_type`
    pub fn severity_for(&self, event_type: EventType) -> AlertSeverity {
        self.severity.unwrap_or_else(|| event_type.default_severity())
    }

    /// Reject ambiguous rules at load time
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidRule {
                rule: format!("#{}", self.id),
                reason: "name must not be empty".into(),
            });
        }
        if self.event_types.is_empty() {
            return Err(Error::InvalidRule {
                rule: self.name.clone(),
                reason: "rule must name at least one event type".into(),
            });
        }
        if self.window_minutes == 0 {
            return Err(Error::InvalidRule {
                rule: self.name.clone(),
                reason: "window must be at least one minute".into(),
            });
        }
        if !self.threshold.is_finite() || self.threshold < 1.0 {
            return Err(Error::InvalidRule {
                rule: self.name.clone(),
                reason: format!("threshold {} must be a finite count of at least 1", self.threshold),
            });
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RULE OUTCOME
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of evaluating one event against the rule set
#[derive(Debug, Clone, Default)]
pub struct RuleOutcome {
    /// Alerts produced by triggered rules
    pub alerts: Vec<AlertEvent>,
    /// Whether any triggered rule requested an immediate block
    pub auto_block: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RULE ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Evaluates health snapshots and behavioral events against fixed
/// thresholds and anomaly rules.
///
/// Evaluation is deterministic: given the same snapshot or event history
/// and timestamps it produces the same alerts. Window boundaries come from
/// the event being evaluated, never from the wall clock.
#[derive(Debug)]
pub struct RuleEngine {
    thresholds: DomainThresholds,
    rules: Vec<AnomalyRule>,
}

impl RuleEngine {
    /// Create an engine, rejecting invalid or ambiguous rules
    pub fn new(thresholds: DomainThresholds, rules: Vec<AnomalyRule>) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            rule.validate()?;
            if !seen.insert(rule.id) {
                return Err(Error::InvalidRule {
                    rule: rule.name.clone(),
                    reason: format!("duplicate rule id {}", rule.id),
                });
            }
        }
        Ok(Self { thresholds, rules })
    }

    /// Configured rules
    pub fn rules(&self) -> &[AnomalyRule] {
        &self.rules
    }

    /// Configured thresholds
    pub fn thresholds(&self) -> &DomainThresholds {
        &self.thresholds
    }

    /// Evaluate one health snapshot against the domain thresholds.
    ///
    /// At most one threshold alert per domain, plus one availability alert
    /// when the probe itself reported the component critical. Violations
    /// are independent; one snapshot can produce several alerts.
    pub fn evaluate_health(&self, health: &ComponentHealth) -> Vec<AlertEvent> {
        let mut alerts = Vec::new();

        if let Some(alert) = self.check_domain_threshold(health) {
            alerts.push(alert);
        }

        if health.status == ComponentStatus::Critical {
            alerts.push(
                AlertEvent::new(
                    &health.component,
                    AlertSeverity::Critical,
                    format!(
                        "{} is critical: {} consecutive probe failures, last response {}ms",
                        health.component, health.error_count, health.response_time_ms
                    ),
                    health.last_check,
                )
                .with_rule("component_availability")
                .with_metadata("error_count", health.error_count.to_string()),
            );
        }

        alerts
    }

    fn check_domain_threshold(&self, health: &ComponentHealth) -> Option<AlertEvent> {
        let t = &self.thresholds;
        let component = health.component.as_str();

        if component.starts_with("oracle") {
            if health.response_time_ms > t.oracle_max_response_ms {
                return Some(
                    AlertEvent::new(
                        component,
                        AlertSeverity::Medium,
                        format!(
                            "{} response time {}ms exceeds {}ms",
                            component, health.response_time_ms, t.oracle_max_response_ms
                        ),
                        health.last_check,
                    )
                    .with_rule("oracle_response_time")
                    .with_metadata("observed_ms", health.response_time_ms.to_string())
                    .with_metadata("threshold_ms", t.oracle_max_response_ms.to_string()),
                );
            }
        } else if component.starts_with("staking") {
            let slashing = health.metric(METRIC_SLASHING_EVENTS).unwrap_or(0.0);
            if slashing > t.staking_max_slashing_events {
                return Some(
                    AlertEvent::new(
                        component,
                        AlertSeverity::Critical,
                        format!("{} reported {} slashing events", component, slashing),
                        health.last_check,
                    )
                    .with_rule("staking_slashing")
                    .with_metadata("slashing_events", slashing.to_string()),
                );
            }
        } else if component.starts_with("treasury") {
            if let Some(balance) = health.metric(METRIC_TOTAL_ASSETS_USD) {
                if balance < t.treasury_min_balance_usd {
                    return Some(
                        AlertEvent::new(
                            component,
                            AlertSeverity::Critical,
                            format!(
                                "{} balance ${:.2} below minimum ${:.2}",
                                component, balance, t.treasury_min_balance_usd
                            ),
                            health.last_check,
                        )
                        .with_rule("treasury_balance")
                        .with_metadata("balance_usd", balance.to_string())
                        .with_metadata("minimum_usd", t.treasury_min_balance_usd.to_string()),
                    );
                }
            }
        } else if component.starts_with("auth") || component.starts_with("security") {
            let failed = health.metric(METRIC_FAILED_AUTH_1H).unwrap_or(0.0);
            if failed > t.auth_max_failed_per_hour {
                return Some(
                    AlertEvent::new(
                        component,
                        AlertSeverity::High,
                        format!(
                            "{} saw {} failed authentications in the last hour (max {})",
                            component, failed, t.auth_max_failed_per_hour
                        ),
                        health.last_check,
                    )
                    .with_rule("auth_failed_logins")
                    .with_metadata("failed_auth_1h", failed.to_string()),
                );
            }
        } else if component.starts_with("frontend")
            || component.starts_with("backend")
            || component.starts_with("web")
        {
            if health.uptime_percent < t.web_min_uptime_percent {
                return Some(
                    AlertEvent::new(
                        component,
                        AlertSeverity::High,
                        format!(
                            "{} uptime {:.2}% below minimum {:.2}%",
                            component, health.uptime_percent, t.web_min_uptime_percent
                        ),
                        health.last_check,
                    )
                    .with_rule("web_uptime")
                    .with_metadata("uptime_percent", health.uptime_percent.to_string()),
                );
            }
        }

        None
    }

    /// Evaluate one event against every enabled rule covering its type.
    ///
    /// Each rule counts its event types in the trailing window ending at
    /// the event's timestamp; the boundary is computed once per rule from
    /// that timestamp, so replays are deterministic. The window must
    /// already contain the event being evaluated.
    pub fn evaluate_event(&self, event: &DomainEvent, window: &EventWindow) -> RuleOutcome {
        let mut outcome = RuleOutcome::default();

        for rule in self.rules.iter().filter(|r| r.enabled && r.matches(event.event_type)) {
            let count = window.count_in_window(&rule.event_types, event.timestamp, rule.window_minutes);
            if (count as f64) < rule.threshold {
                continue;
            }

            if rule.auto_block {
                outcome.auto_block = true;
            }

            if !rule.notification_required {
                tracing::debug!(
                    rule = %rule.name,
                    subject = %event.subject,
                    count,
                    "rule triggered without notification"
                );
                continue;
            }

            outcome.alerts.push(
                AlertEvent::new(
                    &event.subject,
                    rule.severity_for(event.event_type),
                    format!(
                        "{}: {} {} events in {} minutes (threshold {})",
                        rule.name,
                        count,
                        event.event_type.as_str(),
                        rule.window_minutes,
                        rule.threshold
                    ),
                    event.timestamp,
                )
                .with_rule(&rule.name)
                .with_metadata("event_type", event.event_type.as_str())
                .with_metadata("count", count.to_string())
                .with_metadata("threshold", rule.threshold.to_string()),
            );
        }

        outcome
    }
}
