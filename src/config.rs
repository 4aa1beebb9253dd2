//! Engine configuration.
//!
//! All thresholds, rules, channels, and pacing live in one static object
//! loaded at startup. Validation is strict: an ambiguous rule or channel
//! rejects startup rather than running with undefined behavior.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::alerts::channel::{AlertChannel, ChannelKind};
use crate::alerts::event::AlertSeverity;
use crate::alerts::manager::AlertManagerConfig;
use crate::error::{Error, Result};
use crate::rules::engine::{AnomalyRule, DomainThresholds};
use crate::rules::events::EventType;
use crate::scheduler::SchedulerConfig;

// ═══════════════════════════════════════════════════════════════════════════════
// MONITOR CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Cycle pacing and probe deadline
    pub scheduler: SchedulerConfig,
    /// Per-domain health thresholds
    pub thresholds: DomainThresholds,
    /// Cooldown, retry, and history bounds
    pub alerts: AlertManagerConfig,
    /// Anomaly rules
    pub rules: Vec<AnomalyRule>,
    /// Notification channels
    pub channels: Vec<AlertChannel>,
    /// Days of alert history to retain
    pub retention_days: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            thresholds: DomainThresholds::default(),
            alerts: AlertManagerConfig::default(),
            rules: Self::default_rules(),
            channels: vec![AlertChannel::new("ops-log", ChannelKind::Webhook, "log://ops", 600)],
            retention_days: 30,
        }
    }
}

impl MonitorConfig {
    /// Production default rule set
    pub fn default_rules() -> Vec<AnomalyRule> {
        vec![
            AnomalyRule::new(
                1,
                "login failure burst",
                vec![EventType::LoginFailure, EventType::TwoFactorFailure],
                5.0,
                15,
            )
            .with_severity(AlertSeverity::High),
            AnomalyRule::new(2, "suspicious activity cluster", vec![EventType::SuspiciousActivity], 3.0, 60)
                .with_severity(AlertSeverity::High),
            AnomalyRule::new(3, "security violation", vec![EventType::SecurityViolation], 1.0, 60)
                .with_severity(AlertSeverity::Critical)
                .with_auto_block(),
            AnomalyRule::new(4, "large transaction volume", vec![EventType::LargeTransaction], 10.0, 60),
            AnomalyRule::new(5, "compliance escalation", vec![EventType::ComplianceAlert], 2.0, 24 * 60)
                .with_severity(AlertSeverity::Critical),
        ]
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.as_ref().display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the whole configuration; any failure is fatal at startup
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.health_interval_secs == 0 || self.scheduler.performance_interval_secs == 0 {
            return Err(Error::Config("cycle intervals must be non-zero".into()));
        }
        if self.scheduler.probe_timeout_ms == 0 {
            return Err(Error::Config("probe timeout must be non-zero".into()));
        }
        if self.retention_days == 0 {
            return Err(Error::Config("retention must be at least one day".into()));
        }

        let mut rule_ids = HashSet::new();
        for rule in &self.rules {
            rule.validate()?;
            if !rule_ids.insert(rule.id) {
                return Err(Error::InvalidRule {
                    rule: rule.name.clone(),
                    reason: format!("duplicate rule id {}", rule.id),
                });
            }
        }

        let mut channel_names = HashSet::new();
        for channel in &self.channels {
            channel.validate()?;
            if !channel_names.insert(channel.name.clone()) {
                return Err(Error::InvalidChannel {
                    channel: channel.name.clone(),
                    reason: "duplicate channel name".into(),
                });
            }
        }

        Ok(())
    }
}
