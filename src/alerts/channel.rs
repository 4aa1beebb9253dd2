//! Notification channels and the delivery capability.
//!
//! Channel identity, endpoint, and transport are opaque to the engine:
//! delivery goes through the [`AlertSink`] trait and channels are plain
//! configuration records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::alerts::event::{AlertEvent, AlertSeverity};
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// CHANNEL
// ═══════════════════════════════════════════════════════════════════════════════

/// Transport family of a notification channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Email recipient list
    Email,
    /// Slack webhook
    Slack,
    /// SMS gateway
    Sms,
    /// Generic HTTP webhook
    Webhook,
}

impl ChannelKind {
    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::Slack => "slack",
            ChannelKind::Sms => "sms",
            ChannelKind::Webhook => "webhook",
        }
    }
}

/// One configured notification channel.
///
/// Configuration-owned and read-only during a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertChannel {
    /// Channel name, unique within the channel set
    pub name: String,
    /// Transport family
    pub kind: ChannelKind,
    /// Opaque endpoint (address, URL, routing key)
    pub endpoint: String,
    /// Whether the channel receives deliveries
    pub enabled: bool,
    /// Severities this channel accepts; empty accepts all
    pub severity_filter: Vec<AlertSeverity>,
    /// Maximum deliveries per rolling hour
    pub rate_limit_per_hour: u32,
}

impl AlertChannel {
    /// Create an enabled channel accepting all severities
    pub fn new(
        name: impl Into<String>,
        kind: ChannelKind,
        endpoint: impl Into<String>,
        rate_limit_per_hour: u32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            endpoint: endpoint.into(),
            enabled: true,
            severity_filter: Vec::new(),
            rate_limit_per_hour,
        }
    }

    /// Restrict the channel to the given severities
    pub fn with_severity_filter(mut self, severities: Vec<AlertSeverity>) -> Self {
        self.severity_filter = severities;
        self
    }

    /// Whether this channel accepts an alert of the given severity.
    ///
    /// An empty filter accepts every severity.
    pub fn accepts(&self, severity: AlertSeverity) -> bool {
        if !self.enabled {
            return false;
        }
        self.severity_filter.is_empty() || self.severity_filter.contains(&severity)
    }

    /// Reject misconfigured channels at load time
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidChannel {
                channel: format!("{}:{}", self.kind.as_str(), self.endpoint),
                reason: "name must not be empty".into(),
            });
        }
        if self.endpoint.trim().is_empty() {
            return Err(Error::InvalidChannel {
                channel: self.name.clone(),
                reason: "endpoint must not be empty".into(),
            });
        }
        if self.rate_limit_per_hour == 0 {
            return Err(Error::InvalidChannel {
                channel: self.name.clone(),
                reason: "rate limit must allow at least one delivery per hour".into(),
            });
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SINK
// ═══════════════════════════════════════════════════════════════════════════════

/// Delivery capability for notification channels.
///
/// Implementations own the actual transport (SMTP, chat API, SMS gateway,
/// HTTP). The engine only observes success or failure per attempt; the
/// manager bounds every call with a timeout.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one alert on one channel
    async fn deliver(&self, channel: &AlertChannel, alert: &AlertEvent) -> Result<()>;
}

/// Sink that writes deliveries to the log.
///
/// The default sink for local operation and tests; always succeeds.
#[derive(Debug, Default, Clone)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn deliver(&self, channel: &AlertChannel, alert: &AlertEvent) -> Result<()> {
        tracing::warn!(
            channel = %channel.name,
            kind = channel.kind.as_str(),
            alert_id = %alert.alert_id,
            component = %alert.component,
            severity = alert.severity.as_str(),
            "{}",
            alert.message
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts() -> DateTime<Utc> {
        "2025-06-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_empty_filter_accepts_all() {
        let channel = AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100);
        assert!(channel.accepts(AlertSeverity::Low));
        assert!(channel.accepts(AlertSeverity::Critical));
    }

    #[test]
    fn test_filter_restricts() {
        let channel = AlertChannel::new("pager", ChannelKind::Sms, "+15550100", 10)
            .with_severity_filter(vec![AlertSeverity::High, AlertSeverity::Critical]);
        assert!(!channel.accepts(AlertSeverity::Medium));
        assert!(channel.accepts(AlertSeverity::High));
    }

    #[test]
    fn test_disabled_channel_accepts_nothing() {
        let mut channel = AlertChannel::new("ops", ChannelKind::Email, "ops@example.com", 100);
        channel.enabled = false;
        assert!(!channel.accepts(AlertSeverity::Critical));
    }

    #[test]
    fn test_validation() {
        assert!(AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100).validate().is_ok());
        assert!(AlertChannel::new("", ChannelKind::Slack, "#ops", 100).validate().is_err());
        assert!(AlertChannel::new("ops", ChannelKind::Slack, "", 100).validate().is_err());
        assert!(AlertChannel::new("ops", ChannelKind::Slack, "#ops", 0).validate().is_err());
    }

    #[tokio::test]
    async fn test_log_sink_succeeds() {
        let channel = AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100);
        let alert = AlertEvent::new("oracle", AlertSeverity::Medium, "slow", ts());
        assert!(LogSink.deliver(&channel, &alert).await.is_ok());
    }
}
