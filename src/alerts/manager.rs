//! Alert delivery with cooldown suppression, rate limiting, and retry.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::alerts::channel::{AlertChannel, AlertSink};
use crate::alerts::event::AlertEvent;
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// DELIVERY STATUS
// ═══════════════════════════════════════════════════════════════════════════════

/// Delivery state for one (alert, channel) pair.
///
/// `Pending → Delivered`, or `Pending → Failed → ... → Delivered` via
/// retries, or `Failed → Exhausted` once the retry budget is consumed.
/// `Delivered` and `Exhausted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    /// Dispatch in progress
    Pending,
    /// Delivery confirmed
    Delivered,
    /// Delivery failed; eligible for retry
    Failed,
    /// Retry budget consumed without success
    Exhausted,
}

/// Delivery record for one (alert, channel) pair.
///
/// Only `state`, `retry_count`, `error`, and `timestamp` change after
/// creation; `retry_count` never decreases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Alert this delivery belongs to
    pub alert_id: String,
    /// Channel name
    pub channel: String,
    /// Current state
    pub state: DeliveryState,
    /// Last attempt time
    pub timestamp: DateTime<Utc>,
    /// Attempts beyond the first
    pub retry_count: u32,
    /// Failure details from the last attempt
    pub error: Option<String>,
}

impl DeliveryStatus {
    fn pending(alert_id: impl Into<String>, channel: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            alert_id: alert_id.into(),
            channel: channel.into(),
            state: DeliveryState::Pending,
            timestamp: now,
            retry_count: 0,
            error: None,
        }
    }

    fn mark_delivered(&mut self, now: DateTime<Utc>) {
        self.state = DeliveryState::Delivered;
        self.timestamp = now;
        self.error = None;
    }

    fn mark_failed(&mut self, error: &Error, now: DateTime<Utc>) {
        self.state = DeliveryState::Failed;
        self.timestamp = now;
        self.error = Some(error.to_string());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEND OUTCOME & STATS
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of submitting one alert for delivery
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// Cooldown suppressed the alert; no channel was contacted
    Suppressed,
    /// Delivery was attempted; one status per contacted channel
    Dispatched(Vec<DeliveryStatus>),
}

impl SendOutcome {
    /// Whether the alert was cooldown-suppressed
    pub fn is_suppressed(&self) -> bool {
        matches!(self, SendOutcome::Suppressed)
    }

    /// Delivery statuses (empty when suppressed or no channel was eligible)
    pub fn statuses(&self) -> &[DeliveryStatus] {
        match self {
            SendOutcome::Suppressed => &[],
            SendOutcome::Dispatched(statuses) => statuses,
        }
    }
}

/// Aggregated delivery statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryStats {
    /// Alerts accepted for delivery (suppressed alerts excluded)
    pub total_alerts: u64,
    /// Deliveries confirmed
    pub delivered: u64,
    /// Deliveries failed or exhausted
    pub failed: u64,
    /// delivered / attempted * 100; 0 when nothing was attempted
    pub success_rate: f64,
    /// Alerts dropped by cooldown suppression
    pub suppressed: u64,
    /// Channel dispatches skipped by rate limiting (never attempted)
    pub rate_limited_skips: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration for the alert manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertManagerConfig {
    /// Minimum seconds between deliveries of the same alert fingerprint
    pub cooldown_secs: u64,
    /// Maximum redelivery attempts per failed (alert, channel) pair
    pub max_retries: u32,
    /// Maximum alerts retained in history
    pub max_history: usize,
    /// Deadline per delivery attempt in milliseconds
    pub delivery_timeout_ms: u64,
}

impl Default for AlertManagerConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 300,
            max_retries: 3,
            max_history: 10_000,
            delivery_timeout_ms: 10_000,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ALERT MANAGER
// ═══════════════════════════════════════════════════════════════════════════════

/// The only mutable state in the engine: cooldowns, rate counters,
/// delivery records, and alert history, guarded by one lock.
#[derive(Debug, Default)]
struct ManagerState {
    /// Fingerprint -> last dispatch time
    cooldowns: HashMap<String, DateTime<Utc>>,
    /// Channel name -> dispatch times within the rolling hour
    rate_windows: HashMap<String, VecDeque<DateTime<Utc>>>,
    /// All delivery records, append-only
    statuses: Vec<DeliveryStatus>,
    /// Accepted alerts, bounded
    history: VecDeque<AlertEvent>,
    total_alerts: u64,
    suppressed: u64,
    rate_limited_skips: u64,
}

/// Accepts alerts and fans them out to every eligible channel.
///
/// Cooldown suppression happens before any channel is contacted; eligible
/// channels are dispatched concurrently and independently, each attempt
/// bounded by the delivery timeout. Failed deliveries are retried on
/// request up to the configured cap.
pub struct AlertManager {
    config: AlertManagerConfig,
    channels: Vec<AlertChannel>,
    sink: Arc<dyn AlertSink>,
    state: Mutex<ManagerState>,
}

impl AlertManager {
    /// Create a manager, rejecting misconfigured channels
    pub fn new(
        config: AlertManagerConfig,
        channels: Vec<AlertChannel>,
        sink: Arc<dyn AlertSink>,
    ) -> Result<Self> {
        let mut names = HashSet::new();
        for channel in &channels {
            channel.validate()?;
            if !names.insert(channel.name.clone()) {
                return Err(Error::InvalidChannel {
                    channel: channel.name.clone(),
                    reason: "duplicate channel name".into(),
                });
            }
        }
        Ok(Self {
            config,
            channels,
            sink,
            state: Mutex::new(ManagerState::default()),
        })
    }

    /// Configured channels
    pub fn channels(&self) -> &[AlertChannel] {
        &self.channels
    }

    /// Submit one alert for delivery.
    ///
    /// Also the manual-trigger entry point: callers may inject a literal
    /// [`AlertEvent`] directly, bypassing rule evaluation.
    pub async fn send_alert(&self, alert: AlertEvent, now: DateTime<Utc>) -> SendOutcome {
        let eligible = {
            let mut state = self.state.lock().await;

            let fingerprint = alert.fingerprint();
            let cooldown = Duration::seconds(self.config.cooldown_secs as i64);
            if let Some(last) = state.cooldowns.get(&fingerprint) {
                if now.signed_duration_since(*last) < cooldown {
                    state.suppressed += 1;
                    tracing::debug!(
                        alert_id = %alert.alert_id,
                        fingerprint = %fingerprint,
                        "alert suppressed by cooldown"
                    );
                    return SendOutcome::Suppressed;
                }
            }
            // Armed when dispatch begins, so a failing channel cannot cause
            // a storm of re-dispatches inside the window
            state.cooldowns.insert(fingerprint, now);

            let mut eligible = Vec::new();
            for channel in &self.channels {
                if !channel.accepts(alert.severity) {
                    continue;
                }
                let window = state.rate_windows.entry(channel.name.clone()).or_default();
                while window
                    .front()
                    .is_some_and(|t| now.signed_duration_since(*t) >= Duration::hours(1))
                {
                    window.pop_front();
                }
                if window.len() as u32 >= channel.rate_limit_per_hour {
                    state.rate_limited_skips += 1;
                    tracing::debug!(
                        channel = %channel.name,
                        alert_id = %alert.alert_id,
                        "rate limit reached, channel skipped"
                    );
                    continue;
                }
                window.push_back(now);
                eligible.push(channel.clone());
            }

            state.total_alerts += 1;
            if state.history.len() >= self.config.max_history {
                state.history.pop_front();
            }
            state.history.push_back(alert.clone());

            eligible
        };

        // Fan out concurrently; one failing channel never blocks the others
        let mut attempts = JoinSet::new();
        for channel in eligible {
            let sink = Arc::clone(&self.sink);
            let alert = alert.clone();
            let timeout_ms = self.config.delivery_timeout_ms;
            attempts.spawn(async move {
                let result = Self::attempt(sink.as_ref(), &channel, &alert, timeout_ms).await;
                (channel.name, result)
            });
        }

        let mut statuses = Vec::new();
        while let Some(joined) = attempts.join_next().await {
            let Ok((channel_name, result)) = joined else {
                tracing::error!(alert_id = %alert.alert_id, "delivery task aborted");
                continue;
            };
            let mut status = DeliveryStatus::pending(&alert.alert_id, &channel_name, now);
            match result {
                Ok(()) => status.mark_delivered(now),
                Err(err) => {
                    tracing::warn!(
                        channel = %channel_name,
                        alert_id = %alert.alert_id,
                        error = %err,
                        "delivery failed"
                    );
                    status.mark_failed(&err, now);
                }
            }
            statuses.push(status);
        }

        let mut state = self.state.lock().await;
        state.statuses.extend(statuses.iter().cloned());
        SendOutcome::Dispatched(statuses)
    }

    /// One bounded delivery attempt
    async fn attempt(
        sink: &dyn AlertSink,
        channel: &AlertChannel,
        alert: &AlertEvent,
        timeout_ms: u64,
    ) -> Result<()> {
        let timeout = std::time::Duration::from_millis(timeout_ms);
        match tokio::time::timeout(timeout, sink.deliver(channel, alert)).await {
            Ok(result) => result,
            Err(_) => Err(Error::DeliveryTimeout {
                channel: channel.name.clone(),
                timeout_ms,
            }),
        }
    }

    /// Re-attempt every failed delivery.
    ///
    /// Each failed status gets exactly one additional attempt and
    /// `retry_count + 1`; statuses reaching the retry cap without success
    /// become `Exhausted` and leave the retry pool.
    pub async fn retry_failed_deliveries(&self, now: DateTime<Utc>) -> Vec<DeliveryStatus> {
        let work: Vec<(usize, AlertChannel, AlertEvent)> = {
            let state = self.state.lock().await;
            state
                .statuses
                .iter()
                .enumerate()
                .filter(|(_, s)| s.state == DeliveryState::Failed)
                .filter_map(|(idx, s)| {
                    let channel = self.channels.iter().find(|c| c.name == s.channel)?.clone();
                    let alert = state.history.iter().find(|a| a.alert_id == s.alert_id)?.clone();
                    Some((idx, channel, alert))
                })
                .collect()
        };

        let mut updated = Vec::new();
        for (idx, channel, alert) in work {
            let result =
                Self::attempt(self.sink.as_ref(), &channel, &alert, self.config.delivery_timeout_ms)
                    .await;

            let mut state = self.state.lock().await;
            let status = &mut state.statuses[idx];
            if status.state != DeliveryState::Failed {
                // Another caller resolved this status while we were delivering
                continue;
            }
            status.retry_count += 1;
            status.timestamp = now;
            match result {
                Ok(()) => {
                    status.state = DeliveryState::Delivered;
                    status.error = None;
                }
                Err(err) => {
                    status.error = Some(err.to_string());
                    if status.retry_count >= self.config.max_retries {
                        status.state = DeliveryState::Exhausted;
                        tracing::warn!(
                            channel = %channel.name,
                            alert_id = %alert.alert_id,
                            retries = status.retry_count,
                            "delivery retries exhausted"
                        );
                    }
                }
            }
            updated.push(status.clone());
        }
        updated
    }

    /// Aggregate delivery statistics
    pub async fn delivery_stats(&self) -> DeliveryStats {
        let state = self.state.lock().await;
        let delivered = state
            .statuses
            .iter()
            .filter(|s| s.state == DeliveryState::Delivered)
            .count() as u64;
        let failed = state
            .statuses
            .iter()
            .filter(|s| matches!(s.state, DeliveryState::Failed | DeliveryState::Exhausted))
            .count() as u64;
        let attempted = delivered + failed;
        let success_rate = if attempted == 0 {
            0.0
        } else {
            delivered as f64 / attempted as f64 * 100.0
        };
        DeliveryStats {
            total_alerts: state.total_alerts,
            delivered,
            failed,
            success_rate,
            suppressed: state.suppressed,
            rate_limited_skips: state.rate_limited_skips,
        }
    }

    /// Drop history entries older than the retention window.
    ///
    /// Delivery records keep their own lifetime and are not touched.
    pub async fn cleanup_old_alerts(&self, retention_days: u32, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(i64::from(retention_days));
        let mut state = self.state.lock().await;
        let before = state.history.len();
        state.history.retain(|a| a.timestamp >= cutoff);
        let removed = before - state.history.len();
        if removed > 0 {
            tracing::info!(removed, retention_days, "pruned alert history");
        }
        removed
    }

    /// Most recent alerts, newest first
    pub async fn history(&self, limit: usize) -> Vec<AlertEvent> {
        let state = self.state.lock().await;
        state.history.iter().rev().take(limit).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::channel::{ChannelKind, LogSink};
    use crate::alerts::event::AlertSeverity;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn ts() -> DateTime<Utc> {
        "2025-06-01T12:00:00Z".parse().unwrap()
    }

    /// Sink failing every delivery on the named channels
    struct ScriptedSink {
        fail_channels: HashSet<String>,
        attempts: AtomicU32,
    }

    impl ScriptedSink {
        fn failing(channels: &[&str]) -> Self {
            Self {
                fail_channels: channels.iter().map(|c| c.to_string()).collect(),
                attempts: AtomicU32::new(0),
            }
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl AlertSink for ScriptedSink {
        async fn deliver(&self, channel: &AlertChannel, _alert: &AlertEvent) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            if self.fail_channels.contains(&channel.name) {
                Err(Error::ChannelDelivery {
                    channel: channel.name.clone(),
                    details: "simulated outage".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn manager_with(
        channels: Vec<AlertChannel>,
        sink: Arc<dyn AlertSink>,
        config: AlertManagerConfig,
    ) -> AlertManager {
        AlertManager::new(config, channels, sink).unwrap()
    }

    fn alert(component: &str, severity: AlertSeverity, rule: &str) -> AlertEvent {
        AlertEvent::new(component, severity, format!("{} fired", rule), ts()).with_rule(rule)
    }

    #[tokio::test]
    async fn test_delivers_to_all_eligible_channels() {
        let manager = manager_with(
            vec![
                AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100),
                AlertChannel::new("mail", ChannelKind::Email, "ops@example.com", 100),
            ],
            Arc::new(LogSink),
            AlertManagerConfig::default(),
        );

        let outcome = manager.send_alert(alert("oracle", AlertSeverity::Medium, "r1"), ts()).await;
        assert_eq!(outcome.statuses().len(), 2);
        assert!(outcome.statuses().iter().all(|s| s.state == DeliveryState::Delivered));
    }

    #[tokio::test]
    async fn test_severity_filter_skips_channel() {
        let manager = manager_with(
            vec![
                AlertChannel::new("pager", ChannelKind::Sms, "+15550100", 100)
                    .with_severity_filter(vec![AlertSeverity::High, AlertSeverity::Critical]),
                AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100),
            ],
            Arc::new(LogSink),
            AlertManagerConfig::default(),
        );

        let outcome = manager.send_alert(alert("oracle", AlertSeverity::Medium, "r1"), ts()).await;
        let channels: Vec<_> = outcome.statuses().iter().map(|s| s.channel.as_str()).collect();
        assert_eq!(channels, vec!["ops"]);
    }

    #[tokio::test]
    async fn test_cooldown_suppresses_duplicate() {
        let manager = manager_with(
            vec![AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100)],
            Arc::new(LogSink),
            AlertManagerConfig { cooldown_secs: 300, ..Default::default() },
        );

        let first = manager.send_alert(alert("oracle", AlertSeverity::Medium, "r1"), ts()).await;
        assert!(!first.is_suppressed());

        // Same fingerprint inside the window
        let second = manager
            .send_alert(alert("oracle", AlertSeverity::Medium, "r1"), ts() + Duration::seconds(60))
            .await;
        assert!(second.is_suppressed());

        // After the window a full delivery happens again
        let third = manager
            .send_alert(alert("oracle", AlertSeverity::Medium, "r1"), ts() + Duration::seconds(301))
            .await;
        assert!(!third.is_suppressed());
        assert_eq!(third.statuses().len(), 1);
    }

    #[tokio::test]
    async fn test_different_fingerprints_not_suppressed() {
        let manager = manager_with(
            vec![AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100)],
            Arc::new(LogSink),
            AlertManagerConfig::default(),
        );

        manager.send_alert(alert("oracle", AlertSeverity::Medium, "r1"), ts()).await;
        let other = manager.send_alert(alert("treasury", AlertSeverity::Medium, "r1"), ts()).await;
        assert!(!other.is_suppressed());
    }

    #[tokio::test]
    async fn test_rate_limit_skips_not_fails() {
        let manager = manager_with(
            vec![AlertChannel::new("ops", ChannelKind::Slack, "#ops", 2)],
            Arc::new(LogSink),
            AlertManagerConfig::default(),
        );

        for i in 0..3 {
            let rule = format!("r{}", i);
            manager
                .send_alert(alert("oracle", AlertSeverity::Medium, &rule), ts() + Duration::seconds(i))
                .await;
        }

        let stats = manager.delivery_stats().await;
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.rate_limited_skips, 1);
        assert_eq!(stats.total_alerts, 3);
    }

    #[tokio::test]
    async fn test_rate_window_slides() {
        let manager = manager_with(
            vec![AlertChannel::new("ops", ChannelKind::Slack, "#ops", 1)],
            Arc::new(LogSink),
            AlertManagerConfig::default(),
        );

        manager.send_alert(alert("oracle", AlertSeverity::Medium, "r1"), ts()).await;
        // An hour later the window has emptied
        let later = manager
            .send_alert(alert("treasury", AlertSeverity::Medium, "r2"), ts() + Duration::hours(1))
            .await;
        assert_eq!(later.statuses().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_independent() {
        let sink = Arc::new(ScriptedSink::failing(&["mail"]));
        let manager = manager_with(
            vec![
                AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100),
                AlertChannel::new("mail", ChannelKind::Email, "ops@example.com", 100),
            ],
            sink,
            AlertManagerConfig::default(),
        );

        let outcome = manager.send_alert(alert("oracle", AlertSeverity::Medium, "r1"), ts()).await;
        let delivered: Vec<_> = outcome
            .statuses()
            .iter()
            .filter(|s| s.state == DeliveryState::Delivered)
            .map(|s| s.channel.as_str())
            .collect();
        let failed: Vec<_> = outcome
            .statuses()
            .iter()
            .filter(|s| s.state == DeliveryState::Failed)
            .map(|s| s.channel.as_str())
            .collect();
        assert_eq!(delivered, vec!["ops"]);
        assert_eq!(failed, vec!["mail"]);
    }

    #[tokio::test]
    async fn test_retry_increments_and_exhausts() {
        let sink = Arc::new(ScriptedSink::failing(&["mail"]));
        let manager = manager_with(
            vec![AlertChannel::new("mail", ChannelKind::Email, "ops@example.com", 100)],
            Arc::clone(&sink) as Arc<dyn AlertSink>,
            AlertManagerConfig { max_retries: 3, ..Default::default() },
        );

        manager.send_alert(alert("oracle", AlertSeverity::Medium, "r1"), ts()).await;

        for expected_retry in 1..=2u32 {
            let updated = manager.retry_failed_deliveries(ts()).await;
            assert_eq!(updated.len(), 1);
            assert_eq!(updated[0].retry_count, expected_retry);
            assert_eq!(updated[0].state, DeliveryState::Failed);
        }

        // Third retry reaches the cap
        let updated = manager.retry_failed_deliveries(ts()).await;
        assert_eq!(updated[0].retry_count, 3);
        assert_eq!(updated[0].state, DeliveryState::Exhausted);

        // Exhausted statuses leave the retry pool
        let attempts_before = sink.attempts();
        let updated = manager.retry_failed_deliveries(ts()).await;
        assert!(updated.is_empty());
        assert_eq!(sink.attempts(), attempts_before);
    }

    #[tokio::test]
    async fn test_retry_recovers_after_outage() {
        // Fails nothing: simulates the channel coming back before the retry
        struct RecoveringSink {
            remaining_failures: AtomicU32,
        }

        #[async_trait]
        impl AlertSink for RecoveringSink {
            async fn deliver(&self, channel: &AlertChannel, _alert: &AlertEvent) -> Result<()> {
                if self.remaining_failures.load(Ordering::Relaxed) > 0 {
                    self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
                    Err(Error::ChannelDelivery {
                        channel: channel.name.clone(),
                        details: "simulated outage".into(),
                    })
                } else {
                    Ok(())
                }
            }
        }

        let manager = manager_with(
            vec![AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100)],
            Arc::new(RecoveringSink { remaining_failures: AtomicU32::new(1) }),
            AlertManagerConfig { max_retries: 3, ..Default::default() },
        );

        manager.send_alert(alert("oracle", AlertSeverity::Medium, "r1"), ts()).await;
        let updated = manager.retry_failed_deliveries(ts()).await;
        assert_eq!(updated[0].state, DeliveryState::Delivered);
        assert_eq!(updated[0].retry_count, 1);

        let stats = manager.delivery_stats().await;
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_delivery_stats_success_rate() {
        let sink = Arc::new(ScriptedSink::failing(&["mail"]));
        let manager = manager_with(
            vec![
                AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100),
                AlertChannel::new("pager", ChannelKind::Sms, "+15550100", 100),
                AlertChannel::new("mail", ChannelKind::Email, "ops@example.com", 100),
            ],
            sink,
            AlertManagerConfig::default(),
        );

        manager.send_alert(alert("oracle", AlertSeverity::Medium, "r1"), ts()).await;

        let stats = manager.delivery_stats().await;
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.failed, 1);
        assert!((stats.success_rate - 66.67).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_stats_empty() {
        let manager = manager_with(
            vec![AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100)],
            Arc::new(LogSink),
            AlertManagerConfig::default(),
        );
        let stats = manager.delivery_stats().await;
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.total_alerts, 0);
    }

    #[tokio::test]
    async fn test_cleanup_prunes_history_not_statuses() {
        let manager = manager_with(
            vec![AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100)],
            Arc::new(LogSink),
            AlertManagerConfig::default(),
        );

        manager.send_alert(alert("oracle", AlertSeverity::Medium, "r1"), ts()).await;
        manager
            .send_alert(
                AlertEvent::new("treasury", AlertSeverity::Critical, "fresh", ts() + Duration::days(10))
                    .with_rule("r2"),
                ts() + Duration::days(10),
            )
            .await;

        let removed = manager.cleanup_old_alerts(7, ts() + Duration::days(10)).await;
        assert_eq!(removed, 1);
        assert_eq!(manager.history(10).await.len(), 1);

        // Delivery records survive history cleanup
        let stats = manager.delivery_stats().await;
        assert_eq!(stats.delivered, 2);
    }

    #[tokio::test]
    async fn test_duplicate_channel_names_rejected() {
        let result = AlertManager::new(
            AlertManagerConfig::default(),
            vec![
                AlertChannel::new("ops", ChannelKind::Slack, "#ops", 100),
                AlertChannel::new("ops", ChannelKind::Email, "ops@example.com", 100),
            ],
            Arc::new(LogSink),
        );
        assert!(result.is_err());
    }
}
