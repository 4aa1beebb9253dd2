//! Integration tests for the vigil monitoring engine.
//!
//! These tests verify the complete monitoring lifecycle: probe → rules →
//! risk → alert delivery.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use vigil::alerts::channel::{AlertChannel, AlertSink, ChannelKind, LogSink};
use vigil::alerts::event::{AlertEvent, AlertSeverity};
use vigil::alerts::manager::{AlertManager, AlertManagerConfig, DeliveryState};
use vigil::config::MonitorConfig;
use vigil::error::{Error, Result};
use vigil::probe::adapter::StaticProbe;
use vigil::probe::health::{ComponentHealth, ComponentStatus};
use vigil::rules::engine::{
    AnomalyRule, DomainThresholds, RuleEngine, METRIC_TOTAL_ASSETS_USD,
};
use vigil::rules::events::{DomainEvent, EventType};
use vigil::scheduler::{MonitoringScheduler, SchedulerConfig};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn ts() -> DateTime<Utc> {
    "2025-06-01T12:00:00Z".parse().unwrap()
}

/// Sink that fails deliveries on the named channels and counts attempts
struct FlakySink {
    fail_channels: HashSet<String>,
    attempts: AtomicU32,
}

impl FlakySink {
    fn failing(channels: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fail_channels: channels.iter().map(|c| c.to_string()).collect(),
            attempts: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl AlertSink for FlakySink {
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

fn ops_channel() -> AlertChannel {
    AlertChannel::new("ops", ChannelKind::Slack, "#ops", 1000)
}

fn pager_channel() -> AlertChannel {
    AlertChannel::new("pager", ChannelKind::Sms, "+15550100", 1000)
        .with_severity_filter(vec![AlertSeverity::High, AlertSeverity::Critical])
}

fn manager_with(channels: Vec<AlertChannel>, sink: Arc<dyn AlertSink>) -> Arc<AlertManager> {
    Arc::new(AlertManager::new(AlertManagerConfig::default(), channels, sink).unwrap())
}

fn scheduler_with(
    rules: Vec<AnomalyRule>,
    manager: Arc<AlertManager>,
) -> MonitoringScheduler {
    let engine = RuleEngine::new(DomainThresholds::default(), rules).unwrap();
    MonitoringScheduler::new(SchedulerConfig::default(), engine, manager)
}

// ═══════════════════════════════════════════════════════════════════════════════
// FULL MONITORING LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_full_health_cycle_lifecycle() {
    let manager = manager_with(vec![ops_channel()], Arc::new(LogSink));
    let mut scheduler = scheduler_with(vec![], Arc::clone(&manager));

    // Slow oracle and drained treasury; staking healthy
    scheduler.register_probe(Arc::new(StaticProbe::new(
        ComponentHealth::new("oracle", ComponentStatus::Healthy, ts()).with_response_time(6000),
    )));
    scheduler.register_probe(Arc::new(StaticProbe::new(
        ComponentHealth::new("treasury", ComponentStatus::Healthy, ts())
            .with_metric(METRIC_TOTAL_ASSETS_USD, 5000.0),
    )));
    scheduler.register_probe(Arc::new(StaticProbe::new(
        ComponentHealth::new("staking", ComponentStatus::Healthy, ts()),
    )));

    let report = scheduler.run_cycle(ts()).await;
    assert_eq!(report.health_alerts, 2);
    assert_eq!(report.alerts_sent, 2);

    // Both alerts reached the channel
    let history = manager.history(10).await;
    assert_eq!(history.len(), 2);
    let components: HashSet<_> = history.iter().map(|a| a.component.clone()).collect();
    assert!(components.contains("oracle"));
    assert!(components.contains("treasury"));

    // Oracle breach is medium, treasury breach is critical
    let oracle = history.iter().find(|a| a.component == "oracle").unwrap();
    assert_eq!(oracle.severity, AlertSeverity::Medium);
    let treasury = history.iter().find(|a| a.component == "treasury").unwrap();
    assert_eq!(treasury.severity, AlertSeverity::Critical);

    let stats = manager.delivery_stats().await;
    assert_eq!(stats.delivered, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.success_rate, 100.0);
}

#[tokio::test]
async fn test_severity_filter_end_to_end() {
    // Pager only accepts high and critical; ops accepts everything
    let manager = manager_with(vec![ops_channel(), pager_channel()], Arc::new(LogSink));
    let mut scheduler = scheduler_with(vec![], Arc::clone(&manager));

    scheduler.register_probe(Arc::new(StaticProbe::new(
        ComponentHealth::new("oracle", ComponentStatus::Healthy, ts()).with_response_time(6000),
    )));

    scheduler.run_cycle(ts()).await;

    // The medium oracle alert was delivered once, on ops only
    let stats = manager.delivery_stats().await;
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_cooldown_across_cycles() {
    let manager = manager_with(vec![ops_channel()], Arc::new(LogSink));
    let mut scheduler = scheduler_with(vec![], Arc::clone(&manager));

    scheduler.register_probe(Arc::new(StaticProbe::new(
        ComponentHealth::new("oracle", ComponentStatus::Healthy, ts()).with_response_time(6000),
    )));

    let first = scheduler.run_cycle(ts()).await;
    assert_eq!(first.alerts_sent, 1);

    // Next health cycle re-detects the same breach; the manager's cooldown
    // (300s) keeps the channel quiet
    let second = scheduler.run_cycle(ts() + Duration::seconds(30)).await;
    assert_eq!(second.health_alerts, 1);
    assert_eq!(second.alerts_sent, 0);

    // Once the cooldown lapses the alert goes out again
    let third = scheduler.run_cycle(ts() + Duration::seconds(330)).await;
    assert_eq!(third.alerts_sent, 1);

    let stats = manager.delivery_stats().await;
    assert_eq!(stats.delivered, 2);
    assert_eq!(stats.suppressed, 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT AND RISK PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_anomaly_rule_pipeline() {
    let manager = manager_with(vec![ops_channel()], Arc::new(LogSink));
    let rules = vec![
        AnomalyRule::new(1, "login failure burst", vec![EventType::LoginFailure], 3.0, 15)
            .with_severity(AlertSeverity::High),
    ];
    let scheduler = scheduler_with(rules, Arc::clone(&manager));

    for i in 0..3 {
        scheduler
            .ingest_event(DomainEvent::new(
                EventType::LoginFailure,
                "acct-1",
                ts() + Duration::seconds(i * 10),
            ))
            .await;
    }

    let report = scheduler.run_cycle(ts() + Duration::seconds(30)).await;
    assert!(report.performance_alerts >= 1);

    let history = manager.history(10).await;
    let rule_alert = history
        .iter()
        .find(|a| a.metadata.get(AlertEvent::RULE_KEY).map(String::as_str) == Some("login failure burst"))
        .expect("rule alert present");
    assert_eq!(rule_alert.severity, AlertSeverity::High);
    assert_eq!(rule_alert.component, "acct-1");
}

#[tokio::test]
async fn test_security_violation_blocks_and_pages() {
    let manager = manager_with(vec![ops_channel(), pager_channel()], Arc::new(LogSink));
    let rules = MonitorConfig::default_rules();
    let scheduler = scheduler_with(rules, Arc::clone(&manager));

    scheduler
        .ingest_event(DomainEvent::new(EventType::SecurityViolation, "acct-9", ts()))
        .await;

    let report = scheduler.run_cycle(ts()).await;
    assert!(report.performance_alerts >= 1);
    assert!(scheduler.is_blocked("acct-9").await);

    // The critical rule alert reaches both channels
    let stats = manager.delivery_stats().await;
    assert!(stats.delivered >= 2);
}

// ═══════════════════════════════════════════════════════════════════════════════
// DELIVERY FAILURE AND RETRY
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_partial_failure_and_retry_lifecycle() {
    let sink = FlakySink::failing(&["mail"]);
    let channels = vec![
        ops_channel(),
        AlertChannel::new("mail", ChannelKind::Email, "ops@example.com", 1000),
    ];
    let manager = Arc::new(
        AlertManager::new(
            AlertManagerConfig { max_retries: 2, ..Default::default() },
            channels,
            Arc::clone(&sink) as Arc<dyn AlertSink>,
        )
        .unwrap(),
    );

    let alert = AlertEvent::new("treasury", AlertSeverity::Critical, "balance low", ts())
        .with_rule("treasury_balance");
    let outcome = manager.send_alert(alert, ts()).await;

    // One channel delivered, one failed, independently
    let delivered: Vec<_> = outcome
        .statuses()
        .iter()
        .filter(|s| s.state == DeliveryState::Delivered)
        .collect();
    let failed: Vec<_> = outcome
        .statuses()
        .iter()
        .filter(|s| s.state == DeliveryState::Failed)
        .collect();
    assert_eq!(delivered.len(), 1);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].channel, "mail");

    // First retry fails again
    let updated = manager.retry_failed_deliveries(ts() + Duration::seconds(60)).await;
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].retry_count, 1);
    assert_eq!(updated[0].state, DeliveryState::Failed);

    // Second retry reaches the cap and exhausts
    let updated = manager.retry_failed_deliveries(ts() + Duration::seconds(120)).await;
    assert_eq!(updated[0].retry_count, 2);
    assert_eq!(updated[0].state, DeliveryState::Exhausted);

    // Exhausted deliveries never retry again
    let updated = manager.retry_failed_deliveries(ts() + Duration::seconds(180)).await;
    assert!(updated.is_empty());

    let stats = manager.delivery_stats().await;
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.failed, 1);
    assert!((stats.success_rate - 50.0).abs() < f64::EPSILON);
}

// ═══════════════════════════════════════════════════════════════════════════════
// MANUAL TRIGGER AND RETENTION
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_manual_trigger_bypasses_rules() {
    let manager = manager_with(vec![ops_channel()], Arc::new(LogSink));

    // Operator-injected page, no rule evaluation involved
    let alert = AlertEvent::new("treasury", AlertSeverity::Critical, "manual page: drill", ts());
    let outcome = manager.send_alert(alert, ts()).await;

    assert!(!outcome.is_suppressed());
    assert_eq!(outcome.statuses().len(), 1);
    assert_eq!(outcome.statuses()[0].state, DeliveryState::Delivered);
}

#[tokio::test]
async fn test_retention_cleanup() {
    let manager = manager_with(vec![ops_channel()], Arc::new(LogSink));

    manager
        .send_alert(
            AlertEvent::new("oracle", AlertSeverity::Medium, "old alert", ts()).with_rule("r-old"),
            ts(),
        )
        .await;
    manager
        .send_alert(
            AlertEvent::new("oracle", AlertSeverity::Medium, "new alert", ts() + Duration::days(40))
                .with_rule("r-new"),
            ts() + Duration::days(40),
        )
        .await;

    let removed = manager.cleanup_old_alerts(30, ts() + Duration::days(40)).await;
    assert_eq!(removed, 1);

    let history = manager.history(10).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message, "new alert");

    // Delivery records are governed by their own retention
    let stats = manager.delivery_stats().await;
    assert_eq!(stats.delivered, 2);
}

#[tokio::test]
async fn test_default_config_boots_whole_stack() {
    let config = MonitorConfig::default();
    config.validate().unwrap();

    let manager = Arc::new(
        AlertManager::new(config.alerts.clone(), config.channels.clone(), Arc::new(LogSink)).unwrap(),
    );
    let engine = RuleEngine::new(config.thresholds.clone(), config.rules.clone()).unwrap();
    let mut scheduler = MonitoringScheduler::new(config.scheduler.clone(), engine, manager);

    scheduler.register_probe(Arc::new(StaticProbe::new(
        ComponentHealth::new("backend", ComponentStatus::Healthy, ts()).with_uptime(99.99),
    )));

    let report = scheduler.run_cycle(ts()).await;
    assert!(report.is_idle());
}
