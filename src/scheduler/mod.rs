//! Periodic monitoring cycles.
//!
//! The scheduler composes the engine: it probes every registered
//! component on the health interval, evaluates behavioral events and risk
//! scores on the performance interval, and routes resulting alerts to the
//! alert manager. It owns only cycle state (last-run timestamps, probe
//! failure counters, per-subject event windows); invoke [`MonitoringScheduler::run_cycle`]
//! from any external timer — cycles that are not due are skipped without
//! blocking.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::alerts::event::{AlertEvent, AlertSeverity};
use crate::alerts::manager::AlertManager;
use crate::probe::adapter::{probe_with_timeout, HealthProbe};
use crate::probe::health::ComponentHealth;
use crate::risk::scorer::{self, RiskFactors, RiskLevel};
use crate::rules::engine::RuleEngine;
use crate::rules::events::{DomainEvent, EventType, EventWindow};

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration for the monitoring scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between health cycles
    pub health_interval_secs: u64,
    /// Seconds between performance/risk cycles
    pub performance_interval_secs: u64,
    /// Deadline per probe call in milliseconds
    pub probe_timeout_ms: u64,
    /// Trailing window used to derive risk counters, in minutes
    pub risk_window_minutes: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            health_interval_secs: 30,
            performance_interval_secs: 60,
            probe_timeout_ms: 5000,
            risk_window_minutes: 24 * 60,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CYCLE REPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// Summary of one scheduler invocation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CycleReport {
    /// Alerts produced by health threshold checks
    pub health_alerts: u64,
    /// Alerts produced by anomaly rules and risk scoring
    pub performance_alerts: u64,
    /// Alerts dispatched to channels (cooldown-suppressed alerts excluded)
    pub alerts_sent: u64,
}

impl CycleReport {
    /// Whether the invocation did any work
    pub fn is_idle(&self) -> bool {
        self.health_alerts == 0 && self.performance_alerts == 0 && self.alerts_sent == 0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCHEDULER STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-subject risk context
#[derive(Debug, Default)]
struct SubjectProfile {
    kyc_tier: u8,
    account_age_days: u32,
    window: EventWindow,
    blocked: bool,
}

/// Mutable cycle state, guarded by one lock
#[derive(Debug, Default)]
struct SchedulerState {
    last_health_run: Option<DateTime<Utc>>,
    last_performance_run: Option<DateTime<Utc>>,
    /// Consecutive probe failures per component
    error_counts: HashMap<String, u64>,
    /// Most recent snapshot per component
    latest_health: HashMap<String, ComponentHealth>,
    /// Events awaiting the next performance cycle
    pending_events: VecDeque<DomainEvent>,
    subjects: HashMap<String, SubjectProfile>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// MONITORING SCHEDULER
// ═══════════════════════════════════════════════════════════════════════════════

/// Orchestrates health and performance cycles.
pub struct MonitoringScheduler {
    config: SchedulerConfig,
    probes: Vec<Arc<dyn HealthProbe>>,
    engine: RuleEngine,
    manager: Arc<AlertManager>,
    enabled: AtomicBool,
    state: Mutex<SchedulerState>,
}

impl MonitoringScheduler {
    /// Create a scheduler with no registered probes
    pub fn new(config: SchedulerConfig, engine: RuleEngine, manager: Arc<AlertManager>) -> Self {
        Self {
            config,
            probes: Vec::new(),
            engine,
            manager,
            enabled: AtomicBool::new(true),
            state: Mutex::new(SchedulerState::default()),
        }
    }

    /// Register a component probe
    pub fn register_probe(&mut self, probe: Arc<dyn HealthProbe>) {
        self.probes.push(probe);
    }

    /// Turn monitoring on or off; when off, cycles are no-ops
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        tracing::info!(enabled, "monitoring toggled");
    }

    /// Whether monitoring is active
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Queue a behavioral event for the next performance cycle
    pub async fn ingest_event(&self, event: DomainEvent) {
        let mut state = self.state.lock().await;
        state.pending_events.push_back(event);
    }

    /// Seed account attributes used by the risk scorer
    pub async fn register_subject(&self, subject: impl Into<String>, kyc_tier: u8, account_age_days: u32) {
        let mut state = self.state.lock().await;
        let profile = state.subjects.entry(subject.into()).or_default();
        profile.kyc_tier = kyc_tier;
        profile.account_age_days = account_age_days;
    }

    /// Whether a subject has been auto-blocked
    pub async fn is_blocked(&self, subject: &str) -> bool {
        let state = self.state.lock().await;
        state.subjects.get(subject).is_some_and(|p| p.blocked)
    }

    /// Most recent health snapshot per component
    pub async fn latest_health(&self) -> HashMap<String, ComponentHealth> {
        let state = self.state.lock().await;
        state.latest_health.clone()
    }

    /// Run whichever cycles are due at `now`.
    ///
    /// Cheap when nothing is due; callers may invoke this as often as they
    /// like. Errors inside a cycle degrade individual probes or deliveries
    /// and never abort the report.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        if !self.is_enabled() {
            return CycleReport::default();
        }

        let (health_due, performance_due) = {
            let mut state = self.state.lock().await;
            let health_due = state.last_health_run.map_or(true, |t| {
                now.signed_duration_since(t)
                    >= Duration::seconds(self.config.health_interval_secs as i64)
            });
            if health_due {
                state.last_health_run = Some(now);
            }
            let performance_due = state.last_performance_run.map_or(true, |t| {
                now.signed_duration_since(t)
                    >= Duration::seconds(self.config.performance_interval_secs as i64)
            });
            if performance_due {
                state.last_performance_run = Some(now);
            }
            (health_due, performance_due)
        };

        let mut report = CycleReport::default();

        if health_due {
            let (alerts, sent) = self.run_health_cycle(now).await;
            report.health_alerts += alerts;
            report.alerts_sent += sent;
        }

        if performance_due {
            let (alerts, sent) = self.run_performance_cycle(now).await;
            report.performance_alerts += alerts;
            report.alerts_sent += sent;
        }

        if !report.is_idle() {
            tracing::info!(
                health_alerts = report.health_alerts,
                performance_alerts = report.performance_alerts,
                alerts_sent = report.alerts_sent,
                "monitoring cycle complete"
            );
        }
        report
    }

    /// Probe every component concurrently and evaluate the snapshots
    async fn run_health_cycle(&self, now: DateTime<Utc>) -> (u64, u64) {
        let prior_errors: HashMap<String, u64> = {
            let state = self.state.lock().await;
            state.error_counts.clone()
        };

        let timeout = std::time::Duration::from_millis(self.config.probe_timeout_ms);
        let mut probes = JoinSet::new();
        for probe in &self.probes {
            let probe = Arc::clone(probe);
            let prior = prior_errors.get(probe.component()).copied().unwrap_or(0);
            probes.spawn(async move {
                probe_with_timeout(probe.as_ref(), timeout, prior, now).await
            });
        }

        let mut snapshots = Vec::new();
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(health) => snapshots.push(health),
                Err(err) => tracing::error!(error = %err, "probe task aborted"),
            }
        }

        {
            let mut state = self.state.lock().await;
            for health in &snapshots {
                state.error_counts.insert(health.component.clone(), health.error_count);
                state.latest_health.insert(health.component.clone(), health.clone());
            }
        }

        let mut health_alerts = 0u64;
        let mut sent = 0u64;
        for health in &snapshots {
            for alert in self.engine.evaluate_health(health) {
                health_alerts += 1;
                if !self.manager.send_alert(alert, now).await.is_suppressed() {
                    sent += 1;
                }
            }
        }
        (health_alerts, sent)
    }

    /// Drain queued events through the rules, then score each active subject
    async fn run_performance_cycle(&self, now: DateTime<Utc>) -> (u64, u64) {
        let mut alerts = Vec::new();

        {
            let mut state = self.state.lock().await;
            let events: Vec<DomainEvent> = state.pending_events.drain(..).collect();

            for event in events {
                let profile = state.subjects.entry(event.subject.clone()).or_default();
                profile.window.record(event.clone());

                let outcome = self.engine.evaluate_event(&event, &profile.window);
                alerts.extend(outcome.alerts);

                let factors = subject_factors(profile, self.config.risk_window_minutes, now);
                let score = scorer::score(&factors, now);
                let block = outcome.auto_block || scorer::should_auto_block(event.event_type, score);
                if block && !profile.blocked {
                    profile.blocked = true;
                    tracing::warn!(
                        subject = %event.subject,
                        event_type = event.event_type.as_str(),
                        score,
                        "subject auto-blocked"
                    );
                }
            }

            // Score every subject that still has recent activity
            let prune_minutes = self.prune_horizon_minutes();
            for (subject, profile) in state.subjects.iter_mut() {
                profile.window.prune_older_than(now - Duration::minutes(i64::from(prune_minutes)));
                if profile.window.is_empty() {
                    continue;
                }
                let factors = subject_factors(profile, self.config.risk_window_minutes, now);
                let score = scorer::score(&factors, now);
                match RiskLevel::from_score(score) {
                    RiskLevel::High => alerts.push(risk_alert(subject, score, AlertSeverity::High, now)),
                    RiskLevel::Critical => {
                        alerts.push(risk_alert(subject, score, AlertSeverity::Critical, now))
                    }
                    _ => {}
                }
            }
        }

        let performance_alerts = alerts.len() as u64;
        let mut sent = 0u64;
        for alert in alerts {
            if !self.manager.send_alert(alert, now).await.is_suppressed() {
                sent += 1;
            }
        }
        (performance_alerts, sent)
    }

    /// Oldest event age the windows must retain: the risk window or the
    /// longest rule window, whichever is larger
    fn prune_horizon_minutes(&self) -> u32 {
        self.engine
            .rules()
            .iter()
            .map(|r| r.window_minutes)
            .max()
            .unwrap_or(0)
            .max(self.config.risk_window_minutes)
    }
}

/// Derive risk counters for one subject from its event window
fn subject_factors(profile: &SubjectProfile, window_minutes: u32, now: DateTime<Utc>) -> RiskFactors {
    const SUSPICIOUS_TYPES: [EventType; 2] =
        [EventType::SuspiciousActivity, EventType::SecurityViolation];

    RiskFactors {
        failed_logins: profile.window.count_in_window(
            &[EventType::LoginFailure, EventType::TwoFactorFailure],
            now,
            window_minutes,
        ) as u32,
        suspicious_activities: profile.window.count_in_window(&SUSPICIOUS_TYPES, now, window_minutes)
            as u32,
        compliance_alerts: profile
            .window
            .count_in_window(&[EventType::ComplianceAlert], now, window_minutes)
            as u32,
        last_suspicious: profile.window.last_of(&SUSPICIOUS_TYPES).map(|e| e.timestamp),
        kyc_tier: profile.kyc_tier,
        account_age_days: profile.account_age_days,
    }
}

/// Build the per-cycle risk alert for a subject
fn risk_alert(subject: &str, score: u8, severity: AlertSeverity, now: DateTime<Utc>) -> AlertEvent {
    AlertEvent::new(
        subject,
        severity,
        format!("risk score {} for {}", score, subject),
        now,
    )
    .with_rule("risk_score")
    .with_metadata("score", score.to_string())
    .with_metadata("level", RiskLevel::from_score(score).as_str())
}
