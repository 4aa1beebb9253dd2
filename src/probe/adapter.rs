//! Health probe contract and timeout handling.
//!
//! Probes are implemented per monitored subsystem and treated as black
//! boxes. The engine only relies on the contract: a probe answers within
//! the caller-supplied deadline or the caller degrades the snapshot.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::probe::health::ComponentHealth;

// ═══════════════════════════════════════════════════════════════════════════════
// PROBE CONTRACT
// ═══════════════════════════════════════════════════════════════════════════════

/// Health probe for one monitored component.
///
/// Implementations sample the subsystem (an RPC endpoint, a database, a
/// metrics API) and return a fresh snapshot. The scheduler bounds each call
/// with a timeout; implementations do not need their own deadline handling.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Name of the component this probe samples
    fn component(&self) -> &str;

    /// Take a fresh health snapshot
    async fn check_health(&self) -> Result<ComponentHealth>;
}

/// Run a probe bounded by `timeout`, degrading failures to a critical
/// snapshot.
///
/// `prior_errors` is the component's consecutive-failure count before this
/// attempt; the synthesized snapshot carries `prior_errors + 1`.
pub async fn probe_with_timeout(
    probe: &dyn HealthProbe,
    timeout: Duration,
    prior_errors: u64,
    now: DateTime<Utc>,
) -> ComponentHealth {
    let started = std::time::Instant::now();

    match tokio::time::timeout(timeout, probe.check_health()).await {
        Ok(Ok(health)) => health,
        Ok(Err(err)) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::warn!(
                component = probe.component(),
                error = %err,
                "health probe failed"
            );
            ComponentHealth::unreachable(probe.component(), elapsed_ms, prior_errors + 1, now)
        }
        Err(_) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::warn!(
                component = probe.component(),
                timeout_ms = timeout.as_millis() as u64,
                "health probe timed out"
            );
            ComponentHealth::unreachable(probe.component(), elapsed_ms, prior_errors + 1, now)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATIC PROBE
// ═══════════════════════════════════════════════════════════════════════════════

/// Probe returning a fixed snapshot.
///
/// Useful in tests and for wiring components whose health is published
/// out-of-band.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    component: String,
    snapshot: ComponentHealth,
}

impl StaticProbe {
    /// Create a probe that always returns `snapshot`
    pub fn new(snapshot: ComponentHealth) -> Self {
        Self {
            component: snapshot.component.clone(),
            snapshot,
        }
    }
}

#[async_trait]
impl HealthProbe for StaticProbe {
    fn component(&self) -> &str {
        &self.component
    }

    async fn check_health(&self) -> Result<ComponentHealth> {
        Ok(self.snapshot.clone())
    }
}
