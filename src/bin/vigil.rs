//! Vigil CLI
//!
//! Command-line interface for running the monitoring engine and for
//! operator-triggered alerts.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use vigil::prelude::*;
use vigil::rules::engine::{METRIC_FAILED_AUTH_1H, METRIC_SLASHING_EVENTS, METRIC_TOTAL_ASSETS_USD};

/// Vigil - health monitoring and alert delivery engine
#[derive(Parser)]
#[command(name = "vigil")]
#[command(author = "Vigil Team")]
#[command(version = vigil::VERSION)]
#[command(about = "Health monitoring and alert delivery engine", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run monitoring cycles until interrupted
    Run {
        /// Register built-in demo probes instead of waiting for real ones
        #[arg(long)]
        demo: bool,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Validate a configuration file
    CheckConfig,

    /// Inject a manual alert, bypassing rule evaluation
    Trigger {
        /// Component the alert concerns
        #[arg(short = 'C', long)]
        component: String,

        /// Severity (low, medium, high, critical)
        #[arg(short, long, default_value = "high")]
        severity: String,

        /// Alert message
        #[arg(short, long)]
        message: String,
    },
}

fn load_config(path: &Option<PathBuf>) -> anyhow::Result<MonitorConfig> {
    match path {
        Some(path) => {
            MonitorConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(MonitorConfig::default()),
    }
}

fn parse_severity(raw: &str) -> anyhow::Result<AlertSeverity> {
    match raw.to_ascii_lowercase().as_str() {
        "low" => Ok(AlertSeverity::Low),
        "medium" => Ok(AlertSeverity::Medium),
        "high" => Ok(AlertSeverity::High),
        "critical" => Ok(AlertSeverity::Critical),
        other => anyhow::bail!("unknown severity '{}'", other),
    }
}

fn build_manager(config: &MonitorConfig) -> anyhow::Result<Arc<AlertManager>> {
    let manager = AlertManager::new(
        config.alerts.clone(),
        config.channels.clone(),
        Arc::new(LogSink),
    )?;
    Ok(Arc::new(manager))
}

fn demo_probes(now: chrono::DateTime<Utc>) -> Vec<Arc<dyn HealthProbe>> {
    vec![
        Arc::new(StaticProbe::new(
            ComponentHealth::new("oracle", ComponentStatus::Healthy, now)
                .with_response_time(1200)
                .with_metric("active_feeds", 4.0),
        )),
        Arc::new(StaticProbe::new(
            ComponentHealth::new("staking", ComponentStatus::Healthy, now)
                .with_metric(METRIC_SLASHING_EVENTS, 0.0),
        )),
        Arc::new(StaticProbe::new(
            ComponentHealth::new("treasury", ComponentStatus::Healthy, now)
                .with_metric(METRIC_TOTAL_ASSETS_USD, 250_000.0),
        )),
        Arc::new(StaticProbe::new(
            ComponentHealth::new("auth", ComponentStatus::Healthy, now)
                .with_metric(METRIC_FAILED_AUTH_1H, 2.0),
        )),
        Arc::new(StaticProbe::new(
            ComponentHealth::new("backend", ComponentStatus::Healthy, now).with_uptime(99.95),
        )),
    ]
}

async fn run(config: MonitorConfig, demo: bool, once: bool) -> anyhow::Result<()> {
    let manager = build_manager(&config)?;
    let engine = RuleEngine::new(config.thresholds.clone(), config.rules.clone())?;
    let mut scheduler = MonitoringScheduler::new(config.scheduler.clone(), engine, manager);

    if demo {
        for probe in demo_probes(Utc::now()) {
            scheduler.register_probe(probe);
        }
        println!("{} registered demo probes", style("→").cyan());
    } else {
        tracing::warn!("no probes registered; only manual and ingested events will alert");
    }

    println!(
        "{} vigil {} monitoring every {}s (health) / {}s (performance)",
        style("✓").green(),
        vigil::VERSION,
        config.scheduler.health_interval_secs,
        config.scheduler.performance_interval_secs
    );

    let tick = std::time::Duration::from_secs(config.scheduler.health_interval_secs.min(
        config.scheduler.performance_interval_secs,
    ));
    let mut interval = tokio::time::interval(tick);

    loop {
        interval.tick().await;
        let report = scheduler.run_cycle(Utc::now()).await;
        if !report.is_idle() {
            println!(
                "{} health={} performance={} sent={}",
                style("cycle").dim(),
                report.health_alerts,
                report.performance_alerts,
                report.alerts_sent
            );
        }
        if once {
            return Ok(());
        }
    }
}

async fn trigger(
    config: MonitorConfig,
    component: String,
    severity: String,
    message: String,
) -> anyhow::Result<()> {
    let manager = build_manager(&config)?;
    let severity = parse_severity(&severity)?;
    let alert = AlertEvent::new(component, severity, message, Utc::now());

    let outcome = manager.send_alert(alert, Utc::now()).await;
    if outcome.is_suppressed() {
        println!("{} alert suppressed by cooldown", style("−").yellow());
        return Ok(());
    }

    for status in outcome.statuses() {
        match status.state {
            DeliveryState::Delivered => {
                println!("{} delivered on {}", style("✓").green(), status.channel)
            }
            _ => println!(
                "{} {} on {}: {}",
                style("✗").red(),
                format!("{:?}", status.state).to_lowercase(),
                status.channel,
                status.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Run { demo, once } => run(config, demo, once).await,
        Commands::CheckConfig => {
            config.validate()?;
            println!(
                "{} configuration valid: {} rules, {} channels",
                style("✓").green(),
                config.rules.len(),
                config.channels.len()
            );
            Ok(())
        }
        Commands::Trigger { component, severity, message } => {
            trigger(config, component, severity, message).await
        }
    }
}
