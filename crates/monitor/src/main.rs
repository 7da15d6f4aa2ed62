//! Node Monitor - threshold alerting daemon
//!
//! Scrapes a node-exporter-style metrics endpoint on a fixed interval,
//! evaluates threshold rules against the samples, and sends a
//! notification whenever a series starts or stops breaching.

use std::sync::Arc;

use anyhow::{Context, Result};
use monitor_lib::health::{components, HealthRegistry};
use monitor_lib::notify::{Dispatcher, EmailNotifier, LogNotifier, Notifier};
use monitor_lib::observability::MonitorMetrics;
use monitor_lib::rules::RuleCatalog;
use monitor_lib::scheduler::MonitorLoop;
use monitor_lib::scrape::HttpSource;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting node-monitor");

    // Load configuration
    let config = config::MonitorConfig::load()?;
    info!(
        exporter = %config.scrape_config().url(),
        interval_secs = config.check_interval_secs,
        "Monitor configured"
    );

    // An invalid rule set must fail loudly before any cycle runs
    let catalog = RuleCatalog::load(&config.rules_file)
        .with_context(|| format!("Failed to load rules from {}", config.rules_file))?;
    info!(rules = catalog.len(), rules_file = %config.rules_file, "Rule catalog loaded");

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::SCRAPER).await;
    health_registry.register(components::ENGINE).await;
    health_registry.register(components::NOTIFIER).await;

    // Initialize metrics
    let metrics = MonitorMetrics::new();

    // Pick the notifier: email when configured, log otherwise
    let notifier: Arc<dyn Notifier> = match &config.email {
        Some(email) => {
            info!(smtp = %email.smtp_server, to = %email.to, "Email notifications enabled");
            Arc::new(EmailNotifier::new(email).context("Invalid email configuration")?)
        }
        None => {
            info!("No email configured, alerts go to the log");
            Arc::new(LogNotifier::new())
        }
    };

    // Shutdown is broadcast to the loop and every dispatch worker
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

    let dispatcher = Dispatcher::start(notifier, config.dispatch_config(), &shutdown_tx);

    let source = Arc::new(HttpSource::new(&config.scrape_config())?);
    let monitor = MonitorLoop::new(
        source,
        Arc::new(catalog),
        dispatcher.queue(),
        health_registry.clone(),
        config.scheduler_config(),
    );

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        monitor.firing_snapshot(),
    ));

    // Start health/metrics/alerts server
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Mark monitor as ready and start the evaluation loop
    health_registry.set_ready(true).await;
    let loop_handle = tokio::spawn(monitor.run(shutdown_tx.subscribe()));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("SIGINT received, shutting down");

    let _ = shutdown_tx.send(());
    let _ = loop_handle.await;
    dispatcher.join().await;
    api_handle.abort();

    Ok(())
}
