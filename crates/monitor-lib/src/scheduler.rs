//! The evaluation cycle loop
//!
//! Drives the fixed-period cycle: wait for the interval, scrape, evaluate
//! every rule, advance alert state, and hand transition events to the
//! dispatch queue. One cycle runs to completion before the next begins,
//! so the state tracker is only ever touched from this one sequential
//! path. The next tick is measured from the end of the current cycle;
//! there is no catch-up for slow cycles.
//!
//! A scrape failure or timeout is logged and treated as an empty
//! snapshot: it neither resolves firing alerts (absence is not recovery)
//! nor raises new ones.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::{evaluate, AlertStateTracker};
use crate::health::{components, HealthRegistry};
use crate::models::{ActiveAlert, AlertKind, Measurement};
use crate::notify::DispatchQueue;
use crate::observability::MonitorMetrics;
use crate::rules::RuleCatalog;
use crate::scrape::MetricsSource;

/// Default cycle period (5 minutes)
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Configuration for the cycle loop
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period between cycles, measured from the end of each cycle
    pub interval: Duration,
    /// Upper bound on one scrape attempt
    pub scrape_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            scrape_timeout: Duration::from_secs(10),
        }
    }
}

/// Owns the alert state tracker and runs the scrape/evaluate/notify cycle
pub struct MonitorLoop {
    source: Arc<dyn MetricsSource>,
    catalog: Arc<RuleCatalog>,
    tracker: AlertStateTracker,
    queue: Arc<DispatchQueue>,
    health: HealthRegistry,
    metrics: MonitorMetrics,
    firing_snapshot: Arc<RwLock<Vec<ActiveAlert>>>,
    config: SchedulerConfig,
}

impl MonitorLoop {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        catalog: Arc<RuleCatalog>,
        queue: Arc<DispatchQueue>,
        health: HealthRegistry,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            source,
            catalog,
            tracker: AlertStateTracker::new(),
            queue,
            health,
            metrics: MonitorMetrics::new(),
            firing_snapshot: Arc::new(RwLock::new(Vec::new())),
            config,
        }
    }

    /// Shared handle to the currently-firing snapshot, republished after
    /// every cycle for the `/alerts` endpoint.
    pub fn firing_snapshot(&self) -> Arc<RwLock<Vec<ActiveAlert>>> {
        self.firing_snapshot.clone()
    }

    /// Run cycles until shutdown. Cancellation is observed at the wait
    /// boundary so the loop exits without starting a partial cycle.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            rules = self.catalog.len(),
            "Starting evaluation loop"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {
                    self.run_cycle().await;
                }
                _ = shutdown.recv() => {
                    info!("Shutting down evaluation loop");
                    break;
                }
            }
        }
    }

    /// Run one full cycle: scrape, evaluate, advance state, enqueue
    /// events. Public so tests can drive cycles without wall-clock waits.
    pub async fn run_cycle(&mut self) {
        let start = Instant::now();
        let snapshot = self.acquire_snapshot().await;

        let evaluations = evaluate(&self.catalog, &snapshot);
        let events = self.tracker.advance(&evaluations);

        for event in &events {
            let kind = match event.kind {
                AlertKind::Firing => "firing",
                AlertKind::Resolved => "resolved",
            };
            self.metrics.inc_events(kind);
            info!(series = %event.key, kind = %event.kind, value = event.value, "Alert transition");
            self.queue.push(event.clone());
        }

        self.metrics.inc_cycles();
        self.metrics
            .set_series(self.tracker.tracked_series(), self.tracker.firing_series());

        *self.firing_snapshot.write().await = self.tracker.firing();

        debug!(
            samples = snapshot.len(),
            evaluations = evaluations.len(),
            events = events.len(),
            firing = self.tracker.firing_series(),
            elapsed_ms = start.elapsed().as_millis(),
            "Cycle complete"
        );
    }

    /// Scrape with the configured timeout. Failure yields an empty
    /// snapshot so the cycle still runs; the scraper component is marked
    /// degraded until a scrape succeeds again.
    async fn acquire_snapshot(&self) -> Vec<Measurement> {
        let start = Instant::now();
        let result = tokio::time::timeout(self.config.scrape_timeout, self.source.scrape()).await;

        match result {
            Ok(Ok(measurements)) => {
                self.metrics
                    .observe_scrape_duration(start.elapsed().as_secs_f64());
                self.health.set_healthy(components::SCRAPER).await;
                measurements
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Scrape failed, running cycle with empty snapshot");
                self.metrics.inc_scrape_errors();
                self.health
                    .set_degraded(components::SCRAPER, e.to_string())
                    .await;
                Vec::new()
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.config.scrape_timeout.as_secs(),
                    "Scrape timed out, running cycle with empty snapshot"
                );
                self.metrics.inc_scrape_errors();
                self.health
                    .set_degraded(components::SCRAPER, "scrape timed out")
                    .await;
                Vec::new()
            }
        }
    }
}
