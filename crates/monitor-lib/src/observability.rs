//! Self-observability for the monitor
//!
//! Prometheus metrics describing the monitor's own behavior: cycle and
//! scrape counters, a scrape latency histogram, series gauges, and
//! notification dispatch counters. Registered once per process and
//! exposed by the daemon's `/metrics` endpoint.

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;

/// Histogram buckets for scrape latency (in seconds)
const SCRAPE_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    cycles_total: IntCounter,
    scrape_duration_seconds: Histogram,
    scrape_errors_total: IntCounter,
    events_emitted_total: IntCounterVec,
    series_tracked: IntGauge,
    series_firing: IntGauge,
    notifications_sent_total: IntCounter,
    notifications_dropped_total: IntCounter,
    notification_errors_total: IntCounter,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            cycles_total: register_int_counter!(
                "node_monitor_cycles_total",
                "Total number of evaluation cycles run"
            )
            .expect("Failed to register cycles_total"),

            scrape_duration_seconds: register_histogram!(
                "node_monitor_scrape_duration_seconds",
                "Time spent scraping the metrics endpoint",
                SCRAPE_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register scrape_duration_seconds"),

            scrape_errors_total: register_int_counter!(
                "node_monitor_scrape_errors_total",
                "Total number of failed scrape attempts"
            )
            .expect("Failed to register scrape_errors_total"),

            events_emitted_total: register_int_counter_vec!(
                "node_monitor_events_emitted_total",
                "Alert events emitted by transition kind",
                &["kind"]
            )
            .expect("Failed to register events_emitted_total"),

            series_tracked: register_int_gauge!(
                "node_monitor_series_tracked",
                "Number of distinct series with alert state"
            )
            .expect("Failed to register series_tracked"),

            series_firing: register_int_gauge!(
                "node_monitor_series_firing",
                "Number of series currently firing"
            )
            .expect("Failed to register series_firing"),

            notifications_sent_total: register_int_counter!(
                "node_monitor_notifications_sent_total",
                "Alert events successfully delivered"
            )
            .expect("Failed to register notifications_sent_total"),

            notifications_dropped_total: register_int_counter!(
                "node_monitor_notifications_dropped_total",
                "Alert events dropped because the dispatch queue was full"
            )
            .expect("Failed to register notifications_dropped_total"),

            notification_errors_total: register_int_counter!(
                "node_monitor_notification_errors_total",
                "Alert event deliveries that failed or timed out"
            )
            .expect("Failed to register notification_errors_total"),
        }
    }
}

/// Lightweight handle to the global metrics instance. Clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &'static MonitorMetricsInner {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new)
    }

    pub fn inc_cycles(&self) {
        self.inner().cycles_total.inc();
    }

    pub fn observe_scrape_duration(&self, seconds: f64) {
        self.inner().scrape_duration_seconds.observe(seconds);
    }

    pub fn inc_scrape_errors(&self) {
        self.inner().scrape_errors_total.inc();
    }

    pub fn inc_events(&self, kind: &str) {
        self.inner()
            .events_emitted_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn set_series(&self, tracked: usize, firing: usize) {
        self.inner().series_tracked.set(tracked as i64);
        self.inner().series_firing.set(firing as i64);
    }

    pub fn inc_notifications_sent(&self) {
        self.inner().notifications_sent_total.inc();
    }

    pub fn inc_notifications_dropped(&self) {
        self.inner().notifications_dropped_total.inc();
    }

    pub fn inc_notification_errors(&self) {
        self.inner().notification_errors_total.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_once() {
        let a = MonitorMetrics::new();
        let b = MonitorMetrics::new();

        a.inc_cycles();
        b.inc_cycles();
        a.observe_scrape_duration(0.012);
        a.set_series(5, 2);
        a.inc_events("firing");

        // Registered metrics appear in the default registry
        let families = prometheus::gather();
        let names: Vec<&str> = families.iter().map(|f| f.get_name()).collect();
        assert!(names.contains(&"node_monitor_cycles_total"));
        assert!(names.contains(&"node_monitor_scrape_duration_seconds"));
        assert!(names.contains(&"node_monitor_series_firing"));
    }
}
