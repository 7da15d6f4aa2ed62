//! Per-series alert state and transition detection
//!
//! The tracker owns the `SeriesKey -> AlertState` table for the process
//! lifetime and turns each cycle's evaluations into alert events. Events
//! are emitted only on transitions: entering firing produces FIRING,
//! leaving it produces RESOLVED, and a breach that continues is
//! suppressed because it was already notified.
//!
//! A series present in prior state but absent from the current cycle's
//! evaluations (metric missing from the scrape, or no longer matching
//! constraints) is left untouched and emits nothing: a collection gap is
//! not a recovery signal. State entries are never evicted.

use std::collections::HashMap;

use tracing::debug;

use crate::engine::Evaluation;
use crate::models::{ActiveAlert, AlertEvent, AlertKind, SeriesKey};
use crate::rules::Comparator;

/// Tracked state of one series
#[derive(Debug, Clone)]
pub struct AlertState {
    pub firing: bool,
    pub last_value: f64,
    /// Unix timestamp of the transition into firing; meaningless while
    /// not firing
    pub since: i64,
    comparator: Comparator,
    threshold: f64,
}

/// Owns all alert state; touched only from the single evaluation path,
/// so it needs no locking. Tests construct a fresh tracker per case.
#[derive(Debug, Default)]
pub struct AlertStateTracker {
    states: HashMap<SeriesKey, AlertState>,
}

impl AlertStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance state with one cycle's evaluations and return the events
    /// for the transitions that occurred, in evaluation order.
    pub fn advance(&mut self, evaluations: &[Evaluation]) -> Vec<AlertEvent> {
        let mut events = Vec::new();

        for eval in evaluations {
            let was_firing = self
                .states
                .get(&eval.key)
                .map(|s| s.firing)
                .unwrap_or(false);

            let state = self
                .states
                .entry(eval.key.clone())
                .or_insert_with(|| AlertState {
                    firing: false,
                    last_value: eval.value,
                    since: 0,
                    comparator: eval.comparator,
                    threshold: eval.threshold,
                });
            state.last_value = eval.value;
            state.comparator = eval.comparator;
            state.threshold = eval.threshold;

            match (was_firing, eval.breached) {
                (false, true) => {
                    state.firing = true;
                    state.since = chrono::Utc::now().timestamp();
                    events.push(AlertEvent {
                        key: eval.key.clone(),
                        kind: AlertKind::Firing,
                        value: eval.value,
                        threshold: eval.threshold,
                        comparator: eval.comparator,
                    });
                }
                (true, false) => {
                    state.firing = false;
                    events.push(AlertEvent {
                        key: eval.key.clone(),
                        kind: AlertKind::Resolved,
                        value: eval.value,
                        threshold: eval.threshold,
                        comparator: eval.comparator,
                    });
                }
                (true, true) => {
                    debug!(series = %eval.key, value = eval.value, "Breach continues, already notified");
                }
                (false, false) => {}
            }
        }

        events
    }

    /// Series currently firing, for the daemon's `/alerts` snapshot
    pub fn firing(&self) -> Vec<ActiveAlert> {
        let mut active: Vec<ActiveAlert> = self
            .states
            .iter()
            .filter(|(_, s)| s.firing)
            .map(|(key, s)| ActiveAlert {
                series: key.to_string(),
                value: s.last_value,
                threshold: s.threshold,
                comparator: s.comparator,
                since: s.since,
            })
            .collect();
        active.sort_by(|a, b| a.series.cmp(&b.series));
        active
    }

    /// Number of series ever observed
    pub fn tracked_series(&self) -> usize {
        self.states.len()
    }

    /// Number of series currently firing
    pub fn firing_series(&self) -> usize {
        self.states.values().filter(|s| s.firing).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evaluate;
    use crate::models::{Labels, Measurement};
    use crate::rules::RuleCatalog;

    fn catalog(doc: &str) -> RuleCatalog {
        RuleCatalog::from_yaml_str(doc).unwrap()
    }

    fn mem_snapshot(value: f64) -> Vec<Measurement> {
        vec![Measurement::new(
            "node_memory_MemAvailable_bytes",
            Labels::new(),
            value,
        )]
    }

    const MEM_RULE: &str = "rules:\n  node_memory_MemAvailable_bytes:\n    lt: 1000000000\n";

    #[test]
    fn test_first_breach_fires_once() {
        let catalog = catalog(MEM_RULE);
        let mut tracker = AlertStateTracker::new();

        let events = tracker.advance(&evaluate(&catalog, &mem_snapshot(900_000_000.0)));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::Firing);
        assert_eq!(events[0].value, 900_000_000.0);
        assert_eq!(events[0].threshold, 1_000_000_000.0);
    }

    #[test]
    fn test_continuing_breach_is_suppressed() {
        let catalog = catalog(MEM_RULE);
        let mut tracker = AlertStateTracker::new();

        let mut total = 0;
        for _ in 0..5 {
            total += tracker
                .advance(&evaluate(&catalog, &mem_snapshot(900_000_000.0)))
                .len();
        }
        // Exactly one FIRING across five identical breaching cycles
        assert_eq!(total, 1);
        assert_eq!(tracker.firing_series(), 1);
    }

    #[test]
    fn test_recovery_resolves_once() {
        let catalog = catalog(MEM_RULE);
        let mut tracker = AlertStateTracker::new();

        tracker.advance(&evaluate(&catalog, &mem_snapshot(900_000_000.0)));
        let events = tracker.advance(&evaluate(&catalog, &mem_snapshot(1_200_000_000.0)));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::Resolved);
        assert_eq!(events[0].value, 1_200_000_000.0);
        assert_eq!(tracker.firing_series(), 0);

        // Staying healthy emits nothing further
        let events = tracker.advance(&evaluate(&catalog, &mem_snapshot(1_200_000_000.0)));
        assert!(events.is_empty());
    }

    #[test]
    fn test_healthy_series_never_emits() {
        let catalog = catalog(MEM_RULE);
        let mut tracker = AlertStateTracker::new();

        for _ in 0..3 {
            let events = tracker.advance(&evaluate(&catalog, &mem_snapshot(2_000_000_000.0)));
            assert!(events.is_empty());
        }
        assert_eq!(tracker.tracked_series(), 1);
        assert_eq!(tracker.firing_series(), 0);
    }

    #[test]
    fn test_absent_series_stays_firing() {
        let catalog = catalog(MEM_RULE);
        let mut tracker = AlertStateTracker::new();

        tracker.advance(&evaluate(&catalog, &mem_snapshot(900_000_000.0)));
        assert_eq!(tracker.firing_series(), 1);

        // Metric missing from the next scrape entirely
        let events = tracker.advance(&evaluate(&catalog, &[]));
        assert!(events.is_empty());
        assert_eq!(tracker.firing_series(), 1);

        // When it reappears healthy, it resolves exactly once
        let events = tracker.advance(&evaluate(&catalog, &mem_snapshot(1_200_000_000.0)));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::Resolved);
    }

    #[test]
    fn test_flapping_fires_and_resolves_each_transition() {
        let catalog = catalog(MEM_RULE);
        let mut tracker = AlertStateTracker::new();

        let kinds: Vec<Vec<AlertKind>> = [900_000_000.0, 1_200_000_000.0, 900_000_000.0]
            .iter()
            .map(|v| {
                tracker
                    .advance(&evaluate(&catalog, &mem_snapshot(*v)))
                    .iter()
                    .map(|e| e.kind)
                    .collect()
            })
            .collect();

        assert_eq!(kinds[0], vec![AlertKind::Firing]);
        assert_eq!(kinds[1], vec![AlertKind::Resolved]);
        assert_eq!(kinds[2], vec![AlertKind::Firing]);
    }

    #[test]
    fn test_series_with_different_labels_tracked_independently() {
        let catalog = catalog("rules:\n  node_filesystem_files_free:\n    lt: 1000\n");
        let mut tracker = AlertStateTracker::new();

        let labels = |mp: &str| -> Labels {
            [("mountpoint".to_string(), mp.to_string())].into_iter().collect()
        };
        let snapshot = vec![
            Measurement::new("node_filesystem_files_free", labels("/"), 500.0),
            Measurement::new("node_filesystem_files_free", labels("/home"), 5000.0),
        ];

        let events = tracker.advance(&evaluate(&catalog, &snapshot));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key.labels.get("mountpoint").unwrap(), "/");
        assert_eq!(tracker.tracked_series(), 2);
        assert_eq!(tracker.firing_series(), 1);

        // Root recovers while /home starts breaching; both transition
        let snapshot = vec![
            Measurement::new("node_filesystem_files_free", labels("/"), 5000.0),
            Measurement::new("node_filesystem_files_free", labels("/home"), 100.0),
        ];
        let events = tracker.advance(&evaluate(&catalog, &snapshot));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, AlertKind::Resolved);
        assert_eq!(events[1].kind, AlertKind::Firing);
    }

    #[test]
    fn test_firing_snapshot_contents() {
        let catalog = catalog(MEM_RULE);
        let mut tracker = AlertStateTracker::new();

        tracker.advance(&evaluate(&catalog, &mem_snapshot(900_000_000.0)));
        let active = tracker.firing();

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].series, "node_memory_MemAvailable_bytes");
        assert_eq!(active[0].value, 900_000_000.0);
        assert_eq!(active[0].threshold, 1_000_000_000.0);
        assert!(active[0].since > 0);
    }

    #[test]
    fn test_events_keep_evaluation_order() {
        let catalog = catalog("rules:\n  b_metric:\n    gt: 0\n  a_metric:\n    gt: 0\n");
        let mut tracker = AlertStateTracker::new();

        let snapshot = vec![
            Measurement::new("a_metric", Labels::new(), 1.0),
            Measurement::new("b_metric", Labels::new(), 1.0),
        ];
        let events = tracker.advance(&evaluate(&catalog, &snapshot));
        let order: Vec<String> = events.iter().map(|e| e.key.to_string()).collect();
        assert_eq!(order, vec!["b_metric", "a_metric"]);
    }
}
