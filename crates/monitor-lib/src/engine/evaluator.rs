//! Rule evaluation over one measurement snapshot
//!
//! For each rule, the snapshot is filtered to measurements whose name
//! equals the rule's metric name and whose labels satisfy the rule's
//! constraints; each match is classified as breaching or healthy. A rule
//! with no matching measurements simply contributes nothing this cycle.
//!
//! Output order is deterministic: rules in catalog declaration order,
//! then measurements in the order the source returned them.

use crate::models::{Measurement, SeriesKey};
use crate::rules::{Comparator, RuleCatalog};

/// Classification of one (rule, measurement) pair
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub key: SeriesKey,
    pub value: f64,
    pub breached: bool,
    pub comparator: Comparator,
    pub threshold: f64,
}

/// Evaluate every rule in the catalog against the snapshot.
///
/// Multiple rules may match the same measurement and multiple
/// measurements may match one rule; every pair is classified
/// independently.
pub fn evaluate(catalog: &RuleCatalog, measurements: &[Measurement]) -> Vec<Evaluation> {
    let mut results = Vec::new();

    for rule in catalog.rules() {
        for m in measurements {
            if m.name != rule.name {
                continue;
            }
            if !rule.constraints.matches(&m.labels) {
                continue;
            }
            results.push(Evaluation {
                key: SeriesKey::new(rule.name.clone(), m.labels.clone()),
                value: m.value,
                breached: rule.comparator.breached(m.value, rule.threshold),
                comparator: rule.comparator,
                threshold: rule.threshold,
            });
        }
    }

    results
}
