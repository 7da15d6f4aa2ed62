//! Core data models for the node monitor

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rules::Comparator;

/// Label set attached to a measurement, kept sorted by key so a given
/// set of labels has exactly one representation.
pub type Labels = BTreeMap<String, String>;

/// One named, labeled numeric reading from a scrape cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub labels: Labels,
    pub value: f64,
}

impl Measurement {
    pub fn new(name: impl Into<String>, labels: Labels, value: f64) -> Self {
        Self {
            name: name.into(),
            labels,
            value,
        }
    }
}

/// Identity of one tracked alert instance: rule name plus the label set
/// of the matched measurement. Two measurements with the same metric name
/// but different labels are tracked independently under the same rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub rule: String,
    pub labels: Labels,
}

impl SeriesKey {
    pub fn new(rule: impl Into<String>, labels: Labels) -> Self {
        Self {
            rule: rule.into(),
            labels,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return write!(f, "{}", self.rule);
        }
        write!(f, "{}{{", self.rule)?;
        for (i, (k, v)) in self.labels.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}=\"{}\"", k, v)?;
        }
        write!(f, "}}")
    }
}

/// Alert lifecycle transition kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Firing,
    Resolved,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Firing => write!(f, "FIRING"),
            AlertKind::Resolved => write!(f, "RESOLVED"),
        }
    }
}

/// Event emitted exactly once per state transition. Carries enough data
/// for a notifier to render a message without consulting the rule catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub key: SeriesKey,
    pub kind: AlertKind,
    pub value: f64,
    pub threshold: f64,
    pub comparator: Comparator,
}

/// Snapshot entry for a series that is currently firing, published for
/// the daemon's `/alerts` endpoint after every cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveAlert {
    pub series: String,
    pub value: f64,
    pub threshold: f64,
    pub comparator: Comparator,
    /// Unix timestamp of the transition into firing
    pub since: i64,
}
