//! Rule model: threshold comparators, label constraints, and the
//! ordered rule catalog loaded from YAML.

mod catalog;
mod matcher;

pub use catalog::{RuleCatalog, RuleError, RuleOptions};
pub use matcher::{LabelConstraint, LabelConstraints};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Threshold comparator for a rule.
///
/// `Lt`/`Gt` are strict: a value exactly equal to the threshold is not a
/// breach. `Le`/`Ge` are inclusive. `Eq` compares with exact float
/// equality, which is only meaningful for 0/1-style status gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
}

impl Comparator {
    /// Whether `value` breaches a threshold under this comparator
    pub fn breached(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Lt => value < threshold,
            Comparator::Gt => value > threshold,
            Comparator::Le => value <= threshold,
            Comparator::Ge => value >= threshold,
            Comparator::Eq => value == threshold,
        }
    }

    /// Phrase used when rendering a notification message
    pub fn phrase(&self) -> &'static str {
        match self {
            Comparator::Lt => "less than",
            Comparator::Gt => "greater than",
            Comparator::Le => "at most",
            Comparator::Ge => "at least",
            Comparator::Eq => "equal to",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Lt => write!(f, "lt"),
            Comparator::Gt => write!(f, "gt"),
            Comparator::Le => write!(f, "le"),
            Comparator::Ge => write!(f, "ge"),
            Comparator::Eq => write!(f, "eq"),
        }
    }
}

/// A loaded threshold rule. The name is the target metric name; the
/// constraint set may be empty (match-all). Immutable after load.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub comparator: Comparator,
    pub threshold: f64,
    pub constraints: LabelConstraints,
}
