//! Rule catalog loading and validation
//!
//! Rules are declared in a YAML document under a top-level `rules:`
//! mapping from metric name to options:
//!
//! ```yaml
//! rules:
//!   node_memory_MemAvailable_bytes:
//!     lt: 1000000000
//!   node_filesystem_avail_bytes:
//!     lt: 10000000000
//!     label_match:
//!       mountpoint: "/"
//!       fstype: "!tmpfs|devtmpfs"
//! ```
//!
//! Exactly one of `lt`/`gt`/`le`/`ge`/`eq` must be set per rule. Invalid
//! documents, comparator arity violations, and unparsable patterns are all
//! rejected here, before any evaluation cycle runs.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::matcher::{LabelConstraint, LabelConstraints};
use super::{Comparator, Rule};

/// Errors produced while loading the rule catalog. All of these are fatal
/// at startup; the daemon must not run with an ambiguous rule set.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rules document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("rules document has no top-level `rules` mapping")]
    MissingRules,

    #[error("rule name must be a string, got {0:?}")]
    InvalidRuleName(serde_yaml::Value),

    #[error("rule \"{rule}\" has no comparator; set exactly one of lt/gt/le/ge/eq")]
    NoComparator { rule: String },

    #[error("rule \"{rule}\" sets more than one comparator; set exactly one of lt/gt/le/ge/eq")]
    MultipleComparators { rule: String },

    #[error("rule \"{rule}\": invalid pattern for label \"{key}\": {source}")]
    InvalidPattern {
        rule: String,
        key: String,
        #[source]
        source: regex::Error,
    },
}

/// Raw per-rule options as they appear in the document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleOptions {
    pub lt: Option<f64>,
    pub gt: Option<f64>,
    pub le: Option<f64>,
    pub ge: Option<f64>,
    pub eq: Option<f64>,
    #[serde(default)]
    pub label_match: Option<BTreeMap<String, String>>,
}

impl RuleOptions {
    /// Resolve the five optional comparator fields into exactly one
    /// (comparator, threshold) pair.
    fn comparator(&self, rule: &str) -> Result<(Comparator, f64), RuleError> {
        let set: Vec<(Comparator, f64)> = [
            (Comparator::Lt, self.lt),
            (Comparator::Gt, self.gt),
            (Comparator::Le, self.le),
            (Comparator::Ge, self.ge),
            (Comparator::Eq, self.eq),
        ]
        .into_iter()
        .filter_map(|(c, t)| t.map(|t| (c, t)))
        .collect();

        match set.as_slice() {
            [] => Err(RuleError::NoComparator {
                rule: rule.to_string(),
            }),
            [one] => Ok(*one),
            _ => Err(RuleError::MultipleComparators {
                rule: rule.to_string(),
            }),
        }
    }
}

/// Ordered catalog of loaded rules. Declaration order in the document is
/// preserved and defines the order alert events are emitted in.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: Vec<Rule>,
}

impl RuleCatalog {
    /// Load a catalog from a rules file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse a catalog from a YAML document with a top-level `rules` mapping
    pub fn from_yaml_str(doc: &str) -> Result<Self, RuleError> {
        let value: serde_yaml::Value = serde_yaml::from_str(doc)?;
        let mapping = value
            .get("rules")
            .and_then(|r| r.as_mapping())
            .ok_or(RuleError::MissingRules)?;

        let mut rules = Vec::with_capacity(mapping.len());
        for (name, options) in mapping {
            let name = name
                .as_str()
                .ok_or_else(|| RuleError::InvalidRuleName(name.clone()))?;
            let options: RuleOptions = serde_yaml::from_value(options.clone())?;
            rules.push(build_rule(name, &options)?);
        }

        Ok(Self { rules })
    }

    /// Build a catalog from already-parsed rule options, preserving the
    /// iteration order of the input.
    pub fn from_rules(
        entries: impl IntoIterator<Item = (String, RuleOptions)>,
    ) -> Result<Self, RuleError> {
        let rules = entries
            .into_iter()
            .map(|(name, options)| build_rule(&name, &options))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Rules in declaration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn build_rule(name: &str, options: &RuleOptions) -> Result<Rule, RuleError> {
    let (comparator, threshold) = options.comparator(name)?;

    let mut constraints = Vec::new();
    if let Some(label_match) = &options.label_match {
        for (key, pattern) in label_match {
            let constraint =
                LabelConstraint::compile(key, pattern).map_err(|source| RuleError::InvalidPattern {
                    rule: name.to_string(),
                    key: key.clone(),
                    source,
                })?;
            constraints.push(constraint);
        }
    }

    Ok(Rule {
        name: name.to_string(),
        comparator,
        threshold,
        constraints: LabelConstraints::new(constraints),
    })
}
