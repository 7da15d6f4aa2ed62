//! Label constraint matching
//!
//! A rule may restrict which series it applies to with per-key patterns.
//! Matching is FULL-string: every pattern is compiled wrapped in
//! `^(?:...)$`, so `mountpoint: "/"` matches only the root mountpoint and
//! never `/tmp`. A leading `!` negates the pattern, which is how
//! exclusions are written (`fstype: "!tmpfs|devtmpfs"` matches any
//! filesystem type except those two). A key named by a constraint must be
//! present in the measurement's labels; a missing key never matches, even
//! for negated patterns.

use regex::Regex;

use crate::models::Labels;

/// One per-key constraint: the label value must (or, negated, must not)
/// fully match the compiled pattern.
#[derive(Debug, Clone)]
pub struct LabelConstraint {
    pub key: String,
    pattern: Regex,
    negated: bool,
}

impl LabelConstraint {
    /// Compile a constraint from its config form. A leading `!` marks the
    /// pattern as an exclusion and is not part of the regex.
    pub fn compile(key: &str, pattern: &str) -> Result<Self, regex::Error> {
        let (negated, raw) = match pattern.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, pattern),
        };
        let anchored = format!("^(?:{})$", raw);
        Ok(Self {
            key: key.to_string(),
            pattern: Regex::new(&anchored)?,
            negated,
        })
    }

    /// Whether the labels satisfy this constraint
    pub fn matches(&self, labels: &Labels) -> bool {
        let value = match labels.get(&self.key) {
            Some(v) => v,
            None => return false,
        };
        self.pattern.is_match(value) != self.negated
    }
}

/// The full constraint set of one rule. Empty means match-all.
#[derive(Debug, Clone, Default)]
pub struct LabelConstraints(Vec<LabelConstraint>);

impl LabelConstraints {
    pub fn new(constraints: Vec<LabelConstraint>) -> Self {
        Self(constraints)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelConstraint> {
        self.0.iter()
    }

    /// Whether a label set satisfies every constraint. Pure; no side
    /// effects. Empty constraint set matches unconditionally.
    pub fn matches(&self, labels: &Labels) -> bool {
        self.0.iter().all(|c| c.matches(labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn constraints(pairs: &[(&str, &str)]) -> LabelConstraints {
        LabelConstraints::new(
            pairs
                .iter()
                .map(|(k, p)| LabelConstraint::compile(k, p).unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_empty_constraints_match_anything() {
        let c = LabelConstraints::default();
        assert!(c.matches(&Labels::new()));
        assert!(c.matches(&labels(&[("mountpoint", "/tmp")])));
    }

    #[test]
    fn test_missing_key_is_a_non_match() {
        let c = constraints(&[("mountpoint", "/")]);
        assert!(!c.matches(&labels(&[("device", "/dev/sda1")])));
    }

    #[test]
    fn test_missing_key_is_a_non_match_even_when_negated() {
        let c = constraints(&[("fstype", "!tmpfs|devtmpfs")]);
        assert!(!c.matches(&labels(&[("mountpoint", "/")])));
    }

    #[test]
    fn test_full_match_rejects_substring_hits() {
        // "/" must not match "/tmp" even though it is a substring
        let c = constraints(&[("mountpoint", "/")]);
        assert!(c.matches(&labels(&[("mountpoint", "/")])));
        assert!(!c.matches(&labels(&[("mountpoint", "/tmp")])));
    }

    #[test]
    fn test_user_anchored_pattern_still_works() {
        let c = constraints(&[("mountpoint", "^/$")]);
        assert!(c.matches(&labels(&[("mountpoint", "/")])));
        assert!(!c.matches(&labels(&[("mountpoint", "/tmp")])));
    }

    #[test]
    fn test_negated_pattern_excludes_alternatives() {
        let c = constraints(&[("fstype", "!tmpfs|devtmpfs")]);
        assert!(!c.matches(&labels(&[("fstype", "tmpfs")])));
        assert!(!c.matches(&labels(&[("fstype", "devtmpfs")])));
        assert!(c.matches(&labels(&[("fstype", "ext4")])));
    }

    #[test]
    fn test_negation_is_still_full_match() {
        // The exclusion must not fire on values that merely contain the
        // excluded word
        let c = constraints(&[("fstype", "!tmpfs")]);
        assert!(c.matches(&labels(&[("fstype", "not-tmpfs-really")])));
        assert!(!c.matches(&labels(&[("fstype", "tmpfs")])));
    }

    #[test]
    fn test_multiple_constraints_all_required() {
        let c = constraints(&[("mountpoint", "/"), ("fstype", "!tmpfs|devtmpfs")]);
        assert!(c.matches(&labels(&[("mountpoint", "/"), ("fstype", "ext4")])));
        assert!(!c.matches(&labels(&[("mountpoint", "/"), ("fstype", "tmpfs")])));
        assert!(!c.matches(&labels(&[("mountpoint", "/tmp"), ("fstype", "ext4")])));
    }

    #[test]
    fn test_regex_alternation() {
        let c = constraints(&[("device", "/dev/sd[ab]1")]);
        assert!(c.matches(&labels(&[("device", "/dev/sda1")])));
        assert!(c.matches(&labels(&[("device", "/dev/sdb1")])));
        assert!(!c.matches(&labels(&[("device", "/dev/sdc1")])));
    }

    #[test]
    fn test_invalid_pattern_fails_to_compile() {
        assert!(LabelConstraint::compile("device", "[unclosed").is_err());
    }
}
