//! Plain-text exposition format parsing
//!
//! Parses the node-exporter line convention:
//!
//! ```text
//! metric_name{label="value",other="value"} 123.4
//! ```
//!
//! Comment lines (`# HELP`, `# TYPE`) and blank lines are skipped. A line
//! that does not parse is dropped with a debug log; a partially malformed
//! scrape still yields the lines that did parse.

use tracing::debug;

use crate::models::{Labels, Measurement};

/// Parse a full exposition document into measurements, in document order
pub fn parse_text(body: &str) -> Vec<Measurement> {
    let mut measurements = Vec::new();
    let mut skipped = 0usize;

    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_line(trimmed) {
            Some(m) => measurements.push(m),
            None => {
                skipped += 1;
                debug!(line = trimmed, "Skipping unparsable exposition line");
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, parsed = measurements.len(), "Scrape contained malformed lines");
    }

    measurements
}

/// Parse a single exposition line. Returns `None` for anything malformed.
pub fn parse_line(line: &str) -> Option<Measurement> {
    let (name_part, rest) = match line.find('{') {
        Some(open) => {
            let close = line.rfind('}')?;
            if close < open {
                return None;
            }
            (&line[..open], Some((&line[open + 1..close], &line[close + 1..])))
        }
        None => (line, None),
    };

    let (name, labels, value_part) = match rest {
        Some((label_str, tail)) => (name_part.trim(), parse_labels(label_str)?, tail),
        None => {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let value = parts.next()?;
            (name, Labels::new(), value)
        }
    };

    if name.is_empty() {
        return None;
    }

    // The value is the first token after the labels; a trailing timestamp
    // is ignored.
    let value_token = value_part.split_whitespace().next()?;
    let value = parse_value(value_token)?;

    Some(Measurement::new(name, labels, value))
}

/// Parse `k="v",k2="v2"` label pairs, honoring `\"`, `\\` and `\n`
/// escapes inside values.
fn parse_labels(s: &str) -> Option<Labels> {
    let mut labels = Labels::new();
    let mut chars = s.chars().peekable();

    loop {
        // Skip separators and trailing comma before end
        while matches!(chars.peek(), Some(&',') | Some(&' ')) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        for c in chars.by_ref() {
            if c == '=' {
                break;
            }
            key.push(c);
        }
        if key.is_empty() {
            return None;
        }

        if chars.next() != Some('"') {
            return None;
        }

        let mut value = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some('n') => value.push('\n'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return None,
                },
                '"' => {
                    closed = true;
                    break;
                }
                other => value.push(other),
            }
        }
        if !closed {
            return None;
        }

        labels.insert(key, value);
    }

    Some(labels)
}

/// Parse a sample value, including the exposition spellings of
/// non-finite numbers.
fn parse_value(token: &str) -> Option<f64> {
    match token {
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => token.parse().ok(),
    }
}
