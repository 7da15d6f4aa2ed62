//! Alert event delivery
//!
//! The engine hands transition events to a [`Notifier`] through a small
//! bounded dispatch queue so slow delivery never delays the next scrape.
//! Delivery is best-effort: failures are logged and counted, never
//! retried, and never affect alert state.

mod dispatch;
mod email;
mod log;

pub use dispatch::{DispatchConfig, DispatchQueue, Dispatcher};
pub use email::{EmailConfig, EmailNotifier};
pub use log::LogNotifier;

use crate::models::{AlertEvent, AlertKind};
use thiserror::Error;

pub use async_trait::async_trait;

/// Errors from one delivery attempt
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to build message: {0}")]
    Message(String),

    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("delivery timed out")]
    Timeout,
}

/// Trait for alert event delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a single alert event
    async fn deliver(&self, event: &AlertEvent) -> Result<(), NotifyError>;
}

/// Render the one-line human message for an event, shared by the
/// notifier implementations.
pub(crate) fn render_message(event: &AlertEvent) -> String {
    match event.kind {
        AlertKind::Firing => format!(
            "{} is {}, which is {} {}",
            event.key,
            event.value,
            event.comparator.phrase(),
            event.threshold
        ),
        AlertKind::Resolved => format!(
            "{} is {}, back within the {} {} bound",
            event.key,
            event.value,
            event.comparator.phrase(),
            event.threshold
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertKind, Labels, SeriesKey};
    use crate::rules::Comparator;

    fn event(kind: AlertKind) -> AlertEvent {
        AlertEvent {
            key: SeriesKey::new("node_load1", Labels::new()),
            kind,
            value: 5.0,
            threshold: 4.0,
            comparator: Comparator::Gt,
        }
    }

    #[test]
    fn test_render_firing_message() {
        let msg = render_message(&event(AlertKind::Firing));
        assert_eq!(msg, "node_load1 is 5, which is greater than 4");
    }

    #[test]
    fn test_render_resolved_message() {
        let msg = render_message(&event(AlertKind::Resolved));
        assert!(msg.starts_with("node_load1 is 5, back within"));
    }
}
