//! Log-only notifier, the default when no delivery channel is configured

use tracing::{info, warn};

use super::{async_trait, render_message, Notifier, NotifyError};
use crate::models::{AlertEvent, AlertKind};

/// Writes alert events to the log
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        let message = render_message(event);
        match event.kind {
            AlertKind::Firing => {
                warn!(series = %event.key, value = event.value, "[ALERT:FIRING] {message}");
            }
            AlertKind::Resolved => {
                info!(series = %event.key, value = event.value, "[ALERT:RESOLVED] {message}");
            }
        }
        Ok(())
    }
}
