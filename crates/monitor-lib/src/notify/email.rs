//! SMTP email notifier

use chrono::Utc;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use tracing::info;

use super::{async_trait, render_message, Notifier, NotifyError};
use crate::models::AlertEvent;

/// SMTP delivery settings
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub from: String,
    pub to: String,
    /// STARTTLS on the SMTP connection
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_use_tls() -> bool {
    true
}

/// Delivers alert events as individual emails over SMTP
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Build the notifier from its configuration. Address and relay
    /// problems surface here, at startup.
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
                .map_err(NotifyError::Smtp)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_server)
        };
        builder = builder.port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = config
            .from
            .parse()
            .map_err(|e| NotifyError::Message(format!("invalid from address: {e}")))?;
        let to = config
            .to
            .parse()
            .map_err(|e| NotifyError::Message(format!("invalid to address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn deliver(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        let subject = format!(
            "Node Monitor {} - {}",
            event.kind,
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        );
        let body = render_message(event);

        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .body(body)
            .map_err(|e| NotifyError::Message(e.to_string()))?;

        self.transport.send(message).await?;
        info!(series = %event.key, kind = %event.kind, "Alert email sent");
        Ok(())
    }
}
