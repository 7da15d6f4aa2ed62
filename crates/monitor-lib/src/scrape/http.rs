//! HTTP scraper for a node-exporter-style endpoint

use std::time::Duration;

use tracing::debug;

use super::{async_trait, exposition, MetricsSource, ScrapeError};
use crate::models::Measurement;

/// Configuration for the HTTP scraper
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Exporter host
    pub host: String,
    /// Exporter port
    pub port: u16,
    /// Metrics path on the exporter
    pub path: String,
    /// Request timeout; a stalled endpoint must not wedge the scheduler
    pub timeout: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9100,
            path: "/metrics".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ScrapeConfig {
    /// Full scrape URL
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Scrapes measurements from an HTTP metrics endpoint
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    /// Create a scraper from its configuration
    pub fn new(config: &ScrapeConfig) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            url: config.url(),
        })
    }

    /// Create a scraper for an explicit URL, mainly for tests
    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MetricsSource for HttpSource {
    async fn scrape(&self) -> Result<Vec<Measurement>, ScrapeError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let measurements = exposition::parse_text(&body);
        debug!(url = %self.url, samples = measurements.len(), "Scrape complete");

        Ok(measurements)
    }
}
