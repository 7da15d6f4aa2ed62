//! Measurement acquisition from a metrics endpoint
//!
//! The engine consumes parsed name/label/value triples through the
//! [`MetricsSource`] trait; the HTTP scraper and the plain-text exposition
//! parser live here. Scrape failures are recoverable by contract: the
//! scheduler logs them and runs the cycle with an empty snapshot.

mod exposition;
mod http;

pub use exposition::{parse_line, parse_text};
pub use http::{HttpSource, ScrapeConfig};

use crate::models::Measurement;
use thiserror::Error;

pub use async_trait::async_trait;

/// Errors from one scrape attempt
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("scrape request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("scrape endpoint returned status {status}")]
    Status { status: u16 },
}

impl ScrapeError {
    /// Whether the failure was a client-side timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, ScrapeError::Http(e) if e.is_timeout())
    }
}

/// Trait for measurement sources
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Fetch one snapshot of measurements
    async fn scrape(&self) -> Result<Vec<Measurement>, ScrapeError>;
}
