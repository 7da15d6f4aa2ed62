//! Daemon configuration
//!
//! Runtime settings come from an optional YAML config file plus
//! `MONITOR_`-prefixed environment overrides (nested keys separated by
//! `__`, e.g. `MONITOR_EMAIL__SMTP_SERVER`). The rule catalog lives in
//! its own rules file; an invalid catalog aborts startup.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use monitor_lib::notify::{DispatchConfig, EmailConfig};
use monitor_lib::scheduler::SchedulerConfig;
use monitor_lib::scrape::ScrapeConfig;
use serde::Deserialize;

/// Daemon configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Exporter host to scrape
    #[serde(default = "default_exporter_host")]
    pub exporter_host: String,

    /// Exporter port
    #[serde(default = "default_exporter_port")]
    pub exporter_port: u16,

    /// Seconds between evaluation cycles
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Upper bound on one scrape attempt, in seconds
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_secs: u64,

    /// API server port for health/metrics/alerts
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Path to the rules file
    #[serde(default = "default_rules_file")]
    pub rules_file: String,

    /// Notification dispatch workers (clamped to 1..=4)
    #[serde(default = "default_dispatch_workers")]
    pub dispatch_workers: usize,

    /// Pending notification queue capacity
    #[serde(default = "default_dispatch_queue_size")]
    pub dispatch_queue_size: usize,

    /// Per-notification delivery timeout, in seconds
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_secs: u64,

    /// SMTP settings; alerts go to the log when absent
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

fn default_exporter_host() -> String {
    "localhost".to_string()
}

fn default_exporter_port() -> u16 {
    9100
}

fn default_check_interval() -> u64 {
    300
}

fn default_scrape_timeout() -> u64 {
    10
}

fn default_api_port() -> u16 {
    8080
}

fn default_rules_file() -> String {
    "rules.yml".to_string()
}

fn default_dispatch_workers() -> usize {
    2
}

fn default_dispatch_queue_size() -> usize {
    64
}

fn default_delivery_timeout() -> u64 {
    30
}

impl MonitorConfig {
    /// Load configuration from an optional file and the environment.
    /// The file path comes from `MONITOR_CONFIG`, falling back to
    /// `config.yml` when that file exists.
    pub fn load() -> Result<Self> {
        let path = std::env::var("MONITOR_CONFIG").ok().or_else(|| {
            Path::new("config.yml")
                .exists()
                .then(|| "config.yml".to_string())
        });
        Self::load_from(path.as_deref())
    }

    /// Load configuration from a specific file (if any) plus environment
    pub fn load_from(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::new(path, config::FileFormat::Yaml));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("MONITOR")
                .separator("__")
                .ignore_empty(true),
        );

        let config = builder.build().context("Failed to read configuration")?;
        let config: MonitorConfig = config
            .try_deserialize()
            .context("Invalid configuration values")?;

        if config.check_interval_secs == 0 {
            anyhow::bail!("check_interval_secs must be positive");
        }
        if config.scrape_timeout_secs == 0 {
            anyhow::bail!("scrape_timeout_secs must be positive");
        }

        Ok(config)
    }

    pub fn scrape_config(&self) -> ScrapeConfig {
        ScrapeConfig {
            host: self.exporter_host.clone(),
            port: self.exporter_port,
            path: "/metrics".to_string(),
            timeout: Duration::from_secs(self.scrape_timeout_secs),
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(self.check_interval_secs),
            scrape_timeout: Duration::from_secs(self.scrape_timeout_secs),
        }
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            workers: self.dispatch_workers,
            capacity: self.dispatch_queue_size,
            delivery_timeout: Duration::from_secs(self.delivery_timeout_secs),
        }
    }
}
