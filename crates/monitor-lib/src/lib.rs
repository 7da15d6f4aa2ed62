//! Monitor library for threshold alerting on scraped node metrics
//!
//! This crate provides the core functionality for:
//! - Scraping a plain-text metrics endpoint
//! - Evaluating threshold rules with label constraints
//! - Tracking per-series alert state across cycles
//! - Dispatching firing/resolved notifications
//! - Health checks and observability

pub mod engine;
pub mod health;
pub mod models;
pub mod notify;
pub mod observability;
pub mod rules;
pub mod scheduler;
pub mod scrape;

pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::MonitorMetrics;
pub use scheduler::{MonitorLoop, SchedulerConfig, DEFAULT_INTERVAL};
