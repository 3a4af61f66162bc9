//! Telemetry store port
//!
//! Append-only store of [`RoutingRecord`]s. The router treats any query
//! error as "no data" and falls back to cold-start defaults.

use async_trait::async_trait;
use conductor_domain::{RoutingRecord, TelemetryQuery};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Telemetry I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Telemetry record malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Telemetry unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TelemetryStore: Send + Sync {
    async fn append(&self, record: RoutingRecord) -> Result<(), TelemetryError>;

    async fn query(&self, query: &TelemetryQuery) -> Result<Vec<RoutingRecord>, TelemetryError>;
}

/// Store that records nothing and always answers with no data
pub struct NoTelemetry;

#[async_trait]
impl TelemetryStore for NoTelemetry {
    async fn append(&self, _record: RoutingRecord) -> Result<(), TelemetryError> {
        Ok(())
    }

    async fn query(&self, _query: &TelemetryQuery) -> Result<Vec<RoutingRecord>, TelemetryError> {
        Ok(Vec::new())
    }
}
