//! In-memory telemetry store

use async_trait::async_trait;
use conductor_application::ports::telemetry::{TelemetryError, TelemetryStore};
use conductor_domain::{RoutingRecord, TelemetryQuery};
use tokio::sync::Mutex;

/// Telemetry kept for the lifetime of the process
#[derive(Default)]
pub struct MemoryTelemetryStore {
    records: Mutex<Vec<RoutingRecord>>,
}

impl MemoryTelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records
    pub fn with_records(records: Vec<RoutingRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl TelemetryStore for MemoryTelemetryStore {
    async fn append(&self, record: RoutingRecord) -> Result<(), TelemetryError> {
        self.records.lock().await.push(record);
        Ok(())
    }

    async fn query(&self, query: &TelemetryQuery) -> Result<Vec<RoutingRecord>, TelemetryError> {
        Ok(query.apply(self.records.lock().await.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_domain::Tier;

    #[tokio::test]
    async fn test_query_filters_by_tier() {
        let store = MemoryTelemetryStore::new();
        for (tier, model) in [(Tier::Cheap, "a"), (Tier::Premium, "b"), (Tier::Cheap, "c")] {
            store
                .append(RoutingRecord {
                    workflow: "testing".into(),
                    stage: "test_writer".into(),
                    tier,
                    model_id: model.into(),
                    provider: "anthropic".into(),
                    cost: 0.0,
                    input_tokens: 0,
                    output_tokens: 0,
                    cache_hit: false,
                    duration_ms: 1,
                    success: true,
                    timestamp: 1,
                })
                .await
                .unwrap();
        }

        let cheap = store
            .query(&TelemetryQuery::for_workflow("testing").with_tier(Tier::Cheap))
            .await
            .unwrap();
        assert_eq!(cheap.len(), 2);
        assert_eq!(store.len().await, 3);
    }
}
