//! Routing records and telemetry queries

use crate::core::tier::Tier;
use serde::{Deserialize, Serialize};

/// One model call as recorded in telemetry (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRecord {
    pub workflow: String,
    pub stage: String,
    pub tier: Tier,
    pub model_id: String,
    pub provider: String,
    /// USD
    pub cost: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_hit: bool,
    pub duration_ms: u64,
    pub success: bool,
    /// Epoch milliseconds
    pub timestamp: u64,
}

/// Filter over stored routing records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryQuery {
    pub workflow: String,
    pub stage: Option<String>,
    pub tier: Option<Tier>,
    /// Only records at or after this epoch-ms timestamp
    pub since: Option<u64>,
    /// Keep only the most recent N matches
    pub limit: Option<usize>,
}

impl TelemetryQuery {
    pub fn for_workflow(workflow: impl Into<String>) -> Self {
        Self {
            workflow: workflow.into(),
            ..Default::default()
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn since(mut self, timestamp: u64) -> Self {
        self.since = Some(timestamp);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &RoutingRecord) -> bool {
        record.workflow == self.workflow
            && self.stage.as_ref().is_none_or(|s| *s == record.stage)
            && self.tier.is_none_or(|t| t == record.tier)
            && self.since.is_none_or(|since| record.timestamp >= since)
    }

    /// Apply this query to an in-memory slice.
    ///
    /// Results are in timestamp order; `limit` keeps the newest entries.
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a RoutingRecord>) -> Vec<RoutingRecord> {
        let mut matched: Vec<RoutingRecord> = records
            .into_iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        matched.sort_by_key(|r| r.timestamp);
        if let Some(limit) = self.limit {
            let excess = matched.len().saturating_sub(limit);
            matched.drain(..excess);
        }
        matched
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn record(model_id: &str, tier: Tier, success: bool, cost: f64, timestamp: u64) -> RoutingRecord {
        RoutingRecord {
            workflow: "code_review".into(),
            stage: "security_scanner".into(),
            tier,
            model_id: model_id.into(),
            provider: "anthropic".into(),
            cost,
            input_tokens: 2_000,
            output_tokens: 1_000,
            cache_hit: false,
            duration_ms: 1_200,
            success,
            timestamp,
        }
    }
}
