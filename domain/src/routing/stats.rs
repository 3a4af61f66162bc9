//! Aggregated routing statistics and model choice

use super::record::RoutingRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ranking metric for a model: `success_rate * 100 - avg_cost * 10`
pub fn quality_score(success_rate: f64, avg_cost: f64) -> f64 {
    success_rate * 100.0 - avg_cost * 10.0
}

/// Per-model aggregate over a set of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub model_id: String,
    pub calls: usize,
    pub success_rate: f64,
    pub avg_cost: f64,
    pub avg_latency_ms: f64,
}

impl ModelStats {
    pub fn quality_score(&self) -> f64 {
        quality_score(self.success_rate, self.avg_cost)
    }

    /// Group records by model id
    pub fn by_model<'a>(records: impl IntoIterator<Item = &'a RoutingRecord>) -> BTreeMap<String, ModelStats> {
        #[derive(Default)]
        struct Acc {
            calls: usize,
            successes: usize,
            cost: f64,
            latency: u64,
        }

        let mut acc: BTreeMap<String, Acc> = BTreeMap::new();
        for record in records {
            let entry = acc.entry(record.model_id.clone()).or_default();
            entry.calls += 1;
            entry.successes += usize::from(record.success);
            entry.cost += record.cost;
            entry.latency += record.duration_ms;
        }

        acc.into_iter()
            .map(|(model_id, a)| {
                let n = a.calls as f64;
                let stats = ModelStats {
                    model_id: model_id.clone(),
                    calls: a.calls,
                    success_rate: a.successes as f64 / n,
                    avg_cost: a.cost / n,
                    avg_latency_ms: a.latency as f64 / n,
                };
                (model_id, stats)
            })
            .collect()
    }
}

/// Caller constraints applied when choosing a model
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteConstraints {
    pub max_cost: Option<f64>,
    pub max_latency_ms: Option<u64>,
    pub min_success_rate: Option<f64>,
}

impl RouteConstraints {
    pub fn admits(&self, stats: &ModelStats, default_min_success_rate: f64) -> bool {
        let min_rate = self.min_success_rate.unwrap_or(default_min_success_rate);
        stats.success_rate >= min_rate
            && self.max_cost.is_none_or(|max| stats.avg_cost <= max)
            && self
                .max_latency_ms
                .is_none_or(|max| stats.avg_latency_ms <= max as f64)
    }
}

/// Pick the best-scoring admissible model with enough samples.
///
/// Ties go to the lower average cost, then the lexicographically smaller
/// model id. `None` means the caller should use the tier default.
pub fn choose_model(
    stats: &BTreeMap<String, ModelStats>,
    constraints: &RouteConstraints,
    min_sample_size: usize,
    default_min_success_rate: f64,
) -> Option<String> {
    stats
        .values()
        .filter(|s| s.calls >= min_sample_size)
        .filter(|s| constraints.admits(s, default_min_success_rate))
        .min_by(|a, b| {
            b.quality_score()
                .total_cmp(&a.quality_score())
                .then_with(|| a.avg_cost.total_cmp(&b.avg_cost))
                .then_with(|| a.model_id.cmp(&b.model_id))
        })
        .map(|s| s.model_id.clone())
}

/// Read-only summary of a workflow's routing history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingStats {
    pub workflow: String,
    pub days: u32,
    pub total_calls: usize,
    pub avg_cost: f64,
    pub success_rate: f64,
    pub cache_hit_rate: f64,
    pub models_used: Vec<String>,
    pub by_model: BTreeMap<String, ModelStats>,
}

impl RoutingStats {
    pub fn from_records(workflow: impl Into<String>, days: u32, records: &[RoutingRecord]) -> Self {
        let total = records.len();
        let ratio = |count: usize| {
            if total == 0 { 0.0 } else { count as f64 / total as f64 }
        };
        let by_model = ModelStats::by_model(records);

        Self {
            workflow: workflow.into(),
            days,
            total_calls: total,
            avg_cost: if total == 0 {
                0.0
            } else {
                records.iter().map(|r| r.cost).sum::<f64>() / total as f64
            },
            success_rate: ratio(records.iter().filter(|r| r.success).count()),
            cache_hit_rate: ratio(records.iter().filter(|r| r.cache_hit).count()),
            models_used: by_model.keys().cloned().collect(),
            by_model,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_calls == 0
    }

    /// Models ordered by quality score, best first
    pub fn ranked(&self) -> Vec<&ModelStats> {
        let mut ranked: Vec<_> = self.by_model.values().collect();
        ranked.sort_by(|a, b| {
            b.quality_score().total_cmp(&a.quality_score())
        });
        ranked
    }
}
