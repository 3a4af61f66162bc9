//! Adaptive model routing
//!
//! Chooses a model per (workflow, stage, tier) from telemetry, recommends
//! tier upgrades when a tier keeps failing, and summarizes routing history.
//! Telemetry errors never surface to callers: routing falls back to the
//! registry's tier defaults.

use crate::config::RouterConfig;
use crate::ports::telemetry::{TelemetryError, TelemetryStore};
use conductor_domain::util::{DAY_MILLIS, now_millis};
use conductor_domain::{
    ModelRegistry, ModelStats, RouteConstraints, RoutingStats, TelemetryQuery, Tier, TierUpgrade,
    choose_model,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AdaptiveModelRouter {
    telemetry: Arc<dyn TelemetryStore>,
    registry: Arc<ModelRegistry>,
    config: RouterConfig,
}

impl AdaptiveModelRouter {
    pub fn new(telemetry: Arc<dyn TelemetryStore>, registry: Arc<ModelRegistry>) -> Self {
        Self {
            telemetry,
            registry,
            config: RouterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Best model for a stage at a tier.
    ///
    /// Same telemetry and arguments always give the same answer.
    pub async fn get_best_model(
        &self,
        workflow: &str,
        stage: &str,
        tier: Tier,
        constraints: &RouteConstraints,
    ) -> String {
        let since = now_millis().saturating_sub(u64::from(self.config.lookback_days) * DAY_MILLIS);
        let query = TelemetryQuery::for_workflow(workflow)
            .with_stage(stage)
            .with_tier(tier)
            .since(since);

        let records = match self.telemetry.query(&query).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Telemetry unavailable, using tier default: {}", e);
                Vec::new()
            }
        };

        let stats = ModelStats::by_model(&records);
        match choose_model(
            &stats,
            constraints,
            self.config.min_sample_size,
            self.config.min_success_rate,
        ) {
            Some(model_id) => {
                debug!("Routing {}/{} at {} to {}", workflow, stage, tier, model_id);
                model_id
            }
            None => {
                let model_id = self.registry.default_model_id(tier);
                debug!(
                    "No ranked model for {}/{} at {} ({} records), using {}",
                    workflow,
                    stage,
                    tier,
                    records.len(),
                    model_id
                );
                model_id
            }
        }
    }

    /// Whether calls for this stage should move up a tier
    pub async fn recommend_tier_upgrade(&self, workflow: &str, stage: &str, tier: Tier) -> TierUpgrade {
        let query = TelemetryQuery::for_workflow(workflow)
            .with_stage(stage)
            .with_tier(tier)
            .with_limit(self.config.upgrade_window);

        match self.telemetry.query(&query).await {
            Ok(recent) => TierUpgrade::evaluate(
                tier,
                &recent,
                self.config.upgrade_min_samples,
                self.config.failure_rate_threshold,
            ),
            Err(e) => {
                warn!("Telemetry unavailable for upgrade check: {}", e);
                TierUpgrade {
                    recommended: false,
                    reason: format!("Insufficient data: telemetry unavailable ({})", e),
                    target: tier,
                }
            }
        }
    }

    /// Summary of a workflow's calls over the last `days`
    pub async fn get_routing_stats(&self, workflow: &str, days: u32) -> Result<RoutingStats, TelemetryError> {
        let since = now_millis().saturating_sub(u64::from(days) * DAY_MILLIS);
        let records = self
            .telemetry
            .query(&TelemetryQuery::for_workflow(workflow).since(since))
            .await?;
        Ok(RoutingStats::from_records(workflow, days, &records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::telemetry::NoTelemetry;
    use async_trait::async_trait;
    use conductor_domain::RoutingRecord;
    use std::sync::Mutex;

    struct MemoryTelemetry {
        records: Mutex<Vec<RoutingRecord>>,
    }

    impl MemoryTelemetry {
        fn new(records: Vec<RoutingRecord>) -> Self {
            Self {
                records: Mutex::new(records),
            }
        }
    }

    #[async_trait]
    impl TelemetryStore for MemoryTelemetry {
        async fn append(&self, record: RoutingRecord) -> Result<(), TelemetryError> {
            self.records.lock().unwrap().push(record);
            Ok(())
        }

        async fn query(&self, query: &TelemetryQuery) -> Result<Vec<RoutingRecord>, TelemetryError> {
            Ok(query.apply(self.records.lock().unwrap().iter()))
        }
    }

    struct BrokenTelemetry;

    #[async_trait]
    impl TelemetryStore for BrokenTelemetry {
        async fn append(&self, _record: RoutingRecord) -> Result<(), TelemetryError> {
            Err(TelemetryError::Unavailable("down".into()))
        }

        async fn query(&self, _query: &TelemetryQuery) -> Result<Vec<RoutingRecord>, TelemetryError> {
            Err(TelemetryError::Unavailable("down".into()))
        }
    }

    fn record(model: &str, tier: Tier, success: bool, cost: f64) -> RoutingRecord {
        RoutingRecord {
            workflow: "security".into(),
            stage: "security_scanner".into(),
            tier,
            model_id: model.into(),
            provider: "anthropic".into(),
            cost,
            input_tokens: 100,
            output_tokens: 100,
            cache_hit: false,
            duration_ms: 500,
            success,
            timestamp: now_millis(),
        }
    }

    fn batch(model: &str, tier: Tier, n: usize, failures: usize, cost: f64) -> Vec<RoutingRecord> {
        (0..n).map(|i| record(model, tier, i >= failures, cost)).collect()
    }

    fn router(records: Vec<RoutingRecord>) -> AdaptiveModelRouter {
        AdaptiveModelRouter::new(
            Arc::new(MemoryTelemetry::new(records)),
            Arc::new(ModelRegistry::default()),
        )
    }

    #[tokio::test]
    async fn test_cold_start_uses_tier_default() {
        let r = AdaptiveModelRouter::new(Arc::new(NoTelemetry), Arc::new(ModelRegistry::default()));
        let model = r
            .get_best_model("security", "security_scanner", Tier::Capable, &RouteConstraints::default())
            .await;
        assert_eq!(model, ModelRegistry::default().default_model_id(Tier::Capable));
    }

    #[tokio::test]
    async fn test_unavailable_telemetry_falls_back() {
        let r = AdaptiveModelRouter::new(Arc::new(BrokenTelemetry), Arc::new(ModelRegistry::default()));
        let model = r
            .get_best_model("security", "security_scanner", Tier::Cheap, &RouteConstraints::default())
            .await;
        assert_eq!(model, ModelRegistry::default().default_model_id(Tier::Cheap));
        let upgrade = r.recommend_tier_upgrade("security", "security_scanner", Tier::Cheap).await;
        assert!(!upgrade.recommended);
        assert!(r.get_routing_stats("security", 7).await.is_err());
    }

    #[tokio::test]
    async fn test_best_model_is_idempotent() {
        let mut records = batch("model-a", Tier::Capable, 12, 1, 0.02);
        records.extend(batch("model-b", Tier::Capable, 12, 0, 0.03));
        let r = router(records);
        let constraints = RouteConstraints::default();

        let first = r.get_best_model("security", "security_scanner", Tier::Capable, &constraints).await;
        let second = r.get_best_model("security", "security_scanner", Tier::Capable, &constraints).await;
        assert_eq!(first, "model-b");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_best_model_ignores_other_tiers() {
        let r = router(batch("cheap-model", Tier::Cheap, 20, 0, 0.001));
        let model = r
            .get_best_model("security", "security_scanner", Tier::Premium, &RouteConstraints::default())
            .await;
        assert_eq!(model, ModelRegistry::default().default_model_id(Tier::Premium));
    }

    #[tokio::test]
    async fn test_upgrade_at_25_percent_failures() {
        let r = router(batch("m", Tier::Cheap, 20, 5, 0.01));
        let upgrade = r.recommend_tier_upgrade("security", "security_scanner", Tier::Cheap).await;
        assert!(upgrade.recommended);
        assert!(upgrade.reason.contains("25"));
        assert_eq!(upgrade.target, Tier::Capable);
    }

    #[tokio::test]
    async fn test_no_upgrade_at_5_percent_failures() {
        let r = router(batch("m", Tier::Cheap, 20, 1, 0.01));
        let upgrade = r.recommend_tier_upgrade("security", "security_scanner", Tier::Cheap).await;
        assert!(!upgrade.recommended);
        assert!(upgrade.reason.to_lowercase().contains("acceptable"));
    }

    #[tokio::test]
    async fn test_upgrade_window_uses_most_recent_calls() {
        // 30 old failures followed by 20 recent successes
        let mut records = Vec::new();
        for (i, mut r) in batch("m", Tier::Cheap, 50, 30, 0.01).into_iter().enumerate() {
            r.timestamp = 1_000 + i as u64;
            records.push(r);
        }
        let r = router(records);
        let upgrade = r.recommend_tier_upgrade("security", "security_scanner", Tier::Cheap).await;
        assert!(!upgrade.recommended);
    }

    #[tokio::test]
    async fn test_routing_stats() {
        let mut records = batch("model-a", Tier::Cheap, 4, 1, 0.01);
        records.extend(batch("model-b", Tier::Capable, 6, 0, 0.02));
        let r = router(records);

        let stats = r.get_routing_stats("security", 7).await.unwrap();
        assert_eq!(stats.total_calls, 10);
        assert_eq!(stats.models_used.len(), 2);
        assert!((stats.success_rate - 0.9).abs() < 1e-9);
        assert!(r.get_routing_stats("testing", 7).await.unwrap().is_empty());
    }
}
