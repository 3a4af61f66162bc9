//! Orchestrator configuration.
//!
//! [`OrchestratorConfig`] groups the static parameters of
//! [`MetaOrchestrator`](crate::use_cases::orchestrate::MetaOrchestrator).
//! The infrastructure config loader converts file configuration into it.

use super::{LearningConfig, RouterConfig};
use conductor_domain::QualityGates;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Per-call timeout when the template sets none
    pub agent_timeout: Duration,
    /// Deadline for a whole plan
    pub plan_timeout: Duration,
    /// How long interactive runs wait for a plan decision
    pub approval_timeout: Duration,
    /// TTL for cached executor responses
    pub cache_ttl: Duration,
    /// Gates applied to every agent unless the agent overrides them
    pub quality_gates: QualityGates,
    pub router: RouterConfig,
    pub learning: LearningConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_secs(120),
            plan_timeout: Duration::from_secs(600),
            approval_timeout: Duration::from_secs(300),
            cache_ttl: Duration::from_secs(3600),
            quality_gates: QualityGates::new(),
            router: RouterConfig::default(),
            learning: LearningConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    // ==================== Builder Methods ====================

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn with_plan_timeout(mut self, timeout: Duration) -> Self {
        self.plan_timeout = timeout;
        self
    }

    pub fn with_approval_timeout(mut self, timeout: Duration) -> Self {
        self.approval_timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_quality_gates(mut self, gates: QualityGates) -> Self {
        self.quality_gates = gates;
        self
    }

    pub fn with_router(mut self, router: RouterConfig) -> Self {
        self.router = router;
        self
    }

    pub fn with_learning(mut self, learning: LearningConfig) -> Self {
        self.learning = learning;
        self
    }
}
