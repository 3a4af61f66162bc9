//! Composition store: the learning loop's memory
//!
//! Wraps a [`CompositionRepository`] with the reuse rules and serializes
//! read-modify-write cycles per task pattern. Persistence failures are
//! logged and swallowed; learning never fails an orchestration.

use crate::config::LearningConfig;
use crate::ports::composition_repository::{CompositionRepository, PersistenceError};
use conductor_domain::util::now_millis;
use conductor_domain::{AgentComposition, CompositionOutcome, best_for_pattern};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct CompositionStore {
    repository: Arc<dyn CompositionRepository>,
    config: LearningConfig,
    pattern_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CompositionStore {
    pub fn new(repository: Arc<dyn CompositionRepository>) -> Self {
        Self {
            repository,
            config: LearningConfig::default(),
            pattern_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_config(mut self, config: LearningConfig) -> Self {
        self.config = config;
        self
    }

    /// Best proven composition for a pattern, if any has been used enough
    pub async fn load(&self, task_pattern: &str) -> Option<AgentComposition> {
        let candidates = self.candidates(task_pattern).await?;
        best_for_pattern(&candidates, self.config.min_reuse_count).cloned()
    }

    /// Composition that already succeeded for this exact task
    pub async fn load_exact(&self, task_pattern: &str, signature: &str) -> Option<AgentComposition> {
        let candidates = self.candidates(task_pattern).await?;
        candidates
            .into_iter()
            .filter(|c| c.is_proven_for(signature))
            .max_by(|a, b| {
                a.success_rate
                    .total_cmp(&b.success_rate)
                    .then(a.last_used.cmp(&b.last_used))
            })
    }

    /// Fold an outcome into the stored composition.
    ///
    /// Unknown compositions are only created for successful outcomes.
    /// Returns the composition as stored, or `None` when nothing was
    /// persisted.
    pub async fn save(
        &self,
        composition: AgentComposition,
        outcome: &CompositionOutcome,
    ) -> Option<AgentComposition> {
        let lock = self.pattern_lock(&composition.task_pattern).await;
        let _guard = lock.lock().await;

        match self.save_locked(composition, outcome).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Failed to persist composition outcome: {}", e);
                None
            }
        }
    }

    async fn save_locked(
        &self,
        composition: AgentComposition,
        outcome: &CompositionOutcome,
    ) -> Result<Option<AgentComposition>, PersistenceError> {
        let mut stored = match self.repository.get(&composition.id).await? {
            Some(existing) => existing,
            None if outcome.success => {
                info!(
                    "Learning new composition {} for {}",
                    composition.id, composition.task_pattern
                );
                composition
            }
            None => {
                debug!(
                    "Not persisting failed fresh composition {}",
                    composition.id
                );
                return Ok(None);
            }
        };

        let contribution =
            stored.record_outcome(outcome, self.config.reuse_quality_threshold, now_millis());
        self.repository.upsert(&stored).await?;
        if let Err(e) = self.repository.append_contribution(&contribution).await {
            warn!("Failed to append pattern contribution: {}", e);
        }

        debug!(
            "Composition {}: usage_count={}, success_rate={:.2}",
            stored.id, stored.usage_count, stored.success_rate
        );
        Ok(Some(stored))
    }

    async fn candidates(&self, task_pattern: &str) -> Option<Vec<AgentComposition>> {
        match self.repository.find_by_pattern(task_pattern).await {
            Ok(candidates) => Some(candidates),
            Err(e) => {
                warn!("Failed to load compositions for {}: {}", task_pattern, e);
                None
            }
        }
    }

    async fn pattern_lock(&self, task_pattern: &str) -> Arc<Mutex<()>> {
        let mut locks = self.pattern_locks.lock().await;
        Arc::clone(locks.entry(task_pattern.to_string()).or_default())
    }
}
