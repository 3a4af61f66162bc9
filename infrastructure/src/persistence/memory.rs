//! In-memory composition repository

use async_trait::async_trait;
use conductor_application::ports::composition_repository::{
    CompositionRepository, PersistenceError,
};
use conductor_domain::{AgentComposition, PatternContribution};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryCompositionRepository {
    compositions: RwLock<HashMap<String, AgentComposition>>,
    contributions: RwLock<Vec<PatternContribution>>,
}

impl MemoryCompositionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompositionRepository for MemoryCompositionRepository {
    async fn find_by_pattern(
        &self,
        task_pattern: &str,
    ) -> Result<Vec<AgentComposition>, PersistenceError> {
        Ok(self
            .compositions
            .read()
            .await
            .values()
            .filter(|c| c.task_pattern == task_pattern)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<AgentComposition>, PersistenceError> {
        Ok(self.compositions.read().await.get(id).cloned())
    }

    async fn upsert(&self, composition: &AgentComposition) -> Result<(), PersistenceError> {
        self.compositions
            .write()
            .await
            .insert(composition.id.clone(), composition.clone());
        Ok(())
    }

    async fn append_contribution(
        &self,
        contribution: &PatternContribution,
    ) -> Result<(), PersistenceError> {
        self.contributions.write().await.push(contribution.clone());
        Ok(())
    }

    async fn contributions(
        &self,
        task_pattern: &str,
    ) -> Result<Vec<PatternContribution>, PersistenceError> {
        Ok(self
            .contributions
            .read()
            .await
            .iter()
            .filter(|c| c.task_pattern == task_pattern)
            .cloned()
            .collect())
    }
}
