//! Composition repository port
//!
//! Persistence for learned compositions and the pattern library.

use async_trait::async_trait;
use conductor_domain::{AgentComposition, PatternContribution};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Other(String),
}

#[async_trait]
pub trait CompositionRepository: Send + Sync {
    /// All compositions recorded for a task pattern
    async fn find_by_pattern(&self, task_pattern: &str)
    -> Result<Vec<AgentComposition>, PersistenceError>;

    async fn get(&self, id: &str) -> Result<Option<AgentComposition>, PersistenceError>;

    /// Insert or replace by id
    async fn upsert(&self, composition: &AgentComposition) -> Result<(), PersistenceError>;

    async fn append_contribution(
        &self,
        contribution: &PatternContribution,
    ) -> Result<(), PersistenceError>;

    async fn contributions(
        &self,
        task_pattern: &str,
    ) -> Result<Vec<PatternContribution>, PersistenceError>;
}
