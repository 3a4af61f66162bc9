//! Executor port
//!
//! Defines the interface for the text-generation call made on behalf of an
//! agent. Implementations (adapters) live in the infrastructure layer.

use async_trait::async_trait;
use conductor_domain::Tier;
use thiserror::Error;

/// Errors that can occur during an executor call
#[derive(Error, Debug, Clone)]
pub enum ExecutorError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// One text-generation request
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorRequest {
    pub model_id: String,
    pub system_prompt: String,
    pub user_message: String,
    pub tier: Tier,
}

/// Response to an [`ExecutorRequest`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutorResponse {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// USD; zero when the executor cannot price the call
    pub cost: f64,
    pub duration_ms: u64,
}

impl ExecutorResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tokens(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.input_tokens = input_tokens;
        self.output_tokens = output_tokens;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }
}

/// Text-generation backend
#[async_trait]
pub trait Executor: Send + Sync {
    async fn call(&self, request: &ExecutorRequest) -> Result<ExecutorResponse, ExecutorError>;
}
