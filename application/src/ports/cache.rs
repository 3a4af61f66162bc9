//! Response cache port
//!
//! Optional cache in front of the executor. Adapters derive their own key
//! from the request; [`CacheRequest::fingerprint`] is the shared default.

use async_trait::async_trait;
use conductor_domain::util::digest_hex;
use std::time::Duration;

/// The parts of an executor call that determine its response
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheRequest {
    pub model_id: String,
    pub system_prompt: String,
    pub user_message: String,
}

impl CacheRequest {
    pub fn new(
        model_id: impl Into<String>,
        system_prompt: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            system_prompt: system_prompt.into(),
            user_message: user_message.into(),
        }
    }

    /// Stable key over model, system prompt and user message
    pub fn fingerprint(&self) -> String {
        let digest = digest_hex(&[&self.model_id, &self.system_prompt, &self.user_message]);
        format!("{}:{}", self.model_id, digest)
    }
}

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, request: &CacheRequest) -> Option<String>;

    async fn set(&self, request: &CacheRequest, value: &str, ttl: Duration);
}

/// Cache that never stores anything
pub struct NoCache;

#[async_trait]
impl ResponseCache for NoCache {
    async fn get(&self, _request: &CacheRequest) -> Option<String> {
        None
    }

    async fn set(&self, _request: &CacheRequest, _value: &str, _ttl: Duration) {}
}
