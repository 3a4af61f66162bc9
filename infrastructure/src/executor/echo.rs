//! Offline executor for dry runs.
//!
//! Produces a deterministic, structured reply that names the agent and
//! echoes the task, so a whole plan can be exercised without a backend.
//! Classifier prompts get a `DIFFICULTY:` line.

use async_trait::async_trait;
use conductor_application::ports::executor::{
    Executor, ExecutorError, ExecutorRequest, ExecutorResponse,
};
use conductor_domain::util::preview;

const CLASSIFIER_MARKER: &str = "DIFFICULTY:";

#[derive(Debug, Default)]
pub struct EchoExecutor;

impl EchoExecutor {
    pub fn new() -> Self {
        Self
    }

    fn reply(request: &ExecutorRequest) -> String {
        if request.system_prompt.contains(CLASSIFIER_MARKER) {
            return "DIFFICULTY: moderate".to_string();
        }

        let headline = request.system_prompt.lines().next().unwrap_or_default();
        let task = request.user_message.lines().next().unwrap_or_default();
        format!(
            "## Dry run: {}\n\n\
             - Model: {} ({} tier)\n\
             - Task: {}\n\
             - Prompt size: {} characters of instructions, {} of input\n\n\
             No backend was called; this output stands in for the agent's answer.\n\n\
             CONFIDENCE: 0.7",
            preview(headline, 80),
            request.model_id,
            request.tier,
            preview(task, 120),
            request.system_prompt.len(),
            request.user_message.len(),
        )
    }
}

#[async_trait]
impl Executor for EchoExecutor {
    async fn call(&self, request: &ExecutorRequest) -> Result<ExecutorResponse, ExecutorError> {
        let content = Self::reply(request);
        let input_tokens = (request.system_prompt.len() + request.user_message.len()) as u64 / 4;
        let output_tokens = content.len() as u64 / 4;
        Ok(ExecutorResponse::new(content).with_tokens(input_tokens, output_tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_domain::{OutputAssessment, Tier};

    #[tokio::test]
    async fn test_reply_is_structured_and_confident() {
        let response = EchoExecutor
            .call(&ExecutorRequest {
                model_id: "claude-sonnet-4.5".into(),
                system_prompt: "You are a security scanner. Inspect the material.".into(),
                user_message: "Review this PR for security vulnerabilities".into(),
                tier: Tier::Capable,
            })
            .await
            .unwrap();

        assert!(response.content.contains("You are a security scanner."));
        assert!(response.content.contains("Review this PR"));
        assert!(OutputAssessment::of(&response.content).quality >= 0.6);
    }

    #[tokio::test]
    async fn test_classifier_gets_difficulty_line() {
        let response = EchoExecutor
            .call(&ExecutorRequest {
                model_id: "claude-haiku-4.5".into(),
                system_prompt: "Classify the difficulty of the task. Reply with one line \
                                `DIFFICULTY: simple|moderate|complex`."
                    .into(),
                user_message: "Summarize the notes".into(),
                tier: Tier::Cheap,
            })
            .await
            .unwrap();
        assert_eq!(response.content, "DIFFICULTY: moderate");
    }
}
