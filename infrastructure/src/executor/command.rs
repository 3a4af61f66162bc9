//! Subprocess executor.
//!
//! Runs a configured command once per call. Arguments may contain the
//! placeholders `{model}` and `{tier}`. The system prompt and user message
//! are written to stdin separated by a blank line; stdout is the response.
//! The model and tier are also exported as `CONDUCTOR_MODEL` and
//! `CONDUCTOR_TIER`.

use async_trait::async_trait;
use conductor_application::ports::executor::{
    Executor, ExecutorError, ExecutorRequest, ExecutorResponse,
};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Rough characters-per-token ratio for commands that report no usage
const CHARS_PER_TOKEN: usize = 4;

pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
}

impl CommandExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build an executor only if `program` can be found on `PATH`
    pub fn try_new(program: impl Into<String>, args: Vec<String>) -> Option<Self> {
        let program = program.into();
        if which::which(&program).is_err() {
            warn!("Executor command '{}' not found on PATH", program);
            return None;
        }
        Some(Self::new(program, args))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn expand_args(&self, request: &ExecutorRequest) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{model}", &request.model_id)
                    .replace("{tier}", request.tier.as_str())
            })
            .collect()
    }
}

fn estimate_tokens(text: &str) -> u64 {
    text.chars().count().div_ceil(CHARS_PER_TOKEN) as u64
}

#[async_trait]
impl Executor for CommandExecutor {
    async fn call(&self, request: &ExecutorRequest) -> Result<ExecutorResponse, ExecutorError> {
        let started = Instant::now();
        let args = self.expand_args(request);
        debug!("Running {} {:?} for {}", self.program, args, request.model_id);

        let mut child = Command::new(&self.program)
            .args(&args)
            .env("CONDUCTOR_MODEL", &request.model_id)
            .env("CONDUCTOR_TIER", request.tier.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ExecutorError::ConnectionError(format!("Failed to spawn {}: {}", self.program, e))
            })?;

        let input = format!("{}\n\n{}", request.system_prompt, request.user_message);
        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(input.as_bytes()).await
        {
            // The command may exit without reading its input
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(ExecutorError::RequestFailed(format!(
                    "Failed to write prompt: {}",
                    e
                )));
            }
            debug!("{} closed stdin early", self.program);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecutorError::RequestFailed(format!("{} failed: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExecutorError::RequestFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let content = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let mut response = ExecutorResponse::new(content)
            .with_tokens(estimate_tokens(&input), 0);
        response.output_tokens = estimate_tokens(&response.content);
        response.duration_ms = started.elapsed().as_millis() as u64;
        Ok(response)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use conductor_domain::Tier;

    fn request() -> ExecutorRequest {
        ExecutorRequest {
            model_id: "claude-haiku-4.5".into(),
            system_prompt: "You are a drafter.".into(),
            user_message: "Write release notes".into(),
            tier: Tier::Cheap,
        }
    }

    #[tokio::test]
    async fn test_stdin_is_echoed_back() {
        let executor = CommandExecutor::new("cat", vec![]);
        let response = executor.call(&request()).await.unwrap();

        assert_eq!(response.content, "You are a drafter.\n\nWrite release notes");
        assert!(response.input_tokens > 0);
        assert_eq!(response.input_tokens, response.output_tokens);
    }

    #[tokio::test]
    async fn test_placeholders_expand_in_args() {
        let executor = CommandExecutor::new(
            "sh",
            vec!["-c".into(), "cat >/dev/null; echo {model} {tier} $CONDUCTOR_TIER".into()],
        );
        let response = executor.call(&request()).await.unwrap();
        assert_eq!(response.content, "claude-haiku-4.5 cheap cheap");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_request_failure() {
        let executor = CommandExecutor::new("sh", vec!["-c".into(), "echo boom >&2; exit 3".into()]);
        let err = executor.call(&request()).await.unwrap_err();
        assert!(matches!(err, ExecutorError::RequestFailed(ref m) if m.contains("boom")));
    }

    #[tokio::test]
    async fn test_missing_program_is_connection_error() {
        let executor = CommandExecutor::new("definitely-not-a-real-binary-7f3a", vec![]);
        assert!(matches!(
            executor.call(&request()).await,
            Err(ExecutorError::ConnectionError(_))
        ));
        assert!(CommandExecutor::try_new("definitely-not-a-real-binary-7f3a", vec![]).is_none());
    }
}
