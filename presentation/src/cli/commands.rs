//! CLI command definitions

use clap::{Parser, ValueEnum};
use conductor_domain::TaskContext;
use serde_json::Value;
use std::path::PathBuf;

/// Output format for orchestration results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary with each agent's output
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for agent-conductor
#[derive(Parser, Debug)]
#[command(name = "conductor")]
#[command(author, version, about = "Meta-orchestration engine for teams of AI agents")]
#[command(long_about = r#"
Agent Conductor analyzes a task, assembles a team of specialised agents,
picks an execution strategy and routes every call to the model that has
historically performed best. Successful team layouts are remembered and
reused for similar tasks.

Configuration files are loaded from (in priority order):
1. CONDUCTOR_* environment variables (CONDUCTOR_ROUTER__MIN_SAMPLE_SIZE=5)
2. --config <path>     Explicit config file
3. ./conductor.toml    Project-level config
4. ~/.config/agent-conductor/config.toml   Global config

Example:
  conductor "Review this PR for security vulnerabilities"
  conductor --context max_cost=0.01 "Write unit tests for the parser"
  conductor --stats security --days 30
"#)]
pub struct Cli {
    /// The task to orchestrate (not required with --stats or --show-config)
    pub task: Option<String>,

    /// Task context entry as key=value (can be specified multiple times)
    #[arg(short = 'C', long = "context", value_name = "KEY=VALUE")]
    pub context: Vec<String>,

    /// Publish the plan and wait for an approve/reject decision
    #[arg(short, long)]
    pub interactive: bool,

    /// Output format (defaults to the config file's, then text)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Show routing statistics for a workflow and exit
    #[arg(long, value_name = "WORKFLOW")]
    pub stats: Option<String>,

    /// Lookback window for --stats
    #[arg(long, default_value_t = 7)]
    pub days: u32,

    /// Run the plan against the offline echo executor
    #[arg(long)]
    pub dry_run: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Parse `--context` entries into a task context
    pub fn task_context(&self) -> Result<TaskContext, String> {
        parse_context(&self.context)
    }
}

/// Parse `key=value` pairs.
///
/// Values that parse as JSON (numbers, booleans, arrays, objects) keep
/// their type; anything else is a string.
pub fn parse_context(entries: &[String]) -> Result<TaskContext, String> {
    let mut context = TaskContext::new();
    for entry in entries {
        let (key, raw) = entry
            .split_once('=')
            .ok_or_else(|| format!("invalid context entry '{}': expected KEY=VALUE", entry))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("invalid context entry '{}': empty key", entry));
        }
        let value = serde_json::from_str::<Value>(raw.trim())
            .ok()
            .filter(|v| !v.is_string())
            .unwrap_or_else(|| Value::String(raw.trim().to_string()));
        context.insert(key.to_string(), value);
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_context_types() {
        let context = parse_context(&entries(&[
            "max_cost=0.05",
            "domain=security",
            "interactive=true",
            "capabilities=[\"threat_modeling\"]",
            "note=a=b",
        ]))
        .unwrap();

        assert_eq!(context["max_cost"], json!(0.05));
        assert_eq!(context["domain"], json!("security"));
        assert_eq!(context["interactive"], json!(true));
        assert_eq!(context["capabilities"], json!(["threat_modeling"]));
        assert_eq!(context["note"], json!("a=b"));
    }

    #[test]
    fn test_parse_context_rejects_malformed_entries() {
        assert!(parse_context(&entries(&["no_equals"])).is_err());
        assert!(parse_context(&entries(&["=value"])).is_err());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "conductor",
            "--context",
            "max_cost=0.01",
            "-o",
            "json",
            "--dry-run",
            "-vv",
            "Write tests for the parser",
        ]);
        assert_eq!(cli.task.as_deref(), Some("Write tests for the parser"));
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.days, 7);
        assert_eq!(cli.task_context().unwrap()["max_cost"], json!(0.01));
    }

    #[test]
    fn test_cli_stats_mode() {
        let cli = Cli::parse_from(["conductor", "--stats", "security", "--days", "30"]);
        assert!(cli.task.is_none());
        assert_eq!(cli.stats.as_deref(), Some("security"));
        assert_eq!(cli.days, 30);
    }
}
