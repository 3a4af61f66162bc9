//! Console output formatter for orchestration results

use colored::Colorize;
use conductor_domain::{ExecutionOutcome, ExecutionResult, RoutingStats};

/// Formats results and statistics for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete orchestration result
    pub fn format(result: &ExecutionResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Agent Conductor Results"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Pattern:".cyan().bold(),
            result.task_pattern
        ));
        if let Some(strategy) = result.strategy {
            let source = result
                .source
                .map(|s| format!(" ({:?})", s).to_lowercase())
                .unwrap_or_default();
            output.push_str(&format!(
                "{} {}{}\n",
                "Strategy:".cyan().bold(),
                strategy,
                source
            ));
        }
        if let Some(id) = &result.composition_id {
            output.push_str(&format!("{} {}\n", "Composition:".cyan().bold(), id));
        }

        if !result.agent_outputs.is_empty() {
            output.push_str(&Self::section_header("Agents"));
            for agent in &result.agent_outputs {
                let escalated = if agent.escalated { " escalated" } else { "" };
                let cached = if agent.cache_hit { " cached" } else { "" };
                output.push_str(&format!(
                    "  {} {} [{} / {}{}{}] quality {:.2}, ${:.4}, {}ms\n",
                    "v".green(),
                    agent.role.bold(),
                    agent.tier,
                    agent.model_id,
                    escalated,
                    cached,
                    agent.quality_score,
                    agent.cost,
                    agent.duration_ms
                ));
            }
        }

        if !result.warnings.is_empty() {
            output.push_str(&Self::section_header("Warnings"));
            for warning in &result.warnings {
                output.push_str(&format!("  {} {}\n", "!".yellow().bold(), warning));
            }
        }

        match &result.outcome {
            ExecutionOutcome::Success {
                output: text,
                quality_score,
            } => {
                output.push_str(&Self::section_header(&format!(
                    "Result (quality {:.2})",
                    quality_score
                )));
                output.push_str(&format!("\n{}\n", text));
            }
            ExecutionOutcome::Failure(failure) => {
                output.push_str(&Self::section_header("Failed"));
                output.push_str(&format!("\n{} {}\n", "Error:".red().bold(), failure));
                if let Some(partial) = &failure.partial_output {
                    output.push_str(&format!(
                        "\n{}\n{}\n",
                        "Partial output:".yellow().bold(),
                        partial
                    ));
                }
            }
        }

        output.push_str(&format!(
            "\n{} {} agents, ${:.4}, {}ms\n",
            "Total:".dimmed(),
            result.agent_outputs.len(),
            result.total_cost,
            result.duration_ms
        ));
        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(result: &ExecutionResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format routing statistics
    pub fn format_stats(stats: &RoutingStats) -> String {
        let mut output = String::new();
        output.push_str(&Self::header(&format!("Routing: {}", stats.workflow)));
        output.push('\n');

        if stats.is_empty() {
            output.push_str(&format!(
                "No calls recorded in the last {} days.\n",
                stats.days
            ));
            output.push_str(&Self::footer());
            return output;
        }

        output.push_str(&format!(
            "{} {} over {} days\n{} {:.1}%\n{} ${:.4}\n{} {:.1}%\n",
            "Calls:".cyan().bold(),
            stats.total_calls,
            stats.days,
            "Success rate:".cyan().bold(),
            stats.success_rate * 100.0,
            "Average cost:".cyan().bold(),
            stats.avg_cost,
            "Cache hits:".cyan().bold(),
            stats.cache_hit_rate * 100.0,
        ));

        output.push_str(&Self::section_header("Models"));
        output.push_str(&format!(
            "  {:<28} {:>6} {:>9} {:>10} {:>10}\n",
            "model", "calls", "success", "avg cost", "latency"
        ));
        for model in stats.ranked() {
            output.push_str(&format!(
                "  {:<28} {:>6} {:>8.1}% {:>10.4} {:>8.0}ms\n",
                model.model_id,
                model.calls,
                model.success_rate * 100.0,
                model.avg_cost,
                model.avg_latency_ms
            ));
        }
        output.push_str(&Self::footer());
        output
    }

    pub fn format_stats_json(stats: &RoutingStats) -> String {
        serde_json::to_string_pretty(stats).unwrap_or_else(|_| "{}".to_string())
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
