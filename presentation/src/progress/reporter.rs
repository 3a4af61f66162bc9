//! Progress reporting for orchestration runs

use colored::Colorize;
use conductor_application::ports::progress::ProgressNotifier;
use conductor_domain::{Agent, AgentOutput, ExecutionPlan, ExecutionResult, Tier};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress with one spinner per running agent
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
    plan_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            plan_bar: Mutex::new(None),
        }
    }

    fn plan_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_plan_ready(&self, plan: &ExecutionPlan) {
        let pb = self.multi.add(ProgressBar::new(plan.agents.len() as u64));
        pb.set_style(Self::plan_style());
        pb.set_prefix(format!("{} plan", plan.strategy));
        pb.set_message(format!("{:?}", plan.source).to_lowercase());

        if let Ok(mut slot) = self.plan_bar.lock() {
            *slot = Some(pb);
        }
    }

    fn on_agent_start(&self, agent: &Agent, tier: Tier, model_id: &str) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix(agent.role.clone());
        pb.set_message(format!("{} / {}", tier, model_id));
        pb.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(agent.id.clone(), pb);
        }
    }

    fn on_agent_complete(&self, agent: &Agent, output: Option<&AgentOutput>) {
        let bar = self.bars.lock().ok().and_then(|mut bars| bars.remove(&agent.id));
        if let Some(pb) = bar {
            let status = match output {
                Some(o) => format!("{} quality {:.2}", "v".green(), o.quality_score),
                None => format!("{} failed", "x".red()),
            };
            pb.finish_with_message(status);
        }

        if let Ok(slot) = self.plan_bar.lock()
            && let Some(pb) = slot.as_ref()
        {
            pb.inc(1);
        }
    }

    fn on_warning(&self, message: &str) {
        let _ = self
            .multi
            .println(format!("{} {}", "!".yellow().bold(), message));
    }

    fn on_finished(&self, result: &ExecutionResult) {
        if let Ok(mut bars) = self.bars.lock() {
            for (_, pb) in bars.drain() {
                pb.finish_and_clear();
            }
        }
        if let Some(pb) = self.plan_bar.lock().ok().and_then(|mut slot| slot.take()) {
            let message = if result.is_success() {
                "complete".green().to_string()
            } else {
                "failed".red().to_string()
            };
            pb.finish_with_message(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_domain::{FailureKind, OrchestrationFailure, QualityGates, Strategy};
    use std::collections::BTreeSet;

    fn agent(id: &str) -> Agent {
        Agent {
            id: id.into(),
            template_id: "security_scanner".into(),
            role: "Security Scanner".into(),
            tier: Tier::Capable,
            capabilities: BTreeSet::new(),
            instructions: "You are a security scanner.".into(),
            instructions_template: "You are a security scanner.".into(),
            tools: vec![],
            quality_gates: QualityGates::new(),
            timeout_secs: None,
            render_warning: None,
        }
    }

    #[test]
    fn test_bars_are_tracked_and_released() {
        let reporter = ProgressReporter::new();
        let plan = ExecutionPlan::new(vec![agent("a-1"), agent("a-2")], Strategy::Parallel, "security:moderate")
            .unwrap();

        reporter.on_plan_ready(&plan);
        reporter.on_agent_start(&plan.agents[0], Tier::Capable, "claude-sonnet-4.5");
        reporter.on_agent_start(&plan.agents[1], Tier::Capable, "claude-sonnet-4.5");
        assert_eq!(reporter.bars.lock().unwrap().len(), 2);

        reporter.on_agent_complete(&plan.agents[0], None);
        assert_eq!(reporter.bars.lock().unwrap().len(), 1);
        assert_eq!(reporter.plan_bar.lock().unwrap().as_ref().map(|pb| pb.position()), Some(1));

        reporter.on_finished(&ExecutionResult::without_plan(
            "security:moderate",
            OrchestrationFailure::new(FailureKind::AgentExecution, "boom"),
        ));
        assert!(reporter.bars.lock().unwrap().is_empty());
        assert!(reporter.plan_bar.lock().unwrap().is_none());
    }
}
