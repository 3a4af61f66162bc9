//! Adaptive strategy: a cheap classifier routes the task to one specialist.
//!
//! The classifier answers `DIFFICULTY: simple|moderate|complex` and
//! optionally `CAPABILITY: <tag>`. Difficulty maps to a tier; the
//! specialist matching tier (and capability, when named) runs. Without a
//! match, or when classification fails, the highest-tier agent runs.

use super::{StrategyError, prompt_for};
use crate::ports::executor::Executor;
use crate::use_cases::agent_runner::{AgentRunner, RunContext};
use conductor_domain::agent::catalog::CLASSIFIER_TEMPLATE_ID;
use conductor_domain::{Agent, AggregatedResult, Complexity, FailureKind, Tier, highest_tier, lowest_tier};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

const CLASSIFICATION_CAPABILITY: &str = "classification";

/// Parsed classifier answer
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub difficulty: Complexity,
    pub capability: Option<String>,
}

impl Classification {
    pub fn tier(&self) -> Tier {
        match self.difficulty {
            Complexity::Simple => Tier::Cheap,
            Complexity::Moderate => Tier::Capable,
            Complexity::Complex => Tier::Premium,
        }
    }
}

/// Read `DIFFICULTY:` and `CAPABILITY:` lines from a classifier answer
pub fn parse_classification(text: &str) -> Option<Classification> {
    let mut difficulty = None;
    let mut capability = None;

    for line in text.lines() {
        let line = line.trim().trim_matches(|c| c == '`' || c == '*');
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches('`');
        match key.trim().to_ascii_lowercase().as_str() {
            "difficulty" => difficulty = value.parse::<Complexity>().ok(),
            "capability" if !value.is_empty() => capability = Some(value.to_ascii_lowercase()),
            _ => {}
        }
    }

    difficulty.map(|difficulty| Classification {
        difficulty,
        capability,
    })
}

fn is_classifier(agent: &Agent) -> bool {
    agent.template_id == CLASSIFIER_TEMPLATE_ID || agent.has_capability(CLASSIFICATION_CAPABILITY)
}

pub(super) async fn execute<E: Executor + 'static>(
    runner: &Arc<AgentRunner<E>>,
    agents: &[Agent],
    task: &str,
    ctx: &RunContext,
) -> Result<AggregatedResult, StrategyError> {
    let classifier = agents
        .iter()
        .find(|a| is_classifier(a))
        .or_else(|| lowest_tier(agents))
        .ok_or_else(|| StrategyError::new(FailureKind::AgentExecution, "adaptive plan has no agents"))?;
    let mut specialists: Vec<Agent> = agents
        .iter()
        .filter(|a| a.id != classifier.id)
        .cloned()
        .collect();
    if specialists.is_empty() {
        specialists.push(classifier.clone());
    }

    let mut warnings = Vec::new();
    let mut outputs = Vec::new();

    let prompt = prompt_for(classifier, task, &BTreeMap::new(), None);
    let classification = match runner.run(classifier, prompt, ctx).await {
        Ok(output) => {
            let parsed = parse_classification(&output.content);
            if parsed.is_none() {
                warnings.push(format!(
                    "{} gave no difficulty label",
                    classifier.template_id
                ));
            }
            outputs.push(output);
            parsed
        }
        Err(e) if e.is_cancelled() => {
            return Err(StrategyError::from_agent(classifier, e));
        }
        Err(e) => {
            let warning = format!("classification failed: {}", e);
            warn!("{}", warning);
            warnings.push(warning);
            None
        }
    };

    let specialist = choose_specialist(&specialists, classification.as_ref(), &mut warnings);
    info!(
        "Adaptive: {} routed to {} ({})",
        classification
            .as_ref()
            .map(|c| c.difficulty.as_str())
            .unwrap_or("unclassified"),
        specialist.id,
        specialist.tier
    );

    let prompt = prompt_for(&specialist, task, &BTreeMap::new(), None);
    match runner.run(&specialist, prompt, ctx).await {
        Ok(output) => {
            outputs.push(output.clone());
            Ok(AggregatedResult::from_final(&output, outputs, warnings))
        }
        Err(e) => Err(StrategyError::from_agent(&specialist, e).with_progress(Vec::new(), warnings)),
    }
}

fn choose_specialist(
    specialists: &[Agent],
    classification: Option<&Classification>,
    warnings: &mut Vec<String>,
) -> Agent {
    let fallback = || {
        highest_tier(specialists)
            .cloned()
            .unwrap_or_else(|| specialists[0].clone())
    };

    let Some(classification) = classification else {
        return fallback();
    };
    let tier = classification.tier();

    let matched = match &classification.capability {
        Some(capability) => specialists
            .iter()
            .find(|a| a.tier == tier && a.has_capability(capability))
            .or_else(|| specialists.iter().find(|a| a.tier == tier)),
        None => specialists.iter().find(|a| a.tier == tier),
    };

    match matched {
        Some(agent) => agent.clone(),
        None => {
            warnings.push(format!("no specialist at {} tier; using highest tier", tier));
            fallback()
        }
    }
}
