//! Composition strategy selection

use crate::task::requirements::{
    CAP_CONSENSUS, CAP_REFINEMENT, Complexity, GENERAL_DOMAIN, TaskRequirements,
};
use serde::{Deserialize, Serialize};

/// How a plan's agents are composed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Sequential,
    Parallel,
    Debate,
    Teaching,
    Refinement,
    Adaptive,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::Sequential,
        Strategy::Parallel,
        Strategy::Debate,
        Strategy::Teaching,
        Strategy::Refinement,
        Strategy::Adaptive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Parallel => "parallel",
            Strategy::Debate => "debate",
            Strategy::Teaching => "teaching",
            Strategy::Refinement => "refinement",
            Strategy::Adaptive => "adaptive",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Strategy::Sequential => "agents run in order, each seeing earlier outputs",
            Strategy::Parallel => "agents run concurrently, outputs assembled in plan order",
            Strategy::Debate => "independent positions, then a synthesis round",
            Strategy::Teaching => "a junior attempts first, an expert takes over on failure",
            Strategy::Refinement => "draft, review, polish",
            Strategy::Adaptive => "a classifier picks one specialist by difficulty",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown strategy: {}", s))
    }
}

/// Pick a strategy for a fresh plan.
///
/// `agent_count` is the number of specialists spawned for the task's
/// capabilities, before any strategy-specific shaping.
pub fn select_strategy(requirements: &TaskRequirements, agent_count: usize) -> Strategy {
    let complex = requirements.complexity == Complexity::Complex;

    if requirements.has_capability(CAP_CONSENSUS) {
        Strategy::Debate
    } else if requirements.has_capability(CAP_REFINEMENT) {
        Strategy::Refinement
    } else if requirements.is_cost_sensitive() && !complex {
        Strategy::Teaching
    } else if requirements.domain == GENERAL_DOMAIN && !complex {
        Strategy::Adaptive
    } else if agent_count > 1 && !complex {
        Strategy::Parallel
    } else {
        Strategy::Sequential
    }
}
