use crate::core::tier::Tier;
use crate::plan::Strategy;
use crate::quality::QualityGates;
use crate::util::{digest_hex, now_millis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Stored description of one agent in a composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub template_id: String,
    pub role: String,
    pub tier: Tier,
    pub capabilities: BTreeSet<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    /// Unrendered instructions, re-rendered for each new task
    pub instructions_template: String,
    #[serde(default)]
    pub quality_gates: QualityGates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Result of running a plan, as fed back into the learning loop
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionOutcome {
    pub success: bool,
    pub quality_score: f64,
    /// Exact task signature the plan ran for
    pub signature: Option<String>,
}

impl CompositionOutcome {
    pub fn success(quality_score: f64) -> Self {
        Self {
            success: true,
            quality_score,
            signature: None,
        }
    }

    pub fn failure() -> Self {
        Self {
            success: false,
            quality_score: 0.0,
            signature: None,
        }
    }

    pub fn for_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

/// One entry in the pattern library: a single observed outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternContribution {
    pub composition_id: String,
    pub task_pattern: String,
    pub strategy: Strategy,
    pub success: bool,
    pub quality_score: f64,
    pub timestamp: u64,
}

/// A proven plan shape for a task pattern (Aggregate Root)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentComposition {
    pub id: String,
    pub task_pattern: String,
    pub agents: Vec<AgentSpec>,
    pub strategy: Strategy,
    #[serde(default)]
    pub quality_gates: QualityGates,
    pub success_rate: f64,
    pub avg_quality_score: f64,
    pub usage_count: u64,
    pub created_at: u64,
    pub last_used: u64,
    /// Exact task signatures that succeeded at or above the reuse gate
    #[serde(default)]
    pub proven_signatures: BTreeSet<String>,
}

/// Deterministic composition id from pattern, strategy and template order
pub fn composition_fingerprint(task_pattern: &str, strategy: Strategy, template_ids: &[&str]) -> String {
    let strategy = strategy.to_string();
    let templates = template_ids.join(",");
    format!("comp-{}", digest_hex(&[task_pattern, &strategy, &templates]))
}

impl AgentComposition {
    /// A composition with no recorded outcomes yet
    pub fn new(
        task_pattern: impl Into<String>,
        agents: Vec<AgentSpec>,
        strategy: Strategy,
        quality_gates: QualityGates,
    ) -> Self {
        let task_pattern = task_pattern.into();
        let template_ids: Vec<&str> = agents.iter().map(|a| a.template_id.as_str()).collect();
        let id = composition_fingerprint(&task_pattern, strategy, &template_ids);
        let now = now_millis();

        Self {
            id,
            task_pattern,
            agents,
            strategy,
            quality_gates,
            success_rate: 0.0,
            avg_quality_score: 0.0,
            usage_count: 0,
            created_at: now,
            last_used: now,
            proven_signatures: BTreeSet::new(),
        }
    }

    /// Fold one outcome into the running averages.
    ///
    /// A successful outcome at or above `reuse_quality_threshold` marks its
    /// signature as proven; a failed one withdraws it.
    pub fn record_outcome(
        &mut self,
        outcome: &CompositionOutcome,
        reuse_quality_threshold: f64,
        now: u64,
    ) -> PatternContribution {
        let n = self.usage_count as f64;
        let value = if outcome.success { 1.0 } else { 0.0 };
        let quality = outcome.quality_score.clamp(0.0, 1.0);

        self.success_rate = self.success_rate * (n / (n + 1.0)) + value / (n + 1.0);
        self.avg_quality_score = self.avg_quality_score * (n / (n + 1.0)) + quality / (n + 1.0);
        self.usage_count += 1;
        self.last_used = now;

        if let Some(signature) = &outcome.signature {
            if outcome.success && quality >= reuse_quality_threshold {
                self.proven_signatures.insert(signature.clone());
            } else if !outcome.success {
                self.proven_signatures.remove(signature);
            }
        }

        PatternContribution {
            composition_id: self.id.clone(),
            task_pattern: self.task_pattern.clone(),
            strategy: self.strategy,
            success: outcome.success,
            quality_score: quality,
            timestamp: now,
        }
    }

    pub fn is_proven_for(&self, signature: &str) -> bool {
        self.proven_signatures.contains(signature)
    }
}

/// Best composition eligible for pattern reuse.
///
/// Requires `usage_count >= min_usage`; highest success rate wins, ties go
/// to higher usage count, then the most recent use.
pub fn best_for_pattern<'a>(
    candidates: impl IntoIterator<Item = &'a AgentComposition>,
    min_usage: u64,
) -> Option<&'a AgentComposition> {
    candidates
        .into_iter()
        .filter(|c| c.usage_count >= min_usage)
        .max_by(|a, b| {
            a.success_rate
                .total_cmp(&b.success_rate)
                .then(a.usage_count.cmp(&b.usage_count))
                .then(a.last_used.cmp(&b.last_used))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(template_id: &str) -> AgentSpec {
        AgentSpec {
            template_id: template_id.into(),
            role: template_id.into(),
            tier: Tier::Capable,
            capabilities: BTreeSet::new(),
            tools: vec![],
            instructions_template: "{{task}}".into(),
            quality_gates: QualityGates::new(),
            timeout_secs: None,
        }
    }

    fn composition(pattern: &str, templates: &[&str]) -> AgentComposition {
        AgentComposition::new(
            pattern,
            templates.iter().map(|t| spec(t)).collect(),
            Strategy::Parallel,
            QualityGates::new(),
        )
    }

    #[test]
    fn test_fingerprint_depends_on_order() {
        let a = composition_fingerprint("security:moderate", Strategy::Parallel, &["x", "y"]);
        let b = composition_fingerprint("security:moderate", Strategy::Parallel, &["y", "x"]);
        let c = composition_fingerprint("security:moderate", Strategy::Parallel, &["x", "y"]);
        assert_ne!(a, b);
        assert_eq!(a, c);
        assert_eq!(composition("security:moderate", &["x", "y"]).id, a);
    }

    #[test]
    fn test_fingerprint_is_full_sha256_and_strategy_sensitive() {
        let parallel = composition_fingerprint("security:moderate", Strategy::Parallel, &["x", "y"]);
        let sequential = composition_fingerprint("security:moderate", Strategy::Sequential, &["x", "y"]);
        assert_ne!(parallel, sequential);

        let digest = parallel.strip_prefix("comp-").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_running_averages() {
        let mut c = composition("p", &["a"]);
        c.record_outcome(&CompositionOutcome::success(0.9), 0.6, 1);
        c.record_outcome(&CompositionOutcome::failure(), 0.6, 2);
        c.record_outcome(&CompositionOutcome::success(0.6), 0.6, 3);

        assert_eq!(c.usage_count, 3);
        assert!((c.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((c.avg_quality_score - 0.5).abs() < 1e-9);
        assert_eq!(c.last_used, 3);
    }

    #[test]
    fn test_proven_signatures() {
        let mut c = composition("p", &["a"]);
        c.record_outcome(&CompositionOutcome::success(0.5).for_signature("low"), 0.6, 1);
        c.record_outcome(&CompositionOutcome::success(0.8).for_signature("sig"), 0.6, 2);
        assert!(!c.is_proven_for("low"));
        assert!(c.is_proven_for("sig"));

        let contribution = c.record_outcome(&CompositionOutcome::failure().for_signature("sig"), 0.6, 3);
        assert!(!c.is_proven_for("sig"));
        assert!(!contribution.success);
        assert_eq!(contribution.composition_id, c.id);
    }

    #[test]
    fn test_best_for_pattern_threshold_and_ties() {
        let mut young = composition("p", &["young"]);
        young.success_rate = 1.0;
        young.usage_count = 2;

        let mut busy = composition("p", &["busy"]);
        busy.success_rate = 0.9;
        busy.usage_count = 8;
        busy.last_used = 10;

        let mut quiet = composition("p", &["quiet"]);
        quiet.success_rate = 0.9;
        quiet.usage_count = 4;
        quiet.last_used = 20;

        let all = [young, busy, quiet];
        assert_eq!(best_for_pattern(&all, 3).map(|c| c.agents[0].template_id.as_str()), Some("busy"));
        assert!(best_for_pattern(&all[..1], 3).is_none());

        let mut recent = all[1].clone();
        recent.last_used = 99;
        recent.agents[0].template_id = "recent".into();
        let tied = [all[1].clone(), recent];
        assert_eq!(best_for_pattern(&tied, 3).map(|c| c.agents[0].template_id.as_str()), Some("recent"));
    }
}
