//! Rule-based task analyzer
//!
//! Classifies a task description with keyword tables and word-count
//! heuristics. The analyzer is deterministic, performs no I/O, and is
//! total over string input: anything it cannot place lands in the
//! `"general"` domain at [`Complexity::Simple`].
//!
//! Keyword syntax: a trailing `*` marks a prefix stem (`vulnerab*`), a
//! keyword containing a space is a phrase, anything else must match a
//! whole word.

use super::TaskContext;
use super::requirements::{
    CAP_CONSENSUS, CAP_COST_OPTIMIZATION, CAP_REFINEMENT, CAP_SYNTHESIS, Complexity,
    GENERAL_DOMAIN, TaskRequirements, task_signature,
};
use serde_json::Value;
use std::collections::BTreeSet;

/// Ordered domain table; the first domain with any hit wins.
const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "security",
        &[
            "security", "secure", "vulnerab*", "cve", "exploit*", "xss", "csrf", "injection",
            "authentication", "authorization", "auth", "secret*", "owasp", "pentest*",
        ],
    ),
    (
        "testing",
        &["test*", "coverage", "pytest", "tdd", "regression", "unit test"],
    ),
    (
        "performance",
        &[
            "performance", "latency", "optimiz*", "profil*", "slow", "throughput", "benchmark*",
            "memory leak",
        ],
    ),
    (
        "refactoring",
        &["refactor*", "cleanup", "clean up", "restructur*", "tech debt", "technical debt"],
    ),
    (
        "architecture",
        &["architect*", "system design", "microservice*", "scalab*"],
    ),
    (
        "documentation",
        &["doc", "docs", "document*", "readme", "docstring*", "changelog"],
    ),
    (
        "devops",
        &[
            "deploy*", "ci", "pipeline*", "docker*", "kubernetes", "k8s", "terraform", "helm",
        ],
    ),
    (
        "code_review",
        &["review*", "pull request", "pr", "diff", "code review"],
    ),
];

/// Capabilities each domain calls for
const DOMAIN_CAPABILITIES: &[(&str, &[&str])] = &[
    ("security", &["security_scan", "vulnerability_analysis"]),
    ("testing", &["test_generation", "coverage_analysis"]),
    ("performance", &["performance_analysis"]),
    ("refactoring", &["refactoring", "code_analysis"]),
    ("architecture", &["architecture_design"]),
    ("documentation", &["documentation"]),
    ("devops", &["deployment"]),
    ("code_review", &["code_review"]),
    (GENERAL_DOMAIN, &["general_reasoning"]),
];

const COMPLEX_KEYWORDS: &[&str] = &[
    "architect*", "design", "redesign", "migrat*", "distributed", "end to end",
    "comprehensive", "overhaul", "from scratch", "scalab*", "microservice*",
];

const MODERATE_KEYWORDS: &[&str] = &[
    "review*", "analy*", "debug*", "implement*", "security", "audit*", "optimiz*",
    "investigat*", "test*", "refactor*", "fix", "integrat*", "vulnerab*",
];

const SIMPLE_KEYWORDS: &[&str] = &["format*", "typo*", "rename*", "lint*", "simple", "quick", "indent*"];

const CONSENSUS_KEYWORDS: &[&str] = &[
    "debate", "consensus", "compare", "comparison", "perspectives", "trade off", "tradeoff*",
    "pros and cons", "versus",
];

const REFINEMENT_KEYWORDS: &[&str] = &["refine*", "polish*", "iterat*", "draft*", "proofread*", "improve wording"];

const COST_KEYWORDS: &[&str] = &["cheap*", "budget", "low cost", "inexpensive", "frugal"];

const MODERATE_WORD_COUNT: usize = 20;
const COMPLEX_WORD_COUNT: usize = 60;

/// Deterministic keyword classifier for task descriptions
pub struct TaskAnalyzer;

impl TaskAnalyzer {
    /// Analyze a task; `context["interactive"]` (bool) selects interactive mode.
    pub fn analyze(description: &str, context: &TaskContext) -> TaskRequirements {
        let interactive = context
            .get("interactive")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self::analyze_with(description, context, interactive)
    }

    /// Analyze a task with an explicit interactive flag
    pub fn analyze_with(
        description: &str,
        context: &TaskContext,
        interactive: bool,
    ) -> TaskRequirements {
        let text = NormalizedText::new(description);

        let domain = context
            .get("domain")
            .and_then(Value::as_str)
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .map(|d| {
                if DOMAIN_CAPABILITIES.iter().any(|(known, _)| *known == d) {
                    d
                } else {
                    GENERAL_DOMAIN.to_string()
                }
            })
            .unwrap_or_else(|| Self::classify_domain(&text).to_string());

        let complexity = context
            .get("complexity")
            .and_then(Value::as_str)
            .and_then(|c| c.parse().ok())
            .unwrap_or_else(|| Self::classify_complexity(&text));

        let mut needed_capabilities: BTreeSet<String> = Self::capabilities_for(&domain)
            .iter()
            .map(|c| c.to_string())
            .collect();

        if complexity == Complexity::Complex {
            needed_capabilities.insert(CAP_SYNTHESIS.to_string());
        }
        if text.matches_any(CONSENSUS_KEYWORDS) {
            needed_capabilities.insert(CAP_CONSENSUS.to_string());
        }
        if text.matches_any(REFINEMENT_KEYWORDS) {
            needed_capabilities.insert(CAP_REFINEMENT.to_string());
        }

        let max_cost = context
            .get("max_cost")
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite() && *c >= 0.0);
        if max_cost.is_none() && text.matches_any(COST_KEYWORDS) {
            needed_capabilities.insert(CAP_COST_OPTIMIZATION.to_string());
        }

        if let Some(Value::Array(extra)) = context.get("capabilities") {
            needed_capabilities.extend(
                extra
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|c| c.trim().to_lowercase())
                    .filter(|c| !c.is_empty()),
            );
        }

        TaskRequirements {
            description: description.to_string(),
            complexity,
            domain,
            needed_capabilities,
            max_cost,
            min_success_rate: context
                .get("min_success_rate")
                .and_then(Value::as_f64)
                .filter(|r| r.is_finite())
                .map(|r| r.clamp(0.0, 1.0)),
            max_latency_ms: context.get("max_latency_ms").and_then(Value::as_u64),
            interactive,
            signature: task_signature(description, context),
        }
    }

    fn classify_domain(text: &NormalizedText) -> &'static str {
        DOMAIN_KEYWORDS
            .iter()
            .find(|(_, keywords)| text.matches_any(keywords))
            .map(|(domain, _)| *domain)
            .unwrap_or(GENERAL_DOMAIN)
    }

    fn classify_complexity(text: &NormalizedText) -> Complexity {
        let words = text.word_count();
        let complex_hit = text.matches_any(COMPLEX_KEYWORDS);
        let moderate_hit = text.matches_any(MODERATE_KEYWORDS);

        if complex_hit || words > COMPLEX_WORD_COUNT {
            return Complexity::Complex;
        }
        if moderate_hit {
            return Complexity::Moderate;
        }
        // Trivial edits stay simple unless the description is unusually long
        if text.matches_any(SIMPLE_KEYWORDS) {
            return Complexity::Simple;
        }
        if words > MODERATE_WORD_COUNT {
            Complexity::Moderate
        } else {
            Complexity::Simple
        }
    }

    /// Capabilities for a domain tag; unknown domains get the general set
    pub fn capabilities_for(domain: &str) -> &'static [&'static str] {
        DOMAIN_CAPABILITIES
            .iter()
            .find(|(d, _)| *d == domain)
            .or_else(|| DOMAIN_CAPABILITIES.iter().find(|(d, _)| *d == GENERAL_DOMAIN))
            .map(|(_, caps)| *caps)
            .unwrap_or(&[])
    }
}

/// Lowercased description split into alphanumeric words
struct NormalizedText {
    words: Vec<String>,
    padded: String,
}

impl NormalizedText {
    fn new(raw: &str) -> Self {
        let words: Vec<String> = raw
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        let padded = format!(" {} ", words.join(" "));
        Self { words, padded }
    }

    fn word_count(&self) -> usize {
        self.words.len()
    }

    fn matches(&self, keyword: &str) -> bool {
        if let Some(stem) = keyword.strip_suffix('*') {
            self.words.iter().any(|w| w.starts_with(stem))
        } else if keyword.contains(' ') {
            self.padded.contains(&format!(" {} ", keyword))
        } else {
            self.words.iter().any(|w| w == keyword)
        }
    }

    fn matches_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.matches(k))
    }
}
