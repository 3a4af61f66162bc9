//! Built-in template catalog
//!
//! Templates are read-only at runtime. Bump [`CATALOG_VERSION`] whenever a
//! template's capabilities, tier preference, or gates change, so persisted
//! compositions can be traced back to the catalog they came from.

use super::template::AgentTemplate;
use crate::core::tier::Tier;
use crate::quality::gates::{GATE_MIN_LENGTH, GATE_MIN_QUALITY};

pub const CATALOG_VERSION: &str = "2026.10";

/// Generic template used when no template provides a capability
pub const FALLBACK_TEMPLATE_ID: &str = "generalist";
pub const SYNTHESIZER_TEMPLATE_ID: &str = "synthesizer";
pub const CLASSIFIER_TEMPLATE_ID: &str = "task_classifier";
pub const DRAFTER_TEMPLATE_ID: &str = "drafter";
pub const REVIEWER_TEMPLATE_ID: &str = "reviewer";
pub const POLISHER_TEMPLATE_ID: &str = "polisher";

/// Collection of agent templates (Value Object)
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<AgentTemplate>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<AgentTemplate>) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &[AgentTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&AgentTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// First template (in catalog order) that provides a capability
    pub fn find_by_capability(&self, capability: &str) -> Option<&AgentTemplate> {
        self.templates.iter().find(|t| t.has_capability(capability))
    }

    /// Catalog shipped with the engine
    pub fn builtin() -> Self {
        let specialist_gate = 0.55;
        Self::new(vec![
            AgentTemplate::new(
                "security_scanner",
                "Security Scanner",
                Tier::Capable,
                "You are a security scanner. Inspect the material for {{task}} and list concrete \
                 security findings with file locations and severity. Domain: {{domain}}.",
            )
            .with_capabilities(&["security_scan"])
            .with_tools(&["read_file", "grep_search", "dependency_audit"])
            .with_gate(GATE_MIN_QUALITY, specialist_gate),
            AgentTemplate::new(
                "vulnerability_analyst",
                "Vulnerability Analyst",
                Tier::Premium,
                "You are a vulnerability analyst. For {{task}}, assess exploitability and impact \
                 of each weakness and propose mitigations.",
            )
            .with_capabilities(&["vulnerability_analysis", "threat_modeling"])
            .with_tools(&["read_file", "grep_search"])
            .with_gate(GATE_MIN_QUALITY, specialist_gate),
            AgentTemplate::new(
                "test_generator",
                "Test Generator",
                Tier::Capable,
                "You write tests. Produce focused test cases for {{task}}, covering edge cases \
                 and failure paths.",
            )
            .with_capabilities(&["test_generation"])
            .with_tools(&["read_file", "write_file", "run_command"])
            .with_gate(GATE_MIN_QUALITY, specialist_gate),
            AgentTemplate::new(
                "coverage_analyst",
                "Coverage Analyst",
                Tier::Cheap,
                "You analyze test coverage. Identify untested paths relevant to {{task}}.",
            )
            .with_capabilities(&["coverage_analysis"])
            .with_tools(&["read_file", "run_command"])
            .with_gate(GATE_MIN_QUALITY, specialist_gate),
            AgentTemplate::new(
                "code_reviewer",
                "Code Reviewer",
                Tier::Capable,
                "You are a meticulous code reviewer. Review the change for {{task}}: correctness, \
                 readability, and maintainability.",
            )
            .with_capabilities(&["code_review", "code_analysis"])
            .with_tools(&["read_file", "grep_search"])
            .with_gate(GATE_MIN_QUALITY, specialist_gate),
            AgentTemplate::new(
                "refactoring_specialist",
                "Refactoring Specialist",
                Tier::Capable,
                "You restructure code without changing behavior. Propose refactorings for {{task}}.",
            )
            .with_capabilities(&["refactoring"])
            .with_tools(&["read_file", "write_file"])
            .with_gate(GATE_MIN_QUALITY, specialist_gate),
            AgentTemplate::new(
                "performance_analyst",
                "Performance Analyst",
                Tier::Capable,
                "You are a performance engineer. Find bottlenecks related to {{task}} and \
                 quantify the expected gains of each fix.",
            )
            .with_capabilities(&["performance_analysis"])
            .with_tools(&["read_file", "run_command"])
            .with_gate(GATE_MIN_QUALITY, specialist_gate),
            AgentTemplate::new(
                "architect",
                "Software Architect",
                Tier::Premium,
                "You are a software architect. Design a solution for {{task}}; state components, \
                 interfaces, and trade-offs.",
            )
            .with_capabilities(&["architecture_design"])
            .with_tools(&["read_file"])
            .with_gate(GATE_MIN_QUALITY, 0.6)
            .with_timeout_secs(300),
            AgentTemplate::new(
                "documentation_writer",
                "Documentation Writer",
                Tier::Cheap,
                "You write clear technical documentation for {{task}}.",
            )
            .with_capabilities(&["documentation"])
            .with_tools(&["read_file", "write_file"])
            .with_gate(GATE_MIN_QUALITY, 0.5),
            AgentTemplate::new(
                "devops_engineer",
                "DevOps Engineer",
                Tier::Capable,
                "You handle build and deployment concerns. Address {{task}} with concrete \
                 pipeline and infrastructure steps.",
            )
            .with_capabilities(&["deployment"])
            .with_tools(&["read_file", "run_command"])
            .with_gate(GATE_MIN_QUALITY, specialist_gate),
            AgentTemplate::new(
                SYNTHESIZER_TEMPLATE_ID,
                "Synthesizer",
                Tier::Premium,
                "You are the arbiter of a panel. Resolve the panel's answers to {{task}} into a \
                 single conclusion, explaining how conflicts were settled.",
            )
            .with_capabilities(&["synthesis", "consensus"])
            .with_gate(GATE_MIN_QUALITY, 0.6),
            AgentTemplate::new(
                CLASSIFIER_TEMPLATE_ID,
                "Task Classifier",
                Tier::Cheap,
                "Classify the difficulty of the task. Reply with one line \
                 `DIFFICULTY: simple|moderate|complex` and optionally `CAPABILITY: <tag>`.",
            )
            .with_capabilities(&["classification"])
            .with_gate(GATE_MIN_LENGTH, 8.0)
            .with_timeout_secs(30),
            AgentTemplate::new(
                DRAFTER_TEMPLATE_ID,
                "Drafter",
                Tier::Cheap,
                "Write a complete first draft addressing {{task}}.",
            )
            .with_capabilities(&["drafting"])
            .with_gate(GATE_MIN_QUALITY, 0.5),
            AgentTemplate::new(
                REVIEWER_TEMPLATE_ID,
                "Reviewer",
                Tier::Capable,
                "Review and correct the draft below, returning the full improved text.\n\n\
                 {{previous_output}}",
            )
            .with_capabilities(&["review_feedback"])
            .with_gate(GATE_MIN_QUALITY, 0.55),
            AgentTemplate::new(
                POLISHER_TEMPLATE_ID,
                "Polisher",
                Tier::Premium,
                "Polish the reviewed text below into its final form.\n\n{{previous_output}}",
            )
            .with_capabilities(&["polishing"])
            .with_gate(GATE_MIN_QUALITY, 0.6),
            AgentTemplate::new(
                FALLBACK_TEMPLATE_ID,
                "Generalist",
                Tier::Capable,
                "You are a capable generalist assistant. Complete {{task}} thoroughly.",
            )
            .with_capabilities(&["general_reasoning"])
            .with_gate(GATE_MIN_QUALITY, 0.5),
        ])
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_ids_are_unique() {
        let catalog = TemplateCatalog::builtin();
        let mut ids: Vec<_> = catalog.templates().iter().map(|t| t.id.as_str()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_analyzer_capabilities_are_covered() {
        use crate::task::analyzer::TaskAnalyzer;

        let catalog = TemplateCatalog::builtin();
        for domain in [
            "security", "testing", "performance", "refactoring", "architecture",
            "documentation", "devops", "code_review", "general",
        ] {
            for cap in TaskAnalyzer::capabilities_for(domain) {
                assert!(
                    catalog.find_by_capability(cap).is_some(),
                    "no template for {}",
                    cap
                );
            }
        }
        assert!(catalog.find_by_capability("synthesis").is_some());
    }

    #[test]
    fn test_fixed_roles_exist() {
        let catalog = TemplateCatalog::builtin();
        for id in [
            FALLBACK_TEMPLATE_ID,
            SYNTHESIZER_TEMPLATE_ID,
            CLASSIFIER_TEMPLATE_ID,
            DRAFTER_TEMPLATE_ID,
            REVIEWER_TEMPLATE_ID,
            POLISHER_TEMPLATE_ID,
        ] {
            assert!(catalog.get(id).is_some(), "missing {}", id);
        }
        assert_eq!(catalog.get(DRAFTER_TEMPLATE_ID).map(|t| t.tier_preference), Some(Tier::Cheap));
        assert_eq!(catalog.get(POLISHER_TEMPLATE_ID).map(|t| t.tier_preference), Some(Tier::Premium));
    }
}
