//! Agent factory: template selection, tier resolution, instruction rendering

use super::catalog::{FALLBACK_TEMPLATE_ID, TemplateCatalog};
use super::entities::Agent;
use super::render::render_task;
use super::template::AgentTemplate;
use crate::composition::AgentSpec;
use crate::core::error::DomainError;
use crate::core::tier::Tier;
use crate::registry::ModelRegistry;
use crate::task::TaskContext;
use crate::task::requirements::TaskRequirements;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Agents spawned for a set of requirements, plus any degradations
#[derive(Debug, Clone, Default)]
pub struct SpawnedTeam {
    pub agents: Vec<Agent>,
    pub warnings: Vec<String>,
}

/// Instantiates agents from the template catalog (Domain Service)
///
/// The factory never raises a tier above the template preference;
/// escalation happens at call time in the router.
#[derive(Debug, Clone)]
pub struct AgentFactory {
    catalog: TemplateCatalog,
    registry: Arc<ModelRegistry>,
}

impl AgentFactory {
    pub fn new(catalog: TemplateCatalog, registry: Arc<ModelRegistry>) -> Self {
        Self { catalog, registry }
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Template providing a capability
    pub fn select_template(&self, capability: &str) -> Result<&AgentTemplate, DomainError> {
        self.catalog
            .find_by_capability(capability)
            .ok_or_else(|| DomainError::NoTemplateFound(capability.to_string()))
    }

    /// Template by id
    pub fn template(&self, id: &str) -> Option<&AgentTemplate> {
        self.catalog.get(id)
    }

    /// Tier for a template under the task's cost ceiling.
    ///
    /// Downgrades exactly one tier when `max_cost` is below the registry's
    /// estimated cost of a nominal call at the preferred tier.
    pub fn resolve_tier(&self, template: &AgentTemplate, requirements: &TaskRequirements) -> Tier {
        let preferred = template.tier_preference;
        match requirements.max_cost {
            Some(max_cost) if max_cost < self.registry.estimated_call_cost(preferred) => {
                preferred.previous().unwrap_or(preferred)
            }
            _ => preferred,
        }
    }

    /// Spawn an agent with no extra context
    pub fn spawn(&self, template: &AgentTemplate, requirements: &TaskRequirements) -> Agent {
        self.spawn_in(template, requirements, &TaskContext::new())
    }

    /// Spawn an agent, rendering instructions with the task context
    pub fn spawn_in(
        &self,
        template: &AgentTemplate,
        requirements: &TaskRequirements,
        context: &TaskContext,
    ) -> Agent {
        let tier = self.resolve_tier(template, requirements);
        self.build(template, tier, requirements, context)
    }

    /// Spawn with an additional tier ceiling (`tier = min(resolved, ceiling)`)
    pub fn spawn_capped(
        &self,
        template: &AgentTemplate,
        requirements: &TaskRequirements,
        context: &TaskContext,
        ceiling: Tier,
    ) -> Agent {
        let tier = self.resolve_tier(template, requirements).min(ceiling);
        self.build(template, tier, requirements, context)
    }

    /// One agent per agent-bearing capability, in capability order.
    ///
    /// Capabilities without a template fall back to the generic template
    /// with a warning; if the generic template is missing too the
    /// `NoTemplateFound` error is returned.
    pub fn spawn_team(
        &self,
        requirements: &TaskRequirements,
        context: &TaskContext,
    ) -> Result<SpawnedTeam, DomainError> {
        let mut team = SpawnedTeam::default();

        for capability in requirements.agent_capabilities() {
            let template = match self.select_template(capability) {
                Ok(template) => template,
                Err(err) => {
                    let fallback = self.catalog.get(FALLBACK_TEMPLATE_ID).ok_or(err)?;
                    team.warnings.push(format!(
                        "No template provides '{}'; using {}",
                        capability, fallback.id
                    ));
                    fallback
                }
            };
            let agent = self.spawn_in(template, requirements, context);
            if let Some(warning) = &agent.render_warning {
                team.warnings.push(warning.clone());
            }
            team.agents.push(agent);
        }

        Ok(team)
    }

    /// Rebuild an agent from a persisted spec for a new task.
    ///
    /// The stored tier is kept; it is re-checked against the cost ceiling
    /// so a reused composition never exceeds what spawning would allow.
    pub fn hydrate(
        &self,
        spec: &AgentSpec,
        requirements: &TaskRequirements,
        context: &TaskContext,
    ) -> Agent {
        let tier = match requirements.max_cost {
            Some(max_cost) if max_cost < self.registry.estimated_call_cost(spec.tier) => {
                spec.tier.previous().unwrap_or(spec.tier)
            }
            _ => spec.tier,
        };
        let vars = instruction_vars(&spec.role, &spec.capabilities, &spec.tools, requirements, context);
        let (instructions, render_warning) = render_or_degrade(&spec.template_id, &spec.instructions_template, &vars);

        Agent {
            id: Agent::instance_id(&spec.template_id),
            template_id: spec.template_id.clone(),
            role: spec.role.clone(),
            tier,
            capabilities: spec.capabilities.clone(),
            instructions,
            instructions_template: spec.instructions_template.clone(),
            tools: spec.tools.clone(),
            quality_gates: spec.quality_gates.clone(),
            timeout_secs: spec.timeout_secs,
            render_warning,
        }
    }

    fn build(
        &self,
        template: &AgentTemplate,
        tier: Tier,
        requirements: &TaskRequirements,
        context: &TaskContext,
    ) -> Agent {
        let vars = instruction_vars(
            &template.role,
            &template.capabilities,
            &template.tools,
            requirements,
            context,
        );
        let (instructions, render_warning) =
            render_or_degrade(&template.id, &template.default_instructions, &vars);

        Agent {
            id: Agent::instance_id(&template.id),
            template_id: template.id.clone(),
            role: template.role.clone(),
            tier,
            capabilities: template.capabilities.clone(),
            instructions,
            instructions_template: template.default_instructions.clone(),
            tools: template.tools.clone(),
            quality_gates: template.quality_gates.clone(),
            timeout_secs: template.timeout_secs,
            render_warning,
        }
    }
}

/// Render instructions; on failure keep the raw template and describe why
fn render_or_degrade(
    template_id: &str,
    template: &str,
    vars: &BTreeMap<String, String>,
) -> (String, Option<String>) {
    match render_task(template, vars) {
        Ok(rendered) => (rendered, None),
        Err(err) => (
            template.to_string(),
            Some(format!(
                "Instructions for {} left unrendered: {}",
                template_id, err
            )),
        ),
    }
}

fn instruction_vars(
    role: &str,
    capabilities: &std::collections::BTreeSet<String>,
    tools: &[String],
    requirements: &TaskRequirements,
    context: &TaskContext,
) -> BTreeMap<String, String> {
    let mut vars: BTreeMap<String, String> = context
        .iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), text))
        })
        .collect();

    vars.insert("task".into(), requirements.description.clone());
    vars.insert("domain".into(), requirements.domain.clone());
    vars.insert("complexity".into(), requirements.complexity.to_string());
    vars.insert("role".into(), role.to_string());
    vars.insert(
        "capabilities".into(),
        capabilities.iter().cloned().collect::<Vec<_>>().join(", "),
    );
    vars.insert("tools".into(), tools.join(", "));
    vars
}
