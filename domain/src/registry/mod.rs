//! Model registry: available models per provider and tier, with pricing.
//!
//! The registry is an immutable lookup table. The router consults it for
//! cold-start defaults and the agent factory for cost estimates; nothing
//! mutates it after construction.

use crate::core::tier::Tier;
use serde::{Deserialize, Serialize};

/// Nominal input token count used for spawn-time cost estimates
pub const NOMINAL_INPUT_TOKENS: u64 = 2_000;
/// Nominal output token count used for spawn-time cost estimates
pub const NOMINAL_OUTPUT_TOKENS: u64 = 1_000;

/// A model offered by a provider at a given tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Canonical identifier passed to the executor (e.g. "claude-sonnet-4.5")
    pub id: String,
    /// Provider name (e.g. "anthropic")
    pub provider: String,
    pub tier: Tier,
    /// USD per million input tokens
    pub input_cost_per_mtok: f64,
    /// USD per million output tokens
    pub output_cost_per_mtok: f64,
}

impl ModelSpec {
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        tier: Tier,
        input_cost_per_mtok: f64,
        output_cost_per_mtok: f64,
    ) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            tier,
            input_cost_per_mtok,
            output_cost_per_mtok,
        }
    }

    /// Cost in USD for a call with the given token counts
    pub fn cost_for(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 * self.input_cost_per_mtok
            + output_tokens as f64 * self.output_cost_per_mtok)
            / 1_000_000.0
    }
}

/// Immutable table of models (Value Object)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRegistry {
    models: Vec<ModelSpec>,
    default_provider: String,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(
            vec![
                ModelSpec::new("claude-haiku-4.5", "anthropic", Tier::Cheap, 1.0, 5.0),
                ModelSpec::new("claude-sonnet-4.5", "anthropic", Tier::Capable, 3.0, 15.0),
                ModelSpec::new("claude-opus-4.5", "anthropic", Tier::Premium, 5.0, 25.0),
                ModelSpec::new("gpt-5-mini", "openai", Tier::Cheap, 0.25, 2.0),
                ModelSpec::new("gpt-5.1", "openai", Tier::Capable, 1.25, 10.0),
                ModelSpec::new("gpt-5.2", "openai", Tier::Premium, 1.75, 14.0),
                ModelSpec::new("gemini-2.5-flash", "google", Tier::Cheap, 0.3, 2.5),
                ModelSpec::new("gemini-2.5-pro", "google", Tier::Capable, 1.25, 10.0),
                ModelSpec::new("gemini-3-pro-preview", "google", Tier::Premium, 2.0, 12.0),
            ],
            "anthropic",
        )
    }
}

impl ModelRegistry {
    pub fn new(models: Vec<ModelSpec>, default_provider: impl Into<String>) -> Self {
        Self {
            models,
            default_provider: default_provider.into(),
        }
    }

    /// Use a different provider for tier defaults
    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = provider.into();
        self
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub fn models(&self) -> &[ModelSpec] {
        &self.models
    }

    /// Look up a model by its identifier
    pub fn get(&self, model_id: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.id == model_id)
    }

    /// All models registered at a tier
    pub fn models_for_tier(&self, tier: Tier) -> impl Iterator<Item = &ModelSpec> {
        self.models.iter().filter(move |m| m.tier == tier)
    }

    /// Default model for a tier: the default provider's entry, else the
    /// first registered model at that tier.
    pub fn default_for(&self, tier: Tier) -> Option<&ModelSpec> {
        self.models_for_tier(tier)
            .find(|m| m.provider == self.default_provider)
            .or_else(|| self.models_for_tier(tier).next())
    }

    /// Identifier of the tier default, falling back to a fixed name when the
    /// registry has nothing at that tier.
    pub fn default_model_id(&self, tier: Tier) -> String {
        self.default_for(tier)
            .map(|m| m.id.clone())
            .unwrap_or_else(|| format!("default-{}", tier))
    }

    /// Estimated cost of a nominal call at the tier's default model
    pub fn estimated_call_cost(&self, tier: Tier) -> f64 {
        self.default_for(tier)
            .map(|m| m.cost_for(NOMINAL_INPUT_TOKENS, NOMINAL_OUTPUT_TOKENS))
            .unwrap_or(0.0)
    }

    /// Provider name for a model id, "unknown" when unregistered
    pub fn provider_of(&self, model_id: &str) -> String {
        self.get(model_id)
            .map(|m| m.provider.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_for_tier_uses_default_provider() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.default_model_id(Tier::Cheap), "claude-haiku-4.5");
        assert_eq!(registry.default_model_id(Tier::Capable), "claude-sonnet-4.5");
        assert_eq!(registry.default_model_id(Tier::Premium), "claude-opus-4.5");
    }

    #[test]
    fn test_switch_default_provider() {
        let registry = ModelRegistry::default().with_default_provider("openai");
        assert_eq!(registry.default_model_id(Tier::Premium), "gpt-5.2");
    }

    #[test]
    fn test_estimated_cost_increases_with_tier() {
        let registry = ModelRegistry::default();
        let cheap = registry.estimated_call_cost(Tier::Cheap);
        let capable = registry.estimated_call_cost(Tier::Capable);
        let premium = registry.estimated_call_cost(Tier::Premium);
        assert!(cheap < capable && capable < premium);
        assert!((capable - 0.021).abs() < 1e-9);
    }

    #[test]
    fn test_empty_tier_falls_back_to_placeholder() {
        let registry = ModelRegistry::new(vec![], "anthropic");
        assert_eq!(registry.default_model_id(Tier::Cheap), "default-cheap");
        assert_eq!(registry.estimated_call_cost(Tier::Cheap), 0.0);
        assert_eq!(registry.provider_of("x"), "unknown");
    }
}
