//! Learned agent compositions
//!
//! A composition is the persistable shape of a plan that worked: which
//! templates, at which tiers, composed by which strategy. Statistics are only
//! changed through [`AgentComposition::record_outcome`].

mod entities;

pub use entities::{
    AgentComposition, AgentSpec, CompositionOutcome, PatternContribution, best_for_pattern,
    composition_fingerprint,
};
