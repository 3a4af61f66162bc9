//! Agent domain
//!
//! Templates are reusable archetypes; agents are the concrete, single-plan
//! instances spawned from them by the [`factory::AgentFactory`].

pub mod catalog;
pub mod entities;
pub mod factory;
pub mod render;
pub mod template;
