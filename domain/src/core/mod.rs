//! Core domain concepts shared across all subdomains.
//!
//! - [`tier::Tier`]: cost/capability class of a model call
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod tier;
