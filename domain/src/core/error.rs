//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Task analysis produced no usable requirements: {0}")]
    Classification(String),

    #[error("No agent template provides capability '{0}'")]
    NoTemplateFound(String),

    #[error("Invalid execution plan: {0}")]
    InvalidPlan(String),

    #[error("Template rendering failed: missing placeholder '{0}'")]
    MissingPlaceholder(String),
}

impl DomainError {
    /// Check if this error came from template lookup
    pub fn is_no_template(&self) -> bool {
        matches!(self, DomainError::NoTemplateFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_template_display() {
        let error = DomainError::NoTemplateFound("security_scan".to_string());
        assert_eq!(
            error.to_string(),
            "No agent template provides capability 'security_scan'"
        );
        assert!(error.is_no_template());
        assert!(!DomainError::InvalidPlan("empty".into()).is_no_template());
    }
}
