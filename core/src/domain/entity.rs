//! Domain Layer - Core Entity Trait
//!
//! Every stored record (counter or collection) has a stable identifier and
//! an `order` within its ordering domain.

use serde::{Deserialize, Serialize};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Copy + Eq + Ord + std::hash::Hash + std::fmt::Debug + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;

    /// Position within the entity's ordering domain
    fn order(&self) -> i32;
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainError {
    NotFound(String),
    InvalidInput(String),
    Conflict(String),
    Internal(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

/// Reject blank display names
pub(crate) fn validate_name(name: &str, what: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidInput(format!("{} name must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::NotFound("Counter 7".to_string());
        assert_eq!(err.to_string(), "Not found: Counter 7");
    }

    #[test]
    fn test_validate_name_trims() {
        assert_eq!(validate_name("  Water  ", "Counter").unwrap(), "Water");
        assert!(matches!(validate_name("   ", "Counter"), Err(DomainError::InvalidInput(_))));
    }
}
