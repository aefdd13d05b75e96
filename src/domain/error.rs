//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::PersonId;

/// Domain errors represent data or configuration that cannot be turned into a tree.
/// Structural rule violations are not errors; see `validator::Violation`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("No members found")]
    NoMembers,

    #[error("No root person found (is_root must be set for one member)")]
    NoRootPerson,

    #[error("cycle detected in hierarchy at: {0}")]
    CycleDetected(PersonId),

    #[error("invalid record {id}: {message}")]
    InvalidRecord { id: String, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DomainError {
    /// Errors that mean "no tree can be drawn", as opposed to broken input records.
    pub fn is_build_fatal(&self) -> bool {
        matches!(
            self,
            DomainError::NoMembers | DomainError::NoRootPerson | DomainError::CycleDetected(_)
        )
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
