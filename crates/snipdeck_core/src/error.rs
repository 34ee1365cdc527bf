//! Application error types for the snippet engine and its storage.
use std::fmt;
use thiserror::Error;

/// Which kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Category,
    Label,
    Snippet,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Category => "category",
            EntityKind::Label => "label",
            EntityKind::Snippet => "snippet",
        };
        f.write_str(label)
    }
}

/// Top-level application error type.
///
/// The first four variants are the recoverable domain failures; an
/// operation returning one of them has not mutated any state.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dangling reference: {kind} '{id}' does not exist")]
    DanglingReference { kind: EntityKind, id: String },

    #[error("{kind} '{id}' is still used by {usage_count} snippet(s)")]
    EntityInUse {
        kind: EntityKind,
        id: String,
        usage_count: usize,
    },

    #[error("Not found: {kind} '{id}'")]
    NotFound { kind: EntityKind, id: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Locked: {0}")]
    Locked(String),
}

impl AppError {
    pub(crate) fn not_found(kind: impl Into<EntityKind>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.to_string(),
        }
    }

    pub(crate) fn dangling(kind: impl Into<EntityKind>, id: impl fmt::Display) -> Self {
        Self::DanglingReference {
            kind: kind.into(),
            id: id.to_string(),
        }
    }

    /// Returns `true` for the domain failures a caller is expected to
    /// recover from (as opposed to storage or serialization faults).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::InvalidInput(_)
                | AppError::DanglingReference { .. }
                | AppError::EntityInUse { .. }
                | AppError::NotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity_kind() {
        let err = AppError::EntityInUse {
            kind: EntityKind::Category,
            id: "abc".to_string(),
            usage_count: 2,
        };
        assert_eq!(err.to_string(), "category 'abc' is still used by 2 snippet(s)");

        let err = AppError::not_found(EntityKind::Snippet, "xyz");
        assert_eq!(err.to_string(), "Not found: snippet 'xyz'");
    }

    #[test]
    fn storage_faults_are_not_recoverable() {
        assert!(AppError::InvalidInput("comma".to_string()).is_recoverable());
        assert!(!AppError::Storage("disk".to_string()).is_recoverable());
        assert!(!AppError::Locked("held".to_string()).is_recoverable());
    }
}
