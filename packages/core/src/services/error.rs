//! Service Layer Error Types
//!
//! Every failure the ordering engine reports maps to one [`ErrorKind`]. Errors
//! from placement and allocation are raised before any store write; store
//! failures mean the operation was not applied.

use crate::models::ValidationError;
use serde::Serialize;
use thiserror::Error;

/// Coarse error classification surfaced to the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidMove,
    StoreFailure,
    Validation,
}

/// Category operation errors
#[derive(Error, Debug)]
pub enum CategoryServiceError {
    /// Moving, reference or target category does not exist (or is invisible)
    #[error("Category not found: {id}")]
    NotFound { id: String },

    /// Mutation of a category the requester does not own
    #[error("Forbidden on category {id}: {reason}")]
    Forbidden { id: String, reason: String },

    /// Move would create a cycle or the reference is not a sibling candidate
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// Persistence call failed; nothing was applied
    #[error("Store operation failed: {0}")]
    StoreFailure(String),

    /// Input rejected before reaching the store
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl CategoryServiceError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn forbidden(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Forbidden {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_move(msg: impl Into<String>) -> Self {
        Self::InvalidMove(msg.into())
    }

    pub fn store_failure(msg: impl Into<String>) -> Self {
        Self::StoreFailure(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::InvalidMove(_) => ErrorKind::InvalidMove,
            Self::StoreFailure(_) => ErrorKind::StoreFailure,
            Self::Validation(_) => ErrorKind::Validation,
        }
    }
}

impl From<anyhow::Error> for CategoryServiceError {
    fn from(err: anyhow::Error) -> Self {
        Self::StoreFailure(format!("{:#}", err))
    }
}

/// Failed delete, with the subtree size counted before the attempt
#[derive(Error, Debug)]
#[error("{source} (subtree of {descendant_count} descendants left intact)")]
pub struct DeleteError {
    #[source]
    pub source: CategoryServiceError,
    pub descendant_count: usize,
}

impl DeleteError {
    pub fn new(source: CategoryServiceError, descendant_count: usize) -> Self {
        Self {
            source,
            descendant_count,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            CategoryServiceError::not_found("x").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CategoryServiceError::forbidden("x", "shared").kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            CategoryServiceError::from(ValidationError::EmptyName).kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_store_errors_keep_underlying_message() {
        let err: CategoryServiceError = anyhow::anyhow!("connection reset").into();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_delete_error_reports_count() {
        let err = DeleteError::new(CategoryServiceError::store_failure("boom"), 3);
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert!(err.to_string().contains("3 descendants"));
    }
}
