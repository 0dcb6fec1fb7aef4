//! Database Error Types
//!
//! Errors raised by `CategoryStore` implementations. They cross the trait seam
//! as `anyhow::Error` and are reported to callers as store failures.

use thiserror::Error;

/// Store operation that can be made to fail on purpose in tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FindById,
    ListSiblings,
    ListVisible,
    UpdateOrderAndParent,
    UpdatePath,
    CascadeDelete,
    Insert,
    UpdateNameDescription,
}

/// Database operation errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Row addressed by id does not exist
    #[error("Category not found: {id}")]
    NotFound { id: String },

    /// Caller does not own the row it tried to delete
    #[error("Category {id} is not owned by {owner_id}")]
    OwnershipViolation { id: String, owner_id: String },

    /// Referential or uniqueness constraint violated
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Failure injected by a test harness
    #[error("Injected failure during {op:?}")]
    Injected { op: StoreOp },
}

impl DatabaseError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn ownership_violation(id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self::OwnershipViolation {
            id: id.into(),
            owner_id: owner_id.into(),
        }
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }
}
