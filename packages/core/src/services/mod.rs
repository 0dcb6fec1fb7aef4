//! Business Services
//!
//! - `CategoryService` - move, create, rename, delete and tree reads for the
//!   category tree, with domain events for cache invalidation
//!
//! Services coordinate between the store and the UI layer, enforcing ownership
//! and ordering rules before anything is persisted.

pub mod category_service;
pub mod error;


pub use category_service::{build_tree, CategoryService, MoveOutcome};
pub use error::{CategoryServiceError, DeleteError, ErrorKind};
