//! Category Tree Core
//!
//! Ordering and placement engine for a user-arranged category tree, where
//! categories are either shared (visible to everyone) or private to one owner.
//!
//! # Architecture
//!
//! - **Fractional order keys**: a move rewrites exactly one row; siblings are
//!   never renumbered
//! - **Merged visibility**: authenticated requesters order their private
//!   categories among the shared ones
//! - **Materialized paths**: best-effort secondary index, repaired on the next
//!   move of the subtree
//! - **Atomic cascade delete**: a subtree goes away completely or not at all
//!
//! # Modules
//!
//! - [`models`] - Data structures (Category, CategoryTree, Requester, etc.)
//! - [`config`] - Ordering constants and tree limits, overridable from the environment
//! - [`db`] - Store contract, in-memory store, order key allocation, events, seed data
//! - [`operations`] - Placement resolution, path maintenance, cascade delete
//! - [`services`] - `CategoryService`, the public entry point
//! - [`projection`] - Caller-owned optimistic tree state for UI sessions

pub mod config;
pub mod db;
pub mod models;
pub mod operations;
pub mod projection;
pub mod services;

// Re-export commonly used types
pub use config::{OrderingConfig, TreeConfig};
pub use db::{CategoryStore, FractionalOrderCalculator, InMemoryCategoryStore};
pub use models::*;
pub use projection::TreeSession;
pub use services::*;
