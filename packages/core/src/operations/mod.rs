//! Tree Operations
//!
//! The building blocks `CategoryService` composes for each mutation:
//!
//! - [`PlacementResolver`] - legality checks and sibling context for moves
//! - [`PathMaintainer`] - best-effort materialized path fix-up
//! - [`CascadeDeleteOrchestrator`] - pre-checks and reporting around the
//!   store's atomic subtree delete
//!
//! Each borrows the store for the duration of one request.

pub mod cascade_delete;
pub mod path_maintainer;
pub mod placement;

pub use cascade_delete::CascadeDeleteOrchestrator;
pub use path_maintainer::{child_path, derive_path, PathMaintainer, PathMaintenanceReport};
pub use placement::{insert_index_for, Placement, PlacementResolver};
