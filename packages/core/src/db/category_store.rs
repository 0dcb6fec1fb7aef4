//! CategoryStore Trait - Persistence Capability
//!
//! The ordering engine never talks to a database directly. Everything it needs
//! from persistence is this narrow trait, so the allocator, resolver and path
//! maintainer run unchanged against a relational backend or the in-memory
//! implementation used by tests and the dev binary.
//!
//! # Contract
//!
//! - Range reads (`list_siblings`, `list_visible`) return rows ascending by
//!   `order_key`.
//! - `update_order_and_parent` touches exactly one row and is all-or-nothing.
//! - `cascade_delete` is a single transaction: it verifies ownership of the
//!   root, removes the root and every transitive descendant, and either fully
//!   commits or fully rolls back.
//!
//! # Examples
//!
//! ```rust
//! use category_tree_core::db::{CategoryStore, InMemoryCategoryStore};
//! use category_tree_core::models::{NewCategory, VisibilityFilter};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = InMemoryCategoryStore::new();
//! let created = store
//!     .insert(NewCategory {
//!         owner_id: None,
//!         name: "Furniture".to_string(),
//!         description: None,
//!         parent_id: None,
//!         order_key: 10_000.0,
//!     })
//!     .await?;
//!
//! let roots = store.list_siblings(None, &VisibilityFilter::SharedOnly).await?;
//! assert_eq!(roots[0].id, created.id);
//! # Ok(())
//! # }
//! ```

use crate::models::{Category, DeleteResult, NewCategory, VisibilityFilter};
use anyhow::Result;
use async_trait::async_trait;

/// Persistence operations consumed by the ordering engine
///
/// Implementations must be `Send + Sync`; the service is shared across tasks.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Point read. `Ok(None)` when the id does not exist.
    async fn find_by_id(&self, id: &str) -> Result<Option<Category>>;

    /// Children of `parent_id` (`None` = root level) matching `filter`,
    /// ascending by `order_key`.
    async fn list_siblings(
        &self,
        parent_id: Option<&str>,
        filter: &VisibilityFilter,
    ) -> Result<Vec<Category>>;

    /// Every category matching `filter`, ascending by `order_key`.
    async fn list_visible(&self, filter: &VisibilityFilter) -> Result<Vec<Category>>;

    /// Single-row move: new key and parent, bumps `updated_at`.
    async fn update_order_and_parent(
        &self,
        id: &str,
        order_key: f64,
        parent_id: Option<&str>,
    ) -> Result<()>;

    /// Overwrite the materialized path of one row.
    async fn update_path(&self, id: &str, path: &str) -> Result<()>;

    /// Atomically delete `root_id` and its whole subtree after verifying that
    /// `owner_id` owns the root.
    ///
    /// A missing root is not an error: the result reports `existed = false`.
    async fn cascade_delete(&self, root_id: &str, owner_id: &str) -> Result<DeleteResult>;

    /// Insert a new row; the store assigns id and timestamps.
    async fn insert(&self, category: NewCategory) -> Result<Category>;

    /// Edit display fields, bumps `updated_at`.
    async fn update_name_description(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<()>;
}
