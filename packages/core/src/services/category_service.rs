//! Category Service
//!
//! Public entry point for the UI/automation layer. Each call runs the same
//! pipeline: validate and resolve (no writes) → allocate an order key →
//! one store mutation → best-effort path fix-up → domain event.
//!
//! # Examples
//!
//! ```rust
//! use category_tree_core::db::InMemoryCategoryStore;
//! use category_tree_core::models::{DropPosition, Requester};
//! use category_tree_core::services::CategoryService;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = CategoryService::new(Arc::new(InMemoryCategoryStore::new()));
//! let alice = Requester::user("alice");
//!
//! let shoes = service.create_node(&alice, "Shoes", None, None).await?;
//! let boots = service.create_node(&alice, "Boots", None, None).await?;
//! service
//!     .move_node(&alice, &boots.id, Some(&shoes.id), DropPosition::Inside)
//!     .await?;
//!
//! let tree = service.get_tree(&alice).await?;
//! assert_eq!(tree[0].children[0].category.name, "Boots");
//! # Ok(())
//! # }
//! ```

use crate::config::TreeConfig;
use crate::db::{CategoryEvent, CategoryStore, FractionalOrderCalculator, PlacementChange};
use crate::models::{
    normalize_name, Category, CategoryTree, DeleteResult, DropPosition, NewCategory, Requester,
};
use crate::operations::{
    CascadeDeleteOrchestrator, PathMaintainer, PathMaintenanceReport, PlacementResolver,
};
use crate::services::{CategoryServiceError, DeleteError};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Result of a committed move
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub id: String,
    pub parent_id: Option<String>,
    pub order_key: f64,
    /// Index among the visible siblings the key was allocated for
    pub insert_index: usize,
    /// Path fix-up result; failures here do not undo the move
    pub paths: PathMaintenanceReport,
}

/// Ordering, placement and lifecycle operations on the category tree
#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
    calculator: FractionalOrderCalculator,
    config: TreeConfig,
    event_tx: broadcast::Sender<CategoryEvent>,
}

impl CategoryService {
    /// Create a service with default configuration
    pub fn new(store: Arc<dyn CategoryStore>) -> Self {
        Self::with_config(store, TreeConfig::default())
    }

    pub fn with_config(store: Arc<dyn CategoryStore>, config: TreeConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            store,
            calculator: FractionalOrderCalculator::new(config.ordering),
            config,
            event_tx,
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Subscribe to domain events (created, moved, renamed, deleted)
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<CategoryEvent> {
        self.event_tx.subscribe()
    }

    /// No subscribers is not an error
    fn emit_event(&self, event: CategoryEvent) {
        tracing::debug!(
            "Emitting {} for {}",
            event.event_type(),
            event.category_id()
        );
        let _ = self.event_tx.send(event);
    }

    fn resolver(&self) -> PlacementResolver<'_> {
        PlacementResolver::new(self.store.as_ref())
    }

    fn path_maintainer(&self) -> PathMaintainer<'_> {
        PathMaintainer::new(self.store.as_ref())
    }

    fn delete_orchestrator(&self) -> CascadeDeleteOrchestrator<'_> {
        CascadeDeleteOrchestrator::new(self.store.as_ref())
    }

    /// Move `active_id` relative to `reference_id`.
    ///
    /// `reference_id = None` moves to the end of the root level. Only the moved
    /// row is written; sibling rows are never touched.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` and `InvalidMove` are raised before any write.
    /// `StoreFailure` means the move was not applied.
    pub async fn move_node(
        &self,
        requester: &Requester,
        active_id: &str,
        reference_id: Option<&str>,
        position: DropPosition,
    ) -> Result<MoveOutcome, CategoryServiceError> {
        let placement = self
            .resolver()
            .resolve(requester, active_id, reference_id, position)
            .await?;

        let keys = placement.sibling_keys();
        if self.calculator.needs_rebalancing(&keys) {
            tracing::warn!(
                "Siblings under {:?} have collapsed order keys; allocation may be approximate",
                placement.new_parent_id
            );
        }
        let order_key = self.calculator.allocate(&keys, placement.insert_index);

        self.store
            .update_order_and_parent(active_id, order_key, placement.new_parent_id.as_deref())
            .await?;

        tracing::info!(
            "Moved category {} under {:?} at index {} (key {})",
            active_id,
            placement.new_parent_id,
            placement.insert_index,
            order_key
        );

        let paths = self.path_maintainer().update_paths(active_id).await;

        self.emit_event(CategoryEvent::Moved(PlacementChange {
            id: active_id.to_string(),
            parent_id: placement.new_parent_id.clone(),
            order_key,
        }));

        Ok(MoveOutcome {
            id: active_id.to_string(),
            parent_id: placement.new_parent_id,
            order_key,
            insert_index: placement.insert_index,
            paths,
        })
    }

    /// Create a private category for `requester`, appended after the last
    /// visible sibling under `parent_id`.
    pub async fn create_node(
        &self,
        requester: &Requester,
        name: &str,
        description: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<Category, CategoryServiceError> {
        let owner_id = requester.owner_id().ok_or_else(|| {
            CategoryServiceError::forbidden(
                parent_id.unwrap_or("root"),
                "anonymous requesters cannot create categories",
            )
        })?;
        let name = normalize_name(name)?;
        let visibility = requester.visibility();

        if let Some(parent_id) = parent_id {
            self.store
                .find_by_id(parent_id)
                .await?
                .filter(|parent| visibility.matches(parent))
                .ok_or_else(|| CategoryServiceError::not_found(parent_id))?;
        }

        let siblings = self.store.list_siblings(parent_id, &visibility).await?;
        let keys: Vec<f64> = siblings.iter().map(|c| c.order_key).collect();
        let order_key = self.calculator.allocate(&keys, keys.len());

        let created = self
            .store
            .insert(
                NewCategory {
                    owner_id: Some(owner_id.to_string()),
                    name,
                    description: description.map(str::to_string),
                    parent_id: parent_id.map(str::to_string),
                    order_key,
                }
                .validated()?,
            )
            .await?;

        tracing::info!(
            "Created category {} ({:?}) under {:?} with key {}",
            created.id,
            created.name,
            created.parent_id,
            created.order_key
        );

        let paths = self.path_maintainer().update_paths(&created.id).await;
        if !paths.is_clean() {
            tracing::warn!(
                "Created category {} with {} path maintenance failures",
                created.id,
                paths.failures
            );
        }

        let created = match self.store.find_by_id(&created.id).await {
            Ok(Some(fresh)) => fresh,
            Ok(None) => {
                tracing::warn!(
                    "Created category {} vanished before re-read, returning inserted row",
                    created.id
                );
                created
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to re-read created category {}, returning inserted row: {:#}",
                    created.id,
                    e
                );
                created
            }
        };

        self.emit_event(CategoryEvent::Created {
            category: created.clone(),
        });
        Ok(created)
    }

    /// Edit name and description of a privately owned category.
    ///
    /// A name change re-derives the paths of all descendants.
    pub async fn rename_node(
        &self,
        requester: &Requester,
        id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<PathMaintenanceReport, CategoryServiceError> {
        let owner_id = requester.owner_id().ok_or_else(|| {
            CategoryServiceError::forbidden(id, "anonymous requesters cannot edit categories")
        })?;
        let name = normalize_name(name)?;

        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CategoryServiceError::not_found(id))?;

        if current.is_shared() {
            return Err(CategoryServiceError::forbidden(
                id,
                "shared categories cannot be edited",
            ));
        }
        if !current.is_owned_by(owner_id) {
            return Err(CategoryServiceError::forbidden(
                id,
                "category belongs to another user",
            ));
        }

        self.store
            .update_name_description(id, &name, description)
            .await?;
        tracing::info!("Renamed category {} to {:?}", id, name);

        let paths = if current.name != name {
            self.path_maintainer().update_paths(id).await
        } else {
            PathMaintenanceReport::default()
        };

        self.emit_event(CategoryEvent::Renamed {
            id: id.to_string(),
            name,
            description: description.map(str::to_string),
        });
        Ok(paths)
    }

    /// Number of categories that a delete of `id` would remove besides `id`
    pub async fn count_descendants(&self, id: &str) -> Result<usize, CategoryServiceError> {
        self.delete_orchestrator().count_descendants(id).await
    }

    /// Delete a privately owned category together with its subtree.
    ///
    /// Failures carry the descendant count computed before the attempt; a
    /// failed delete leaves every row in place.
    pub async fn delete_node(
        &self,
        requester: &Requester,
        id: &str,
    ) -> Result<DeleteResult, DeleteError> {
        let owner_id = requester.owner_id().ok_or_else(|| {
            DeleteError::new(
                CategoryServiceError::forbidden(id, "anonymous requesters cannot delete categories"),
                0,
            )
        })?;

        let result = self.delete_orchestrator().delete_subtree(id, owner_id).await?;

        if result.existed {
            self.emit_event(CategoryEvent::Deleted {
                id: id.to_string(),
                deleted_count: result.deleted_count,
            });
        }
        Ok(result)
    }

    /// Nested tree of everything `requester` can see.
    ///
    /// Authenticated requesters get their private categories merged with the
    /// shared ones; anonymous requesters get shared categories only.
    /// Categories whose parent is not visible are left out.
    pub async fn get_tree(
        &self,
        requester: &Requester,
    ) -> Result<Vec<CategoryTree>, CategoryServiceError> {
        let categories = self.store.list_visible(&requester.visibility()).await?;
        Ok(build_tree(categories))
    }
}

fn compare_siblings(a: &Category, b: &Category) -> Ordering {
    a.order_key
        .partial_cmp(&b.order_key)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}

/// Assemble a nested tree from a flat list of categories.
///
/// Children are ordered by `order_key`. Categories whose parent is absent from
/// the list, or that sit on a parent cycle, are dropped. Assembly uses explicit
/// stacks, so depth is bounded by memory rather than the call stack.
pub fn build_tree(categories: Vec<Category>) -> Vec<CategoryTree> {
    let present: HashSet<String> = categories.iter().map(|c| c.id.clone()).collect();
    let mut roots: Vec<Category> = Vec::new();
    let mut children: HashMap<String, Vec<Category>> = HashMap::new();

    for category in categories {
        match category.parent_id.clone() {
            None => roots.push(category),
            Some(parent) if present.contains(&parent) => {
                children.entry(parent).or_default().push(category)
            }
            Some(_) => {}
        }
    }

    roots.sort_by(compare_siblings);
    for list in children.values_mut() {
        list.sort_by(compare_siblings);
    }
    let root_ids: Vec<String> = roots.iter().map(|c| c.id.clone()).collect();

    // Pre-order walk: every parent is recorded before its children
    let mut preorder: Vec<(Category, Vec<String>)> = Vec::new();
    let mut stack: Vec<Category> = roots.into_iter().rev().collect();
    while let Some(category) = stack.pop() {
        let kids = children.remove(&category.id).unwrap_or_default();
        let kid_ids = kids.iter().map(|c| c.id.clone()).collect();
        stack.extend(kids.into_iter().rev());
        preorder.push((category, kid_ids));
    }

    // Reverse pre-order builds every child before its parent
    let mut built: HashMap<String, CategoryTree> = HashMap::new();
    for (category, kid_ids) in preorder.into_iter().rev() {
        let kids = kid_ids.iter().filter_map(|id| built.remove(id)).collect();
        built.insert(
            category.id.clone(),
            CategoryTree {
                category,
                children: kids,
            },
        );
    }

    root_ids
        .iter()
        .filter_map(|id| built.remove(id))
        .collect()
}
