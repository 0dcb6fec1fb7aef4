//! In-memory `CategoryStore`
//!
//! A complete, thread-safe implementation of the store contract backed by a
//! `HashMap`. It serves as the reference implementation for tests and the dev
//! binary, and it supports failure injection so callers can verify how the
//! engine behaves when persistence fails halfway through an operation.
//!
//! Cascade deletes are staged on a copy of the table and swapped in only after
//! every row has been removed, which gives the all-or-nothing guarantee the
//! trait requires.

use super::category_store::CategoryStore;
use super::error::{DatabaseError, StoreOp};
use crate::models::{Category, DeleteResult, NewCategory, VisibilityFilter};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Faults {
    fail_next: HashSet<StoreOp>,
    /// Abort the next cascade delete after this many rows were staged for removal
    cascade_fail_after: Option<usize>,
}

/// Thread-safe in-memory category table
#[derive(Debug, Default)]
pub struct InMemoryCategoryStore {
    rows: RwLock<HashMap<String, Category>>,
    faults: Mutex<Faults>,
}

impl InMemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `categories`, ids and keys kept as given
    pub fn with_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let rows = categories
            .into_iter()
            .map(|category| (category.id.clone(), category))
            .collect();
        Self {
            rows: RwLock::new(rows),
            faults: Mutex::new(Faults::default()),
        }
    }

    /// All rows in unspecified order
    pub async fn snapshot(&self) -> Vec<Category> {
        self.rows.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Make the next call of `op` fail with an injected error
    pub async fn fail_next(&self, op: StoreOp) {
        self.faults.lock().await.fail_next.insert(op);
    }

    /// Make the next cascade delete fail after `rows` rows were staged
    pub async fn fail_cascade_after(&self, rows: usize) {
        self.faults.lock().await.cascade_fail_after = Some(rows);
    }

    async fn check_fault(&self, op: StoreOp) -> Result<()> {
        if self.faults.lock().await.fail_next.remove(&op) {
            tracing::debug!("Injected store failure for {:?}", op);
            return Err(DatabaseError::Injected { op }.into());
        }
        Ok(())
    }

    fn sorted(mut categories: Vec<Category>) -> Vec<Category> {
        categories.sort_by(compare_by_key);
        categories
    }
}

/// Ascending by order key; ties broken by creation time then id so range
/// reads stay deterministic.
fn compare_by_key(a: &Category, b: &Category) -> Ordering {
    a.order_key
        .partial_cmp(&b.order_key)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Ids of `root_id` and every transitive descendant, root first
fn collect_subtree(rows: &HashMap<String, Category>, root_id: &str) -> Vec<String> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for row in rows.values() {
        if let Some(parent) = row.parent_id.as_deref() {
            children.entry(parent).or_default().push(row.id.as_str());
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::new();
    let mut worklist = vec![root_id];
    while let Some(id) = worklist.pop() {
        if !seen.insert(id) {
            continue;
        }
        ordered.push(id.to_string());
        if let Some(kids) = children.get(id) {
            worklist.extend(kids.iter().copied());
        }
    }
    ordered
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Category>> {
        self.check_fault(StoreOp::FindById).await?;
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn list_siblings(
        &self,
        parent_id: Option<&str>,
        filter: &VisibilityFilter,
    ) -> Result<Vec<Category>> {
        self.check_fault(StoreOp::ListSiblings).await?;
        let rows = self.rows.read().await;
        let siblings = rows
            .values()
            .filter(|c| c.parent_id.as_deref() == parent_id && filter.matches(c))
            .cloned()
            .collect();
        Ok(Self::sorted(siblings))
    }

    async fn list_visible(&self, filter: &VisibilityFilter) -> Result<Vec<Category>> {
        self.check_fault(StoreOp::ListVisible).await?;
        let rows = self.rows.read().await;
        let visible = rows.values().filter(|c| filter.matches(c)).cloned().collect();
        Ok(Self::sorted(visible))
    }

    async fn update_order_and_parent(
        &self,
        id: &str,
        order_key: f64,
        parent_id: Option<&str>,
    ) -> Result<()> {
        self.check_fault(StoreOp::UpdateOrderAndParent).await?;
        let mut rows = self.rows.write().await;

        if let Some(parent) = parent_id {
            if !rows.contains_key(parent) {
                return Err(DatabaseError::constraint(format!(
                    "parent {} does not exist",
                    parent
                ))
                .into());
            }
        }

        let row = rows.get_mut(id).ok_or_else(|| DatabaseError::not_found(id))?;
        row.order_key = order_key;
        row.parent_id = parent_id.map(str::to_string);
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn update_path(&self, id: &str, path: &str) -> Result<()> {
        self.check_fault(StoreOp::UpdatePath).await?;
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(id).ok_or_else(|| DatabaseError::not_found(id))?;
        row.path = Some(path.to_string());
        Ok(())
    }

    async fn cascade_delete(&self, root_id: &str, owner_id: &str) -> Result<DeleteResult> {
        self.check_fault(StoreOp::CascadeDelete).await?;
        let fail_after = self.faults.lock().await.cascade_fail_after.take();

        let mut rows = self.rows.write().await;
        let root = match rows.get(root_id) {
            Some(root) => root,
            None => {
                return Ok(DeleteResult {
                    existed: false,
                    deleted_count: 0,
                })
            }
        };

        if !root.is_owned_by(owner_id) {
            return Err(DatabaseError::ownership_violation(root_id, owner_id).into());
        }

        let doomed = collect_subtree(&rows, root_id);
        let mut staged = rows.clone();
        for (removed, id) in doomed.iter().enumerate() {
            if fail_after == Some(removed) {
                // Staged copy is dropped; the live table is untouched
                return Err(DatabaseError::Injected {
                    op: StoreOp::CascadeDelete,
                }
                .into());
            }
            staged.remove(id);
        }

        let doomed_set: HashSet<&str> = doomed.iter().map(String::as_str).collect();
        if let Some(orphan) = staged
            .values()
            .find(|c| c.parent_id.as_deref().is_some_and(|p| doomed_set.contains(p)))
        {
            return Err(DatabaseError::constraint(format!(
                "delete of {} would orphan {}",
                root_id, orphan.id
            ))
            .into());
        }

        *rows = staged;
        Ok(DeleteResult {
            existed: true,
            deleted_count: doomed.len(),
        })
    }

    async fn insert(&self, category: NewCategory) -> Result<Category> {
        self.check_fault(StoreOp::Insert).await?;
        let mut rows = self.rows.write().await;

        if let Some(parent) = category.parent_id.as_deref() {
            if !rows.contains_key(parent) {
                return Err(DatabaseError::constraint(format!(
                    "parent {} does not exist",
                    parent
                ))
                .into());
            }
        }

        let now = Utc::now();
        let created = Category {
            id: Uuid::new_v4().to_string(),
            owner_id: category.owner_id,
            name: category.name,
            description: category.description,
            parent_id: category.parent_id,
            order_key: category.order_key,
            path: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        };
        rows.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_name_description(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<()> {
        self.check_fault(StoreOp::UpdateNameDescription).await?;
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(id).ok_or_else(|| DatabaseError::not_found(id))?;
        row.name = name.to_string();
        row.description = description.map(str::to_string);
        row.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str, owner: Option<&str>, parent: Option<&str>, key: f64) -> Category {
        let mut c = Category::new(
            owner.map(str::to_string),
            id.to_uppercase(),
            None,
            parent.map(str::to_string),
            key,
        );
        c.id = id.to_string();
        c
    }

    fn family() -> InMemoryCategoryStore {
        InMemoryCategoryStore::with_categories(vec![
            category("p", Some("alice"), None, 1.0),
            category("c1", Some("alice"), Some("p"), 1.0),
            category("c2", Some("alice"), Some("p"), 2.0),
            category("g1", Some("alice"), Some("c1"), 1.0),
            category("other", Some("alice"), None, 2.0),
        ])
    }

    #[tokio::test]
    async fn test_list_siblings_sorted_and_filtered() {
        let store = InMemoryCategoryStore::with_categories(vec![
            category("b", None, None, 20.0),
            category("a", Some("alice"), None, 10.0),
            category("z", Some("bob"), None, 5.0),
        ]);

        let alice = VisibilityFilter::OwnerAndShared("alice".to_string());
        let ids: Vec<String> = store
            .list_siblings(None, &alice)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        let shared = store
            .list_siblings(None, &VisibilityFilter::SharedOnly)
            .await
            .unwrap();
        assert_eq!(shared.len(), 1);
    }

    #[tokio::test]
    async fn test_cascade_delete_removes_subtree() {
        let store = family();
        let result = store.cascade_delete("p", "alice").await.unwrap();

        assert_eq!(
            result,
            DeleteResult {
                existed: true,
                deleted_count: 4
            }
        );
        let remaining = store.snapshot().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "other");
    }

    #[tokio::test]
    async fn test_cascade_delete_rolls_back_on_failure() {
        let store = family();
        store.fail_cascade_after(2).await;

        assert!(store.cascade_delete("p", "alice").await.is_err());
        assert_eq!(store.len().await, 5);

        // Failure is one-shot
        assert!(store.cascade_delete("p", "alice").await.is_ok());
    }

    #[tokio::test]
    async fn test_cascade_delete_checks_owner() {
        let store = family();
        let err = store.cascade_delete("p", "mallory").await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DatabaseError>(),
            Some(DatabaseError::OwnershipViolation { .. })
        ));
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test]
    async fn test_cascade_delete_missing_root_is_idempotent() {
        let store = family();
        let result = store.cascade_delete("ghost", "alice").await.unwrap();
        assert!(!result.existed);
        assert_eq!(result.deleted_count, 0);
    }

    #[tokio::test]
    async fn test_insert_requires_existing_parent() {
        let store = InMemoryCategoryStore::new();
        let result = store
            .insert(NewCategory {
                owner_id: None,
                name: "Orphan".to_string(),
                description: None,
                parent_id: Some("missing".to_string()),
                order_key: 1.0,
            })
            .await;
        assert!(result.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let store = family();
        store.fail_next(StoreOp::UpdatePath).await;

        assert!(store.update_path("p", "x").await.is_err());
        assert!(store.update_path("p", "x").await.is_ok());
    }
}
