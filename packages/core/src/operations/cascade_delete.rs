//! Cascade delete orchestration
//!
//! The store owns the authoritative, transactional subtree delete. This
//! module performs the client-side pre-checks, counts the subtree for
//! confirmation prompts and reports failures together with that count.

use crate::db::CategoryStore;
use crate::models::{DeleteResult, VisibilityFilter};
use crate::services::{CategoryServiceError, DeleteError};
use std::collections::HashSet;

pub struct CascadeDeleteOrchestrator<'a> {
    store: &'a dyn CategoryStore,
}

impl<'a> CascadeDeleteOrchestrator<'a> {
    pub fn new(store: &'a dyn CategoryStore) -> Self {
        Self { store }
    }

    /// Number of categories below `node_id`, of any owner.
    ///
    /// Walks the whole subtree over an explicit worklist; each category is
    /// counted once even if the stored parent pointers loop.
    pub async fn count_descendants(&self, node_id: &str) -> Result<usize, CategoryServiceError> {
        let mut seen: HashSet<String> = HashSet::from([node_id.to_string()]);
        let mut worklist = vec![node_id.to_string()];

        while let Some(id) = worklist.pop() {
            let children = self
                .store
                .list_siblings(Some(&id), &VisibilityFilter::All)
                .await?;
            for child in children {
                if seen.insert(child.id.clone()) {
                    worklist.push(child.id);
                }
            }
        }

        Ok(seen.len() - 1)
    }

    /// Delete `node_id` and its subtree as one atomic store operation.
    ///
    /// Missing nodes yield `NotFound`, nodes not privately owned by `owner_id`
    /// yield `Forbidden`; both are detected before the store is asked to
    /// delete anything. Store failures leave the subtree untouched.
    pub async fn delete_subtree(
        &self,
        node_id: &str,
        owner_id: &str,
    ) -> Result<DeleteResult, DeleteError> {
        let node = self
            .store
            .find_by_id(node_id)
            .await
            .map_err(|e| DeleteError::new(e.into(), 0))?
            .ok_or_else(|| DeleteError::new(CategoryServiceError::not_found(node_id), 0))?;

        let descendant_count = self
            .count_descendants(node_id)
            .await
            .map_err(|e| DeleteError::new(e, 0))?;

        if !node.is_owned_by(owner_id) {
            let reason = if node.is_shared() {
                "shared categories cannot be deleted"
            } else {
                "category belongs to another user"
            };
            return Err(DeleteError::new(
                CategoryServiceError::forbidden(node_id, reason),
                descendant_count,
            ));
        }

        let result = self
            .store
            .cascade_delete(node_id, owner_id)
            .await
            .map_err(|e| {
                tracing::warn!("Cascade delete of {} failed: {:#}", node_id, e);
                DeleteError::new(e.into(), descendant_count)
            })?;

        tracing::info!(
            "Deleted category {} with {} descendants ({} rows)",
            node_id,
            descendant_count,
            result.deleted_count
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryCategoryStore, StoreOp};
    use crate::models::Category;
    use crate::services::ErrorKind;

    fn category(id: &str, owner: Option<&str>, parent: Option<&str>) -> Category {
        let mut c = Category::new(
            owner.map(str::to_string),
            id.to_string(),
            None,
            parent.map(str::to_string),
            1.0,
        );
        c.id = id.to_string();
        c
    }

    fn store() -> InMemoryCategoryStore {
        InMemoryCategoryStore::with_categories(vec![
            category("p", Some("alice"), None),
            category("c1", Some("alice"), Some("p")),
            category("c2", Some("alice"), Some("p")),
            category("g1", Some("alice"), Some("c1")),
            category("shared", None, None),
        ])
    }

    #[tokio::test]
    async fn test_count_descendants() {
        let store = store();
        let orchestrator = CascadeDeleteOrchestrator::new(&store);

        assert_eq!(orchestrator.count_descendants("p").await.unwrap(), 3);
        assert_eq!(orchestrator.count_descendants("g1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_descendants_of_deep_chain() {
        let mut rows = vec![category("n0", Some("alice"), None)];
        for i in 1..2_500 {
            let parent = format!("n{}", i - 1);
            rows.push(category(&format!("n{}", i), Some("alice"), Some(&parent)));
        }
        let store = InMemoryCategoryStore::with_categories(rows);
        let orchestrator = CascadeDeleteOrchestrator::new(&store);

        assert_eq!(orchestrator.count_descendants("n0").await.unwrap(), 2_499);
        assert_eq!(orchestrator.count_descendants("n2000").await.unwrap(), 499);
    }

    #[tokio::test]
    async fn test_delete_shared_is_forbidden() {
        let store = store();
        let orchestrator = CascadeDeleteOrchestrator::new(&store);

        let err = orchestrator
            .delete_subtree("shared", "alice")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test]
    async fn test_store_failure_carries_descendant_count() {
        let store = store();
        store.fail_next(StoreOp::CascadeDelete).await;
        let orchestrator = CascadeDeleteOrchestrator::new(&store);

        let err = orchestrator.delete_subtree("p", "alice").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert_eq!(err.descendant_count, 3);
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test]
    async fn test_delete_missing_node() {
        let store = store();
        let orchestrator = CascadeDeleteOrchestrator::new(&store);

        let err = orchestrator.delete_subtree("ghost", "alice").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
