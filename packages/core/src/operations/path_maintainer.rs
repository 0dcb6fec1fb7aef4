//! Materialized path maintenance
//!
//! A category's `path` is its ancestors' names joined with `/`. It is a
//! secondary index: the parent pointer is authoritative, so failures here are
//! logged and counted but never fail or roll back the operation that
//! triggered the fix-up. The next successful move of the subtree repairs it.

use crate::db::CategoryStore;
use crate::models::{Category, VisibilityFilter};
use std::collections::HashSet;

/// Outcome of a best-effort path fix-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathMaintenanceReport {
    /// Rows whose path was written
    pub updated: usize,
    /// Reads or writes that failed and were skipped
    pub failures: usize,
}

impl PathMaintenanceReport {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

/// Path of a child whose parent has `parent_path` and `parent_name`
pub fn child_path(parent_path: &str, parent_name: &str) -> String {
    if parent_path.is_empty() {
        parent_name.to_string()
    } else {
        format!("{}/{}", parent_path, parent_name)
    }
}

/// Path of a category placed under `parent` (`None` = root, empty path)
pub fn derive_path(parent: Option<&Category>) -> String {
    match parent {
        None => String::new(),
        Some(parent) => child_path(parent.path.as_deref().unwrap_or(""), &parent.name),
    }
}

/// Recomputes paths for a category and its whole subtree
pub struct PathMaintainer<'a> {
    store: &'a dyn CategoryStore,
}

impl<'a> PathMaintainer<'a> {
    pub fn new(store: &'a dyn CategoryStore) -> Self {
        Self { store }
    }

    /// Rewrite the path of `node_id` from its current parent, then of every
    /// descendant from its own (unchanged) parent.
    ///
    /// Idempotent. Uses an explicit worklist so deep trees do not grow the
    /// call stack, and a visited set so a corrupt parent cycle terminates.
    /// Never returns an error.
    pub async fn update_paths(&self, node_id: &str) -> PathMaintenanceReport {
        let mut report = PathMaintenanceReport::default();

        let root = match self.store.find_by_id(node_id).await {
            Ok(Some(node)) => node,
            Ok(None) => {
                tracing::warn!("Path maintenance skipped: category {} not found", node_id);
                report.failures += 1;
                return report;
            }
            Err(e) => {
                tracing::warn!("Path maintenance failed to load {}: {:#}", node_id, e);
                report.failures += 1;
                return report;
            }
        };

        let root_path = match root.parent_id.as_deref() {
            None => String::new(),
            Some(parent_id) => match self.store.find_by_id(parent_id).await {
                Ok(parent) => derive_path(parent.as_ref()),
                Err(e) => {
                    tracing::warn!(
                        "Path maintenance failed to load parent {} of {}: {:#}",
                        parent_id,
                        node_id,
                        e
                    );
                    report.failures += 1;
                    return report;
                }
            },
        };

        let mut visited: HashSet<String> = HashSet::new();
        let mut worklist: Vec<(Category, String)> = vec![(root, root_path)];

        while let Some((node, path)) = worklist.pop() {
            if !visited.insert(node.id.clone()) {
                continue;
            }

            if node.path.as_deref() != Some(path.as_str()) {
                match self.store.update_path(&node.id, &path).await {
                    Ok(()) => report.updated += 1,
                    Err(e) => {
                        tracing::warn!("Failed to update path of {}: {:#}", node.id, e);
                        report.failures += 1;
                    }
                }
            }

            match self
                .store
                .list_siblings(Some(&node.id), &VisibilityFilter::All)
                .await
            {
                Ok(children) => {
                    let children_path = child_path(&path, &node.name);
                    worklist.extend(
                        children
                            .into_iter()
                            .map(|child| (child, children_path.clone())),
                    );
                }
                Err(e) => {
                    tracing::warn!("Failed to list children of {}: {:#}", node.id, e);
                    report.failures += 1;
                }
            }
        }

        tracing::debug!(
            "Path maintenance for {}: {} updated, {} failures",
            node_id,
            report.updated,
            report.failures
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryCategoryStore, StoreOp};

    fn category(id: &str, name: &str, parent: Option<&str>) -> Category {
        let mut c = Category::new(
            Some("alice".to_string()),
            name.to_string(),
            None,
            parent.map(str::to_string),
            1.0,
        );
        c.id = id.to_string();
        c
    }

    fn chain() -> InMemoryCategoryStore {
        InMemoryCategoryStore::with_categories(vec![
            category("a", "Apparel", None),
            category("b", "Shoes", Some("a")),
            category("c", "Boots", Some("b")),
            category("d", "Laces", Some("c")),
        ])
    }

    async fn path_of(store: &InMemoryCategoryStore, id: &str) -> Option<String> {
        store.find_by_id(id).await.unwrap().unwrap().path
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("", "Apparel"), "Apparel");
        assert_eq!(child_path("Apparel", "Shoes"), "Apparel/Shoes");
    }

    #[tokio::test]
    async fn test_update_paths_walks_subtree() {
        let store = chain();
        let report = PathMaintainer::new(&store).update_paths("a").await;

        assert!(report.is_clean());
        assert_eq!(report.updated, 4);
        assert_eq!(path_of(&store, "a").await.as_deref(), Some(""));
        assert_eq!(path_of(&store, "b").await.as_deref(), Some("Apparel"));
        assert_eq!(path_of(&store, "c").await.as_deref(), Some("Apparel/Shoes"));
        assert_eq!(
            path_of(&store, "d").await.as_deref(),
            Some("Apparel/Shoes/Boots")
        );
    }

    #[tokio::test]
    async fn test_update_paths_is_idempotent() {
        let store = chain();
        let maintainer = PathMaintainer::new(&store);
        maintainer.update_paths("a").await;

        let second = maintainer.update_paths("a").await;
        assert_eq!(second, PathMaintenanceReport::default());
    }

    #[tokio::test]
    async fn test_update_paths_starts_from_parent_path() {
        let store = chain();
        let maintainer = PathMaintainer::new(&store);
        maintainer.update_paths("a").await;

        store
            .update_name_description("b", "Footwear", None)
            .await
            .unwrap();
        maintainer.update_paths("b").await;

        assert_eq!(path_of(&store, "b").await.as_deref(), Some("Apparel"));
        assert_eq!(
            path_of(&store, "d").await.as_deref(),
            Some("Apparel/Footwear/Boots")
        );
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_raised() {
        let store = chain();
        store.fail_next(StoreOp::UpdatePath).await;

        let report = PathMaintainer::new(&store).update_paths("a").await;
        assert_eq!(report.failures, 1);
        assert_eq!(report.updated, 3);
    }

    #[tokio::test]
    async fn test_missing_node_reports_failure() {
        let store = chain();
        let report = PathMaintainer::new(&store).update_paths("nope").await;
        assert_eq!(report.failures, 1);
    }
}
