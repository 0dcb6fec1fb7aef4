//! Placement resolution for drag-and-drop moves
//!
//! Turns "drop `moving` Before/After/Inside `reference`" into a target parent
//! and an insertion index within the requester's visible sibling list. All
//! legality checks (ownership, cycles, sibling membership) happen here, before
//! anything is written.

use crate::db::CategoryStore;
use crate::models::{Category, DropPosition, Requester};
use crate::services::CategoryServiceError;
use std::collections::HashSet;

/// Where a moving category will land
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Parent after the move (`None` = root level)
    pub new_parent_id: Option<String>,

    /// Zero-based index within `siblings`
    pub insert_index: usize,

    /// Visible siblings under the new parent, ascending, moving node excluded
    pub siblings: Vec<Category>,
}

impl Placement {
    pub fn sibling_keys(&self) -> Vec<f64> {
        self.siblings.iter().map(|c| c.order_key).collect()
    }
}

/// Index at which a node lands in `siblings` for the given drop.
///
/// `siblings` must already be the merged, ascending sibling list under the
/// resolved parent with the moving node removed. `Inside` drops and drops
/// without a reference append.
pub fn insert_index_for(
    siblings: &[Category],
    reference_id: Option<&str>,
    position: DropPosition,
) -> Result<usize, CategoryServiceError> {
    let reference_id = match (reference_id, position) {
        (None, _) | (_, DropPosition::Inside) => return Ok(siblings.len()),
        (Some(id), _) => id,
    };

    let index = siblings
        .iter()
        .position(|c| c.id == reference_id)
        .ok_or_else(|| {
            CategoryServiceError::invalid_move(format!(
                "reference {} is not among the visible siblings",
                reference_id
            ))
        })?;

    Ok(match position {
        DropPosition::Before => index,
        _ => index + 1,
    })
}

/// Validates moves and computes their sibling context
pub struct PlacementResolver<'a> {
    store: &'a dyn CategoryStore,
}

impl<'a> PlacementResolver<'a> {
    pub fn new(store: &'a dyn CategoryStore) -> Self {
        Self { store }
    }

    /// Resolve the target parent and insertion index for a move.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the requester is anonymous or does not privately own
    ///   the moving category (shared categories are never movable)
    /// - `NotFound` if the moving or reference category is missing, or the
    ///   reference is not visible to the requester
    /// - `InvalidMove` if the new parent is the moving category or one of its
    ///   descendants, or the reference is not among the expected siblings
    pub async fn resolve(
        &self,
        requester: &Requester,
        moving_id: &str,
        reference_id: Option<&str>,
        position: DropPosition,
    ) -> Result<Placement, CategoryServiceError> {
        let owner_id = requester.owner_id().ok_or_else(|| {
            CategoryServiceError::forbidden(moving_id, "anonymous requesters cannot move categories")
        })?;

        let moving = self
            .store
            .find_by_id(moving_id)
            .await?
            .ok_or_else(|| CategoryServiceError::not_found(moving_id))?;

        if moving.is_shared() {
            return Err(CategoryServiceError::forbidden(
                moving_id,
                "shared categories cannot be moved",
            ));
        }
        if !moving.is_owned_by(owner_id) {
            return Err(CategoryServiceError::forbidden(
                moving_id,
                "category belongs to another user",
            ));
        }

        let visibility = requester.visibility();

        let new_parent_id = match reference_id {
            None => None,
            Some(reference_id) => {
                if reference_id == moving_id {
                    return Err(CategoryServiceError::invalid_move(format!(
                        "cannot drop {} onto itself",
                        moving_id
                    )));
                }

                let reference = self
                    .store
                    .find_by_id(reference_id)
                    .await?
                    .filter(|c| visibility.matches(c))
                    .ok_or_else(|| CategoryServiceError::not_found(reference_id))?;

                match position {
                    DropPosition::Inside => Some(reference.id),
                    DropPosition::Before | DropPosition::After => reference.parent_id,
                }
            }
        };

        if let Some(parent_id) = new_parent_id.as_deref() {
            if self.is_descendant(moving_id, parent_id).await? {
                return Err(CategoryServiceError::invalid_move(format!(
                    "cannot move {} under itself or its descendant {}",
                    moving_id, parent_id
                )));
            }
        }

        let siblings: Vec<Category> = self
            .store
            .list_siblings(new_parent_id.as_deref(), &visibility)
            .await?
            .into_iter()
            .filter(|c| c.id != moving_id)
            .collect();

        let insert_index = insert_index_for(&siblings, reference_id, position)?;

        tracing::debug!(
            "Resolved move of {} {:?} {:?}: parent {:?}, index {} of {}",
            moving_id,
            position,
            reference_id,
            new_parent_id,
            insert_index,
            siblings.len()
        );

        Ok(Placement {
            new_parent_id,
            insert_index,
            siblings,
        })
    }

    /// True when `candidate_id` is `ancestor_id` itself or lies below it.
    ///
    /// Walks up from the candidate with no depth limit; a chain that loops is
    /// reported as an invalid move.
    pub async fn is_descendant(
        &self,
        ancestor_id: &str,
        candidate_id: &str,
    ) -> Result<bool, CategoryServiceError> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = Some(candidate_id.to_string());

        while let Some(id) = current {
            if id == ancestor_id {
                return Ok(true);
            }
            if !visited.insert(id.clone()) {
                return Err(CategoryServiceError::invalid_move(format!(
                    "ancestry of {} contains a cycle at {}",
                    candidate_id, id
                )));
            }

            current = match self.store.find_by_id(&id).await? {
                Some(node) => node.parent_id,
                None if id == candidate_id => {
                    return Err(CategoryServiceError::not_found(candidate_id))
                }
                None => None,
            };
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryCategoryStore;

    fn category(id: &str, owner: Option<&str>, parent: Option<&str>, key: f64) -> Category {
        let mut c = Category::new(
            owner.map(str::to_string),
            id.to_string(),
            None,
            parent.map(str::to_string),
            key,
        );
        c.id = id.to_string();
        c
    }

    fn siblings() -> Vec<Category> {
        vec![
            category("a", None, None, 1.0),
            category("b", None, None, 2.0),
            category("c", None, None, 3.0),
        ]
    }

    #[test]
    fn test_insert_index_before_and_after() {
        let s = siblings();
        assert_eq!(insert_index_for(&s, Some("b"), DropPosition::Before).unwrap(), 1);
        assert_eq!(insert_index_for(&s, Some("b"), DropPosition::After).unwrap(), 2);
        assert_eq!(insert_index_for(&s, Some("a"), DropPosition::Before).unwrap(), 0);
        assert_eq!(insert_index_for(&s, Some("c"), DropPosition::After).unwrap(), 3);
    }

    #[test]
    fn test_insert_index_appends_inside_or_without_reference() {
        let s = siblings();
        assert_eq!(insert_index_for(&s, Some("b"), DropPosition::Inside).unwrap(), 3);
        assert_eq!(insert_index_for(&s, None, DropPosition::Before).unwrap(), 3);
        assert_eq!(insert_index_for(&[], None, DropPosition::After).unwrap(), 0);
    }

    #[test]
    fn test_insert_index_missing_reference() {
        let err = insert_index_for(&siblings(), Some("zzz"), DropPosition::Before).unwrap_err();
        assert!(matches!(err, CategoryServiceError::InvalidMove(_)));
    }

    #[tokio::test]
    async fn test_resolve_merges_shared_siblings() {
        let store = InMemoryCategoryStore::with_categories(vec![
            category("mine", Some("alice"), None, 1.0),
            category("shared", None, None, 2.0),
            category("bobs", Some("bob"), None, 3.0),
            category("moving", Some("alice"), None, 4.0),
        ]);
        let resolver = PlacementResolver::new(&store);

        let placement = resolver
            .resolve(
                &Requester::user("alice"),
                "moving",
                Some("shared"),
                DropPosition::After,
            )
            .await
            .unwrap();

        let ids: Vec<&str> = placement.siblings.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["mine", "shared"]);
        assert_eq!(placement.insert_index, 2);
        assert_eq!(placement.new_parent_id, None);
    }

    #[tokio::test]
    async fn test_resolve_rejects_other_users_reference() {
        let store = InMemoryCategoryStore::with_categories(vec![
            category("moving", Some("alice"), None, 1.0),
            category("bobs", Some("bob"), None, 2.0),
        ]);
        let resolver = PlacementResolver::new(&store);

        let err = resolver
            .resolve(
                &Requester::user("alice"),
                "moving",
                Some("bobs"),
                DropPosition::Inside,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_rejects_anonymous() {
        let store = InMemoryCategoryStore::with_categories(vec![category(
            "moving",
            Some("alice"),
            None,
            1.0,
        )]);
        let resolver = PlacementResolver::new(&store);

        let err = resolver
            .resolve(&Requester::Anonymous, "moving", None, DropPosition::After)
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryServiceError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_is_descendant_detects_corrupt_chain() {
        let store = InMemoryCategoryStore::with_categories(vec![
            category("x", Some("alice"), Some("y"), 1.0),
            category("y", Some("alice"), Some("x"), 1.0),
            category("m", Some("alice"), None, 1.0),
        ]);
        let resolver = PlacementResolver::new(&store);

        let err = resolver.is_descendant("m", "x").await.unwrap_err();
        assert!(matches!(err, CategoryServiceError::InvalidMove(_)));
    }

    #[tokio::test]
    async fn test_is_descendant_walks_long_chains() {
        let mut rows = vec![category("n0", Some("alice"), None, 1.0)];
        for i in 1..3_000 {
            let parent = format!("n{}", i - 1);
            rows.push(category(&format!("n{}", i), Some("alice"), Some(&parent), 1.0));
        }
        let store = InMemoryCategoryStore::with_categories(rows);
        let resolver = PlacementResolver::new(&store);

        assert!(resolver.is_descendant("n0", "n2999").await.unwrap());
        assert!(!resolver.is_descendant("n2999", "n0").await.unwrap());
    }
}
