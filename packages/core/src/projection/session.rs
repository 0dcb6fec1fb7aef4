//! Tree session state
//!
//! Caller-owned view state: the flattened tree, expansion, the node being
//! dragged and the selected node. Sessions are created per view and dropped
//! when the view goes away; nothing here is shared between sessions.
//!
//! # Examples
//!
//! ```rust
//! use category_tree_core::models::{Category, CategoryTree, DropPosition};
//! use category_tree_core::projection::TreeSession;
//!
//! let leaf = |id: &str| {
//!     let mut c = Category::new(None, id.to_string(), None, None, 0.0);
//!     c.id = id.to_string();
//!     CategoryTree::leaf(c)
//! };
//!
//! let mut session = TreeSession::new();
//! session.set_items(vec![leaf("a"), leaf("b"), leaf("c")]);
//!
//! assert!(session.move_node("c", Some("a"), DropPosition::Before));
//!
//! let tree = session.get_tree();
//! let order: Vec<&str> = tree.iter().map(|t| t.id()).collect();
//! assert_eq!(order, vec!["c", "a", "b"]);
//! ```

use crate::models::{Category, CategoryTree, DropPosition, Requester};
use crate::services::{CategoryService, CategoryServiceError, MoveOutcome};
use std::collections::{HashMap, HashSet};

/// A category in the flattened projection
#[derive(Debug, Clone, PartialEq)]
pub struct FlatCategory {
    pub category: Category,

    /// Dense position among the siblings, starting at 0
    pub sort_order: usize,

    /// Child ids in `sort_order`
    pub children: Vec<String>,
}

impl FlatCategory {
    pub fn id(&self) -> &str {
        &self.category.id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.category.parent_id.as_deref()
    }
}

/// Flattened tree plus UI state for one view session
#[derive(Debug, Clone, Default)]
pub struct TreeSession {
    items: HashMap<String, FlatCategory>,
    expanded_ids: HashSet<String>,
    active_id: Option<String>,
    selected_id: Option<String>,
}

impl TreeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the projection with `tree`.
    ///
    /// Each node's `sort_order` is its index in its parent's children. UI state
    /// (expansion, active and selected ids) is kept.
    pub fn set_items(&mut self, tree: Vec<CategoryTree>) {
        self.items.clear();

        let mut stack: Vec<(CategoryTree, Option<String>, usize)> = tree
            .into_iter()
            .enumerate()
            .map(|(index, node)| (node, None, index))
            .collect();

        while let Some((mut node, parent_id, sort_order)) = stack.pop() {
            let children = std::mem::take(&mut node.children);
            let mut category = node.category.clone();
            category.parent_id = parent_id;

            let id = category.id.clone();
            let child_ids = children.iter().map(|c| c.category.id.clone()).collect();
            stack.extend(
                children
                    .into_iter()
                    .enumerate()
                    .map(|(index, child)| (child, Some(id.clone()), index)),
            );

            self.items.insert(
                id,
                FlatCategory {
                    category,
                    sort_order,
                    children: child_ids,
                },
            );
        }
    }

    pub fn get(&self, id: &str) -> Option<&FlatCategory> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids under `parent_id` in display order
    fn sibling_ids(&self, parent_id: Option<&str>) -> Vec<String> {
        let mut siblings: Vec<&FlatCategory> = self
            .items
            .values()
            .filter(|item| item.parent_id() == parent_id)
            .collect();
        siblings.sort_by(|a, b| compare_items(a, b));
        siblings.into_iter().map(|item| item.id().to_string()).collect()
    }

    /// Write dense positions for `ordered` and store it as the parent's child list
    fn renumber(&mut self, parent_id: Option<&str>, ordered: &[String]) {
        for (index, id) in ordered.iter().enumerate() {
            if let Some(item) = self.items.get_mut(id) {
                item.sort_order = index;
            }
        }
        if let Some(parent) = parent_id.and_then(|id| self.items.get_mut(id)) {
            parent.children = ordered.to_vec();
        }
    }

    /// Optimistically move `active_id` relative to `over_id`.
    ///
    /// `over_id = None` appends at the root level. Returns `false` and leaves
    /// the projection untouched for unknown ids, or when `over_id` is
    /// `active_id` or one of its descendants.
    pub fn move_node(
        &mut self,
        active_id: &str,
        over_id: Option<&str>,
        position: DropPosition,
    ) -> bool {
        let old_parent = match self.items.get(active_id) {
            Some(active) => active.category.parent_id.clone(),
            None => return false,
        };

        let new_parent = match over_id {
            None => None,
            Some(over_id) => {
                if over_id == active_id
                    || self.descendant_ids(active_id).iter().any(|d| d == over_id)
                {
                    return false;
                }
                let over = match self.items.get(over_id) {
                    Some(over) => over,
                    None => return false,
                };
                match position {
                    DropPosition::Inside => Some(over_id.to_string()),
                    DropPosition::Before | DropPosition::After => {
                        over.category.parent_id.clone()
                    }
                }
            }
        };

        let mut destination: Vec<String> = self
            .sibling_ids(new_parent.as_deref())
            .into_iter()
            .filter(|id| id != active_id)
            .collect();

        let index = match (over_id, position) {
            (None, _) | (_, DropPosition::Inside) => destination.len(),
            (Some(over_id), _) => {
                let over_index = destination
                    .iter()
                    .position(|id| id == over_id)
                    .unwrap_or(destination.len());
                match position {
                    DropPosition::Before => over_index,
                    _ => (over_index + 1).min(destination.len()),
                }
            }
        };
        destination.insert(index, active_id.to_string());

        if let Some(active) = self.items.get_mut(active_id) {
            active.category.parent_id = new_parent.clone();
        }

        if old_parent != new_parent {
            let source = self.sibling_ids(old_parent.as_deref());
            self.renumber(old_parent.as_deref(), &source);
        }
        self.renumber(new_parent.as_deref(), &destination);

        tracing::debug!(
            "Optimistic move of {} to {:?} at {}",
            active_id,
            new_parent,
            index
        );
        true
    }

    /// Nested tree ordered by `sort_order` at every level.
    ///
    /// Built with explicit stacks, so deep chains do not grow the call stack.
    pub fn get_tree(&self) -> Vec<CategoryTree> {
        let mut children: HashMap<Option<&str>, Vec<&FlatCategory>> = HashMap::new();
        for item in self.items.values() {
            children.entry(item.parent_id()).or_default().push(item);
        }
        for list in children.values_mut() {
            list.sort_by(|a, b| compare_items(a, b));
        }

        let roots = children.remove(&None).unwrap_or_default();
        let root_ids: Vec<&str> = roots.iter().map(|item| item.id()).collect();

        // Pre-order: parents are recorded before their children
        let mut preorder: Vec<(&FlatCategory, Vec<&str>)> = Vec::new();
        let mut stack: Vec<&FlatCategory> = roots.into_iter().rev().collect();
        while let Some(item) = stack.pop() {
            let kids = children.remove(&Some(item.id())).unwrap_or_default();
            let kid_ids = kids.iter().map(|kid| kid.id()).collect();
            stack.extend(kids.into_iter().rev());
            preorder.push((item, kid_ids));
        }

        let mut built: HashMap<&str, CategoryTree> = HashMap::new();
        for (item, kid_ids) in preorder.into_iter().rev() {
            let kids = kid_ids.iter().filter_map(|id| built.remove(id)).collect();
            built.insert(
                item.id(),
                CategoryTree {
                    category: item.category.clone(),
                    children: kids,
                },
            );
        }

        root_ids
            .iter()
            .filter_map(|id| built.remove(id))
            .collect()
    }

    /// Every id below `id`, depth-first in display order
    pub fn descendant_ids(&self, id: &str) -> Vec<String> {
        let mut descendants = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut stack: Vec<String> = self.sibling_ids(Some(id)).into_iter().rev().collect();

        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            stack.extend(self.sibling_ids(Some(&current)).into_iter().rev());
            descendants.push(current);
        }
        descendants
    }

    pub fn toggle_expand(&mut self, id: &str) {
        if !self.expanded_ids.remove(id) {
            self.expanded_ids.insert(id.to_string());
        }
    }

    pub fn expand_all(&mut self) {
        self.expanded_ids = self.items.keys().cloned().collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded_ids.clear();
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded_ids.contains(id)
    }

    pub fn set_active_id(&mut self, id: Option<String>) {
        self.active_id = id;
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn set_selected_id(&mut self, id: Option<String>) {
        self.selected_id = id;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// Back to an empty session
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Drop handler: optimistic local move, then the authoritative move, then
    /// a refetch that overwrites local state whether the move succeeded or not.
    ///
    /// Returns the service's result. If the refetch itself fails the optimistic
    /// state stays and a warning is logged.
    pub async fn apply_move(
        &mut self,
        service: &CategoryService,
        requester: &Requester,
        active_id: &str,
        over_id: Option<&str>,
        position: DropPosition,
    ) -> Result<MoveOutcome, CategoryServiceError> {
        self.move_node(active_id, over_id, position);
        self.active_id = None;

        let result = service
            .move_node(requester, active_id, over_id, position)
            .await;
        if let Err(e) = &result {
            tracing::warn!("Move of {} rejected, reverting to server tree: {}", active_id, e);
        }

        match service.get_tree(requester).await {
            Ok(tree) => self.set_items(tree),
            Err(e) => tracing::warn!("Failed to refetch tree after move: {}", e),
        }

        result
    }
}

fn compare_items(a: &FlatCategory, b: &FlatCategory) -> std::cmp::Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.id().cmp(b.id()))
}
