//! Category Data Structures
//!
//! This module defines the `Category` record and the small value types that
//! travel with it through the ordering engine.
//!
//! # Visibility
//!
//! - `owner_id = None`: shared category, visible to everyone, movable by no one
//! - `owner_id = Some(user)`: private category, visible to and mutable by `user` only
//!
//! An authenticated requester works on the merge of both partitions; an
//! anonymous requester only ever sees shared categories.
//!
//! # Examples
//!
//! ```rust
//! use category_tree_core::models::{Category, Requester, VisibilityFilter};
//!
//! let shared = Category::new(None, "Apparel".to_string(), None, None, 10_000.0);
//! let requester = Requester::user("user-1");
//!
//! assert!(shared.is_shared());
//! assert!(requester.visibility().matches(&shared));
//! assert!(VisibilityFilter::SharedOnly.matches(&shared));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for category input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Category name cannot be empty")]
    EmptyName,
}

/// A node of the category tree.
///
/// # Fields
///
/// - `id`: Opaque unique identifier, assigned at creation and never changed
/// - `owner_id`: `None` for shared categories, the owner for private ones
/// - `name`: Non-empty display name
/// - `description`: Optional free text
/// - `parent_id`: `None` for root-level categories
/// - `order_key`: Fractional sort key among the visible siblings
/// - `path`: Denormalized ancestor names joined with `/` (secondary index)
/// - `metadata`: Opaque JSON carried for callers, never interpreted here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,

    #[serde(default)]
    pub owner_id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub parent_id: Option<String>,

    pub order_key: f64,

    /// Not authoritative; always re-derivable from the parent chain
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a category with a fresh UUID and no path yet
    pub fn new(
        owner_id: Option<String>,
        name: String,
        description: Option<String>,
        parent_id: Option<String>,
        order_key: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            name,
            description,
            parent_id,
            order_key,
            path: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Shared categories have no owner
    pub fn is_shared(&self) -> bool {
        self.owner_id.is_none()
    }

    /// True when `owner_id` is the category's private owner
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id.as_deref() == Some(owner_id)
    }
}

/// Insert payload for a new category (the store assigns id and timestamps)
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub owner_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub order_key: f64,
}

impl NewCategory {
    /// Validate and normalize the name
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.name = normalize_name(&self.name)?;
        Ok(self)
    }
}

/// Trim a display name, rejecting empty or whitespace-only input
pub fn normalize_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Identity on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ownerId", rename_all = "lowercase")]
pub enum Requester {
    /// No session: read-only access to shared categories
    Anonymous,
    /// Authenticated user
    User(String),
}

impl Requester {
    pub fn user(owner_id: impl Into<String>) -> Self {
        Self::User(owner_id.into())
    }

    pub fn owner_id(&self) -> Option<&str> {
        match self {
            Requester::Anonymous => None,
            Requester::User(id) => Some(id.as_str()),
        }
    }

    /// Rows this requester is allowed to see
    pub fn visibility(&self) -> VisibilityFilter {
        match self {
            Requester::Anonymous => VisibilityFilter::SharedOnly,
            Requester::User(id) => VisibilityFilter::OwnerAndShared(id.clone()),
        }
    }
}

/// Row filter applied by the store's range reads
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VisibilityFilter {
    /// `owner_id IS NULL`
    SharedOnly,
    /// `owner_id = ? OR owner_id IS NULL`
    OwnerAndShared(String),
    /// Unfiltered; maintenance scans only (path fix-up, descendant counts)
    All,
}

impl VisibilityFilter {
    pub fn matches(&self, category: &Category) -> bool {
        match self {
            VisibilityFilter::SharedOnly => category.owner_id.is_none(),
            VisibilityFilter::OwnerAndShared(owner) => match &category.owner_id {
                None => true,
                Some(id) => id == owner,
            },
            VisibilityFilter::All => true,
        }
    }
}

/// Where a dragged category lands relative to the reference category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    Before,
    After,
    Inside,
}

/// A category together with its ordered children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTree {
    #[serde(flatten)]
    pub category: Category,

    #[serde(default)]
    pub children: Vec<CategoryTree>,
}

impl CategoryTree {
    pub fn leaf(category: Category) -> Self {
        Self {
            category,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.category.id
    }

    /// Number of nodes below this one (excluding itself)
    pub fn descendant_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&CategoryTree> = vec![self];
        while let Some(node) = stack.pop() {
            count += node.children.len();
            stack.extend(node.children.iter());
        }
        count
    }

    /// Number of levels in this subtree, counting this node
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&CategoryTree, usize)> = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.children.iter().map(|child| (child, level + 1)));
        }
        deepest
    }
}

/// Children are detached onto a heap stack so dropping a deep chain does not
/// recurse once per level.
impl Drop for CategoryTree {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// Outcome of a cascade delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    /// Whether the root existed when the delete ran
    pub existed: bool,
    /// Number of rows removed, root included
    pub deleted_count: usize,
}
