//! Domain Events for category mutations
//!
//! `CategoryService` publishes one event per committed mutation on a tokio
//! broadcast channel. Views holding a `TreeSession` subscribe to learn that
//! their local state is stale and should be re-fetched.

use crate::models::Category;
use serde::{Deserialize, Serialize};

/// Placement of a category after a move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementChange {
    pub id: String,
    pub parent_id: Option<String>,
    pub order_key: f64,
}

/// Domain events emitted by `CategoryService`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CategoryEvent {
    /// A new category was inserted
    Created { category: Category },

    /// A category received a new parent and/or order key
    Moved(PlacementChange),

    /// Name or description changed
    Renamed {
        id: String,
        name: String,
        description: Option<String>,
    },

    /// A subtree was removed
    Deleted { id: String, deleted_count: usize },
}

impl CategoryEvent {
    /// String representation of the event type, for logging
    pub fn event_type(&self) -> &str {
        match self {
            CategoryEvent::Created { .. } => "category:created",
            CategoryEvent::Moved(_) => "category:moved",
            CategoryEvent::Renamed { .. } => "category:renamed",
            CategoryEvent::Deleted { .. } => "category:deleted",
        }
    }

    /// Id of the category the event is about
    pub fn category_id(&self) -> &str {
        match self {
            CategoryEvent::Created { category } => &category.id,
            CategoryEvent::Moved(change) => &change.id,
            CategoryEvent::Renamed { id, .. } => id,
            CategoryEvent::Deleted { id, .. } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The tag is merged into the payload, not nested
    #[test]
    fn test_moved_event_serialization_contract() {
        let event = CategoryEvent::Moved(PlacementChange {
            id: "cat-1".to_string(),
            parent_id: Some("cat-0".to_string()),
            order_key: 5000.0,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "moved");
        assert_eq!(json["id"], "cat-1");
        assert_eq!(json["parentId"], "cat-0");
        assert_eq!(json["orderKey"], 5000.0);
    }

    #[test]
    fn test_event_accessors() {
        let event = CategoryEvent::Deleted {
            id: "cat-9".to_string(),
            deleted_count: 3,
        };
        assert_eq!(event.event_type(), "category:deleted");
        assert_eq!(event.category_id(), "cat-9");
    }
}
