//! Data Models
//!
//! - `Category` - A node of the user-arranged category tree
//! - `CategoryTree` - Nested view of categories with ordered children
//! - Value types used at the API boundary (`Requester`, `DropPosition`, ...)

mod category;

pub use category::{
    normalize_name, Category, CategoryTree, DeleteResult, DropPosition, NewCategory, Requester,
    ValidationError, VisibilityFilter,
};
