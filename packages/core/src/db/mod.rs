//! Persistence Layer
//!
//! - [`CategoryStore`] - narrow capability trait the ordering engine consumes
//! - [`InMemoryCategoryStore`] - thread-safe reference implementation with
//!   transactional cascade delete and failure injection
//! - [`FractionalOrderCalculator`] - pure order-key allocator
//! - [`CategoryEvent`] - domain events published after committed mutations

mod category_store;
mod error;
pub mod events;
pub mod fractional_ordering;
mod memory_store;
pub mod seed;

pub use category_store::CategoryStore;
pub use error::{DatabaseError, StoreOp};
pub use events::{CategoryEvent, PlacementChange};
pub use fractional_ordering::FractionalOrderCalculator;
pub use memory_store::InMemoryCategoryStore;
pub use seed::seed_default_categories;
