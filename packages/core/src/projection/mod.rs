//! Client-side Tree Projection
//!
//! [`TreeSession`] holds a flattened copy of the category tree for one view
//! session. Drags are applied optimistically with dense integer positions and
//! then reconciled with the service, whose tree always wins.

pub mod session;

pub use session::{FlatCategory, TreeSession};
