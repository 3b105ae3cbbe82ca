//! Document layer: open-document snapshots and the store that owns them.

pub mod documents;

pub use documents::{DocumentError, DocumentSnapshot, DocumentStore};
