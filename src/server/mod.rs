//! LSP transport layer.

pub mod backend;

pub use backend::Backend;
