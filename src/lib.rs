//! Core library for the DWScript language server.
//!
//! The analysis engine ([`analysis::Engine`]) is usable without a client:
//! feed it documents and it answers definition, reference, rename, and
//! workspace-symbol queries. The [`server`] module wraps it in an LSP
//! transport.

pub mod analysis;
pub mod logging;
pub mod server;
pub mod syntax;
pub mod workspace;
