//! Error taxonomy for analysis queries.
//!
//! Every variant is recoverable-and-reported: a query that cannot be
//! satisfied returns one of these (or an empty result) to the caller,
//! never a panic. Display strings double as the user-visible reason for
//! a failed rename.

use thiserror::Error;
use tower_lsp::lsp_types::Url;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("no renameable symbol at the requested position")]
    NotASymbol,

    #[error("document not found: {0}")]
    DocumentNotFound(Url),

    #[error("document has no syntax tree; fix parse errors first")]
    NoAst,

    #[error("'{0}' is a reserved word or built-in name and cannot be renamed")]
    ReservedName(String),

    #[error("the new name must not be empty")]
    InvalidName,

    #[error("no references found for '{0}'")]
    NoReferences(String),
}
