//! Open-document tracking.
//!
//! Each document is held as an immutable snapshot: text, version, and (when
//! the last parse succeeded) its syntax tree and scope tree. An edit builds
//! a complete new snapshot (incremental rope splice, full re-parse, full
//! scope rebuild) and atomically swaps the `Arc`, so a resolver always
//! reads one consistent version and never a partially rebuilt tree.

use std::sync::Arc;

use dashmap::DashMap;
use ropey::Rope;
use thiserror::Error;
use tower_lsp::lsp_types::{Position as LspPosition, TextDocumentContentChangeEvent, Url};
use tracing::debug;

use crate::analysis::scope::ScopeTree;
use crate::syntax::{parse, Program};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document not open: {0}")]
    NotOpen(Url),

    #[error("change version {received} is not newer than {current}")]
    StaleVersion { current: i32, received: i32 },
}

#[derive(Debug)]
pub struct DocumentSnapshot {
    pub uri: Url,
    pub text: Rope,
    pub version: i32,
    /// `None` when the last parse failed; dependent queries then return
    /// empty results instead of operating on a stale tree.
    pub program: Option<Arc<Program>>,
    pub scopes: Option<Arc<ScopeTree>>,
}

impl DocumentSnapshot {
    fn from_rope(uri: Url, text: Rope, version: i32) -> Arc<Self> {
        let source = text.to_string();
        let (program, scopes) = match parse(&source) {
            Ok(program) => {
                let scopes = ScopeTree::build(&program);
                (Some(Arc::new(program)), Some(Arc::new(scopes)))
            }
            Err(err) => {
                debug!("parse failed for {} v{}: {}", uri, version, err);
                (None, None)
            }
        };
        Arc::new(Self {
            uri,
            text,
            version,
            program,
            scopes,
        })
    }
}

/// Convert a protocol position to a char index in the rope, clamping
/// out-of-range lines/columns. Protocol columns are UTF-16 code units.
fn position_to_char(text: &Rope, position: LspPosition) -> usize {
    let line = (position.line as usize).min(text.len_lines().saturating_sub(1));
    let line_slice = text.line(line);
    let max_cu = line_slice.len_utf16_cu();
    let cu = (position.character as usize).min(max_cu);
    text.line_to_char(line) + line_slice.utf16_cu_to_char(cu)
}

#[derive(Default)]
pub struct DocumentStore {
    documents: DashMap<Url, Arc<DocumentSnapshot>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or re-open) a document with its full text.
    pub fn open(&self, uri: Url, text: &str, version: i32) -> Arc<DocumentSnapshot> {
        let snapshot = DocumentSnapshot::from_rope(uri.clone(), Rope::from_str(text), version);
        self.documents.insert(uri, snapshot.clone());
        snapshot
    }

    /// Apply incremental (or full) content changes, producing and storing a
    /// new snapshot. Changes with a version not newer than the current one
    /// are rejected.
    pub fn apply_changes(
        &self,
        uri: &Url,
        changes: &[TextDocumentContentChangeEvent],
        version: i32,
    ) -> Result<Arc<DocumentSnapshot>, DocumentError> {
        let current = self
            .documents
            .get(uri)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DocumentError::NotOpen(uri.clone()))?;
        if version <= current.version {
            return Err(DocumentError::StaleVersion {
                current: current.version,
                received: version,
            });
        }

        let mut text = current.text.clone();
        for change in changes {
            match change.range {
                Some(range) => {
                    let start = position_to_char(&text, range.start);
                    let end = position_to_char(&text, range.end).max(start);
                    text.remove(start..end);
                    text.insert(start, &change.text);
                }
                None => {
                    text = Rope::from_str(&change.text);
                }
            }
        }

        let snapshot = DocumentSnapshot::from_rope(uri.clone(), text, version);
        self.documents.insert(uri.clone(), snapshot.clone());
        Ok(snapshot)
    }

    pub fn close(&self, uri: &Url) -> Option<Arc<DocumentSnapshot>> {
        self.documents.remove(uri).map(|(_, snapshot)| snapshot)
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<DocumentSnapshot>> {
        self.documents.get(uri).map(|entry| entry.value().clone())
    }

    /// Snapshots of every open document.
    pub fn list(&self) -> Vec<Arc<DocumentSnapshot>> {
        self.documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
