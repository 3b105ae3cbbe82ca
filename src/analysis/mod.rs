//! The analysis engine: incremental symbol resolution, reference search,
//! rename transactions, and workspace symbol search.
//!
//! [`Engine`] is the explicit context object the request layer threads
//! through every query; it owns the two long-lived shared resources, the
//! open-document store and the workspace symbol index.

pub mod error;
pub mod position;
pub mod references;
pub mod rename;
pub mod resolver;
pub mod scope;
pub mod text_scan;
pub mod workspace_index;

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tower_lsp::lsp_types::{
    Location, Position as LspPosition, Range, SymbolInformation, TextDocumentContentChangeEvent,
    Url,
};
use tracing::debug;

pub use error::AnalysisError;

use references::DeclarationSite;
use rename::RenameTransaction;
use resolver::Resolution;
use scope::ScopeTree;
use workspace_index::{IndexEntry, WorkspaceIndex};

use crate::syntax::parse;
use crate::workspace::documents::{DocumentError, DocumentSnapshot, DocumentStore};

/// Result limit used by workspace-symbol callers.
pub const WORKSPACE_SYMBOL_LIMIT: usize = 500;

#[derive(Default)]
pub struct Engine {
    pub documents: DocumentStore,
    pub index: WorkspaceIndex,
    folders: RwLock<Vec<PathBuf>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_workspace_folders(&self, folders: Vec<PathBuf>) {
        *self.folders.write() = folders;
    }

    pub fn workspace_folders(&self) -> Vec<PathBuf> {
        self.folders.read().clone()
    }

    // ── Document lifecycle ──────────────────────────────────────────

    pub fn open_document(&self, uri: Url, text: &str, version: i32) {
        let snapshot = self.documents.open(uri, text, version);
        self.index_snapshot(&snapshot);
    }

    pub fn change_document(
        &self,
        uri: &Url,
        changes: &[TextDocumentContentChangeEvent],
        version: i32,
    ) -> Result<(), DocumentError> {
        let snapshot = self.documents.apply_changes(uri, changes, version)?;
        self.index_snapshot(&snapshot);
        Ok(())
    }

    pub fn close_document(&self, uri: &Url) {
        self.documents.close(uri);
        self.index.remove_file(uri);
    }

    /// Re-index a document snapshot. A failed parse leaves the previous
    /// contribution in place, so the index always reflects the most recent
    /// successful parse.
    pub fn index_snapshot(&self, snapshot: &DocumentSnapshot) {
        if let Some(tree) = &snapshot.scopes {
            self.index
                .index_file(&snapshot.uri, tree.indexable_declarations());
        }
    }

    /// Index a file discovered on disk (workspace scan). Returns false if
    /// the file does not parse.
    pub fn index_unopened_file(&self, uri: &Url, text: &str) -> bool {
        match parse(text) {
            Ok(program) => {
                let tree = ScopeTree::build(&program);
                self.index.index_file(uri, tree.indexable_declarations());
                true
            }
            Err(err) => {
                debug!("workspace scan: skipping {uri}: {err}");
                false
            }
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Definition(s) of the symbol at `position`. Empty when the document
    /// is unknown, has no syntax tree, or the position is not on a name;
    /// multiple locations only for legitimate cross-file ambiguity.
    pub fn resolve_definition(&self, uri: &Url, position: LspPosition) -> Vec<Location> {
        let (_, _, resolution) = match self.resolve_at(uri, position) {
            Ok(resolved) => resolved,
            Err(err) => {
                debug!("resolve_definition {uri}: {err}");
                return Vec::new();
            }
        };
        match resolution {
            Resolution::Declaration { decl, .. } | Resolution::Scoped { decl, .. } => {
                vec![position::location(uri, decl.selection_range)]
            }
            Resolution::Index { entries, .. } => {
                let mut locations: Vec<Location> = entries
                    .iter()
                    .map(|entry| position::location(&entry.uri, entry.declaration.selection_range))
                    .collect();
                references::sort_locations(&mut locations);
                locations
            }
        }
    }

    /// Every occurrence of the symbol at `position`, across files for
    /// globals, restricted to the enclosing function for locals.
    pub fn find_references(
        &self,
        uri: &Url,
        position: LspPosition,
        include_declaration: bool,
    ) -> Vec<Location> {
        let (_, tree, resolution) = match self.resolve_at(uri, position) {
            Ok(resolved) => resolved,
            Err(err) => {
                debug!("find_references {uri}: {err}");
                return Vec::new();
            }
        };
        let (locations, declaration) = self.search_reference_locations(uri, &tree, &resolution);
        let mut locations = match &declaration {
            Some(decl) => {
                references::apply_declaration_policy(locations, decl, include_declaration)
            }
            None => locations,
        };
        references::sort_locations(&mut locations);
        locations
    }

    /// Validate renameability and return the exact token range plus the
    /// current name as a placeholder, without running the full search.
    pub fn prepare_rename(
        &self,
        uri: &Url,
        position: LspPosition,
    ) -> Result<(Range, String), AnalysisError> {
        let (_, _, resolution) = self.resolve_at(uri, position)?;
        rename::check_renameable(resolution.name())?;
        require_declarations(&resolution)?;
        Ok((
            position::span_to_range(resolution.at()),
            resolution.name().to_string(),
        ))
    }

    /// Build the complete, version-stamped rename transaction for the
    /// symbol at `position`.
    pub fn rename(
        &self,
        uri: &Url,
        position: LspPosition,
        new_name: &str,
    ) -> Result<RenameTransaction, AnalysisError> {
        let (_, tree, resolution) = self.resolve_at(uri, position)?;
        let name = resolution.name().to_string();
        rename::check_renameable(&name)?;
        if new_name.trim().is_empty() {
            return Err(AnalysisError::InvalidName);
        }
        require_declarations(&resolution)?;

        let (locations, declaration) = self.search_reference_locations(uri, &tree, &resolution);
        let mut locations = match &declaration {
            Some(decl) => references::apply_declaration_policy(locations, decl, true),
            None => locations,
        };
        references::sort_locations(&mut locations);
        if locations.is_empty() {
            return Err(AnalysisError::NoReferences(name));
        }

        Ok(RenameTransaction::from_locations(
            &locations,
            new_name,
            |file| self.documents.get(file).map(|doc| doc.version),
        ))
    }

    /// Workspace symbol search. While the initial background scan has not
    /// populated the index yet, falls back to a best-effort raw text scan
    /// of the workspace folders; once the index has entries it is
    /// authoritative.
    pub fn search_symbols(&self, query: &str, limit: usize) -> Vec<SymbolInformation> {
        let entries = if self.index.is_empty() {
            let folders = self.workspace_folders();
            debug!(
                "index empty; raw text scan over {} workspace folder(s)",
                folders.len()
            );
            text_scan::scan_folders(&folders, query, limit)
        } else {
            self.index.search(query, limit)
        };
        entries.into_iter().map(entry_to_symbol).collect()
    }

    // ── Internals ───────────────────────────────────────────────────

    fn resolve_at(
        &self,
        uri: &Url,
        position: LspPosition,
    ) -> Result<(Arc<DocumentSnapshot>, Arc<ScopeTree>, Resolution), AnalysisError> {
        let doc = self
            .documents
            .get(uri)
            .ok_or_else(|| AnalysisError::DocumentNotFound(uri.clone()))?;
        let tree = doc.scopes.clone().ok_or(AnalysisError::NoAst)?;
        let pos = position::from_protocol(position);
        let resolution =
            resolver::resolve(&tree, pos, &self.index).ok_or(AnalysisError::NotASymbol)?;
        Ok((doc, tree, resolution))
    }

    /// Reference locations (declaration excluded) plus the declaration's
    /// own location, for the inclusion policy to apply.
    fn search_reference_locations(
        &self,
        uri: &Url,
        tree: &ScopeTree,
        resolution: &Resolution,
    ) -> (Vec<Location>, Option<Location>) {
        let (decl_scope, decl) = match resolution {
            Resolution::Declaration { scope, decl, .. } => (*scope, decl),
            Resolution::Scoped {
                decl_scope, decl, ..
            } => (*decl_scope, decl),
            Resolution::Index { name, entries, .. } => {
                let Some(first) = entries.first() else {
                    return (Vec::new(), None);
                };
                let declaration =
                    position::location(&first.uri, first.declaration.selection_range);
                let origin = DeclarationSite {
                    uri: first.uri.clone(),
                    selection: first.declaration.selection_range,
                };
                let locations =
                    references::find_global(&self.documents, &self.index, name, &origin);
                return (locations, Some(declaration));
            }
        };

        let declaration = position::location(uri, decl.selection_range);
        if tree.enclosing_function(decl_scope).is_some() {
            // Local or parameter: restricted to the function subtree so
            // same-named locals in sibling functions never contaminate.
            let locations = references::find_local(tree, decl_scope, &decl.name)
                .into_iter()
                .map(|span| position::location(uri, span))
                .collect();
            (locations, Some(declaration))
        } else {
            let origin = DeclarationSite {
                uri: uri.clone(),
                selection: decl.selection_range,
            };
            let locations =
                references::find_global(&self.documents, &self.index, &decl.name, &origin);
            (locations, Some(declaration))
        }
    }
}

/// A resolution that produced zero declarations counts as "not a symbol"
/// for rename purposes: the cursor is on a name that refers to nothing.
fn require_declarations(resolution: &Resolution) -> Result<(), AnalysisError> {
    match resolution {
        Resolution::Index { entries, .. } if entries.is_empty() => Err(AnalysisError::NotASymbol),
        _ => Ok(()),
    }
}

#[allow(deprecated)] // SymbolInformation retains a deprecated `deprecated` field
fn entry_to_symbol(entry: IndexEntry) -> SymbolInformation {
    SymbolInformation {
        name: entry.name,
        kind: entry.declaration.kind.to_symbol_kind(),
        tags: None,
        deprecated: None,
        location: position::location(&entry.uri, entry.declaration.selection_range),
        container_name: entry.declaration.container_name,
    }
}
