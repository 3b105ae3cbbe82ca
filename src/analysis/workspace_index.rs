//! Workspace-wide symbol index.
//!
//! Maps declaration names to entries across every indexed file. Alongside
//! the name table the index keeps, per file, the exact set of names that
//! file last contributed, so re-indexing removes precisely that set before
//! adding the new one: no leaked entries, no duplicates. Both tables sit
//! behind a single RwLock: readers run concurrently, and a per-file
//! replace is atomic from a reader's point of view (a reader never sees a
//! file's old and new entries half-swapped).

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::analysis::scope::Declaration;

/// One indexed declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub name: String,
    pub declaration: Declaration,
    pub uri: Url,
}

#[derive(Default)]
struct IndexInner {
    by_name: FxHashMap<String, Vec<IndexEntry>>,
    /// Names each file contributed in its most recent successful index.
    file_names: FxHashMap<Url, Vec<String>>,
}

impl IndexInner {
    fn remove_file(&mut self, uri: &Url) {
        let Some(names) = self.file_names.remove(uri) else {
            return;
        };
        for name in names {
            if let Some(entries) = self.by_name.get_mut(&name) {
                entries.retain(|entry| entry.uri != *uri);
                if entries.is_empty() {
                    self.by_name.remove(&name);
                }
            }
        }
    }
}

#[derive(Default)]
pub struct WorkspaceIndex {
    inner: RwLock<IndexInner>,
}

impl WorkspaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace every entry previously contributed by `uri`.
    pub fn index_file(&self, uri: &Url, declarations: Vec<Declaration>) {
        let mut inner = self.inner.write();
        inner.remove_file(uri);

        let mut names = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            let name = declaration.name.clone();
            inner
                .by_name
                .entry(name.clone())
                .or_default()
                .push(IndexEntry {
                    name: name.clone(),
                    declaration,
                    uri: uri.clone(),
                });
            names.push(name);
        }
        names.sort_unstable();
        names.dedup();
        debug!("indexed {}: {} name(s)", uri, names.len());
        if !names.is_empty() {
            inner.file_names.insert(uri.clone(), names);
        }
    }

    /// Remove every entry contributed by `uri` (document close or file
    /// deletion).
    pub fn remove_file(&self, uri: &Url) {
        self.inner.write().remove_file(uri);
    }

    /// Case-insensitive substring search over declaration names. An empty
    /// query matches everything. Results are truncated at `limit`.
    pub fn search(&self, query: &str, limit: usize) -> Vec<IndexEntry> {
        let needle = query.to_lowercase();
        let inner = self.inner.read();
        let mut results: Vec<IndexEntry> = inner
            .by_name
            .iter()
            .filter(|(name, _)| needle.is_empty() || name.to_lowercase().contains(&needle))
            .flat_map(|(_, entries)| entries.iter().cloned())
            .collect();
        results.sort_by(|a, b| {
            (
                a.name.as_str(),
                a.uri.as_str(),
                a.declaration.selection_range.start,
            )
                .cmp(&(
                    b.name.as_str(),
                    b.uri.as_str(),
                    b.declaration.selection_range.start,
                ))
        });
        results.truncate(limit);
        results
    }

    /// Exact, case-sensitive lookup used for cross-file resolution.
    pub fn find_by_name(&self, name: &str) -> Vec<IndexEntry> {
        let inner = self.inner.read();
        let mut entries = inner.by_name.get(name).cloned().unwrap_or_default();
        entries.sort_by(|a, b| {
            (a.uri.as_str(), a.declaration.selection_range.start)
                .cmp(&(b.uri.as_str(), b.declaration.selection_range.start))
        });
        entries
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().by_name.values().map(Vec::len).sum()
    }

    /// True until the first file is indexed; callers fall back to a raw
    /// text scan while this holds during the initial workspace scan.
    pub fn is_empty(&self) -> bool {
        self.inner.read().by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scope::DeclKind;
    use crate::syntax::{Pos, Span};

    fn decl(name: &str, kind: DeclKind, line: u32) -> Declaration {
        let span = Span::new(Pos::new(line, 1), Pos::new(line, 1 + name.len() as u32));
        Declaration {
            name: name.to_string(),
            kind,
            range: span,
            selection_range: span,
            container_name: None,
            detail: name.to_string(),
        }
    }

    fn uri(path: &str) -> Url {
        Url::parse(&format!("file:///{path}")).unwrap()
    }

    #[test]
    fn test_reindex_replaces_previous_contribution() {
        let index = WorkspaceIndex::new();
        let file = uri("f.dws");

        index.index_file(
            &file,
            vec![
                decl("a", DeclKind::Variable, 1),
                decl("b", DeclKind::Variable, 2),
            ],
        );
        index.index_file(
            &file,
            vec![
                decl("b", DeclKind::Variable, 2),
                decl("c", DeclKind::Variable, 3),
            ],
        );

        assert!(index.find_by_name("a").is_empty(), "a must be absent");
        assert_eq!(index.find_by_name("b").len(), 1, "b must not duplicate");
        assert_eq!(index.find_by_name("c").len(), 1);
    }

    #[test]
    fn test_remove_file() {
        let index = WorkspaceIndex::new();
        index.index_file(&uri("f.dws"), vec![decl("x", DeclKind::Variable, 1)]);
        index.index_file(&uri("g.dws"), vec![decl("x", DeclKind::Variable, 1)]);

        index.remove_file(&uri("f.dws"));

        let remaining = index.find_by_name("x");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].uri, uri("g.dws"));
    }

    #[test]
    fn test_search_substring_case_insensitive() {
        let index = WorkspaceIndex::new();
        index.index_file(
            &uri("f.dws"),
            vec![
                decl("testFunc", DeclKind::Function, 1),
                decl("MyClass", DeclKind::Class, 2),
                decl("globalVar", DeclKind::Variable, 3),
            ],
        );

        let hits = index.search("test", 500);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "testFunc");

        let upper = index.search("TEST", 500);
        assert_eq!(upper.len(), 1);
        assert_eq!(upper[0].name, "testFunc");

        let all = index.search("", 500);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_search_limit_does_not_overrun() {
        let index = WorkspaceIndex::new();
        index.index_file(&uri("f.dws"), vec![decl("only", DeclKind::Variable, 1)]);
        // Fewer matches than the limit must not panic or pad.
        assert_eq!(index.search("", 500).len(), 1);
        assert_eq!(index.search("only", 0).len(), 0);
    }

    #[test]
    fn test_find_by_name_is_case_sensitive() {
        let index = WorkspaceIndex::new();
        index.index_file(&uri("f.dws"), vec![decl("Foo", DeclKind::Function, 1)]);
        assert_eq!(index.find_by_name("Foo").len(), 1);
        assert!(index.find_by_name("foo").is_empty());
    }

    #[test]
    fn test_overloads_return_all_entries() {
        let index = WorkspaceIndex::new();
        index.index_file(&uri("a.dws"), vec![decl("Log", DeclKind::Function, 1)]);
        index.index_file(&uri("b.dws"), vec![decl("Log", DeclKind::Function, 4)]);
        assert_eq!(index.find_by_name("Log").len(), 2);
    }
}
