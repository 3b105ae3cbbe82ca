//! Reference search: local (within one function) and cross-document.
//!
//! All result sets leave this module sorted by
//! `(fileURI, start.line, start.character)` so clients observe a
//! deterministic ordering regardless of scan order.

use tower_lsp::lsp_types::{Location, Url};
use tracing::debug;

use crate::analysis::position;
use crate::analysis::scope::{ScopeId, ScopeTree};
use crate::analysis::workspace_index::WorkspaceIndex;
use crate::syntax::Span;
use crate::workspace::documents::DocumentStore;

/// Identifies the declaration a reference search is anchored to.
#[derive(Debug, Clone)]
pub struct DeclarationSite {
    pub uri: Url,
    pub selection: Span,
}

/// Occurrences of `name` within the function subtree containing
/// `decl_scope`, excluding occurrences captured by a nested re-declaration
/// of the same name (those belong to the shadowing declaration).
pub fn find_local(tree: &ScopeTree, decl_scope: ScopeId, name: &str) -> Vec<Span> {
    let root = tree.enclosing_function(decl_scope).unwrap_or(decl_scope);
    let mut spans: Vec<Span> = tree
        .references()
        .iter()
        .filter(|r| r.name == name)
        .filter(|r| tree.is_descendant_or_self(r.scope, root))
        .filter(|r| matches!(tree.lookup_from(r.scope, name), Some((s, _)) if s == decl_scope))
        .map(|r| r.range)
        .collect();
    spans.sort_by_key(|s| s.start);
    spans
}

/// Occurrences of `name` across the workspace: a live scan of every open
/// document merged with index entries for files that are indexed but not
/// open. Occurrences that resolve to a different declaration (a shadowing
/// local, or another file's own global of the same spelling) are excluded.
pub fn find_global(
    documents: &DocumentStore,
    index: &WorkspaceIndex,
    name: &str,
    origin: &DeclarationSite,
) -> Vec<Location> {
    let mut locations = Vec::new();

    for doc in documents.list() {
        let Some(tree) = doc.scopes.as_ref() else {
            continue;
        };
        for reference in tree.references().iter().filter(|r| r.name == name) {
            match tree.lookup_from(reference.scope, name) {
                Some((_, decl)) => {
                    if doc.uri == origin.uri && decl.selection_range == origin.selection {
                        locations.push(position::location(&doc.uri, reference.range));
                    }
                }
                // Unresolved in its own document: a cross-file use.
                None => locations.push(position::location(&doc.uri, reference.range)),
            }
        }
    }

    for entry in index.find_by_name(name) {
        if documents.get(&entry.uri).is_none() {
            locations.push(position::location(
                &entry.uri,
                entry.declaration.selection_range,
            ));
        }
    }

    let before = locations.len();
    sort_locations(&mut locations);
    if locations.len() < before {
        debug!(
            "deduplicated {} reference location(s) for '{}'",
            before - locations.len(),
            name
        );
    }
    locations
}

/// Canonical result ordering plus removal of duplicate locations reported
/// by both the open-document scan and the index.
pub fn sort_locations(locations: &mut Vec<Location>) {
    locations.sort_by(|a, b| {
        (a.uri.as_str(), a.range.start.line, a.range.start.character).cmp(&(
            b.uri.as_str(),
            b.range.start.line,
            b.range.start.character,
        ))
    });
    locations.dedup();
}

/// Shared declaration-inclusion policy: with `include` the declaration is
/// placed first (inserted, or moved to the front if already present);
/// without it the declaration's own range is removed. Callers re-sort the
/// final output regardless.
pub fn apply_declaration_policy(
    mut locations: Vec<Location>,
    declaration: &Location,
    include: bool,
) -> Vec<Location> {
    if include {
        match locations.iter().position(|l| l == declaration) {
            Some(0) => {}
            Some(i) => {
                let decl = locations.remove(i);
                locations.insert(0, decl);
            }
            None => locations.insert(0, declaration.clone()),
        }
    } else {
        locations.retain(|l| l != declaration);
    }
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;
    use indoc::indoc;
    use tower_lsp::lsp_types::{Position as LspPosition, Range};

    fn build(source: &str) -> ScopeTree {
        ScopeTree::build(&parse(source).unwrap())
    }

    fn loc(uri: &str, line: u32, character: u32) -> Location {
        Location {
            uri: Url::parse(uri).unwrap(),
            range: Range {
                start: LspPosition { line, character },
                end: LspPosition {
                    line,
                    character: character + 1,
                },
            },
        }
    }

    #[test]
    fn test_local_isolation_between_sibling_functions() {
        let tree = build(indoc! {"
            procedure A;
            var x: Integer;
            begin
              x := 1;
            end;
            procedure B;
            var x: Integer;
            begin
              x := 2;
            end;
        "});
        // Declaration scope for A's x: resolve the reference on line 4.
        let reference = tree
            .references()
            .iter()
            .find(|r| r.name == "x" && r.range.start.line == 4)
            .unwrap();
        let (decl_scope, _) = tree.lookup_from(reference.scope, "x").unwrap();
        let spans = find_local(&tree, decl_scope, "x");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start.line, 4);
    }

    #[test]
    fn test_local_excludes_shadowed_occurrences() {
        let tree = build(indoc! {"
            procedure Run;
            var x: Integer;
            begin
              x := 1;
              begin
                var x: Integer;
                x := 2;
              end;
              x := 3;
            end;
        "});
        let reference = tree
            .references()
            .iter()
            .find(|r| r.name == "x" && r.range.start.line == 4)
            .unwrap();
        let (outer_scope, _) = tree.lookup_from(reference.scope, "x").unwrap();
        let spans = find_local(&tree, outer_scope, "x");
        let lines: Vec<u32> = spans.iter().map(|s| s.start.line).collect();
        assert_eq!(lines, [4, 9]);
    }

    #[test]
    fn test_sort_locations_deterministic() {
        let mut locations = vec![
            loc("file:///b.dws", 4, 0),
            loc("file:///a.dws", 9, 0),
            loc("file:///a.dws", 1, 0),
        ];
        sort_locations(&mut locations);
        let order: Vec<(String, u32)> = locations
            .iter()
            .map(|l| (l.uri.to_string(), l.range.start.line))
            .collect();
        assert_eq!(
            order,
            [
                ("file:///a.dws".to_string(), 1),
                ("file:///a.dws".to_string(), 9),
                ("file:///b.dws".to_string(), 4),
            ]
        );
    }

    #[test]
    fn test_sort_locations_removes_duplicates() {
        let mut locations = vec![loc("file:///a.dws", 1, 0), loc("file:///a.dws", 1, 0)];
        sort_locations(&mut locations);
        assert_eq!(locations.len(), 1);
    }

    #[test]
    fn test_declaration_policy_insert_and_remove() {
        let decl = loc("file:///a.dws", 0, 0);
        let refs = vec![loc("file:///a.dws", 5, 0), loc("file:///a.dws", 8, 0)];

        let with_decl = apply_declaration_policy(refs.clone(), &decl, true);
        assert_eq!(with_decl.len(), 3);
        assert_eq!(with_decl[0], decl);

        let without = apply_declaration_policy(with_decl, &decl, false);
        assert_eq!(without, refs);
    }

    #[test]
    fn test_declaration_policy_moves_existing_to_front() {
        let decl = loc("file:///a.dws", 7, 0);
        let refs = vec![
            loc("file:///a.dws", 2, 0),
            decl.clone(),
            loc("file:///a.dws", 9, 0),
        ];
        let result = apply_declaration_policy(refs, &decl, true);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], decl);
    }
}
