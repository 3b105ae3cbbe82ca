//! Symbol resolution at a cursor position.
//!
//! Resolution order: a position sitting on a declaration name returns that
//! declaration directly (go-to-definition on a declaration is idempotent);
//! otherwise the identifier occurrence at the position is resolved by
//! walking the scope chain outward, nearest declaration first; if the chain
//! is exhausted the workspace index is consulted for cross-file matches,
//! which may legitimately return several declarations for an overloaded
//! name.

use crate::analysis::scope::{Declaration, ScopeId, ScopeTree};
use crate::analysis::workspace_index::{IndexEntry, WorkspaceIndex};
use crate::syntax::{Pos, Span};

#[derive(Debug, Clone)]
pub enum Resolution {
    /// The cursor is on a declaration's own name token.
    Declaration {
        scope: ScopeId,
        decl: Declaration,
        at: Span,
    },
    /// An occurrence resolved to a declaration within this document.
    Scoped {
        decl_scope: ScopeId,
        decl: Declaration,
        at: Span,
    },
    /// Nothing in the document's scope chain matched; these are the
    /// workspace-index candidates (possibly empty).
    Index {
        name: String,
        entries: Vec<IndexEntry>,
        at: Span,
    },
}

impl Resolution {
    pub fn name(&self) -> &str {
        match self {
            Resolution::Declaration { decl, .. } | Resolution::Scoped { decl, .. } => &decl.name,
            Resolution::Index { name, .. } => name,
        }
    }

    /// The exact token span under the cursor.
    pub fn at(&self) -> Span {
        match self {
            Resolution::Declaration { at, .. }
            | Resolution::Scoped { at, .. }
            | Resolution::Index { at, .. } => *at,
        }
    }
}

/// Resolve the symbol at `pos`, or `None` when the position is not on a
/// name at all.
pub fn resolve(tree: &ScopeTree, pos: Pos, index: &WorkspaceIndex) -> Option<Resolution> {
    if let Some((scope, decl)) = tree.declaration_at(pos) {
        return Some(Resolution::Declaration {
            scope,
            decl: decl.clone(),
            at: decl.selection_range,
        });
    }

    let reference = tree.reference_at(pos)?;
    match tree.lookup_from(reference.scope, &reference.name) {
        Some((decl_scope, decl)) => Some(Resolution::Scoped {
            decl_scope,
            decl: decl.clone(),
            at: reference.range,
        }),
        None => Some(Resolution::Index {
            name: reference.name.clone(),
            entries: index.find_by_name(&reference.name),
            at: reference.range,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scope::{DeclKind, ScopeKind};
    use crate::syntax::parse;
    use indoc::indoc;

    fn build(source: &str) -> ScopeTree {
        ScopeTree::build(&parse(source).unwrap())
    }

    #[test]
    fn test_resolve_on_declaration_is_idempotent() {
        let tree = build("var counter: Integer;");
        let index = WorkspaceIndex::new();
        // Position inside the name token "counter" (line 1, columns 5..12).
        let resolution = resolve(&tree, Pos::new(1, 7), &index).unwrap();
        match resolution {
            Resolution::Declaration { decl, at, .. } => {
                assert_eq!(decl.name, "counter");
                assert_eq!(at, decl.selection_range);
            }
            other => panic!("expected declaration resolution, got {other:?}"),
        }
    }

    #[test]
    fn test_shadowing_nearest_wins() {
        let tree = build(indoc! {"
            var x := 1;
            procedure Run;
            begin
              begin
                var x := 2;
                PrintLn(x);
              end;
            end;
        "});
        let index = WorkspaceIndex::new();
        // The x inside PrintLn on line 6.
        let resolution = resolve(&tree, Pos::new(6, 13), &index).unwrap();
        match resolution {
            Resolution::Scoped { decl_scope, decl, .. } => {
                assert_eq!(decl.selection_range.start.line, 5);
                assert_eq!(tree.scope(decl_scope).kind, ScopeKind::Block);
            }
            other => panic!("expected scoped resolution, got {other:?}"),
        }
    }

    #[test]
    fn test_unresolved_falls_back_to_index() {
        let tree = build("begin PrintValue(1); end");
        let index = WorkspaceIndex::new();
        let resolution = resolve(&tree, Pos::new(1, 9), &index).unwrap();
        match resolution {
            Resolution::Index { name, entries, .. } => {
                assert_eq!(name, "PrintValue");
                assert!(entries.is_empty());
            }
            other => panic!("expected index resolution, got {other:?}"),
        }
    }

    #[test]
    fn test_no_symbol_at_position() {
        let tree = build("var x := 1;");
        let index = WorkspaceIndex::new();
        // Position on the ':=' operator.
        assert!(resolve(&tree, Pos::new(1, 20), &index).is_none());
    }

    #[test]
    fn test_parameter_resolution() {
        let tree = build(indoc! {"
            function Twice(value: Integer): Integer;
            begin
              Result := value + value;
            end;
        "});
        let index = WorkspaceIndex::new();
        let resolution = resolve(&tree, Pos::new(3, 15), &index).unwrap();
        match resolution {
            Resolution::Scoped { decl, .. } => {
                assert_eq!(decl.name, "value");
                assert_eq!(decl.kind, DeclKind::Parameter);
            }
            other => panic!("expected scoped resolution, got {other:?}"),
        }
    }
}
