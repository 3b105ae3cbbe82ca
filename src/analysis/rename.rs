//! Rename validation and transaction assembly.
//!
//! A rename is refused for reserved words and built-in names (two static,
//! immutable sets, matched case-insensitively per Pascal rules) and for an
//! empty replacement. A validated rename groups the full reference set by
//! file into non-overlapping text edits, each file group stamped with that
//! file's current document version (absent when the file is not open,
//! since versioned edits only apply to tracked documents).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use tower_lsp::lsp_types::{
    DocumentChanges, Location, OneOf, OptionalVersionedTextDocumentIdentifier, TextDocumentEdit,
    TextEdit, Url, WorkspaceEdit,
};

use crate::analysis::error::AnalysisError;

/// Language keywords; renaming to or from these is never valid.
static RESERVED_WORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "and", "array", "begin", "case", "class", "const", "div", "do", "downto", "else", "end",
        "except", "finally", "for", "function", "if", "implementation", "inherited", "interface",
        "mod", "nil", "not", "of", "or", "procedure", "property", "raise", "read", "record",
        "repeat", "set", "then", "to", "try", "type", "unit", "until", "uses", "var", "while",
        "write", "xor",
    ]
    .into_iter()
    .collect()
});

/// Built-in types and magic functions, stored lowercase.
static BUILTIN_NAMES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "integer", "float", "string", "boolean", "variant", "print", "println", "length", "high",
        "low", "inc", "dec", "ord", "chr", "abs", "sqrt", "round", "trunc", "copy", "pos",
        "assert", "inttostr", "strtoint", "floattostr", "strtofloat",
    ]
    .into_iter()
    .collect()
});

/// Reject renaming of reserved words and built-in names.
pub fn check_renameable(name: &str) -> Result<(), AnalysisError> {
    let lower = name.to_lowercase();
    if RESERVED_WORDS.contains(lower.as_str()) || BUILTIN_NAMES.contains(lower.as_str()) {
        return Err(AnalysisError::ReservedName(name.to_string()));
    }
    Ok(())
}

/// The complete, version-stamped edit set for one rename. Constructed
/// fresh per request, never persisted.
#[derive(Debug, Clone)]
pub struct RenameTransaction {
    pub edits: HashMap<Url, Vec<TextEdit>>,
    pub document_versions: HashMap<Url, Option<i32>>,
}

impl RenameTransaction {
    /// Group sorted reference locations by file into one edit per
    /// occurrence. `version_of` reports the current version of open
    /// documents.
    pub fn from_locations(
        locations: &[Location],
        new_name: &str,
        version_of: impl Fn(&Url) -> Option<i32>,
    ) -> Self {
        let mut edits: HashMap<Url, Vec<TextEdit>> = HashMap::new();
        let mut document_versions = HashMap::new();
        for location in locations {
            edits
                .entry(location.uri.clone())
                .or_default()
                .push(TextEdit {
                    range: location.range,
                    new_text: new_name.to_string(),
                });
            document_versions
                .entry(location.uri.clone())
                .or_insert_with(|| version_of(&location.uri));
        }
        for file_edits in edits.values_mut() {
            file_edits.sort_by_key(|edit| (edit.range.start.line, edit.range.start.character));
        }
        Self {
            edits,
            document_versions,
        }
    }

    /// Convert into an LSP workspace edit with versioned per-file groups,
    /// files ordered by URI.
    pub fn into_workspace_edit(self) -> WorkspaceEdit {
        let mut uris: Vec<Url> = self.edits.keys().cloned().collect();
        uris.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        let mut document_edits = Vec::with_capacity(uris.len());
        let mut edits = self.edits;
        for uri in uris {
            let file_edits = edits.remove(&uri).unwrap_or_default();
            let version = self.document_versions.get(&uri).copied().flatten();
            document_edits.push(TextDocumentEdit {
                text_document: OptionalVersionedTextDocumentIdentifier { uri, version },
                edits: file_edits.into_iter().map(OneOf::Left).collect(),
            });
        }

        WorkspaceEdit {
            changes: None,
            document_changes: Some(DocumentChanges::Edits(document_edits)),
            change_annotations: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::{Position as LspPosition, Range};

    fn loc(uri: &str, line: u32) -> Location {
        Location {
            uri: Url::parse(uri).unwrap(),
            range: Range {
                start: LspPosition { line, character: 0 },
                end: LspPosition { line, character: 5 },
            },
        }
    }

    #[test]
    fn test_reserved_words_rejected() {
        assert_eq!(
            check_renameable("begin"),
            Err(AnalysisError::ReservedName("begin".to_string()))
        );
        assert!(matches!(
            check_renameable("Integer"),
            Err(AnalysisError::ReservedName(_))
        ));
        assert!(matches!(
            check_renameable("PrintLn"),
            Err(AnalysisError::ReservedName(_))
        ));
    }

    #[test]
    fn test_ordinary_name_allowed() {
        assert!(check_renameable("myVariable").is_ok());
    }

    #[test]
    fn test_reserved_check_is_case_insensitive() {
        assert!(check_renameable("BEGIN").is_err());
        assert!(check_renameable("printLN").is_err());
    }

    #[test]
    fn test_transaction_groups_by_file_and_stamps_versions() {
        let locations = vec![
            loc("file:///a.dws", 1),
            loc("file:///a.dws", 5),
            loc("file:///b.dws", 2),
        ];
        let tx = RenameTransaction::from_locations(&locations, "renamed", |uri| {
            if uri.as_str().ends_with("a.dws") {
                Some(7)
            } else {
                None
            }
        });

        assert_eq!(tx.edits.len(), 2);
        let a = Url::parse("file:///a.dws").unwrap();
        let b = Url::parse("file:///b.dws").unwrap();
        assert_eq!(tx.edits[&a].len(), 2);
        assert_eq!(tx.document_versions[&a], Some(7));
        assert_eq!(tx.document_versions[&b], None);
        assert!(tx.edits[&a].iter().all(|e| e.new_text == "renamed"));
    }

    #[test]
    fn test_workspace_edit_ordered_by_uri() {
        let locations = vec![loc("file:///b.dws", 0), loc("file:///a.dws", 0)];
        let tx = RenameTransaction::from_locations(&locations, "n", |_| None);
        let edit = tx.into_workspace_edit();
        match edit.document_changes {
            Some(DocumentChanges::Edits(groups)) => {
                assert_eq!(groups.len(), 2);
                assert!(groups[0].text_document.uri.as_str().ends_with("a.dws"));
                assert!(groups[1].text_document.uri.as_str().ends_with("b.dws"));
            }
            other => panic!("expected document edits, got {other:?}"),
        }
    }
}
