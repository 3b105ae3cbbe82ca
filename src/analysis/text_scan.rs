//! Best-effort raw-text symbol scan.
//!
//! While the background workspace scan has not yet populated the index,
//! symbol search falls back to scanning the workspace folders directly so
//! results are not silently empty during the indexing race. This is a
//! deliberate two-tier policy: once the index has entries it is
//! authoritative and this scan is never consulted.

use std::path::Path;

use tracing::{debug, warn};
use url::Url;
use walkdir::WalkDir;

use crate::analysis::scope::{DeclKind, Declaration};
use crate::analysis::workspace_index::IndexEntry;
use crate::syntax::{Pos, Span};

/// Extensions recognized as DWScript source.
pub const SOURCE_EXTENSIONS: &[&str] = &["dws", "pas"];

pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SOURCE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Scan every source file under the given folders for declaration-looking
/// lines whose name contains `query` (case-insensitive; empty matches all).
pub fn scan_folders(folders: &[std::path::PathBuf], query: &str, limit: usize) -> Vec<IndexEntry> {
    let needle = query.to_lowercase();
    let mut results = Vec::new();

    for folder in folders {
        for entry in WalkDir::new(folder)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if !is_source_file(entry.path()) {
                continue;
            }
            let text = match std::fs::read_to_string(entry.path()) {
                Ok(text) => text,
                Err(err) => {
                    warn!("fallback scan: cannot read {:?}: {}", entry.path(), err);
                    continue;
                }
            };
            let Ok(uri) = Url::from_file_path(entry.path()) else {
                continue;
            };
            scan_text(&uri, &text, &needle, &mut results);
        }
    }

    debug!(
        "fallback text scan matched {} symbol(s) for '{}'",
        results.len(),
        query
    );
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

fn keyword_kind(word: &str) -> Option<DeclKind> {
    match word.to_lowercase().as_str() {
        "function" => Some(DeclKind::Function),
        "procedure" => Some(DeclKind::Function),
        "var" => Some(DeclKind::Variable),
        "const" => Some(DeclKind::Constant),
        "type" => Some(DeclKind::Type),
        _ => None,
    }
}

/// Scan one file's text for `keyword identifier` pairs.
fn scan_text(uri: &Url, text: &str, needle: &str, results: &mut Vec<IndexEntry>) {
    for (line_idx, line) in text.lines().enumerate() {
        let words = split_words(line);
        for pair in words.windows(2) {
            let (keyword, _) = &pair[0];
            let (name, column) = &pair[1];
            let Some(kind) = keyword_kind(keyword) else {
                continue;
            };
            if keyword_kind(name).is_some() {
                continue;
            }
            if !needle.is_empty() && !name.to_lowercase().contains(needle) {
                continue;
            }
            let line_no = line_idx as u32 + 1;
            let span = Span::new(
                Pos::new(line_no, *column),
                Pos::new(line_no, column + name.encode_utf16().count() as u32),
            );
            results.push(IndexEntry {
                name: name.clone(),
                declaration: Declaration {
                    name: name.clone(),
                    kind,
                    range: span,
                    selection_range: span,
                    container_name: None,
                    detail: format!("{} {}", keyword.to_lowercase(), name),
                },
                uri: uri.clone(),
            });
        }
    }
}

/// Identifier-like words in a line with their 1-based UTF-16 start columns.
fn split_words(line: &str) -> Vec<(String, u32)> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut start_column = 0u32;
    let mut column = 1u32;
    for c in line.chars() {
        if c.is_alphanumeric() || c == '_' {
            if current.is_empty() {
                start_column = column;
            }
            current.push(c);
        } else if !current.is_empty() {
            words.push((std::mem::take(&mut current), start_column));
        }
        column += c.len_utf16() as u32;
    }
    if !current.is_empty() {
        words.push((current, start_column));
    }
    words
}
