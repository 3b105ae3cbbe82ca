//! Conversions between syntax-tree positions and protocol positions.
//!
//! Syntax positions are 1-based line/column; protocol positions are 0-based
//! line/character. Columns are UTF-16 code units in BOTH domains, the
//! encoding the LSP specification mandates when no `positionEncoding` is
//! negotiated, so conversion is a pure offset shift and non-ASCII source
//! produces protocol-correct ranges.

use tower_lsp::lsp_types::{Location, Position as LspPosition, Range, Url};

use crate::syntax::{Pos, Span};

/// Protocol position → 1-based syntax position.
pub fn from_protocol(position: LspPosition) -> Pos {
    Pos::new(position.line + 1, position.character + 1)
}

/// 1-based syntax position → protocol position.
pub fn to_protocol(pos: Pos) -> LspPosition {
    LspPosition {
        line: pos.line.saturating_sub(1),
        character: pos.column.saturating_sub(1),
    }
}

/// Syntax span → protocol range.
pub fn span_to_range(span: Span) -> Range {
    Range {
        start: to_protocol(span.start),
        end: to_protocol(span.end),
    }
}

/// Syntax span in a file → protocol location.
pub fn location(uri: &Url, span: Span) -> Location {
    Location {
        uri: uri.clone(),
        range: span_to_range(span),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let protocol = LspPosition {
            line: 4,
            character: 11,
        };
        assert_eq!(to_protocol(from_protocol(protocol)), protocol);

        let syntax = Pos::new(1, 1);
        assert_eq!(from_protocol(to_protocol(syntax)), syntax);
    }

    #[test]
    fn test_first_position_maps_to_origin() {
        assert_eq!(
            to_protocol(Pos::new(1, 1)),
            LspPosition {
                line: 0,
                character: 0
            }
        );
    }

    #[test]
    fn test_span_to_range() {
        let span = Span::new(Pos::new(2, 3), Pos::new(2, 8));
        let range = span_to_range(span);
        assert_eq!(range.start.line, 1);
        assert_eq!(range.start.character, 2);
        assert_eq!(range.end.character, 7);
    }
}
