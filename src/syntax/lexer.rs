//! Lexer for DWScript source text.
//!
//! Keywords are matched case-insensitively (Pascal rules); identifier
//! spellings are preserved. Column tracking is in UTF-16 code units so
//! token spans line up with protocol positions without re-measuring.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use super::ast::{Pos, Span};
use super::parser::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),

    // Keywords
    KwVar,
    KwConst,
    KwType,
    KwFunction,
    KwProcedure,
    KwBegin,
    KwEnd,
    KwIf,
    KwThen,
    KwElse,
    KwWhile,
    KwDo,
    KwRepeat,
    KwUntil,
    KwFor,
    KwTo,
    KwDownto,
    KwClass,
    KwRecord,
    KwProperty,
    KwRead,
    KwWrite,
    KwNot,
    KwAnd,
    KwOr,
    KwXor,
    KwDiv,
    KwMod,
    KwTrue,
    KwFalse,
    KwNil,

    // Punctuation and operators
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Assign, // :=
    Eq,
    NotEq, // <>
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Plus,
    Minus,
    Star,
    Slash,

    Eof,
}

impl TokenKind {
    /// Display name used in parse error messages.
    pub fn describe(&self) -> String {
        use TokenKind::*;
        let fixed = match self {
            Ident(name) => return format!("identifier '{name}'"),
            Int(v) => return format!("integer {v}"),
            Float(v) => return format!("float {v}"),
            Str(_) => return "string literal".to_string(),
            Eof => return "end of input".to_string(),
            KwVar => "var",
            KwConst => "const",
            KwType => "type",
            KwFunction => "function",
            KwProcedure => "procedure",
            KwBegin => "begin",
            KwEnd => "end",
            KwIf => "if",
            KwThen => "then",
            KwElse => "else",
            KwWhile => "while",
            KwDo => "do",
            KwRepeat => "repeat",
            KwUntil => "until",
            KwFor => "for",
            KwTo => "to",
            KwDownto => "downto",
            KwClass => "class",
            KwRecord => "record",
            KwProperty => "property",
            KwRead => "read",
            KwWrite => "write",
            KwNot => "not",
            KwAnd => "and",
            KwOr => "or",
            KwXor => "xor",
            KwDiv => "div",
            KwMod => "mod",
            KwTrue => "true",
            KwFalse => "false",
            KwNil => "nil",
            LParen => "(",
            RParen => ")",
            LBracket => "[",
            RBracket => "]",
            Comma => ",",
            Colon => ":",
            Semicolon => ";",
            Dot => ".",
            Assign => ":=",
            Eq => "=",
            NotEq => "<>",
            Less => "<",
            LessEq => "<=",
            Greater => ">",
            GreaterEq => ">=",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
        };
        format!("'{fixed}'")
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

static KEYWORDS: Lazy<FxHashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    let mut m = FxHashMap::default();
    m.insert("var", KwVar);
    m.insert("const", KwConst);
    m.insert("type", KwType);
    m.insert("function", KwFunction);
    m.insert("procedure", KwProcedure);
    m.insert("begin", KwBegin);
    m.insert("end", KwEnd);
    m.insert("if", KwIf);
    m.insert("then", KwThen);
    m.insert("else", KwElse);
    m.insert("while", KwWhile);
    m.insert("do", KwDo);
    m.insert("repeat", KwRepeat);
    m.insert("until", KwUntil);
    m.insert("for", KwFor);
    m.insert("to", KwTo);
    m.insert("downto", KwDownto);
    m.insert("class", KwClass);
    m.insert("record", KwRecord);
    m.insert("property", KwProperty);
    m.insert("read", KwRead);
    m.insert("write", KwWrite);
    m.insert("not", KwNot);
    m.insert("and", KwAnd);
    m.insert("or", KwOr);
    m.insert("xor", KwXor);
    m.insert("div", KwDiv);
    m.insert("mod", KwMod);
    m.insert("true", KwTrue);
    m.insert("false", KwFalse);
    m.insert("nil", KwNil);
    m
});

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += c.len_utf16() as u32;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Skip whitespace and comments. `//` runs to end of line, `{ … }` is a
    /// block comment, `(* … *)` nests.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.peek() == Some(&'/') {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    } else {
                        return Ok(());
                    }
                }
                Some('{') => {
                    let start = self.pos();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('}') => break,
                            Some(_) => {}
                            None => {
                                return Err(ParseError::new("unterminated comment", start));
                            }
                        }
                    }
                }
                Some('(') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.peek() == Some(&'*') {
                        let start = self.pos();
                        self.bump();
                        self.bump();
                        let mut depth = 1usize;
                        loop {
                            match self.bump() {
                                Some('*') if self.peek() == Some(')') => {
                                    self.bump();
                                    depth -= 1;
                                    if depth == 0 {
                                        break;
                                    }
                                }
                                Some('(') if self.peek() == Some('*') => {
                                    self.bump();
                                    depth += 1;
                                }
                                Some(_) => {}
                                None => {
                                    return Err(ParseError::new("unterminated comment", start));
                                }
                            }
                        }
                    } else {
                        return Ok(());
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let start = self.pos();
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let span = Span::new(start, self.pos());
        let kind = KEYWORDS
            .get(name.to_lowercase().as_str())
            .cloned()
            .unwrap_or(TokenKind::Ident(name));
        Token { kind, span }
    }

    fn lex_number(&mut self) -> Result<Token, ParseError> {
        let start = self.pos();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let mut is_float = false;
        if self.peek() == Some('.') {
            // A lone `.` may be a member access on an integer; only consume
            // when a digit follows.
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push('.');
                self.bump();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }
        let span = Span::new(start, self.pos());
        let kind = if is_float {
            TokenKind::Float(
                text.parse()
                    .map_err(|_| ParseError::new(format!("invalid number '{text}'"), start))?,
            )
        } else {
            TokenKind::Int(
                text.parse()
                    .map_err(|_| ParseError::new(format!("invalid number '{text}'"), start))?,
            )
        };
        Ok(Token { kind, span })
    }

    /// Pascal strings: single quotes, doubled quote escapes (`'it''s'`).
    fn lex_string(&mut self) -> Result<Token, ParseError> {
        let start = self.pos();
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\'') => {
                    if self.peek() == Some('\'') {
                        value.push('\'');
                        self.bump();
                    } else {
                        break;
                    }
                }
                Some('\n') | None => {
                    return Err(ParseError::new("unterminated string literal", start));
                }
                Some(c) => value.push(c),
            }
        }
        Ok(Token {
            kind: TokenKind::Str(value),
            span: Span::new(start, self.pos()),
        })
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;
        let start = self.pos();
        let single = |lexer: &mut Self, kind: TokenKind| {
            lexer.bump();
            Ok(Token {
                kind,
                span: Span::new(start, lexer.pos()),
            })
        };
        match self.peek() {
            None => Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
            }),
            Some(c) if c.is_alphabetic() || c == '_' => Ok(self.lex_ident_or_keyword()),
            Some(c) if c.is_ascii_digit() => self.lex_number(),
            Some('\'') => self.lex_string(),
            Some('(') => single(self, TokenKind::LParen),
            Some(')') => single(self, TokenKind::RParen),
            Some('[') => single(self, TokenKind::LBracket),
            Some(']') => single(self, TokenKind::RBracket),
            Some(',') => single(self, TokenKind::Comma),
            Some(';') => single(self, TokenKind::Semicolon),
            Some('.') => single(self, TokenKind::Dot),
            Some('+') => single(self, TokenKind::Plus),
            Some('-') => single(self, TokenKind::Minus),
            Some('*') => single(self, TokenKind::Star),
            Some('/') => single(self, TokenKind::Slash),
            Some('=') => single(self, TokenKind::Eq),
            Some(':') => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token {
                        kind: TokenKind::Assign,
                        span: Span::new(start, self.pos()),
                    })
                } else {
                    Ok(Token {
                        kind: TokenKind::Colon,
                        span: Span::new(start, self.pos()),
                    })
                }
            }
            Some('<') => {
                self.bump();
                match self.peek() {
                    Some('>') => {
                        self.bump();
                        Ok(Token {
                            kind: TokenKind::NotEq,
                            span: Span::new(start, self.pos()),
                        })
                    }
                    Some('=') => {
                        self.bump();
                        Ok(Token {
                            kind: TokenKind::LessEq,
                            span: Span::new(start, self.pos()),
                        })
                    }
                    _ => Ok(Token {
                        kind: TokenKind::Less,
                        span: Span::new(start, self.pos()),
                    }),
                }
            }
            Some('>') => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Token {
                        kind: TokenKind::GreaterEq,
                        span: Span::new(start, self.pos()),
                    })
                } else {
                    Ok(Token {
                        kind: TokenKind::Greater,
                        span: Span::new(start, self.pos()),
                    })
                }
            }
            Some(c) => Err(ParseError::new(format!("unexpected character '{c}'"), start)),
        }
    }
}

/// Tokenize an entire source string, ending with a single `Eof` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let at_end = token.kind == TokenKind::Eof;
        tokens.push(token);
        if at_end {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            kinds("BEGIN End beGin"),
            vec![
                TokenKind::KwBegin,
                TokenKind::KwEnd,
                TokenKind::KwBegin,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_identifier_case_preserved() {
        let tokens = tokenize("MyVar").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident("MyVar".to_string()));
    }

    #[test]
    fn test_assign_vs_colon() {
        assert_eq!(
            kinds("x := 1; y : Integer"),
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Assign,
                TokenKind::Int(1),
                TokenKind::Semicolon,
                TokenKind::Ident("y".into()),
                TokenKind::Colon,
                TokenKind::Ident("Integer".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("a // line\n{ block } b (* nested (* inner *) *) c"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Ident("b".into()),
                TokenKind::Ident("c".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_string_with_doubled_quote() {
        let tokens = tokenize("'it''s'").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str("it's".to_string()));
    }

    #[test]
    fn test_unterminated_comment_is_error() {
        assert!(tokenize("begin { never closed").is_err());
    }

    #[test]
    fn test_utf16_column_tracking() {
        // '𝕏' is one char but two UTF-16 code units.
        let tokens = tokenize("'𝕏' x").unwrap();
        let x = &tokens[1];
        assert_eq!(x.kind, TokenKind::Ident("x".into()));
        // quote + surrogate pair + quote + space = column 6 (1-based).
        assert_eq!(x.span.start, Pos::new(1, 6));
    }

    #[test]
    fn test_spans_are_one_based() {
        let tokens = tokenize("abc").unwrap();
        assert_eq!(tokens[0].span.start, Pos::new(1, 1));
        assert_eq!(tokens[0].span.end, Pos::new(1, 4));
    }
}
