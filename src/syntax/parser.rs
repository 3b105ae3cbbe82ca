//! Recursive-descent parser producing a [`Program`].
//!
//! The parser is strict: the first error aborts the parse and the document
//! keeps no syntax tree, so downstream queries degrade to empty results
//! instead of operating on a half-built tree.

use thiserror::Error;

use super::ast::*;
use super::lexer::{tokenize, Token, TokenKind};

#[derive(Debug, Clone, Error, PartialEq)]
#[error("{}:{}: {}", pos.line, pos.column, message)]
pub struct ParseError {
    pub message: String,
    pub pos: Pos,
}

impl ParseError {
    pub fn new(message: impl Into<String>, pos: Pos) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

/// Parse a whole source file.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    idx: usize,
    prev_end: Pos,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            idx: 0,
            prev_end: Pos::new(1, 1),
        }
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.idx].kind
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.idx].span
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.idx].clone();
        if token.kind != TokenKind::Eof {
            self.idx += 1;
        }
        self.prev_end = token.span.end;
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, context: &str) -> Result<Token, ParseError> {
        if self.peek() == kind {
            Ok(self.bump())
        } else {
            Err(ParseError::new(
                format!(
                    "expected {} in {context}, found {}",
                    kind.describe(),
                    self.peek().describe()
                ),
                self.peek_span().start,
            ))
        }
    }

    fn expect_ident(&mut self, context: &str) -> Result<Ident, ParseError> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                let token = self.bump();
                Ok(Ident {
                    name,
                    span: token.span,
                })
            }
            other => Err(ParseError::new(
                format!("expected identifier in {context}, found {}", other.describe()),
                self.peek_span().start,
            )),
        }
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        loop {
            while self.eat(&TokenKind::Semicolon) {}
            if *self.peek() == TokenKind::Eof {
                break;
            }
            statements.push(self.parse_stmt()?);
        }
        Ok(Program { statements })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            TokenKind::KwVar => self.parse_var_stmt(),
            TokenKind::KwConst => self.parse_const_stmt(),
            TokenKind::KwType => self.parse_type_stmt(),
            TokenKind::KwFunction => self.parse_function_stmt(FunctionKind::Function),
            TokenKind::KwProcedure => self.parse_function_stmt(FunctionKind::Procedure),
            TokenKind::KwBegin => self.parse_block(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwRepeat => self.parse_repeat(),
            TokenKind::KwFor => self.parse_for(),
            _ => self.parse_expr_or_assign(),
        }
    }

    fn parse_var_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_span().start;
        self.bump(); // var
        let mut names = vec![self.expect_ident("variable declaration")?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.expect_ident("variable declaration")?);
        }
        let type_name = if self.eat(&TokenKind::Colon) {
            Some(self.expect_ident("variable type")?)
        } else {
            None
        };
        let init = if self.eat(&TokenKind::Assign) || self.eat(&TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Stmt::Var {
            names,
            type_name,
            init,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_const_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_span().start;
        self.bump(); // const
        let name = self.expect_ident("constant declaration")?;
        let type_name = if self.eat(&TokenKind::Colon) {
            Some(self.expect_ident("constant type")?)
        } else {
            None
        };
        if !self.eat(&TokenKind::Eq) && !self.eat(&TokenKind::Assign) {
            return Err(ParseError::new(
                "expected '=' in constant declaration",
                self.peek_span().start,
            ));
        }
        let value = self.parse_expr()?;
        Ok(Stmt::Const {
            name,
            type_name,
            value,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_type_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_span().start;
        self.bump(); // type
        let name = self.expect_ident("type declaration")?;
        self.expect(&TokenKind::Eq, "type declaration")?;
        let kind = match self.peek().clone() {
            TokenKind::KwClass => {
                self.bump();
                let parent = if self.eat(&TokenKind::LParen) {
                    let parent = self.expect_ident("class parent")?;
                    self.expect(&TokenKind::RParen, "class parent")?;
                    Some(parent)
                } else {
                    None
                };
                let members = self.parse_class_members()?;
                TypeDeclKind::Class { parent, members }
            }
            TokenKind::KwRecord => {
                self.bump();
                let members = self.parse_class_members()?;
                TypeDeclKind::Record { members }
            }
            TokenKind::LParen => {
                self.bump();
                let mut members = vec![self.expect_ident("enumeration member")?];
                while self.eat(&TokenKind::Comma) {
                    members.push(self.expect_ident("enumeration member")?);
                }
                self.expect(&TokenKind::RParen, "enumeration")?;
                TypeDeclKind::Enum { members }
            }
            TokenKind::Ident(_) => {
                let target = self.expect_ident("type alias")?;
                TypeDeclKind::Alias { target }
            }
            other => {
                return Err(ParseError::new(
                    format!("expected type definition, found {}", other.describe()),
                    self.peek_span().start,
                ));
            }
        };
        Ok(Stmt::Type {
            name,
            kind,
            span: Span::new(start, self.prev_end),
        })
    }

    /// Members of a `class … end` or `record … end` body.
    fn parse_class_members(&mut self) -> Result<Vec<ClassMember>, ParseError> {
        let mut members = Vec::new();
        loop {
            while self.eat(&TokenKind::Semicolon) {}
            match self.peek().clone() {
                TokenKind::KwEnd => {
                    self.bump();
                    break;
                }
                TokenKind::KwFunction => {
                    members.push(ClassMember::Method(
                        self.parse_function(FunctionKind::Method, true, true)?,
                    ));
                }
                TokenKind::KwProcedure => {
                    members.push(ClassMember::Method(
                        self.parse_function(FunctionKind::Method, false, true)?,
                    ));
                }
                TokenKind::KwProperty => {
                    let start = self.peek_span().start;
                    self.bump();
                    let name = self.expect_ident("property declaration")?;
                    self.expect(&TokenKind::Colon, "property declaration")?;
                    let type_name = Some(self.expect_ident("property type")?);
                    let read = if self.eat(&TokenKind::KwRead) {
                        Some(self.expect_ident("property read accessor")?)
                    } else {
                        None
                    };
                    let write = if self.eat(&TokenKind::KwWrite) {
                        Some(self.expect_ident("property write accessor")?)
                    } else {
                        None
                    };
                    members.push(ClassMember::Property {
                        name,
                        type_name,
                        read,
                        write,
                        span: Span::new(start, self.prev_end),
                    });
                }
                TokenKind::Ident(_) => {
                    let start = self.peek_span().start;
                    let mut names = vec![self.expect_ident("field declaration")?];
                    while self.eat(&TokenKind::Comma) {
                        names.push(self.expect_ident("field declaration")?);
                    }
                    let type_name = if self.eat(&TokenKind::Colon) {
                        Some(self.expect_ident("field type")?)
                    } else {
                        None
                    };
                    members.push(ClassMember::Field {
                        names,
                        type_name,
                        span: Span::new(start, self.prev_end),
                    });
                }
                TokenKind::Eof => {
                    return Err(ParseError::new(
                        "unterminated class body",
                        self.peek_span().start,
                    ));
                }
                other => {
                    return Err(ParseError::new(
                        format!("unexpected {} in class body", other.describe()),
                        self.peek_span().start,
                    ));
                }
            }
        }
        Ok(members)
    }

    fn parse_function_stmt(&mut self, kind: FunctionKind) -> Result<Stmt, ParseError> {
        let has_result = kind == FunctionKind::Function;
        Ok(Stmt::Function(self.parse_function(kind, has_result, false)?))
    }

    /// Parse a routine. `body_optional` allows bodiless method signatures
    /// inside class bodies.
    fn parse_function(
        &mut self,
        kind: FunctionKind,
        has_result: bool,
        body_optional: bool,
    ) -> Result<FunctionDecl, ParseError> {
        let start = self.peek_span().start;
        self.bump(); // function | procedure
        let name = self.expect_ident("routine declaration")?;

        let mut params = Vec::new();
        if self.eat(&TokenKind::LParen) {
            if !self.eat(&TokenKind::RParen) {
                loop {
                    let group_start = self.peek_span().start;
                    let mut group = vec![self.expect_ident("parameter")?];
                    while self.eat(&TokenKind::Comma) {
                        group.push(self.expect_ident("parameter")?);
                    }
                    let type_name = if self.eat(&TokenKind::Colon) {
                        Some(self.expect_ident("parameter type")?)
                    } else {
                        None
                    };
                    let group_span = Span::new(group_start, self.prev_end);
                    for name in group {
                        params.push(Param {
                            name,
                            type_name: type_name.clone(),
                            span: group_span,
                        });
                    }
                    if !self.eat(&TokenKind::Semicolon) {
                        break;
                    }
                }
                self.expect(&TokenKind::RParen, "parameter list")?;
            }
        }

        let result_type = if has_result && self.eat(&TokenKind::Colon) {
            Some(self.expect_ident("result type")?)
        } else {
            None
        };
        self.eat(&TokenKind::Semicolon);

        let mut body = Vec::new();
        let has_body = matches!(
            self.peek(),
            TokenKind::KwBegin | TokenKind::KwVar | TokenKind::KwConst
        ) || (!body_optional
            && matches!(self.peek(), TokenKind::KwFunction | TokenKind::KwProcedure));
        if has_body {
            loop {
                match self.peek() {
                    TokenKind::KwVar => body.push(self.parse_var_stmt()?),
                    TokenKind::KwConst => body.push(self.parse_const_stmt()?),
                    TokenKind::KwFunction if !body_optional => {
                        body.push(self.parse_function_stmt(FunctionKind::Function)?)
                    }
                    TokenKind::KwProcedure if !body_optional => {
                        body.push(self.parse_function_stmt(FunctionKind::Procedure)?)
                    }
                    _ => break,
                }
                while self.eat(&TokenKind::Semicolon) {}
            }
            body.push(self.parse_block()?);
        } else if !body_optional {
            return Err(ParseError::new(
                format!("expected routine body, found {}", self.peek().describe()),
                self.peek_span().start,
            ));
        }

        Ok(FunctionDecl {
            kind,
            name,
            params,
            result_type,
            body,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_span().start;
        self.expect(&TokenKind::KwBegin, "block")?;
        let mut body = Vec::new();
        loop {
            while self.eat(&TokenKind::Semicolon) {}
            if self.eat(&TokenKind::KwEnd) {
                break;
            }
            if *self.peek() == TokenKind::Eof {
                return Err(ParseError::new("unterminated block", self.peek_span().start));
            }
            body.push(self.parse_stmt()?);
        }
        Ok(Stmt::Block {
            body,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_span().start;
        self.bump(); // if
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::KwThen, "if statement")?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.eat(&TokenKind::KwElse) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_span().start;
        self.bump(); // while
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::KwDo, "while statement")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While {
            cond,
            body,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_repeat(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_span().start;
        self.bump(); // repeat
        let mut body = Vec::new();
        loop {
            while self.eat(&TokenKind::Semicolon) {}
            if self.eat(&TokenKind::KwUntil) {
                break;
            }
            if *self.peek() == TokenKind::Eof {
                return Err(ParseError::new(
                    "unterminated repeat statement",
                    self.peek_span().start,
                ));
            }
            body.push(self.parse_stmt()?);
        }
        let cond = self.parse_expr()?;
        Ok(Stmt::Repeat {
            body,
            cond,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_span().start;
        self.bump(); // for
        let declares = self.eat(&TokenKind::KwVar);
        let var = self.expect_ident("for loop variable")?;
        self.expect(&TokenKind::Assign, "for statement")?;
        let from = self.parse_expr()?;
        let downto = if self.eat(&TokenKind::KwTo) {
            false
        } else if self.eat(&TokenKind::KwDownto) {
            true
        } else {
            return Err(ParseError::new(
                "expected 'to' or 'downto' in for statement",
                self.peek_span().start,
            ));
        };
        let to = self.parse_expr()?;
        self.expect(&TokenKind::KwDo, "for statement")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For {
            var,
            declares,
            from,
            to,
            downto,
            body,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_expr_or_assign(&mut self) -> Result<Stmt, ParseError> {
        let start = self.peek_span().start;
        let expr = self.parse_expr()?;
        if self.eat(&TokenKind::Assign) {
            let value = self.parse_expr()?;
            Ok(Stmt::Assign {
                target: expr,
                value,
                span: Span::new(start, self.prev_end),
            })
        } else {
            Ok(Stmt::Expr {
                expr,
                span: Span::new(start, self.prev_end),
            })
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                TokenKind::Eq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEq => BinaryOp::LessEq,
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEq => BinaryOp::GreaterEq,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_additive()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                TokenKind::KwOr => BinaryOp::Or,
                TokenKind::KwXor => BinaryOp::Xor,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_term()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::KwDiv => BinaryOp::IntDiv,
                TokenKind::KwMod => BinaryOp::Mod,
                TokenKind::KwAnd => BinaryOp::And,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_factor()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek_span().start;
        let op = match self.peek() {
            TokenKind::KwNot => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_factor()?;
            let span = Span::new(start, operand.span().end);
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.bump();
                    let member = self.expect_ident("member access")?;
                    let span = expr.span().merge(member.span);
                    expr = Expr::Member {
                        object: Box::new(expr),
                        member,
                        span,
                    };
                }
                TokenKind::LParen => {
                    self.bump();
                    let mut args = Vec::new();
                    if *self.peek() != TokenKind::RParen {
                        args.push(self.parse_expr()?);
                        while self.eat(&TokenKind::Comma) {
                            args.push(self.parse_expr()?);
                        }
                    }
                    let close = self.expect(&TokenKind::RParen, "argument list")?;
                    let span = expr.span().merge(close.span);
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.parse_expr()?;
                    let close = self.expect(&TokenKind::RBracket, "index expression")?;
                    let span = expr.span().merge(close.span);
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().clone() {
            TokenKind::Int(value) => {
                let token = self.bump();
                Ok(Expr::IntLit {
                    value,
                    span: token.span,
                })
            }
            TokenKind::Float(value) => {
                let token = self.bump();
                Ok(Expr::FloatLit {
                    value,
                    span: token.span,
                })
            }
            TokenKind::Str(value) => {
                let token = self.bump();
                Ok(Expr::StringLit {
                    value,
                    span: token.span,
                })
            }
            TokenKind::KwTrue => {
                let token = self.bump();
                Ok(Expr::BoolLit {
                    value: true,
                    span: token.span,
                })
            }
            TokenKind::KwFalse => {
                let token = self.bump();
                Ok(Expr::BoolLit {
                    value: false,
                    span: token.span,
                })
            }
            TokenKind::KwNil => {
                let token = self.bump();
                Ok(Expr::Nil { span: token.span })
            }
            TokenKind::Ident(name) => {
                let token = self.bump();
                Ok(Expr::Ident(Ident {
                    name,
                    span: token.span,
                }))
            }
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "parenthesized expression")?;
                Ok(expr)
            }
            other => Err(ParseError::new(
                format!("expected expression, found {}", other.describe()),
                self.peek_span().start,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_parse_var_declaration() {
        let program = parse("var x: Integer := 5;").unwrap();
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::Var {
                names,
                type_name,
                init,
                ..
            } => {
                assert_eq!(names[0].name, "x");
                assert_eq!(type_name.as_ref().unwrap().name, "Integer");
                assert!(init.is_some());
            }
            other => panic!("expected var declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_function_with_nested_block() {
        let source = indoc! {"
            function Add(a, b: Integer): Integer;
            var sum: Integer;
            begin
              sum := a + b;
              Result := sum;
            end;
        "};
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Stmt::Function(decl) => {
                assert_eq!(decl.name.name, "Add");
                assert_eq!(decl.params.len(), 2);
                assert_eq!(decl.result_type.as_ref().unwrap().name, "Integer");
                // var section + block
                assert_eq!(decl.body.len(), 2);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_class_with_members() {
        let source = indoc! {"
            type TPoint = class
              FX, FY: Integer;
              function Sum: Integer;
              begin
                Result := FX + FY;
              end;
              property X: Integer read FX write FX;
            end;
        "};
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Stmt::Type {
                name,
                kind: TypeDeclKind::Class { members, .. },
                ..
            } => {
                assert_eq!(name.name, "TPoint");
                assert_eq!(members.len(), 3);
            }
            other => panic!("expected class declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_enum() {
        let program = parse("type TColor = (Red, Green, Blue);").unwrap();
        match &program.statements[0] {
            Stmt::Type {
                kind: TypeDeclKind::Enum { members },
                ..
            } => {
                let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
                assert_eq!(names, ["Red", "Green", "Blue"]);
            }
            other => panic!("expected enum declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_for_var_declares_loop_variable() {
        let program = parse("begin for var i := 0 to 9 do PrintLn(i); end").unwrap();
        match &program.statements[0] {
            Stmt::Block { body, .. } => match &body[0] {
                Stmt::For { var, declares, .. } => {
                    assert_eq!(var.name, "i");
                    assert!(*declares);
                }
                other => panic!("expected for, got {other:?}"),
            },
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn test_member_access_and_call() {
        let program = parse("obj.Update(1, x);").unwrap();
        match &program.statements[0] {
            Stmt::Expr { expr, .. } => match expr {
                Expr::Call { callee, args, .. } => {
                    assert_eq!(args.len(), 2);
                    assert!(matches!(callee.as_ref(), Expr::Member { .. }));
                }
                other => panic!("expected call, got {other:?}"),
            },
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_reports_position() {
        let err = parse("var := 5;").unwrap_err();
        assert_eq!(err.pos.line, 1);
        assert!(err.message.contains("identifier"));
    }

    #[test]
    fn test_unterminated_block_is_error() {
        assert!(parse("begin x := 1;").is_err());
    }

    #[test]
    fn test_operator_precedence() {
        let program = parse("x := 1 + 2 * 3;").unwrap();
        match &program.statements[0] {
            Stmt::Assign { value, .. } => match value {
                Expr::Binary { op, rhs, .. } => {
                    assert_eq!(*op, BinaryOp::Add);
                    assert!(matches!(
                        rhs.as_ref(),
                        Expr::Binary {
                            op: BinaryOp::Mul,
                            ..
                        }
                    ));
                }
                other => panic!("expected binary expression, got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        }
    }
}
