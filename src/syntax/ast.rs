//! Syntax tree for the DWScript language.
//!
//! Nodes form a closed set of variants so that every consumer (scope
//! building, resolution) matches exhaustively; adding a new declaration
//! kind is a compile-time-checked change. All positions are 1-based with
//! columns counted in UTF-16 code units.

/// A 1-based source position. Columns are UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A contiguous source region within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    /// Whether `pos` falls within this span, inclusive on both ends so a
    /// cursor sitting just past the last character of a token still hits.
    pub fn contains(&self, pos: Pos) -> bool {
        pos >= self.start && pos <= self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// An identifier occurrence with its source span. Case is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// A parsed compilation unit.
#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Procedure,
    Method,
}

/// One parameter of a function, procedure, or method.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Ident,
    pub type_name: Option<Ident>,
    pub span: Span,
}

/// A function, procedure, or method declaration, including nested
/// declarations and the `begin..end` body.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub kind: FunctionKind,
    pub name: Ident,
    pub params: Vec<Param>,
    pub result_type: Option<Ident>,
    /// Leading `var`/`const`/nested routine declarations followed by the
    /// body block. Empty for bodiless method signatures.
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A member of a `class` or `record` body.
#[derive(Debug, Clone)]
pub enum ClassMember {
    Field {
        names: Vec<Ident>,
        type_name: Option<Ident>,
        span: Span,
    },
    Method(FunctionDecl),
    Property {
        name: Ident,
        type_name: Option<Ident>,
        read: Option<Ident>,
        write: Option<Ident>,
        span: Span,
    },
}

/// The right-hand side of a `type` declaration.
#[derive(Debug, Clone)]
pub enum TypeDeclKind {
    Class {
        parent: Option<Ident>,
        members: Vec<ClassMember>,
    },
    Record {
        members: Vec<ClassMember>,
    },
    Enum {
        members: Vec<Ident>,
    },
    Alias {
        target: Ident,
    },
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `var a, b: Integer;` or `var x := expr;`
    Var {
        names: Vec<Ident>,
        type_name: Option<Ident>,
        init: Option<Expr>,
        span: Span,
    },
    /// `const Name = expr;` or `const Name: T = expr;`
    Const {
        name: Ident,
        type_name: Option<Ident>,
        value: Expr,
        span: Span,
    },
    /// `type Name = class … end;`, `= record … end`, `= (A, B)`, `= Other;`
    Type {
        name: Ident,
        kind: TypeDeclKind,
        span: Span,
    },
    Function(FunctionDecl),
    /// `begin … end`
    Block {
        body: Vec<Stmt>,
        span: Span,
    },
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    Repeat {
        body: Vec<Stmt>,
        cond: Expr,
        span: Span,
    },
    /// `for i := a to b do …` or `for var i := a to b do …`
    For {
        var: Ident,
        /// True for `for var i := …`, which declares the loop variable.
        declares: bool,
        from: Expr,
        to: Expr,
        downto: bool,
        body: Box<Stmt>,
        span: Span,
    },
    Assign {
        target: Expr,
        value: Expr,
        span: Span,
    },
    Expr {
        expr: Expr,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Var { span, .. }
            | Stmt::Const { span, .. }
            | Stmt::Type { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Repeat { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::Expr { span, .. } => *span,
            Stmt::Function(decl) => decl.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Ident(Ident),
    IntLit {
        value: i64,
        span: Span,
    },
    FloatLit {
        value: f64,
        span: Span,
    },
    StringLit {
        value: String,
        span: Span,
    },
    BoolLit {
        value: bool,
        span: Span,
    },
    Nil {
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    /// `object.member`. The member name is resolved by the type system,
    /// not by lexical lookup, so it is never recorded as a plain reference.
    Member {
        object: Box<Expr>,
        member: Ident,
        span: Span,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(ident) => ident.span,
            Expr::IntLit { span, .. }
            | Expr::FloatLit { span, .. }
            | Expr::StringLit { span, .. }
            | Expr::BoolLit { span, .. }
            | Expr::Nil { span }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Call { span, .. }
            | Expr::Member { span, .. }
            | Expr::Index { span, .. } => *span,
        }
    }
}
