//! Scope tree construction.
//!
//! A single depth-first walk over a parsed program produces an arena of
//! scopes (global → function → block) with parent/child links expressed as
//! indices, so the whole tree is torn down in one step when a document is
//! re-parsed. The same walk records every bare identifier occurrence as a
//! [`SymbolReference`] tagged with the innermost scope it appears in.
//!
//! Within one scope a repeated declaration of a name replaces the earlier
//! entry; across nested scopes inner declarations shadow outer ones without
//! deleting them.

use rustc_hash::FxHashMap;
use tower_lsp::lsp_types::SymbolKind;

use crate::syntax::{
    ClassMember, Expr, FunctionDecl, FunctionKind, Ident, Param, Pos, Program, Span, Stmt,
    TypeDeclKind,
};

/// Index of a scope in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Block,
}

/// What kind of thing a declaration introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Variable,
    Parameter,
    Function,
    Method,
    Field,
    Property,
    Constant,
    Class,
    Record,
    Enum,
    EnumMember,
    Type,
}

impl DeclKind {
    pub fn to_symbol_kind(self) -> SymbolKind {
        match self {
            DeclKind::Variable | DeclKind::Parameter => SymbolKind::VARIABLE,
            DeclKind::Function => SymbolKind::FUNCTION,
            DeclKind::Method => SymbolKind::METHOD,
            DeclKind::Field => SymbolKind::FIELD,
            DeclKind::Property => SymbolKind::PROPERTY,
            DeclKind::Constant => SymbolKind::CONSTANT,
            DeclKind::Class | DeclKind::Type => SymbolKind::CLASS,
            DeclKind::Record => SymbolKind::STRUCT,
            DeclKind::Enum => SymbolKind::ENUM,
            DeclKind::EnumMember => SymbolKind::ENUM_MEMBER,
        }
    }
}

/// A named declaration. Immutable once created; the whole set is replaced
/// when its file is re-parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    /// Full extent of the declaring statement.
    pub range: Span,
    /// The name token itself.
    pub selection_range: Span,
    pub container_name: Option<String>,
    pub detail: String,
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub span: Span,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub declarations: FxHashMap<String, Declaration>,
}

/// One identifier occurrence, tagged with the scope it appears in.
#[derive(Debug, Clone)]
pub struct SymbolReference {
    pub name: String,
    pub range: Span,
    pub scope: ScopeId,
}

#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    references: Vec<SymbolReference>,
    /// Block scopes introduced by class/record bodies; their declarations
    /// are exported to the workspace index with a container name.
    type_body_scopes: Vec<ScopeId>,
}

impl ScopeTree {
    /// Build the scope tree and reference list for a parsed program.
    pub fn build(program: &Program) -> Self {
        let mut builder = Builder::new();
        for stmt in &program.statements {
            builder.walk_stmt(stmt);
        }
        builder.finish()
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn references(&self) -> &[SymbolReference] {
        &self.references
    }

    /// The innermost scope whose span covers `pos`.
    pub fn innermost_scope_at(&self, pos: Pos) -> ScopeId {
        let mut current = self.global();
        'descend: loop {
            for &child in &self.scopes[current.0].children {
                if self.scopes[child.0].span.contains(pos) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Walk from `scope` outward through parent links; the nearest scope
    /// declaring `name` wins (shadowing).
    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, &Declaration)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(decl) = self.scopes[id.0].declarations.get(name) {
                return Some((id, decl));
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    /// The declaration whose name token covers `pos`, if any.
    pub fn declaration_at(&self, pos: Pos) -> Option<(ScopeId, &Declaration)> {
        for (idx, scope) in self.scopes.iter().enumerate() {
            for decl in scope.declarations.values() {
                if decl.selection_range.contains(pos) {
                    return Some((ScopeId(idx), decl));
                }
            }
        }
        None
    }

    /// The recorded identifier occurrence covering `pos`, if any.
    pub fn reference_at(&self, pos: Pos) -> Option<&SymbolReference> {
        self.references.iter().find(|r| r.range.contains(pos))
    }

    pub fn is_descendant_or_self(&self, scope: ScopeId, ancestor: ScopeId) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.scopes[id.0].parent;
        }
        false
    }

    /// The nearest enclosing Function scope, starting at `scope` itself.
    /// `None` means the scope chain reaches the global scope without
    /// crossing a function, i.e. the position is in global (or type-body)
    /// territory.
    pub fn enclosing_function(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.scopes[id.0].kind == ScopeKind::Function {
                return Some(id);
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    /// Declarations this document contributes to the workspace index:
    /// globals plus class/record members. Function locals and parameters
    /// are never exported; they are meaningless workspace-wide and would
    /// let a global search pull in unrelated locals.
    pub fn indexable_declarations(&self) -> Vec<Declaration> {
        let mut out: Vec<Declaration> = self.scopes[self.global().0]
            .declarations
            .values()
            .cloned()
            .collect();
        for &id in &self.type_body_scopes {
            out.extend(self.scopes[id.0].declarations.values().cloned());
        }
        out.sort_by(|a, b| {
            (a.selection_range.start, a.name.as_str()).cmp(&(b.selection_range.start, b.name.as_str()))
        });
        out
    }
}

struct Builder {
    scopes: Vec<Scope>,
    references: Vec<SymbolReference>,
    type_body_scopes: Vec<ScopeId>,
    current: ScopeId,
    containers: Vec<String>,
}

impl Builder {
    fn new() -> Self {
        let global = Scope {
            kind: ScopeKind::Global,
            // Sentinel span so every position falls inside the global scope.
            span: Span::new(Pos::new(1, 1), Pos::new(u32::MAX, u32::MAX)),
            parent: None,
            children: Vec::new(),
            declarations: FxHashMap::default(),
        };
        Self {
            scopes: vec![global],
            references: Vec::new(),
            type_body_scopes: Vec::new(),
            current: ScopeId(0),
            containers: Vec::new(),
        }
    }

    fn finish(self) -> ScopeTree {
        ScopeTree {
            scopes: self.scopes,
            references: self.references,
            type_body_scopes: self.type_body_scopes,
        }
    }

    fn push_scope(&mut self, kind: ScopeKind, span: Span) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            span,
            parent: Some(self.current),
            children: Vec::new(),
            declarations: FxHashMap::default(),
        });
        self.scopes[self.current.0].children.push(id);
        self.current = id;
        id
    }

    fn pop_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            self.current = parent;
        }
    }

    fn container(&self) -> Option<String> {
        self.containers.last().cloned()
    }

    fn declare(&mut self, decl: Declaration) {
        self.scopes[self.current.0]
            .declarations
            .insert(decl.name.clone(), decl);
    }

    fn reference(&mut self, ident: &Ident) {
        self.references.push(SymbolReference {
            name: ident.name.clone(),
            range: ident.span,
            scope: self.current,
        });
    }

    fn reference_opt(&mut self, ident: &Option<Ident>) {
        if let Some(ident) = ident {
            self.reference(ident);
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Var {
                names,
                type_name,
                init,
                span,
            } => {
                if let Some(init) = init {
                    self.walk_expr(init);
                }
                self.reference_opt(type_name);
                for name in names {
                    let detail = match type_name {
                        Some(t) => format!("var {}: {}", name.name, t.name),
                        None => format!("var {}", name.name),
                    };
                    self.declare(Declaration {
                        name: name.name.clone(),
                        kind: DeclKind::Variable,
                        range: *span,
                        selection_range: name.span,
                        container_name: self.container(),
                        detail,
                    });
                }
            }
            Stmt::Const {
                name,
                type_name,
                value,
                span,
            } => {
                self.walk_expr(value);
                self.reference_opt(type_name);
                let detail = match type_name {
                    Some(t) => format!("const {}: {}", name.name, t.name),
                    None => format!("const {}", name.name),
                };
                self.declare(Declaration {
                    name: name.name.clone(),
                    kind: DeclKind::Constant,
                    range: *span,
                    selection_range: name.span,
                    container_name: self.container(),
                    detail,
                });
            }
            Stmt::Type { name, kind, span } => self.walk_type_decl(name, kind, *span),
            Stmt::Function(decl) => self.walk_function(decl),
            Stmt::Block { body, span } => {
                self.push_scope(ScopeKind::Block, *span);
                for stmt in body {
                    self.walk_stmt(stmt);
                }
                self.pop_scope();
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.walk_expr(cond);
                self.walk_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.walk_stmt(else_branch);
                }
            }
            Stmt::While { cond, body, .. } => {
                self.walk_expr(cond);
                self.walk_stmt(body);
            }
            Stmt::Repeat { body, cond, span } => {
                self.push_scope(ScopeKind::Block, *span);
                for stmt in body {
                    self.walk_stmt(stmt);
                }
                self.walk_expr(cond);
                self.pop_scope();
            }
            Stmt::For {
                var,
                declares,
                from,
                to,
                body,
                span,
                ..
            } => {
                self.walk_expr(from);
                self.walk_expr(to);
                if *declares {
                    // `for var i := …` scopes the loop variable to the loop.
                    self.push_scope(ScopeKind::Block, *span);
                    self.declare(Declaration {
                        name: var.name.clone(),
                        kind: DeclKind::Variable,
                        range: *span,
                        selection_range: var.span,
                        container_name: self.container(),
                        detail: format!("var {}", var.name),
                    });
                    self.walk_stmt(body);
                    self.pop_scope();
                } else {
                    self.reference(var);
                    self.walk_stmt(body);
                }
            }
            Stmt::Assign { target, value, .. } => {
                self.walk_expr(target);
                self.walk_expr(value);
            }
            Stmt::Expr { expr, .. } => self.walk_expr(expr),
        }
    }

    fn walk_function(&mut self, decl: &FunctionDecl) {
        let keyword = match decl.kind {
            FunctionKind::Function => "function",
            FunctionKind::Procedure => "procedure",
            FunctionKind::Method => "method",
        };
        let params: Vec<String> = decl
            .params
            .iter()
            .map(|p| match &p.type_name {
                Some(t) => format!("{}: {}", p.name.name, t.name),
                None => p.name.name.clone(),
            })
            .collect();
        let mut detail = format!("{} {}({})", keyword, decl.name.name, params.join("; "));
        if let Some(result) = &decl.result_type {
            detail.push_str(": ");
            detail.push_str(&result.name);
        }
        let kind = if decl.kind == FunctionKind::Method {
            DeclKind::Method
        } else {
            DeclKind::Function
        };
        self.declare(Declaration {
            name: decl.name.name.clone(),
            kind,
            range: decl.span,
            selection_range: decl.name.span,
            container_name: self.container(),
            detail,
        });

        self.push_scope(ScopeKind::Function, decl.span);
        self.containers.push(decl.name.name.clone());
        for param in &decl.params {
            self.walk_param(param);
        }
        self.reference_opt(&decl.result_type);
        for stmt in &decl.body {
            self.walk_stmt(stmt);
        }
        self.containers.pop();
        self.pop_scope();
    }

    fn walk_param(&mut self, param: &Param) {
        self.reference_opt(&param.type_name);
        let detail = match &param.type_name {
            Some(t) => format!("{}: {}", param.name.name, t.name),
            None => param.name.name.clone(),
        };
        self.declare(Declaration {
            name: param.name.name.clone(),
            kind: DeclKind::Parameter,
            range: param.span,
            selection_range: param.name.span,
            container_name: self.container(),
            detail,
        });
    }

    fn walk_type_decl(&mut self, name: &Ident, kind: &TypeDeclKind, span: Span) {
        match kind {
            TypeDeclKind::Class { parent, members } => {
                self.reference_opt(parent);
                self.declare(Declaration {
                    name: name.name.clone(),
                    kind: DeclKind::Class,
                    range: span,
                    selection_range: name.span,
                    container_name: self.container(),
                    detail: match parent {
                        Some(p) => format!("class {}({})", name.name, p.name),
                        None => format!("class {}", name.name),
                    },
                });
                self.walk_type_body(name, members, span);
            }
            TypeDeclKind::Record { members } => {
                self.declare(Declaration {
                    name: name.name.clone(),
                    kind: DeclKind::Record,
                    range: span,
                    selection_range: name.span,
                    container_name: self.container(),
                    detail: format!("record {}", name.name),
                });
                self.walk_type_body(name, members, span);
            }
            TypeDeclKind::Enum { members } => {
                self.declare(Declaration {
                    name: name.name.clone(),
                    kind: DeclKind::Enum,
                    range: span,
                    selection_range: name.span,
                    container_name: self.container(),
                    detail: format!("enum {}", name.name),
                });
                // Pascal semantics: enumeration members are visible in the
                // scope enclosing the enum itself.
                for member in members {
                    self.declare(Declaration {
                        name: member.name.clone(),
                        kind: DeclKind::EnumMember,
                        range: member.span,
                        selection_range: member.span,
                        container_name: Some(name.name.clone()),
                        detail: format!("{}.{}", name.name, member.name),
                    });
                }
            }
            TypeDeclKind::Alias { target } => {
                self.reference(target);
                self.declare(Declaration {
                    name: name.name.clone(),
                    kind: DeclKind::Type,
                    range: span,
                    selection_range: name.span,
                    container_name: self.container(),
                    detail: format!("type {} = {}", name.name, target.name),
                });
            }
        }
    }

    /// Class and record bodies get a Block scope of their own so members
    /// do not collide with globals; method bodies nest inside it so
    /// implicit-self member access resolves lexically.
    fn walk_type_body(&mut self, type_name: &Ident, members: &[ClassMember], span: Span) {
        let body = self.push_scope(ScopeKind::Block, span);
        self.type_body_scopes.push(body);
        self.containers.push(type_name.name.clone());
        for member in members {
            match member {
                ClassMember::Field {
                    names,
                    type_name: field_type,
                    span,
                } => {
                    self.reference_opt(field_type);
                    for name in names {
                        let detail = match field_type {
                            Some(t) => format!("{}: {}", name.name, t.name),
                            None => name.name.clone(),
                        };
                        self.declare(Declaration {
                            name: name.name.clone(),
                            kind: DeclKind::Field,
                            range: *span,
                            selection_range: name.span,
                            container_name: Some(type_name.name.clone()),
                            detail,
                        });
                    }
                }
                ClassMember::Method(decl) => self.walk_function(decl),
                ClassMember::Property {
                    name,
                    type_name: prop_type,
                    read,
                    write,
                    span,
                } => {
                    self.reference_opt(prop_type);
                    // Accessors refer to fields or methods of the class.
                    self.reference_opt(read);
                    self.reference_opt(write);
                    let detail = match prop_type {
                        Some(t) => format!("property {}: {}", name.name, t.name),
                        None => format!("property {}", name.name),
                    };
                    self.declare(Declaration {
                        name: name.name.clone(),
                        kind: DeclKind::Property,
                        range: *span,
                        selection_range: name.span,
                        container_name: Some(type_name.name.clone()),
                        detail,
                    });
                }
            }
        }
        self.containers.pop();
        self.pop_scope();
    }

    fn walk_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => self.reference(ident),
            Expr::IntLit { .. }
            | Expr::FloatLit { .. }
            | Expr::StringLit { .. }
            | Expr::BoolLit { .. }
            | Expr::Nil { .. } => {}
            Expr::Unary { operand, .. } => self.walk_expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.walk_expr(lhs);
                self.walk_expr(rhs);
            }
            Expr::Call { callee, args, .. } => {
                self.walk_expr(callee);
                for arg in args {
                    self.walk_expr(arg);
                }
            }
            // Only the object side is a lexical reference; the member name
            // would need type information to resolve.
            Expr::Member { object, .. } => self.walk_expr(object),
            Expr::Index { object, index, .. } => {
                self.walk_expr(object);
                self.walk_expr(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;
    use indoc::indoc;

    fn build(source: &str) -> ScopeTree {
        ScopeTree::build(&parse(source).unwrap())
    }

    #[test]
    fn test_global_declarations() {
        let tree = build("var x: Integer; const Pi = 3;");
        let global = tree.scope(tree.global());
        assert!(global.declarations.contains_key("x"));
        assert!(global.declarations.contains_key("Pi"));
    }

    #[test]
    fn test_function_scope_seeded_with_parameters() {
        let tree = build(indoc! {"
            function Add(a, b: Integer): Integer;
            begin
              Result := a + b;
            end;
        "});
        let global = tree.scope(tree.global());
        assert!(global.declarations.contains_key("Add"));
        let func = tree.scope(global.children[0]);
        assert_eq!(func.kind, ScopeKind::Function);
        assert_eq!(func.declarations["a"].kind, DeclKind::Parameter);
        assert_eq!(func.declarations["b"].kind, DeclKind::Parameter);
    }

    #[test]
    fn test_nested_block_shadows_outer() {
        let tree = build(indoc! {"
            procedure Run;
            var x: Integer;
            begin
              begin
                var x: Integer;
                x := 1;
              end;
            end;
        "});
        // Reference to x is on line 6.
        let reference = tree
            .references()
            .iter()
            .find(|r| r.name == "x" && r.range.start.line == 6)
            .expect("reference to x");
        let (scope, decl) = tree.lookup_from(reference.scope, "x").unwrap();
        assert_eq!(tree.scope(scope).kind, ScopeKind::Block);
        // The shadowing declaration is the one on line 5.
        assert_eq!(decl.selection_range.start.line, 5);
    }

    #[test]
    fn test_same_scope_redeclaration_replaces() {
        let tree = build("var x: Integer;\nvar x: Float;");
        let global = tree.scope(tree.global());
        let decl = &global.declarations["x"];
        assert_eq!(decl.selection_range.start.line, 2);
    }

    #[test]
    fn test_enum_members_in_enclosing_scope() {
        let tree = build("type TColor = (Red, Green, Blue);");
        let global = tree.scope(tree.global());
        assert_eq!(global.declarations["TColor"].kind, DeclKind::Enum);
        assert_eq!(global.declarations["Red"].kind, DeclKind::EnumMember);
        assert_eq!(
            global.declarations["Red"].container_name.as_deref(),
            Some("TColor")
        );
    }

    #[test]
    fn test_class_members_not_in_global_scope() {
        let tree = build(indoc! {"
            type TPoint = class
              FX: Integer;
            end;
            var FX: Integer;
        "});
        let global = tree.scope(tree.global());
        // The global FX is the var, not the field.
        assert_eq!(global.declarations["FX"].kind, DeclKind::Variable);
        let exported = tree.indexable_declarations();
        let field = exported
            .iter()
            .find(|d| d.kind == DeclKind::Field)
            .expect("field exported");
        assert_eq!(field.container_name.as_deref(), Some("TPoint"));
    }

    #[test]
    fn test_innermost_scope_at_position() {
        let tree = build(indoc! {"
            procedure Run;
            begin
              var y := 1;
            end;
        "});
        let inner = tree.innermost_scope_at(Pos::new(3, 7));
        assert_eq!(tree.scope(inner).kind, ScopeKind::Block);
        let global = tree.innermost_scope_at(Pos::new(100, 1));
        assert_eq!(global, tree.global());
    }

    #[test]
    fn test_var_initializer_sees_outer_binding() {
        let tree = build(indoc! {"
            var x := 1;
            procedure Run;
            begin
              var x := x + 1;
            end;
        "});
        let init_ref = tree
            .references()
            .iter()
            .find(|r| r.name == "x" && r.range.start.line == 4)
            .expect("initializer reference");
        // Recorded before the inner x was declared, but lookup is by scope,
        // and the inner declaration lands in the same block; nearest wins.
        let (scope, _) = tree.lookup_from(init_ref.scope, "x").unwrap();
        assert_eq!(tree.scope(scope).kind, ScopeKind::Block);
    }

    #[test]
    fn test_type_annotations_are_references() {
        let tree = build(indoc! {"
            type TPoint = class
            end;
            var p: TPoint;
        "});
        assert!(tree
            .references()
            .iter()
            .any(|r| r.name == "TPoint" && r.range.start.line == 3));
    }

    #[test]
    fn test_indexable_excludes_locals() {
        let tree = build(indoc! {"
            var globalVar: Integer;
            function Calc(seed: Integer): Integer;
            var temp: Integer;
            begin
              Result := seed;
            end;
        "});
        let exported: Vec<_> = tree
            .indexable_declarations()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert!(exported.contains(&"globalVar".to_string()));
        assert!(exported.contains(&"Calc".to_string()));
        assert!(!exported.contains(&"temp".to_string()));
        assert!(!exported.contains(&"seed".to_string()));
    }
}
