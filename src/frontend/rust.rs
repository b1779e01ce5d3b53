//! `syn`-based concrete frontend: parses a Rust source file into a
//! [`CompilationUnit`] and provides a best-effort [`Resolver`] over it.
//!
//! Full type inference is out of scope (see SPEC_FULL.md §1): this builder
//! only tracks types it can read straight off the syntax — `let` type
//! annotations, function parameter/return types, and literal types — and
//! leaves everything else `None`, which the pipeline treats conservatively.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use proc_macro2::LineColumn;
use syn::spanned::Spanned;

use crate::ast::{
    AstType, CompilationUnit, Container, ContainerId, ContainerKind, ExprId, ExprKind, LiteralKind,
    ParsedUnit, Resolver, SourceSpan, StmtId, StmtKind, StmtNode, ExprNode,
};
use crate::error::{CloneForgeError, Result};

const WELL_KNOWN_TYPES: &[&str] = &[
    "String", "str", "Vec", "Option", "Result", "Box", "Arc", "Rc", "RefCell", "Cell", "Cow",
    "HashMap", "HashSet", "BTreeMap", "BTreeSet", "VecDeque",
];

fn span_of<T: Spanned>(node: &T) -> SourceSpan {
    let start: LineColumn = node.span().start();
    let end: LineColumn = node.span().end();
    SourceSpan { start_line: start.line, start_col: start.column, end_line: end.line, end_col: end.column }
}

/// Parse a Rust source file into a compilation unit plus its resolver.
pub fn parse_file(path: &Path) -> Result<ParsedUnit> {
    let source = std::fs::read_to_string(path)?;
    parse_str(path, &source)
}

pub fn parse_str(path: &Path, source: &str) -> Result<ParsedUnit> {
    let file = syn::parse_file(source)
        .map_err(|e| CloneForgeError::Parse { path: path.display().to_string(), message: e.to_string() })?;
    let mut builder = Builder::new(path.to_path_buf());
    builder.visit_items(&file.items, None, false, 0);
    let (unit, type_map, well_known) = builder.finish();
    let resolver = Arc::new(RustResolver { type_map, well_known });
    Ok(ParsedUnit { unit: Arc::new(unit), resolver })
}

struct Builder {
    file: PathBuf,
    stmts: Vec<StmtNode>,
    exprs: Vec<ExprNode>,
    containers: Vec<Container>,
    enums: std::collections::HashSet<String>,
    type_map: HashMap<ExprId, AstType>,
    scope: Vec<HashMap<String, AstType>>,
    /// Stack of enclosing non-lambda-or-lambda containers, innermost last,
    /// so a closure found mid-body can record its `parent` (§4.10 static-
    /// ness inheritance walks this chain back up).
    current_container: Vec<ContainerId>,
}

impl Builder {
    fn new(file: PathBuf) -> Self {
        Self {
            file,
            stmts: Vec::new(),
            exprs: Vec::new(),
            containers: Vec::new(),
            enums: std::collections::HashSet::new(),
            type_map: HashMap::new(),
            scope: vec![HashMap::new()],
            current_container: Vec::new(),
        }
    }

    fn finish(self) -> (CompilationUnit, HashMap<ExprId, AstType>, std::collections::HashSet<String>) {
        let unit = CompilationUnit { file: self.file, stmts: self.stmts, exprs: self.exprs, containers: self.containers };
        (unit, self.type_map, self.enums)
    }

    fn push_stmt(&mut self, kind: StmtKind, span: SourceSpan) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(StmtNode { kind, span });
        id
    }

    fn push_expr(&mut self, kind: ExprKind, span: SourceSpan) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(ExprNode { kind, span, inferred_type: None });
        id
    }

    fn push_container(&mut self, container: Container) -> ContainerId {
        let id = container.id;
        self.containers.push(container);
        id
    }

    fn next_container_id(&self) -> ContainerId {
        ContainerId(self.containers.len() as u32)
    }

    fn opaque_expr(&mut self, span: SourceSpan) -> ExprId {
        self.push_expr(ExprKind::Call { callee: "<opaque>".to_string(), args: Vec::new() }, span)
    }

    fn set_binding(&mut self, name: &str, ty: AstType) {
        if let Some(scope) = self.scope.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    fn lookup_binding(&self, name: &str) -> Option<AstType> {
        self.scope.iter().rev().find_map(|s| s.get(name).cloned())
    }

    /// Walk top-level items, recursing into modules and (for locally
    /// declared types, valid Rust) item statements inside function bodies.
    fn visit_items(&mut self, items: &[syn::Item], owner: Option<&str>, owner_nested: bool, depth: usize) {
        // Pre-scan enum names so impl-block owner-kind detection can use them.
        for item in items {
            if let syn::Item::Enum(e) = item {
                self.enums.insert(e.ident.to_string());
            }
        }
        for item in items {
            match item {
                syn::Item::Fn(f) => self.visit_free_fn(f, owner_nested),
                syn::Item::Impl(imp) => self.visit_impl(imp, depth),
                syn::Item::Mod(m) => {
                    if let Some((_, items)) = &m.content {
                        self.visit_items(items, owner, owner_nested, depth + 1);
                    }
                }
                syn::Item::Static(s) => self.visit_static(&s.ident, &s.expr, false),
                syn::Item::Const(c) => self.visit_static(&c.ident, &c.expr, true),
                _ => {}
            }
        }
        let _ = owner;
    }

    fn visit_static(&mut self, ident: &syn::Ident, expr: &syn::Expr, is_const: bool) {
        let syn::Expr::Block(block) = expr else { return };
        let span = span_of(&block.block);
        let container_id = self.next_container_id();
        self.scope.push(HashMap::new());
        self.current_container.push(container_id);
        let body = self.visit_block_stmts(&block.block.stmts);
        self.current_container.pop();
        self.scope.pop();
        self.push_container(Container {
            id: container_id,
            kind: ContainerKind::StaticInit,
            name: ident.to_string(),
            is_static: true,
            owner_type: self.file.display().to_string(),
            owner_nested: false,
            owner_is_enum: false,
            body,
            span,
            parent: None,
        });
        let _ = is_const;
    }

    fn visit_free_fn(&mut self, f: &syn::ItemFn, owner_nested: bool) {
        if f.block.stmts.is_empty() {
            return;
        }
        let container_id = self.next_container_id();
        let span = span_of(&f.block);
        self.scope.push(self.param_scope(&f.sig));
        self.current_container.push(container_id);
        let body = self.visit_block_stmts(&f.block.stmts);
        self.current_container.pop();
        self.scope.pop();
        self.push_container(Container {
            id: container_id,
            kind: ContainerKind::Method,
            name: f.sig.ident.to_string(),
            is_static: true,
            owner_type: self.file.display().to_string(),
            owner_nested,
            owner_is_enum: false,
            body,
            span,
            parent: None,
        });
    }

    fn visit_impl(&mut self, imp: &syn::ItemImpl, depth: usize) {
        let owner_type = type_to_string(&imp.self_ty);
        let owner_is_enum = self.enums.contains(&owner_type);
        let owner_nested = depth > 0;
        for item in &imp.items {
            if let syn::ImplItem::Fn(m) = item {
                self.visit_method(m, &owner_type, owner_is_enum, owner_nested);
            }
        }
    }

    fn visit_method(&mut self, m: &syn::ImplItemFn, owner_type: &str, owner_is_enum: bool, owner_nested: bool) {
        if m.block.stmts.is_empty() {
            return;
        }
        let has_self = m.sig.receiver().is_some();
        let returns_self = matches!(&m.sig.output, syn::ReturnType::Type(_, ty) if type_to_string(ty) == "Self" || type_to_string(ty) == owner_type);
        let looks_like_ctor = m.sig.ident == "new"
            || m.sig.ident.to_string().starts_with("with_")
            || m.sig.ident == "default"
            || m.sig.ident.to_string().starts_with("from_");

        let kind = if has_self {
            ContainerKind::Method
        } else if returns_self || looks_like_ctor {
            ContainerKind::Constructor
        } else {
            ContainerKind::Method
        };

        let container_id = self.next_container_id();
        let span = span_of(&m.block);
        self.scope.push(self.param_scope(&m.sig));
        self.current_container.push(container_id);
        let body = self.visit_block_stmts(&m.block.stmts);
        self.current_container.pop();
        self.scope.pop();
        self.push_container(Container {
            id: container_id,
            kind,
            name: m.sig.ident.to_string(),
            is_static: !has_self,
            owner_type: owner_type.to_string(),
            owner_nested,
            owner_is_enum,
            body,
            span,
            parent: None,
        });
    }

    fn param_scope(&self, sig: &syn::Signature) -> HashMap<String, AstType> {
        let mut scope = HashMap::new();
        for arg in &sig.inputs {
            if let syn::FnArg::Typed(pat_ty) = arg {
                if let syn::Pat::Ident(pat_ident) = pat_ty.pat.as_ref() {
                    scope.insert(pat_ident.ident.to_string(), type_to_ast(&pat_ty.ty));
                }
            }
        }
        scope
    }

    fn visit_block_stmts(&mut self, stmts: &[syn::Stmt]) -> Vec<StmtId> {
        stmts.iter().filter_map(|s| self.visit_stmt(s)).collect()
    }

    fn visit_stmt(&mut self, stmt: &syn::Stmt) -> Option<StmtId> {
        match stmt {
            syn::Stmt::Local(local) => Some(self.visit_local(local)),
            syn::Stmt::Expr(expr, _) => {
                let span = span_of(expr);
                if let Some(kind) = self.visit_control_flow(expr) {
                    Some(self.push_stmt(kind, span))
                } else {
                    let e = self.visit_expr(expr);
                    Some(self.push_stmt(StmtKind::Expr(e), span))
                }
            }
            syn::Stmt::Item(syn::Item::Impl(imp)) => {
                self.visit_impl(imp, 1);
                None
            }
            syn::Stmt::Item(_) => None,
            syn::Stmt::Macro(_) => None,
        }
    }

    fn visit_local(&mut self, local: &syn::Local) -> StmtId {
        let span = span_of(local);
        let (name, ty_ann) = match &local.pat {
            syn::Pat::Type(pt) => {
                let name = pat_ident_name(&pt.pat);
                (name, Some(type_to_ast(&pt.ty)))
            }
            other => (pat_ident_name(other), None),
        };
        let init = local.init.as_ref().map(|i| self.visit_expr(&i.expr));
        let ty = ty_ann.or_else(|| init.and_then(|e| self.type_map.get(&e).cloned()));
        if let Some(t) = &ty {
            self.set_binding(&name, t.clone());
        }
        self.push_stmt(StmtKind::Let { name, ty, is_final: false, init }, span)
    }

    /// Statements syn represents as a trailing `Expr` (no semicolon) that
    /// map to one of the pipeline's dedicated control-flow `StmtKind`s.
    fn visit_control_flow(&mut self, expr: &syn::Expr) -> Option<StmtKind> {
        match expr {
            syn::Expr::If(e) => {
                let cond = self.visit_expr(&e.cond);
                let then_branch = self.visit_block_stmts(&e.then_branch.stmts);
                let else_branch = match &e.else_branch {
                    Some((_, else_expr)) => match else_expr.as_ref() {
                        syn::Expr::Block(b) => self.visit_block_stmts(&b.block.stmts),
                        other => {
                            let span = span_of(other);
                            vec![self.push_stmt(StmtKind::Expr(self.opaque_fallback(span)), span)]
                        }
                    },
                    None => Vec::new(),
                };
                Some(StmtKind::If { cond, then_branch, else_branch })
            }
            syn::Expr::While(e) => {
                let cond = self.visit_expr(&e.cond);
                let body = self.visit_block_stmts(&e.body.stmts);
                Some(StmtKind::While { cond, body })
            }
            syn::Expr::ForLoop(e) => {
                let binder = pat_ident_name_opt(&e.pat);
                let iter = self.visit_expr(&e.expr);
                let body = self.visit_block_stmts(&e.body.stmts);
                Some(StmtKind::ForLoop { binder, iter, body })
            }
            syn::Expr::Match(e) => {
                let scrutinee = self.visit_expr(&e.expr);
                let arms = e
                    .arms
                    .iter()
                    .map(|arm| match &arm.body.as_ref() {
                        syn::Expr::Block(b) => self.visit_block_stmts(&b.block.stmts),
                        other => {
                            let span = span_of(*other);
                            let ex = self.visit_expr(other);
                            vec![self.push_stmt(StmtKind::Expr(ex), span)]
                        }
                    })
                    .collect();
                Some(StmtKind::Match { scrutinee, arms })
            }
            syn::Expr::Return(e) => {
                let value = e.expr.as_ref().map(|v| self.visit_expr(v));
                Some(StmtKind::Return(value))
            }
            syn::Expr::Break(_) => Some(StmtKind::Break),
            syn::Expr::Continue(_) => Some(StmtKind::Continue),
            syn::Expr::Assign(e) => {
                let target = self.visit_expr(&e.left);
                let value = self.visit_expr(&e.right);
                Some(StmtKind::Assign { target, value })
            }
            _ => None,
        }
    }

    fn opaque_fallback(&mut self, span: SourceSpan) -> ExprId {
        self.opaque_expr(span)
    }

    fn visit_expr(&mut self, expr: &syn::Expr) -> ExprId {
        let span = span_of(expr);
        match expr {
            syn::Expr::Path(p) => {
                let name = path_to_string(&p.path);
                let id = self.push_expr(ExprKind::Ident(name.clone()), span);
                if let Some(ty) = self.lookup_binding(&name) {
                    self.type_map.insert(id, ty);
                }
                id
            }
            syn::Expr::Field(f) => {
                let base = self.visit_expr(&f.base);
                let field = match &f.member {
                    syn::Member::Named(id) => id.to_string(),
                    syn::Member::Unnamed(i) => i.index.to_string(),
                };
                self.push_expr(ExprKind::FieldAccess { base, field }, span)
            }
            syn::Expr::MethodCall(m) => {
                let receiver = Some(self.visit_expr(&m.receiver));
                let args: Vec<ExprId> = m.args.iter().map(|a| self.visit_expr(a)).collect();
                self.push_expr(ExprKind::MethodCall { receiver, method: m.method.to_string(), args }, span)
            }
            syn::Expr::Call(c) => {
                let callee = match c.func.as_ref() {
                    syn::Expr::Path(p) => path_to_string(&p.path),
                    _ => "<call>".to_string(),
                };
                let args: Vec<ExprId> = c.args.iter().map(|a| self.visit_expr(a)).collect();
                if callee == "assert" || callee == "assert_eq" || callee == "assert_ne" {
                    self.push_expr(ExprKind::AssertOrMock { name: callee, args }, span)
                } else {
                    self.push_expr(ExprKind::Call { callee, args }, span)
                }
            }
            syn::Expr::Macro(m) => {
                let name = path_to_string(&m.mac.path);
                if name == "assert" || name == "assert_eq" || name == "assert_ne" || name == "debug_assert" {
                    self.push_expr(ExprKind::AssertOrMock { name, args: Vec::new() }, span)
                } else {
                    self.push_expr(ExprKind::Call { callee: name, args: Vec::new() }, span)
                }
            }
            syn::Expr::Binary(b) => {
                let lhs = self.visit_expr(&b.left);
                let rhs = self.visit_expr(&b.right);
                self.push_expr(ExprKind::Binary { op: bin_op_str(&b.op).to_string(), lhs, rhs }, span)
            }
            syn::Expr::Unary(u) => {
                let operand = self.visit_expr(&u.expr);
                self.push_expr(ExprKind::Unary { op: unary_op_str(&u.op).to_string(), operand }, span)
            }
            syn::Expr::Lit(l) => {
                let kind = literal_kind(&l.lit);
                let id = self.push_expr(ExprKind::Literal(kind.clone()), span);
                self.type_map.insert(id, literal_type(&kind));
                id
            }
            syn::Expr::Paren(p) => self.visit_expr(&p.expr),
            syn::Expr::Reference(r) => self.visit_expr(&r.expr),
            syn::Expr::Closure(c) => self.visit_closure(c, span),
            _ => self.opaque_expr(span),
        }
    }

    /// Block-bodied lambdas are containers in their own right (§4.1, §9):
    /// a nested pass extracts candidate sequences from the closure body
    /// just like any method, and the enclosing sequence sees only the
    /// closure expression itself (it never inlines the closure's body).
    /// Closures with a non-block expression body (`|x| x + 1`) carry no
    /// statement sequence worth extracting and are left opaque.
    fn visit_closure(&mut self, c: &syn::ExprClosure, span: SourceSpan) -> ExprId {
        let syn::Expr::Block(block) = c.body.as_ref() else {
            return self.opaque_expr(span);
        };
        let container_id = self.next_container_id();
        let body_span = span_of(&block.block);
        let parent = self.current_container.last().copied();
        self.scope.push(closure_param_scope(&c.inputs));
        self.current_container.push(container_id);
        let body = self.visit_block_stmts(&block.block.stmts);
        self.current_container.pop();
        self.scope.pop();
        self.push_container(Container {
            id: container_id,
            kind: ContainerKind::Lambda,
            name: "<closure>".to_string(),
            is_static: parent.is_none(),
            owner_type: self.file.display().to_string(),
            owner_nested: false,
            owner_is_enum: false,
            body,
            span: body_span,
            parent,
        });
        self.push_expr(ExprKind::Call { callee: "<closure>".to_string(), args: Vec::new() }, span)
    }
}

fn closure_param_scope(inputs: &syn::punctuated::Punctuated<syn::Pat, syn::Token![,]>) -> HashMap<String, AstType> {
    let mut scope = HashMap::new();
    for pat in inputs {
        match pat {
            syn::Pat::Type(pt) => {
                if let Some(name) = pat_ident_name_opt(&pt.pat) {
                    scope.insert(name, type_to_ast(&pt.ty));
                }
            }
            other => {
                if let Some(name) = pat_ident_name_opt(other) {
                    scope.insert(name, AstType::simple("_"));
                }
            }
        }
    }
    scope
}

fn pat_ident_name(pat: &syn::Pat) -> String {
    pat_ident_name_opt(pat).unwrap_or_else(|| "_".to_string())
}

fn pat_ident_name_opt(pat: &syn::Pat) -> Option<String> {
    match pat {
        syn::Pat::Ident(p) => Some(p.ident.to_string()),
        _ => None,
    }
}

fn path_to_string(path: &syn::Path) -> String {
    path.segments.iter().map(|s| s.ident.to_string()).collect::<Vec<_>>().join("::")
}

fn type_to_string(ty: &syn::Type) -> String {
    match ty {
        syn::Type::Path(p) => p.path.segments.last().map(|s| s.ident.to_string()).unwrap_or_default(),
        syn::Type::Reference(r) => type_to_string(&r.elem),
        _ => "_".to_string(),
    }
}

fn type_to_ast(ty: &syn::Type) -> AstType {
    AstType::simple(type_to_string(ty))
}

fn bin_op_str(op: &syn::BinOp) -> &'static str {
    use syn::BinOp::*;
    match op {
        Add(_) => "+",
        Sub(_) => "-",
        Mul(_) => "*",
        Div(_) => "/",
        Rem(_) => "%",
        And(_) => "&&",
        Or(_) => "||",
        Eq(_) => "==",
        Ne(_) => "!=",
        Lt(_) => "<",
        Le(_) => "<=",
        Gt(_) => ">",
        Ge(_) => ">=",
        _ => "?",
    }
}

fn unary_op_str(op: &syn::UnOp) -> &'static str {
    match op {
        syn::UnOp::Not(_) => "!",
        syn::UnOp::Neg(_) => "-",
        _ => "?",
    }
}

fn literal_kind(lit: &syn::Lit) -> LiteralKind {
    match lit {
        syn::Lit::Str(s) => LiteralKind::Str(s.value()),
        syn::Lit::Int(i) => {
            if i.suffix() == "i64" || i.suffix() == "u64" {
                LiteralKind::Long(i.base10_digits().to_string())
            } else {
                LiteralKind::Int(i.base10_digits().to_string())
            }
        }
        syn::Lit::Float(f) => LiteralKind::Double(f.base10_digits().to_string()),
        syn::Lit::Bool(b) => LiteralKind::Bool(b.value),
        _ => LiteralKind::Null,
    }
}

fn literal_type(kind: &LiteralKind) -> AstType {
    match kind {
        LiteralKind::Str(_) => AstType::simple("String"),
        LiteralKind::Int(_) => AstType::simple("i32"),
        LiteralKind::Long(_) => AstType::simple("i64"),
        LiteralKind::Double(_) => AstType::simple("f64"),
        LiteralKind::Bool(_) => AstType::simple("bool"),
        LiteralKind::Null => AstType::void(),
    }
}

/// Best-effort resolver backed by the types the builder could read directly
/// off the syntax (§1: full inference is out of scope).
pub struct RustResolver {
    type_map: HashMap<ExprId, AstType>,
    well_known: std::collections::HashSet<String>,
}

impl Resolver for RustResolver {
    fn resolve_type(&self, _unit: &CompilationUnit, expr: ExprId) -> Option<AstType> {
        self.type_map.get(&expr).cloned()
    }

    fn is_well_known(&self, name: &str) -> bool {
        WELL_KNOWN_TYPES.contains(&name) || self.well_known.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_simple_function_body() {
        let source = r#"
            fn add_and_log(a: i32, b: i32) -> i32 {
                let sum = a + b;
                println!("{}", sum);
                sum
            }
        "#;
        let parsed = parse_str(&PathBuf::from("t.rs"), source).unwrap();
        assert_eq!(parsed.unit.containers.len(), 1);
        assert_eq!(parsed.unit.containers[0].kind, ContainerKind::Method);
        assert!(parsed.unit.containers[0].body.len() >= 2);
    }

    #[test]
    fn detects_constructor_in_impl_block() {
        let source = r#"
            struct Widget { id: u32 }
            impl Widget {
                fn new(id: u32) -> Self {
                    let w = Widget { id };
                    w
                }
            }
        "#;
        let parsed = parse_str(&PathBuf::from("t.rs"), source).unwrap();
        assert!(parsed.unit.containers.iter().any(|c| c.kind == ContainerKind::Constructor));
    }

    #[test]
    fn invalid_source_reports_parse_error() {
        let result = parse_str(&PathBuf::from("bad.rs"), "fn (");
        assert!(result.is_err());
    }

    #[test]
    fn block_bodied_closure_becomes_its_own_lambda_container() {
        let source = r#"
            fn spawn_all(items: Vec<i32>) {
                let handles: Vec<_> = items.into_iter().map(|x| {
                    let doubled = x * 2;
                    println!("{}", doubled);
                    doubled
                }).collect();
                drop(handles);
            }
        "#;
        let parsed = parse_str(&PathBuf::from("t.rs"), source).unwrap();
        let lambda = parsed.unit.containers.iter().find(|c| c.kind == ContainerKind::Lambda).unwrap();
        assert!(lambda.body.len() >= 2);
        assert!(parsed.unit.containers.iter().any(|c| c.kind == ContainerKind::Method));
    }

    #[test]
    fn expression_bodied_closure_is_left_opaque() {
        let source = r#"
            fn add_one(xs: Vec<i32>) -> Vec<i32> {
                xs.into_iter().map(|x| x + 1).collect()
            }
        "#;
        let parsed = parse_str(&PathBuf::from("t.rs"), source).unwrap();
        assert!(!parsed.unit.containers.iter().any(|c| c.kind == ContainerKind::Lambda));
    }
}
