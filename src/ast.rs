//! Frontend-agnostic AST contract consumed by the analysis pipeline.
//!
//! Source parsing and symbol resolution are external concerns (see
//! `frontend::rust` for the bundled adapter). Everything in this module is
//! pure data: a small arena of statements and expressions, plus the trait a
//! concrete parser implements to plug into the pipeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Index of a statement inside a `CompilationUnit`'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StmtId(pub u32);

/// Index of an expression inside a `CompilationUnit`'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExprId(pub u32);

/// Index of a container (method, constructor, initializer, lambda).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub u32);

/// 1-indexed line, 0-indexed column, matching the convention used throughout
/// the codebase's other location types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl SourceSpan {
    pub fn contains(&self, other: &SourceSpan) -> bool {
        (self.start_line, self.start_col) <= (other.start_line, other.start_col)
            && (other.end_line, other.end_col) <= (self.end_line, self.end_col)
    }
}

/// Which kind of code container a sequence of statements lives in. Static-
/// ness and placement decisions (§4.10) branch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerKind {
    Method,
    Constructor,
    StaticInit,
    InstanceInit,
    Lambda,
}

/// A method, constructor, initializer, or lambda body.
#[derive(Debug, Clone)]
pub struct Container {
    pub id: ContainerId,
    pub kind: ContainerKind,
    pub name: String,
    pub is_static: bool,
    /// Enclosing type's path, e.g. `crate::foo::Bar`.
    pub owner_type: String,
    /// Is the owner type nested inside another type declaration?
    pub owner_nested: bool,
    /// Is the owner type an enum?
    pub owner_is_enum: bool,
    /// Top-level statements, in source order.
    pub body: Vec<StmtId>,
    pub span: SourceSpan,
    /// For lambdas, the enclosing non-lambda container (used to inherit
    /// static-ness, per §4.10).
    pub parent: Option<ContainerId>,
}

/// A minimal, structural statement kind vocabulary. The pipeline only needs
/// enough shape to compare and to walk for data-flow; it never needs to
/// regenerate source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StmtKind {
    /// `let name: ty = init;` (or `let name;` with init = None)
    Let {
        name: String,
        ty: Option<AstType>,
        is_final: bool,
        init: Option<ExprId>,
    },
    /// Bare expression statement.
    Expr(ExprId),
    /// `name = expr;` or compound assignment (`+=`, etc).
    Assign { target: ExprId, value: ExprId },
    If {
        cond: ExprId,
        then_branch: Vec<StmtId>,
        else_branch: Vec<StmtId>,
    },
    While {
        cond: ExprId,
        body: Vec<StmtId>,
    },
    ForLoop {
        binder: Option<String>,
        iter: ExprId,
        body: Vec<StmtId>,
    },
    Match {
        scrutinee: ExprId,
        arms: Vec<Vec<StmtId>>,
    },
    Return(Option<ExprId>),
    Break,
    Continue,
    /// A nested container reference (lambda or closure body), treated as an
    /// opaque single statement by the outer extractor per §4.1.
    NestedContainer(ContainerId),
}

/// A minimal expression vocabulary, enough for token normalization,
/// data-flow, and type-directed parameterization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprKind {
    Ident(String),
    FieldAccess { base: ExprId, field: String },
    MethodCall { receiver: Option<ExprId>, method: String, args: Vec<ExprId> },
    Call { callee: String, args: Vec<ExprId> },
    Binary { op: String, lhs: ExprId, rhs: ExprId },
    Unary { op: String, operand: ExprId },
    Literal(LiteralKind),
    /// Assertion/mock-framework call, tagged specially for the token
    /// normalizer (§4.2).
    AssertOrMock { name: String, args: Vec<ExprId> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Str(String),
    Int(String),
    Long(String),
    Double(String),
    Bool(bool),
    Null,
}

/// Structural type representation. Deliberately shallow — good enough for
/// assignability/compatibility checks, not a type-checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstType {
    pub name: String,
    pub generics: Vec<AstType>,
    pub is_primitive: bool,
}

impl AstType {
    pub fn simple(name: impl Into<String>) -> Self {
        let name = name.into();
        let is_primitive = matches!(
            name.as_str(),
            "bool" | "char" | "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16"
                | "u32" | "u64" | "u128" | "usize" | "f32" | "f64"
        );
        Self { name, generics: Vec::new(), is_primitive }
    }

    pub fn void() -> Self {
        Self { name: "()".to_string(), generics: Vec::new(), is_primitive: true }
    }

    pub fn is_void(&self) -> bool {
        self.name == "()"
    }

    /// Still resolved to the universal placeholder (§4.10 step 4's "still
    /// universally typed" check), i.e. no narrower type was ever found.
    pub fn is_universal(&self) -> bool {
        self.name == "_"
    }

    /// Strips generic parameters for a coarse "base type" comparison, as
    /// used by return-type unification (§4.10).
    pub fn base_name(&self) -> &str {
        &self.name
    }
}

/// A single statement or expression's AST node, addressable by `StmtId`.
#[derive(Debug, Clone)]
pub struct StmtNode {
    pub kind: StmtKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub span: SourceSpan,
    pub inferred_type: Option<AstType>,
}

/// A parsed compilation unit: one source file's containers plus the arenas
/// backing their statements and expressions. Immutable once built; shared
/// by `Arc` so downstream entities can hold cheap references instead of
/// borrowing with a lifetime (see SPEC_FULL.md's "arena and indices" note).
#[derive(Debug)]
pub struct CompilationUnit {
    pub file: std::path::PathBuf,
    pub stmts: Vec<StmtNode>,
    pub exprs: Vec<ExprNode>,
    pub containers: Vec<Container>,
}

impl CompilationUnit {
    pub fn stmt(&self, id: StmtId) -> &StmtNode {
        &self.stmts[id.0 as usize]
    }

    pub fn expr(&self, id: ExprId) -> &ExprNode {
        &self.exprs[id.0 as usize]
    }

    pub fn container(&self, id: ContainerId) -> &Container {
        &self.containers[id.0 as usize]
    }

    /// Names of every container (method/fn) declared directly on the given
    /// owner type in this unit, for the safety validator's name-collision
    /// check (§4.11 rule 1).
    pub fn member_names(&self, owner_type: &str) -> Vec<String> {
        self.containers.iter().filter(|c| c.owner_type == owner_type).map(|c| c.name.clone()).collect()
    }
}

/// Read-only, best-effort type/scope resolution. Parsers that cannot fully
/// resolve symbols (the common case — full resolution is out of scope, see
/// SPEC_FULL.md §1) still implement this trait with whatever partial
/// information they have; `None` means "unknown", which the pipeline treats
/// conservatively.
pub trait Resolver: Send + Sync {
    fn resolve_type(&self, unit: &CompilationUnit, expr: ExprId) -> Option<AstType>;

    fn is_assignable(&self, from: &AstType, to: &AstType) -> bool {
        from == to || from.base_name() == to.base_name()
    }

    fn is_well_known(&self, name: &str) -> bool;

    fn find_ancestor_container(
        &self,
        unit: &CompilationUnit,
        stmt: StmtId,
        kind: ContainerKind,
    ) -> Option<ContainerId> {
        let _ = (unit, stmt, kind);
        None
    }
}

/// A compiled unit plus the resolver that produced it, bundled so callers
/// don't need to thread two Arcs through the whole pipeline.
#[derive(Clone)]
pub struct ParsedUnit {
    pub unit: Arc<CompilationUnit>,
    pub resolver: Arc<dyn Resolver>,
}
