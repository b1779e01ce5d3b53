//! Token Normalizer (§4.2): walks a statement's AST producing an ordered
//! token sequence whose structural tags abstract away identifier/literal
//! content while retaining the content for value comparison.

use serde::{Deserialize, Serialize};

use crate::ast::{CompilationUnit, ExprId, ExprKind, LiteralKind, StmtId, StmtKind};

/// Coarse token kind, mirroring the spec's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Keyword,
    Operator,
    Var,
    Type,
    StringLit,
    IntLit,
    LongLit,
    DoubleLit,
    BooleanLit,
    NullLit,
    MethodCall,
    ControlFlow(String),
    Assert,
    Mock,
}

/// A single normalized token. `normalized_tag` is what similarity scoring
/// compares; `raw` is what the variation tracker diffs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub raw: String,
    pub normalized_tag: String,
    pub line: usize,
    pub column: usize,
    pub expr: Option<ExprId>,
}

impl Token {
    fn new(kind: TokenKind, raw: impl Into<String>, line: usize, column: usize) -> Self {
        let raw = raw.into();
        let normalized_tag = Self::tag_for(&kind);
        Self { kind, raw, normalized_tag, line, column, expr: None }
    }

    fn tag_for(kind: &TokenKind) -> String {
        match kind {
            TokenKind::Keyword => "KEYWORD".to_string(),
            TokenKind::Operator => "OPERATOR".to_string(),
            TokenKind::Var => "VAR".to_string(),
            TokenKind::Type => "TYPE".to_string(),
            TokenKind::StringLit => "STRING_LIT".to_string(),
            TokenKind::IntLit => "INT_LIT".to_string(),
            TokenKind::LongLit => "LONG_LIT".to_string(),
            TokenKind::DoubleLit => "DOUBLE_LIT".to_string(),
            TokenKind::BooleanLit => "BOOLEAN_LIT".to_string(),
            TokenKind::NullLit => "NULL_LIT".to_string(),
            TokenKind::MethodCall => "METHOD_CALL".to_string(),
            TokenKind::ControlFlow(kw) => format!("CONTROL_FLOW({kw})"),
            TokenKind::Assert => "ASSERT".to_string(),
            TokenKind::Mock => "MOCK".to_string(),
        }
    }

    /// Two tokens structurally match when kind and normalized tag agree;
    /// raw content is deliberately excluded (§4.2).
    pub fn structurally_matches(&self, other: &Token) -> bool {
        self.normalized_tag == other.normalized_tag
    }
}

const ASSERT_NAMES: &[&str] = &["assert", "assert_eq", "assert_ne", "assert_matches", "debug_assert"];
const MOCK_NAMES: &[&str] = &["expect", "when", "returning", "times", "mock", "verify"];

/// Tokenize a single statement (and its nested expressions) in source order.
pub fn tokenize_stmt(unit: &CompilationUnit, stmt: StmtId) -> Vec<Token> {
    let mut out = Vec::new();
    walk_stmt(unit, stmt, &mut out);
    out
}

/// Tokenize a contiguous run of top-level statements.
pub fn tokenize_stmts(unit: &CompilationUnit, stmts: &[StmtId]) -> Vec<Token> {
    stmts.iter().flat_map(|&s| tokenize_stmt(unit, s)).collect()
}

fn walk_stmt(unit: &CompilationUnit, id: StmtId, out: &mut Vec<Token>) {
    let node = unit.stmt(id);
    let (line, col) = (node.span.start_line, node.span.start_col);
    match &node.kind {
        StmtKind::Let { name, ty, init, .. } => {
            out.push(Token::new(TokenKind::Keyword, "let", line, col));
            out.push(Token::new(TokenKind::Var, name.clone(), line, col));
            if let Some(ty) = ty {
                out.push(Token::new(TokenKind::Type, ty.name.clone(), line, col));
            }
            if let Some(init) = init {
                walk_expr(unit, *init, out);
            }
        }
        StmtKind::Expr(e) => walk_expr(unit, *e, out),
        StmtKind::Assign { target, value } => {
            walk_expr(unit, *target, out);
            out.push(Token::new(TokenKind::Operator, "=", line, col));
            walk_expr(unit, *value, out);
        }
        StmtKind::If { cond, then_branch, else_branch } => {
            out.push(Token::new(TokenKind::ControlFlow("if".into()), "if", line, col));
            walk_expr(unit, *cond, out);
            for s in then_branch {
                walk_stmt(unit, *s, out);
            }
            for s in else_branch {
                walk_stmt(unit, *s, out);
            }
        }
        StmtKind::While { cond, body } => {
            out.push(Token::new(TokenKind::ControlFlow("while".into()), "while", line, col));
            walk_expr(unit, *cond, out);
            for s in body {
                walk_stmt(unit, *s, out);
            }
        }
        StmtKind::ForLoop { iter, body, .. } => {
            out.push(Token::new(TokenKind::ControlFlow("for".into()), "for", line, col));
            walk_expr(unit, *iter, out);
            for s in body {
                walk_stmt(unit, *s, out);
            }
        }
        StmtKind::Match { scrutinee, arms } => {
            out.push(Token::new(TokenKind::ControlFlow("match".into()), "match", line, col));
            walk_expr(unit, *scrutinee, out);
            for arm in arms {
                for s in arm {
                    walk_stmt(unit, *s, out);
                }
            }
        }
        StmtKind::Return(e) => {
            out.push(Token::new(TokenKind::ControlFlow("return".into()), "return", line, col));
            if let Some(e) = e {
                walk_expr(unit, *e, out);
            }
        }
        StmtKind::Break => out.push(Token::new(TokenKind::ControlFlow("break".into()), "break", line, col)),
        StmtKind::Continue => out.push(Token::new(TokenKind::ControlFlow("continue".into()), "continue", line, col)),
        StmtKind::NestedContainer(_) => {
            out.push(Token::new(TokenKind::Keyword, "<nested>", line, col));
        }
    }
}

fn walk_expr(unit: &CompilationUnit, id: ExprId, out: &mut Vec<Token>) {
    let node = unit.expr(id);
    let (line, col) = (node.span.start_line, node.span.start_col);
    let mut tok = |kind, raw: &str| {
        let mut t = Token::new(kind, raw, line, col);
        t.expr = Some(id);
        t
    };
    match &node.kind {
        ExprKind::Ident(name) => out.push(tok(TokenKind::Var, name)),
        ExprKind::FieldAccess { base, field } => {
            walk_expr(unit, *base, out);
            out.push(tok(TokenKind::Var, field));
        }
        ExprKind::MethodCall { receiver, method, args } => {
            if let Some(r) = receiver {
                walk_expr(unit, *r, out);
            }
            if ASSERT_NAMES.contains(&method.as_str()) {
                out.push(tok(TokenKind::Assert, method));
            } else if MOCK_NAMES.contains(&method.as_str()) {
                out.push(tok(TokenKind::Mock, method));
            } else {
                out.push(tok(TokenKind::MethodCall, method));
            }
            for a in args {
                walk_expr(unit, *a, out);
            }
        }
        ExprKind::Call { callee, args } => {
            if ASSERT_NAMES.contains(&callee.as_str()) {
                out.push(tok(TokenKind::Assert, callee));
            } else {
                out.push(tok(TokenKind::MethodCall, callee));
            }
            for a in args {
                walk_expr(unit, *a, out);
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            walk_expr(unit, *lhs, out);
            out.push(tok(TokenKind::Operator, op));
            walk_expr(unit, *rhs, out);
        }
        ExprKind::Unary { op, operand } => {
            out.push(tok(TokenKind::Operator, op));
            walk_expr(unit, *operand, out);
        }
        ExprKind::Literal(lit) => out.push(match lit {
            LiteralKind::Str(s) => tok(TokenKind::StringLit, s),
            LiteralKind::Int(s) => tok(TokenKind::IntLit, s),
            LiteralKind::Long(s) => tok(TokenKind::LongLit, s),
            LiteralKind::Double(s) => tok(TokenKind::DoubleLit, s),
            LiteralKind::Bool(b) => tok(TokenKind::BooleanLit, if *b { "true" } else { "false" }),
            LiteralKind::Null => tok(TokenKind::NullLit, "null"),
        }),
        ExprKind::AssertOrMock { name, args } => {
            out.push(tok(TokenKind::Assert, name));
            for a in args {
                walk_expr(unit, *a, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprNode, SourceSpan, StmtNode};

    fn unit_with(stmts: Vec<StmtNode>, exprs: Vec<ExprNode>) -> CompilationUnit {
        CompilationUnit { file: "t.rs".into(), stmts, exprs, containers: Vec::new() }
    }

    #[test]
    fn tokenizes_let_with_literal() {
        let exprs = vec![ExprNode {
            kind: ExprKind::Literal(LiteralKind::Int("1".into())),
            span: SourceSpan::default(),
            inferred_type: None,
        }];
        let stmts = vec![StmtNode {
            kind: StmtKind::Let { name: "x".into(), ty: None, is_final: false, init: Some(ExprId(0)) },
            span: SourceSpan::default(),
        }];
        let unit = unit_with(stmts, exprs);
        let toks = tokenize_stmt(&unit, StmtId(0));
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[0].normalized_tag, "KEYWORD");
        assert_eq!(toks[1].normalized_tag, "VAR");
        assert_eq!(toks[2].normalized_tag, "INT_LIT");
    }

    #[test]
    fn two_different_literals_share_structural_tag() {
        let exprs = vec![
            ExprNode { kind: ExprKind::Literal(LiteralKind::Str("a".into())), span: SourceSpan::default(), inferred_type: None },
            ExprNode { kind: ExprKind::Literal(LiteralKind::Str("b".into())), span: SourceSpan::default(), inferred_type: None },
        ];
        let unit = unit_with(Vec::new(), exprs);
        let mut a = Vec::new();
        walk_expr(&unit, ExprId(0), &mut a);
        let mut b = Vec::new();
        walk_expr(&unit, ExprId(1), &mut b);
        assert!(a[0].structurally_matches(&b[0]));
        assert_ne!(a[0].raw, b[0].raw);
    }

    #[test]
    fn assert_call_tagged_specially() {
        let exprs = vec![
            ExprNode { kind: ExprKind::Literal(LiteralKind::Bool(true)), span: SourceSpan::default(), inferred_type: None },
        ];
        let unit = unit_with(
            vec![StmtNode {
                kind: StmtKind::Expr(ExprId(1)),
                span: SourceSpan::default(),
            }],
            vec![
                exprs[0].clone(),
                ExprNode {
                    kind: ExprKind::Call { callee: "assert".into(), args: vec![ExprId(0)] },
                    span: SourceSpan::default(),
                    inferred_type: None,
                },
            ],
        );
        let toks = tokenize_stmt(&unit, StmtId(0));
        assert_eq!(toks[0].kind, TokenKind::Assert);
    }
}
