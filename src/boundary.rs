//! Boundary Refiner (§4.7): conservatively trims trailing usage-only
//! statements and extends the start to pull in immediately preceding
//! declarations the sequence depends on.

use crate::ast::{CompilationUnit, ExprKind, StmtId, StmtKind};
use crate::extractor::StatementSequence;
use crate::similarity::{score_sequences, SimilarityWeights};

/// Is this statement a pure "read" — an expression statement whose only
/// effect is referencing already-defined names, never control flow,
/// declarations, assignments, or mutating calls?
fn is_usage_only(unit: &CompilationUnit, id: StmtId) -> bool {
    match &unit.stmt(id).kind {
        StmtKind::Expr(e) => !has_side_effecting_call(unit, *e),
        _ => false,
    }
}

fn has_side_effecting_call(unit: &CompilationUnit, e: crate::ast::ExprId) -> bool {
    match &unit.expr(e).kind {
        ExprKind::MethodCall { method, .. } => is_mutating_method(method),
        ExprKind::Call { .. } | ExprKind::AssertOrMock { .. } => false,
        ExprKind::Ident(_) | ExprKind::Literal(_) => false,
        ExprKind::FieldAccess { base, .. } => has_side_effecting_call(unit, *base),
        ExprKind::Binary { lhs, rhs, .. } => {
            has_side_effecting_call(unit, *lhs) || has_side_effecting_call(unit, *rhs)
        }
        ExprKind::Unary { operand, .. } => has_side_effecting_call(unit, *operand),
    }
}

fn is_mutating_method(name: &str) -> bool {
    name.starts_with("set") || name.ends_with("_mut") || matches!(name, "push" | "insert" | "remove" | "clear")
}

/// Trim trailing usage-only statements from a sequence.
fn trim_trailing(unit: &CompilationUnit, stmts: &[StmtId], min_statements: usize) -> Vec<StmtId> {
    let mut end = stmts.len();
    while end > min_statements && is_usage_only(unit, stmts[end - 1]) {
        end -= 1;
    }
    stmts[..end].to_vec()
}

/// Extend the start backwards over immediately preceding declarations whose
/// names the sequence uses but does not itself define.
fn extend_leading(
    unit: &CompilationUnit,
    container_body: &[StmtId],
    start: usize,
    stmts: &[StmtId],
) -> (usize, Vec<StmtId>) {
    let facts = crate::dataflow::analyze(unit, stmts);
    let free = facts.used.difference(&facts.defined).cloned().collect::<std::collections::HashSet<_>>();
    let mut new_start = start;
    while new_start > 0 {
        let candidate = container_body[new_start - 1];
        let name = match &unit.stmt(candidate).kind {
            StmtKind::Let { name, .. } if free.contains(name) => name.clone(),
            _ => break,
        };
        let _ = name;
        new_start -= 1;
    }
    let mut extended = container_body[new_start..start].to_vec();
    extended.extend_from_slice(stmts);
    (new_start, extended)
}

/// Refine a single sequence in isolation (§4.7): trim trailing usage-only
/// statements, then extend the start backwards over immediately preceding
/// declarations it depends on. Returns `None` when the result would drop
/// below `min_statements`, in which case the caller should keep the
/// original sequence unchanged.
pub fn refine_sequence(
    seq: &StatementSequence,
    container_body: &[StmtId],
    min_statements: usize,
) -> Option<StatementSequence> {
    let trimmed = trim_trailing(&seq.unit, &seq.stmts, min_statements);
    let (start, extended) = extend_leading(&seq.unit, container_body, seq.start_index, &trimmed);

    if extended.len() < min_statements {
        return None;
    }
    if start == seq.start_index && extended.len() == seq.stmts.len() {
        return None;
    }

    let mut refined = seq.clone();
    refined.start_index = start;
    refined.stmts = extended;
    refined.span = crate::extractor::span_of_stmts(&seq.unit, &refined.stmts);
    Some(refined)
}

/// Refine a pair of sequences together (§4.7). Returns `None` when either
/// side's refinement would shrink it below `min_statements` or the
/// recomputed score falls below threshold, in which case the caller should
/// keep the originals.
pub fn refine_pair(
    a: &StatementSequence,
    b: &StatementSequence,
    a_body: &[StmtId],
    b_body: &[StmtId],
    min_statements: usize,
    threshold: f64,
    weights: &SimilarityWeights,
) -> Option<(StatementSequence, StatementSequence)> {
    let refined_a = refine_sequence(a, a_body, min_statements).unwrap_or_else(|| a.clone());
    let refined_b = refine_sequence(b, b_body, min_statements).unwrap_or_else(|| b.clone());

    let result = score_sequences(&refined_a, &refined_b, weights);
    if result.overall >= threshold {
        Some((refined_a, refined_b))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Container, ContainerId, ContainerKind, ExprId, ExprNode, LiteralKind, SourceSpan, StmtNode};
    use std::sync::Arc;

    #[test]
    fn mutating_setter_is_not_usage_only() {
        assert!(is_mutating_method("setA"));
        assert!(!is_mutating_method("getA"));
    }

    #[test]
    fn refine_sequence_trims_trailing_usage_only_read() {
        // user.set_a(1); log_user(user);
        let exprs = vec![
            ExprNode { kind: ExprKind::Ident("user".into()), span: SourceSpan::default(), inferred_type: None },
            ExprNode { kind: ExprKind::Literal(LiteralKind::Int("1".into())), span: SourceSpan::default(), inferred_type: None },
            ExprNode {
                kind: ExprKind::MethodCall { receiver: Some(ExprId(0)), method: "set_a".into(), args: vec![ExprId(1)] },
                span: SourceSpan::default(),
                inferred_type: None,
            },
            ExprNode { kind: ExprKind::Ident("user".into()), span: SourceSpan::default(), inferred_type: None },
            ExprNode {
                kind: ExprKind::Call { callee: "log_user".into(), args: vec![ExprId(3)] },
                span: SourceSpan::default(),
                inferred_type: None,
            },
        ];
        let stmts = vec![
            StmtNode { kind: StmtKind::Expr(ExprId(2)), span: SourceSpan { start_line: 1, start_col: 0, end_line: 1, end_col: 1 } },
            StmtNode { kind: StmtKind::Expr(ExprId(4)), span: SourceSpan { start_line: 2, start_col: 0, end_line: 2, end_col: 1 } },
        ];
        let container = Container {
            id: ContainerId(0),
            kind: ContainerKind::Method,
            name: "m".into(),
            is_static: false,
            owner_type: "T".into(),
            owner_nested: false,
            owner_is_enum: false,
            body: vec![StmtId(0), StmtId(1)],
            span: SourceSpan { start_line: 1, start_col: 0, end_line: 2, end_col: 1 },
            parent: None,
        };
        let unit = Arc::new(CompilationUnit { file: "t.rs".into(), stmts, exprs, containers: vec![container] });
        let seq = StatementSequence {
            file: Arc::new("t.rs".into()),
            unit: Arc::clone(&unit),
            container: ContainerId(0),
            container_kind: ContainerKind::Method,
            start_index: 0,
            stmts: vec![StmtId(0), StmtId(1)],
            span: SourceSpan { start_line: 1, start_col: 0, end_line: 2, end_col: 1 },
        };
        let refined = refine_sequence(&seq, &unit.containers[0].body, 1).expect("trailing read should be trimmed");
        assert_eq!(refined.stmts, vec![StmtId(0)]);
    }
}
