//! Sequence Truncator (§4.9): computes the largest safely-extractable
//! prefix length across every member of a cluster.

use crate::ast::{AstType, CompilationUnit, StmtId, StmtKind};
use crate::dataflow;
use crate::escape::nested_return_before;
use crate::extractor::StatementSequence;
use crate::variation::{Variation, VariationKind};

/// Result of truncation: the safe prefix length plus an optional resolved
/// return variable name, if the primary's prefix has exactly one.
pub struct TruncationResult {
    pub k: usize,
    pub primary_return_var: Option<String>,
}

fn stmt_shape_matches(unit_a: &CompilationUnit, a: StmtId, unit_b: &CompilationUnit, b: StmtId) -> bool {
    use StmtKind::*;
    match (&unit_a.stmt(a).kind, &unit_b.stmt(b).kind) {
        (Let { .. }, Let { .. })
        | (Expr(_), Expr(_))
        | (Assign { .. }, Assign { .. })
        | (If { .. }, If { .. })
        | (While { .. }, While { .. })
        | (ForLoop { .. }, ForLoop { .. })
        | (Match { .. }, Match { .. })
        | (Return(_), Return(_))
        | (Break, Break)
        | (Continue, Continue)
        | (NestedContainer(_), NestedContainer(_)) => true,
        _ => false,
    }
}

/// Which top-level statement (index into `stmts`) produced the token at
/// `token_idx` of `stmts`'s flattened tokenization. Variations are keyed by
/// token position (§4.5), but truncation narrows `k` in statement units, so
/// the two need translating between.
fn stmt_index_for_token(unit: &CompilationUnit, stmts: &[StmtId], token_idx: usize) -> usize {
    let mut consumed = 0;
    for (i, &s) in stmts.iter().enumerate() {
        let count = crate::token::tokenize_stmt(unit, s).len();
        if token_idx < consumed + count {
            return i;
        }
        consumed += count;
    }
    stmts.len()
}

/// For each i < k, do the primary and every duplicate member share the same
/// top-level statement shape?
fn structural_compatible_len(primary: &StatementSequence, members: &[&StatementSequence]) -> usize {
    let max_check = members.iter().map(|m| m.len()).chain(std::iter::once(primary.len())).min().unwrap_or(0);
    let mut k = max_check;
    for i in 0..max_check {
        let ok = members.iter().all(|m| stmt_shape_matches(&primary.unit, primary.stmts[i], &m.unit, m.stmts[i]));
        if !ok {
            k = i;
            break;
        }
    }
    k
}

/// Compute the truncation length and (if resolvable) the primary's return
/// variable for a cluster's primary plus its duplicate members.
pub fn truncate_cluster(
    primary: &StatementSequence,
    members: &[&StatementSequence],
    variations: &[Variation],
) -> TruncationResult {
    let mut k = primary.len().min(members.iter().map(|m| m.len()).min().unwrap_or(primary.len()));
    k = k.min(structural_compatible_len(primary, members));

    if let Some(idx) = nested_return_before(&primary.unit, &primary.stmts, k) {
        k = idx;
    }
    for m in members {
        if let Some(idx) = nested_return_before(&m.unit, &m.stmts, k) {
            k = idx.min(k);
        }
    }

    // Single live-out: shrink k until every member's prefix has <= 1 live-out.
    loop {
        if k == 0 {
            break;
        }
        let mut ok = true;
        for seq in members.iter().copied().chain(std::iter::once(primary)) {
            let prefix = &seq.stmts[..k.min(seq.len())];
            let facts = dataflow::analyze(&seq.unit, prefix);
            let container = seq.unit.container(seq.container);
            let out = dataflow::live_out(&seq.unit, &container.body, seq.start_index, prefix.len(), &facts);
            if out.len() > 1 {
                ok = false;
                break;
            }
        }
        if ok {
            break;
        }
        k -= 1;
    }

    // Variations referencing internal (nested-scope) variables, or
    // universal-typed variations inside a return, force k down to that
    // variation's statement index. `Variation::primary_index` is a token
    // position (§4.5), so it must be translated to a statement index before
    // comparing against or assigning into k (a statement count).
    for v in variations {
        let stmt_idx = stmt_index_for_token(&primary.unit, &primary.stmts, v.primary_index);
        if stmt_idx >= k {
            continue;
        }
        let facts = dataflow::analyze(&primary.unit, &primary.stmts[..k.min(primary.len())]);
        let is_internal_ref = matches!(v.kind, VariationKind::Variable) && facts.internal_vars.contains(&v.value_a);
        let is_universal_in_return = matches!(v.kind, VariationKind::Type) && v.value_a == "dyn Any";
        if is_internal_ref || is_universal_in_return {
            k = stmt_idx;
        }
    }

    let prefix = &primary.stmts[..k.min(primary.len())];
    let facts = dataflow::analyze(&primary.unit, prefix);
    let container = primary.unit.container(primary.container);
    let out = dataflow::live_out(&primary.unit, &container.body, primary.start_index, prefix.len(), &facts);
    let return_var = out.iter().next().cloned().or_else(|| {
        prefix.iter().find_map(|&s| match &primary.unit.stmt(s).kind {
            StmtKind::Let { name, .. } if facts.returned.contains(name) => Some(name.clone()),
            _ => None,
        })
    });

    TruncationResult { k, primary_return_var: return_var }
}

pub fn universal_type() -> AstType {
    AstType::simple("dyn Any")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprId, ExprKind, ExprNode, LiteralKind, SourceSpan, StmtNode};

    #[test]
    fn universal_type_name() {
        assert_eq!(universal_type().name, "dyn Any");
    }

    /// Three `let` statements, each lowering to 3 tokens (`let`, name,
    /// literal) — token index 4 falls inside statement 1, not statement 4,
    /// so a caller comparing a token index directly against a statement
    /// count would badly undershoot or overshoot `k`.
    fn three_let_stmts_unit() -> CompilationUnit {
        let exprs = vec![
            ExprNode { kind: ExprKind::Literal(LiteralKind::Int("1".into())), span: SourceSpan::default(), inferred_type: None },
            ExprNode { kind: ExprKind::Literal(LiteralKind::Int("2".into())), span: SourceSpan::default(), inferred_type: None },
            ExprNode { kind: ExprKind::Literal(LiteralKind::Int("3".into())), span: SourceSpan::default(), inferred_type: None },
        ];
        let stmts = vec![
            StmtNode { kind: StmtKind::Let { name: "a".into(), ty: None, is_final: false, init: Some(ExprId(0)) }, span: SourceSpan::default() },
            StmtNode { kind: StmtKind::Let { name: "b".into(), ty: None, is_final: false, init: Some(ExprId(1)) }, span: SourceSpan::default() },
            StmtNode { kind: StmtKind::Let { name: "c".into(), ty: None, is_final: false, init: Some(ExprId(2)) }, span: SourceSpan::default() },
        ];
        CompilationUnit { file: "t.rs".into(), stmts, exprs, containers: Vec::new() }
    }

    #[test]
    fn stmt_index_for_token_translates_token_position_to_statement_index() {
        let unit = three_let_stmts_unit();
        let stmts = vec![StmtId(0), StmtId(1), StmtId(2)];
        // Each `let` lowers to 3 tokens: `let`, the bound name, the literal.
        assert_eq!(stmt_index_for_token(&unit, &stmts, 0), 0);
        assert_eq!(stmt_index_for_token(&unit, &stmts, 2), 0);
        assert_eq!(stmt_index_for_token(&unit, &stmts, 3), 1);
        assert_eq!(stmt_index_for_token(&unit, &stmts, 5), 1);
        assert_eq!(stmt_index_for_token(&unit, &stmts, 6), 2);
        // Past the end of the tokenization clamps to the statement count.
        assert_eq!(stmt_index_for_token(&unit, &stmts, 100), 3);
    }
}
