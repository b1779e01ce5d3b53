//! Escape/closure/mutability auxiliary predicates (§4's "Escape/Closure/
//! Mutability" component), used by the safety validator and the boundary
//! refiner.

use std::collections::HashSet;

use crate::ast::{CompilationUnit, ExprId, ExprKind, StmtId, StmtKind};

/// Names assigned to (not merely read) anywhere within `stmts`, at any
/// nesting depth. Used to detect escaping writes to outer-scope variables.
pub fn assigned_names(unit: &CompilationUnit, stmts: &[StmtId]) -> HashSet<String> {
    let mut out = HashSet::new();
    for &s in stmts {
        collect_assigned(unit, s, &mut out);
    }
    out
}

fn collect_assigned(unit: &CompilationUnit, id: StmtId, out: &mut HashSet<String>) {
    match &unit.stmt(id).kind {
        StmtKind::Assign { target, .. } => {
            if let ExprKind::Ident(name) = &unit.expr(*target).kind {
                out.insert(name.clone());
            }
        }
        StmtKind::If { then_branch, else_branch, .. } => {
            for s in then_branch.iter().chain(else_branch) {
                collect_assigned(unit, *s, out);
            }
        }
        StmtKind::While { body, .. } | StmtKind::ForLoop { body, .. } => {
            for s in body {
                collect_assigned(unit, *s, out);
            }
        }
        StmtKind::Match { arms, .. } => {
            for arm in arms {
                for s in arm {
                    collect_assigned(unit, *s, out);
                }
            }
        }
        _ => {}
    }
}

/// A write that targets a name not defined anywhere inside the sequence
/// "escapes" to an outer scope — the sequence mutates state its caller
/// cannot see through the extracted helper's parameter list (scenario 4,
/// §8).
pub fn escaping_writes(unit: &CompilationUnit, stmts: &[StmtId], defined: &HashSet<String>) -> Vec<String> {
    assigned_names(unit, stmts)
        .into_iter()
        .filter(|name| !defined.contains(name))
        .collect()
}

/// Whether a nested-return statement exists below top level within the
/// first `limit` top-level statements (used by the truncator, §4.9).
pub fn nested_return_before(unit: &CompilationUnit, stmts: &[StmtId], limit: usize) -> Option<usize> {
    for (i, &s) in stmts.iter().enumerate().take(limit) {
        if contains_return_below_top(unit, s, 0) {
            return Some(i);
        }
    }
    None
}

fn contains_return_below_top(unit: &CompilationUnit, id: StmtId, depth: usize) -> bool {
    match &unit.stmt(id).kind {
        StmtKind::Return(_) => depth > 0,
        StmtKind::If { then_branch, else_branch, .. } => {
            then_branch.iter().chain(else_branch).any(|&s| contains_return_below_top(unit, s, depth + 1))
        }
        StmtKind::While { body, .. } | StmtKind::ForLoop { body, .. } => {
            body.iter().any(|&s| contains_return_below_top(unit, s, depth + 1))
        }
        StmtKind::Match { arms, .. } => arms.iter().flatten().any(|&s| contains_return_below_top(unit, s, depth + 1)),
        _ => false,
    }
}

/// Names used-but-not-defined in `stmts` — candidates for captured
/// parameters (§4.10), before filtering out `self`/well-knowns/etc.
pub fn free_variables(unit: &CompilationUnit, stmts: &[StmtId]) -> HashSet<String> {
    let facts = crate::dataflow::analyze(unit, stmts);
    facts.used.difference(&facts.defined).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprNode, SourceSpan, StmtNode};

    #[test]
    fn detects_escaping_write_to_outer_counter() {
        let exprs = vec![
            ExprNode { kind: ExprKind::Ident("counter".into()), span: SourceSpan::default(), inferred_type: None },
            ExprNode { kind: ExprKind::Literal(crate::ast::LiteralKind::Int("1".into())), span: SourceSpan::default(), inferred_type: None },
        ];
        let stmts = vec![StmtNode {
            kind: StmtKind::Assign { target: ExprId(0), value: ExprId(1) },
            span: SourceSpan::default(),
        }];
        let unit = CompilationUnit { file: "t.rs".into(), stmts, exprs, containers: Vec::new() };
        let defined = HashSet::new();
        let escaping = escaping_writes(&unit, &[StmtId(0)], &defined);
        assert_eq!(escaping, vec!["counter".to_string()]);
    }
}
