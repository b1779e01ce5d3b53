//! Safety Validator (§4.11): the final gate before a cluster becomes a
//! recommendation.

use std::collections::HashSet;

use crate::ast::{CompilationUnit, ContainerKind, StmtId, StmtKind};
use crate::error::{SkipReason, ValidationIssue};
use crate::escape::{assigned_names, escaping_writes};
use crate::extractor::StatementSequence;
use crate::recommend::Strategy;
use crate::resolver::ParameterSpec;
use crate::variation::{has_control_flow_differences, Variation};

/// Names of `let`-bound variables declared `final`-equivalent (`let` without
/// `mut` in Rust terms) inside the containing body, outside the sequence,
/// that the sequence assigns to.
fn final_local_assignment(unit: &CompilationUnit, container_body: &[StmtId], stmts: &[StmtId]) -> Option<String> {
    let finals: HashSet<String> = container_body
        .iter()
        .filter_map(|&s| match &unit.stmt(s).kind {
            StmtKind::Let { name, is_final: true, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();
    let defined_in_seq: HashSet<String> = stmts
        .iter()
        .filter_map(|&s| match &unit.stmt(s).kind {
            StmtKind::Let { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();
    let assigned = assigned_names(unit, stmts);
    assigned.into_iter().find(|name| finals.contains(name) && !defined_in_seq.contains(name))
}

/// Run all validation rules for a cluster's primary + duplicate members,
/// given resolved parameters and the chosen strategy. Returns every issue
/// found, most-severe first is not required — callers filter by variant.
pub fn validate(
    primary: &StatementSequence,
    members: &[&StatementSequence],
    variations: &[Variation],
    params: &[ParameterSpec],
    strategy: Strategy,
    suggested_name: &str,
    existing_members: &[String],
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    // Rule 1: name collision.
    if existing_members.iter().any(|m| m == suggested_name) {
        issues.push(ValidationIssue::Error(SkipReason::NameCollision { name: suggested_name.to_string() }));
    }

    // Rule 2: inconsistent capture across members.
    let primary_free = crate::escape::free_variables(&primary.unit, &primary.stmts);
    for m in members {
        let member_free = crate::escape::free_variables(&m.unit, &m.stmts);
        if primary_free.len() == member_free.len() && primary_free != member_free {
            issues.push(ValidationIssue::Error(SkipReason::InconsistentCapture));
            break;
        }
    }

    // Rule 3: control-flow variation present.
    if has_control_flow_differences(variations) {
        issues.push(ValidationIssue::Error(SkipReason::ControlFlowMismatch));
    }

    // Rule 4: more than five parameters (warning unless truncation failed to reduce size).
    if params.len() > 5 {
        issues.push(ValidationIssue::Warning(format!("extraction needs {} parameters", params.len())));
    }

    // Rule 5 & 6: final field / final local assignment.
    for seq in members.iter().copied().chain(std::iter::once(primary)) {
        let defined = crate::dataflow::analyze(&seq.unit, &seq.stmts).defined;
        for escaped in escaping_writes(&seq.unit, &seq.stmts, &defined) {
            if escaped.starts_with("self.") || escaped.contains("::") {
                issues.push(ValidationIssue::Error(SkipReason::AssignsFinalField { field: escaped }));
            } else {
                issues.push(ValidationIssue::Error(SkipReason::AssignsFinalLocal { name: escaped }));
            }
        }
        let container = seq.unit.container(seq.container);
        if let Some(name) = final_local_assignment(&seq.unit, &container.body, &seq.stmts) {
            issues.push(ValidationIssue::Error(SkipReason::AssignsFinalLocal { name }));
        }
    }

    // Rule 7: EXTRACT_PARENT_CLASS rejected for nested/enum owner types.
    if strategy == Strategy::ExtractParentClass {
        let owner_unsuitable = members
            .iter()
            .copied()
            .chain(std::iter::once(primary))
            .any(|seq| {
                let owner = &seq.unit.container(seq.container);
                owner.owner_nested || owner.owner_is_enum
            });
        if owner_unsuitable {
            issues.push(ValidationIssue::Error(SkipReason::StrategyIncompatible {
                strategy: "EXTRACT_PARENT_CLASS".to_string(),
                rule: "owner type is nested or an enum".to_string(),
            }));
        }
    }

    issues
}

/// Is this container kind ever eligible for lambda-specific static
/// resolution concerns noted in the resolver? Kept here as a convenience
/// predicate used by the recommendation generator's placement logic.
pub fn placement_container_kind(kind: ContainerKind) -> &'static str {
    match kind {
        ContainerKind::Method => "method",
        ContainerKind::Constructor => "constructor",
        ContainerKind::StaticInit => "static initializer",
        ContainerKind::InstanceInit => "instance initializer",
        ContainerKind::Lambda => "lambda",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::ast::{Container, ExprId, ExprKind, ExprNode, LiteralKind, SourceSpan, StmtNode};

    fn one_stmt_seq() -> StatementSequence {
        let exprs = vec![ExprNode {
            kind: ExprKind::Literal(LiteralKind::Int("1".into())),
            span: SourceSpan::default(),
            inferred_type: None,
        }];
        let stmts = vec![StmtNode {
            kind: StmtKind::Let { name: "x".into(), ty: None, is_final: false, init: Some(ExprId(0)) },
            span: SourceSpan::default(),
        }];
        let container = Container {
            id: crate::ast::ContainerId(0),
            kind: ContainerKind::Method,
            name: "m".into(),
            is_static: false,
            owner_type: "T".into(),
            owner_nested: false,
            owner_is_enum: false,
            body: vec![StmtId(0)],
            span: SourceSpan::default(),
            parent: None,
        };
        let unit = Arc::new(CompilationUnit { file: "t.rs".into(), stmts, exprs, containers: vec![container] });
        StatementSequence {
            file: Arc::new("t.rs".into()),
            unit,
            container: crate::ast::ContainerId(0),
            container_kind: ContainerKind::Method,
            start_index: 0,
            stmts: vec![StmtId(0)],
            span: SourceSpan::default(),
        }
    }

    #[test]
    fn placement_names_are_stable() {
        assert_eq!(placement_container_kind(ContainerKind::Method), "method");
        assert_eq!(placement_container_kind(ContainerKind::Lambda), "lambda");
    }

    #[test]
    fn rule_1_flags_name_collision_with_existing_member() {
        let seq = one_stmt_seq();
        let existing = vec!["helper".to_string(), "other".to_string()];
        let issues = validate(&seq, &[], &[], &[], Strategy::ExtractHelperMethod, "helper", &existing);
        assert!(issues.iter().any(|i| matches!(i, ValidationIssue::Error(SkipReason::NameCollision { name }) if name == "helper")));
    }

    #[test]
    fn rule_1_allows_a_name_not_already_a_member() {
        let seq = one_stmt_seq();
        let existing = vec!["other".to_string()];
        let issues = validate(&seq, &[], &[], &[], Strategy::ExtractHelperMethod, "helper", &existing);
        assert!(!issues.iter().any(|i| matches!(i, ValidationIssue::Error(SkipReason::NameCollision { .. }))));
    }
}
