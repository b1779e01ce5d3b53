//! Parameter & Return Resolver (§4.10): turns aggregated variations and
//! captured free variables into a concrete parameter list and return type.

use std::collections::HashSet;

use crate::ast::{AstType, ExprId, Resolver};
use crate::dataflow;
use crate::escape::free_variables;
use crate::extractor::StatementSequence;
use crate::variation::{Variation, VariationKind};

/// A resolved parameter (§3).
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub ty: AstType,
    pub example_a: String,
    pub example_b: String,
    pub variation_index: Option<usize>,
    pub line: usize,
}

/// Resolved return type plus, when applicable, the variable name the
/// extracted prefix should return (§3).
#[derive(Debug, Clone)]
pub struct ReturnTypeResult {
    pub ty: AstType,
    pub return_variable: Option<String>,
}

const WELL_KNOWN: &[&str] = &["Self", "String", "Vec", "Option", "Result", "HashMap", "HashSet"];

fn well_known_or_primitive(name: &str, resolver: &dyn Resolver) -> bool {
    WELL_KNOWN.contains(&name) || resolver.is_well_known(name)
}

/// Step 1-2: initial parameters from variations, plus captured free
/// variables not already covered by a variation.
pub fn initial_parameters(
    seq: &StatementSequence,
    variations: &[Variation],
    resolver: &dyn Resolver,
) -> Vec<ParameterSpec> {
    let mut params = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for v in variations {
        if matches!(v.kind, VariationKind::ControlFlow) {
            continue;
        }
        let name = format!("arg{}", v.primary_index);
        if !seen_names.insert(name.clone()) {
            continue;
        }
        let ty = v
            .expr_a
            .and_then(|e| resolver.resolve_type(&seq.unit, e))
            .unwrap_or_else(|| infer_literal_type(&v.value_a));
        params.push(ParameterSpec {
            name,
            ty,
            example_a: v.value_a.clone(),
            example_b: v.value_b.clone(),
            variation_index: Some(v.primary_index),
            line: seq.unit.stmt(seq.stmts[0]).span.start_line,
        });
    }

    let free = free_variables(&seq.unit, &seq.stmts);
    let owner_static_fields: HashSet<&str> = HashSet::new(); // best-effort: resolver doesn't expose field lists here.
    for name in free {
        if name == "this" || name == "super" || name == "self" {
            continue;
        }
        if well_known_or_primitive(&name, resolver) {
            continue;
        }
        if owner_static_fields.contains(name.as_str()) {
            continue;
        }
        if !seen_names.insert(name.clone()) {
            continue;
        }
        let facts = dataflow::analyze(&seq.unit, &seq.stmts);
        let ty = facts.type_map.get(&name).cloned().unwrap_or_else(|| AstType::simple("_"));
        params.push(ParameterSpec {
            name: name.clone(),
            ty,
            example_a: name.clone(),
            example_b: name,
            variation_index: None,
            line: seq.span.start_line,
        });
    }

    params
}

fn infer_literal_type(raw: &str) -> AstType {
    if raw.starts_with('"') {
        AstType::simple("String")
    } else if raw == "true" || raw == "false" {
        AstType::simple("bool")
    } else if raw.parse::<i64>().is_ok() {
        AstType::simple("i64")
    } else if raw.parse::<f64>().is_ok() {
        AstType::simple("f64")
    } else {
        AstType::simple("_")
    }
}

/// Step 3: drop parameters whose example value is internally defined, an
/// access on such a name, or resolves to void.
pub fn filter_internal_parameters(seq: &StatementSequence, params: Vec<ParameterSpec>) -> Vec<ParameterSpec> {
    let facts = dataflow::analyze(&seq.unit, &seq.stmts);
    params
        .into_iter()
        .filter(|p| {
            if p.ty.is_void() {
                return false;
            }
            let base = p.example_a.split('.').next().unwrap_or(&p.example_a);
            !facts.defined.contains(base)
        })
        .collect()
}

/// Step 4: for still-universally-typed parameters, try a narrower
/// context-based type (here: just the free-variable type map).
pub fn refine_universal_types(seq: &StatementSequence, mut params: Vec<ParameterSpec>) -> Vec<ParameterSpec> {
    let facts = dataflow::analyze(&seq.unit, &seq.stmts);
    for p in params.iter_mut() {
        if p.ty.name == "_" {
            if let Some(ty) = facts.type_map.get(&p.name) {
                p.ty = ty.clone();
            }
        }
    }
    params
}

/// Step 5: when truncated to `k`, drop parameters whose representative
/// location is past the last included statement.
pub fn drop_parameters_past_truncation(seq: &StatementSequence, params: Vec<ParameterSpec>, k: usize) -> Vec<ParameterSpec> {
    if k >= seq.len() {
        return params;
    }
    let cutoff_line = seq.unit.stmt(seq.stmts[k.saturating_sub(1).min(seq.len() - 1)]).span.end_line;
    params.into_iter().filter(|p| p.line <= cutoff_line).collect()
}

/// Full pipeline for one sequence's parameter list (§4.10 steps 1-5).
pub fn resolve_parameters(
    seq: &StatementSequence,
    variations: &[Variation],
    resolver: &dyn Resolver,
    truncated_k: Option<usize>,
) -> Vec<ParameterSpec> {
    let params = initial_parameters(seq, variations, resolver);
    let params = filter_internal_parameters(seq, params);
    let params = refine_universal_types(seq, params);
    match truncated_k {
        Some(k) => drop_parameters_past_truncation(seq, params, k),
        None => params,
    }
}

/// Return-type decision (§4.10): prefer the truncation's resolved return
/// variable type; otherwise unify each member's live-out/return type.
pub fn resolve_return_type(
    members: &[&StatementSequence],
    truncation_return_var: Option<&str>,
    resolver: &dyn Resolver,
) -> ReturnTypeResult {
    if let (Some(primary), Some(var_name)) = (members.first(), truncation_return_var) {
        let facts = dataflow::analyze(&primary.unit, &primary.stmts);
        if let Some(ty) = facts.type_map.get(var_name) {
            return ReturnTypeResult { ty: ty.clone(), return_variable: Some(var_name.to_string()) };
        }
    }

    let mut candidate: Option<AstType> = None;
    for seq in members {
        let facts = dataflow::analyze(&seq.unit, &seq.stmts);
        let container = seq.unit.container(seq.container);
        let out = dataflow::live_out(&seq.unit, &container.body, seq.start_index, seq.len(), &facts);
        if let Some(name) = out.iter().next() {
            if let Some(ty) = facts.type_map.get(name) {
                candidate = Some(unify(candidate, ty.clone()));
                continue;
            }
        }
        if let Some(name) = facts.returned.iter().next() {
            if let Some(ty) = facts.type_map.get(name) {
                candidate = Some(unify(candidate, ty.clone()));
            }
        }
    }

    let ty = candidate.unwrap_or_else(AstType::void);
    let return_variable = if !ty.is_void() {
        members.first().and_then(|seq| {
            let facts = dataflow::analyze(&seq.unit, &seq.stmts);
            let container = seq.unit.container(seq.container);
            let out = dataflow::live_out(&seq.unit, &container.body, seq.start_index, seq.len(), &facts);
            dataflow::find_return_variable(&seq.unit, &seq.stmts, &facts, &out, Some(&ty), resolver)
        })
    } else {
        None
    };

    ReturnTypeResult { ty, return_variable }
}

/// Unify two candidate types with preference: non-primitive > String > widest numeric.
fn unify(acc: Option<AstType>, next: AstType) -> AstType {
    match acc {
        None => next,
        Some(prev) => {
            let rank = |t: &AstType| -> u8 {
                if !t.is_primitive && t.name != "String" {
                    0
                } else if t.name == "String" {
                    1
                } else {
                    2
                }
            };
            if rank(&next) <= rank(&prev) {
                next
            } else {
                prev
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_type_inference() {
        assert_eq!(infer_literal_type("\"x\"").name, "String");
        assert_eq!(infer_literal_type("42").name, "i64");
        assert_eq!(infer_literal_type("true").name, "bool");
    }

    #[test]
    fn unify_prefers_non_primitive_over_string() {
        let result = unify(Some(AstType::simple("String")), AstType::simple("User"));
        assert_eq!(result.name, "User");
    }
}
