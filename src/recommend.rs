//! Recommendation Generator (§4.12): strategy selection, confidence
//! scoring, and name generation for a validated cluster.

use serde::{Deserialize, Serialize};

use crate::cluster::DuplicateCluster;
use crate::extractor::StatementSequence;
use crate::namer::{NameSuggester, NamingContext};
use crate::resolver::{ParameterSpec, ReturnTypeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    ExtractHelperMethod,
    ExtractToBeforeEach,
    ExtractToParameterizedTest,
    ExtractToUtilityClass,
    ExtractParentClass,
    ConstructorDelegation,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractHelperMethod => "EXTRACT_HELPER_METHOD",
            Self::ExtractToBeforeEach => "EXTRACT_TO_BEFORE_EACH",
            Self::ExtractToParameterizedTest => "EXTRACT_TO_PARAMETERIZED_TEST",
            Self::ExtractToUtilityClass => "EXTRACT_TO_UTILITY_CLASS",
            Self::ExtractParentClass => "EXTRACT_PARENT_CLASS",
            Self::ConstructorDelegation => "CONSTRUCTOR_DELEGATION",
        }
    }
}

/// A fully resolved refactoring proposal for one cluster (§3).
#[derive(Debug, Clone)]
pub struct RefactoringRecommendation {
    pub strategy: Strategy,
    pub name: String,
    pub parameters: Vec<ParameterSpec>,
    pub return_type: ReturnTypeResult,
    pub confidence: f64,
    pub estimated_lines_saved: i64,
    pub target_type: String,
}

fn is_test_file(path: &std::path::Path) -> bool {
    let s = path.to_string_lossy();
    s.contains("/tests/") || s.contains("\\tests\\") || s.ends_with("_test.rs") || s.ends_with("test.rs")
}

fn is_stateless(seq: &StatementSequence) -> bool {
    let container = seq.unit.container(seq.container);
    container.is_static
}

/// Strategy decision (§4.12), deterministic.
pub fn choose_strategy(primary: &StatementSequence, members: &[&StatementSequence]) -> Strategy {
    let all_test = std::iter::once(primary)
        .chain(members.iter().copied())
        .all(|s| is_test_file(&s.file));

    if !all_test {
        return Strategy::ExtractHelperMethod;
    }

    let owners: std::collections::HashSet<&str> = std::iter::once(primary)
        .chain(members.iter().copied())
        .map(|s| s.unit.container(s.container).owner_type.as_str())
        .collect();

    if owners.len() > 1 && is_stateless(primary) {
        return Strategy::ExtractToUtilityClass;
    }
    if owners.len() > 1 {
        let any_nested = std::iter::once(primary)
            .chain(members.iter().copied())
            .any(|s| s.unit.container(s.container).owner_nested);
        if !any_nested {
            return Strategy::ExtractParentClass;
        }
    }
    Strategy::ExtractHelperMethod
}

/// Confidence scoring (§4.12): starts at 1.0 and is multiplied down.
pub fn score_confidence(
    type_compat_safe: bool,
    param_count: usize,
    avg_similarity: f64,
    max_live_out: usize,
) -> f64 {
    let mut c = 1.0;
    if !type_compat_safe {
        c *= 0.5;
    }
    if param_count > 5 {
        c *= 0.7;
    }
    if avg_similarity < 0.85 {
        c *= 0.8;
    }
    if max_live_out > 1 {
        c *= 0.1;
    }
    c
}

/// Deterministic name heuristic (§4.12): derives a verb-object style name
/// from the most prominent method call in the primary sequence, falling
/// back to the owner type name.
pub fn heuristic_name(primary: &StatementSequence) -> String {
    let tokens = crate::token::tokenize_stmts(&primary.unit, &primary.stmts);
    let call = tokens
        .iter()
        .find(|t| matches!(t.kind, crate::token::TokenKind::MethodCall))
        .map(|t| t.raw.clone());
    match call {
        Some(name) => format!("extracted_{}", to_snake_case(&name)),
        None => {
            let owner = &primary.unit.container(primary.container).owner_type;
            format!("extracted_helper_{}", to_snake_case(owner))
        }
    }
}

fn to_snake_case(s: &str) -> String {
    let mut out = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c.is_alphanumeric() {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_') && !s.is_empty()
}

/// Placement type for the extracted helper (§4.12 "target placement"),
/// shared between the safety validator's name-collision check (§4.11 rule
/// 1, which needs it before a recommendation exists) and `generate` below.
pub fn target_type_for(strategy: Strategy, primary: &StatementSequence) -> String {
    let owner = &primary.unit.container(primary.container).owner_type;
    match strategy {
        Strategy::ExtractToUtilityClass => format!("{}Helpers", owner),
        Strategy::ExtractParentClass => format!("{}Base", owner),
        _ => owner.clone(),
    }
}

/// Build the final recommendation for one cluster.
#[allow(clippy::too_many_arguments)]
pub fn generate(
    cluster: &DuplicateCluster,
    primary: &StatementSequence,
    members: &[&StatementSequence],
    params: Vec<ParameterSpec>,
    return_type: ReturnTypeResult,
    type_compat_safe: bool,
    max_live_out: usize,
    namer: &dyn NameSuggester,
) -> RefactoringRecommendation {
    let strategy = choose_strategy(primary, members);
    let avg_similarity = if cluster.pairs.is_empty() {
        1.0
    } else {
        cluster.pairs.iter().map(|p| p.result.overall).sum::<f64>() / cluster.pairs.len() as f64
    };
    let confidence = score_confidence(type_compat_safe, params.len(), avg_similarity, max_live_out);

    let owner = &primary.unit.container(primary.container).owner_type;
    let ctx = NamingContext { owner_type: owner.clone(), strategy: strategy.as_str().to_string() };
    let snippet = crate::token::tokenize_stmts(&primary.unit, &primary.stmts)
        .into_iter()
        .map(|t| t.raw)
        .collect::<Vec<_>>()
        .join(" ");
    let name = namer
        .suggest(&snippet, &ctx)
        .filter(|n| is_valid_identifier(n))
        .unwrap_or_else(|| heuristic_name(primary));

    let target_type = target_type_for(strategy, primary);

    RefactoringRecommendation {
        strategy,
        name,
        parameters: params,
        return_type,
        confidence,
        estimated_lines_saved: cluster.estimated_loc_reduction,
        target_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_starts_at_one_and_degrades() {
        assert!((score_confidence(true, 2, 0.95, 1) - 1.0).abs() < 1e-9);
        assert!(score_confidence(false, 2, 0.95, 1) < 1.0);
        assert!(score_confidence(true, 6, 0.95, 1) < 1.0);
        assert!(score_confidence(true, 2, 0.95, 2) < 0.2);
    }

    #[test]
    fn snake_case_conversion() {
        assert_eq!(to_snake_case("setUserStatus"), "set_user_status");
    }

    #[test]
    fn identifier_validation() {
        assert!(is_valid_identifier("valid_name"));
        assert!(!is_valid_identifier("1invalid"));
        assert!(!is_valid_identifier(""));
    }
}
