//! Variation Tracker (§4.5): aligns two token sequences and records where
//! (and how) they differ.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ast::ExprId;
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariationKind {
    Literal,
    Variable,
    MethodCall,
    Type,
    ControlFlow,
}

/// A single aligned differing pair, keyed by the primary side's index
/// (§3). `value_a`/`value_b` hold the raw text on each side.
#[derive(Debug, Clone)]
pub struct Variation {
    pub kind: VariationKind,
    pub primary_index: usize,
    pub value_a: String,
    pub value_b: String,
    pub expr_a: Option<ExprId>,
    pub expr_b: Option<ExprId>,
}

fn classify(tag: &str, kind: &TokenKind) -> VariationKind {
    if tag.starts_with("CONTROL_FLOW") {
        return VariationKind::ControlFlow;
    }
    match kind {
        TokenKind::StringLit
        | TokenKind::IntLit
        | TokenKind::LongLit
        | TokenKind::DoubleLit
        | TokenKind::BooleanLit
        | TokenKind::NullLit => VariationKind::Literal,
        TokenKind::Var => VariationKind::Variable,
        TokenKind::MethodCall => VariationKind::MethodCall,
        TokenKind::Type => VariationKind::Type,
        _ => VariationKind::Variable,
    }
}

/// Align two token sequences: positional when lengths match, otherwise an
/// LCS backtrace over structural matches, coalescing adjacent
/// deletion/insertion runs of the same kind into a single substitution
/// (§4.5).
pub fn align_tokens(a: &[Token], b: &[Token]) -> Vec<Variation> {
    if a.len() == b.len() {
        return a
            .iter()
            .zip(b)
            .enumerate()
            .filter_map(|(i, (x, y))| diff_if_needed(i, x, y))
            .collect();
    }
    lcs_backtrace(a, b)
}

fn diff_if_needed(i: usize, x: &Token, y: &Token) -> Option<Variation> {
    if x.raw == y.raw {
        None
    } else {
        Some(to_variation(i, x, y))
    }
}

fn to_variation(i: usize, x: &Token, y: &Token) -> Variation {
    Variation {
        kind: classify(&x.normalized_tag, &x.kind),
        primary_index: i,
        value_a: x.raw.clone(),
        value_b: y.raw.clone(),
        expr_a: x.expr,
        expr_b: y.expr,
    }
}

fn lcs_backtrace(a: &[Token], b: &[Token]) -> Vec<Variation> {
    let (n, m) = (a.len(), b.len());
    let mut dp = vec![vec![0usize; m + 1]; n + 1];
    for i in 1..=n {
        for j in 1..=m {
            dp[i][j] = if a[i - 1].structurally_matches(&b[j - 1]) {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }
    let mut ops: Vec<(Option<usize>, Option<usize>)> = Vec::new();
    let (mut i, mut j) = (n, m);
    while i > 0 && j > 0 {
        if a[i - 1].structurally_matches(&b[j - 1]) {
            ops.push((Some(i - 1), Some(j - 1)));
            i -= 1;
            j -= 1;
        } else if dp[i - 1][j] >= dp[i][j - 1] {
            ops.push((Some(i - 1), None));
            i -= 1;
        } else {
            ops.push((None, Some(j - 1)));
            j -= 1;
        }
    }
    while i > 0 {
        ops.push((Some(i - 1), None));
        i -= 1;
    }
    while j > 0 {
        ops.push((None, Some(j - 1)));
        j -= 1;
    }
    ops.reverse();

    // Coalesce adjacent (del, ins) runs of matched length into substitutions.
    let mut out = Vec::new();
    let mut k = 0;
    while k < ops.len() {
        match ops[k] {
            (Some(ai), Some(bi)) => {
                if let Some(v) = diff_if_needed(ai, &a[ai], &b[bi]) {
                    out.push(v);
                }
                k += 1;
            }
            (Some(_), None) | (None, Some(_)) => {
                let mut dels = Vec::new();
                let mut inss = Vec::new();
                while k < ops.len() {
                    match ops[k] {
                        (Some(ai), None) => {
                            dels.push(ai);
                            k += 1;
                        }
                        (None, Some(bi)) => {
                            inss.push(bi);
                            k += 1;
                        }
                        _ => break,
                    }
                }
                let pairs = dels.len().min(inss.len());
                for idx in 0..pairs {
                    out.push(to_variation(dels[idx], &a[dels[idx]], &b[inss[idx]]));
                }
                // unmatched leftovers (length mismatch) are recorded against
                // the primary side only, keyed by primary index.
                for &ai in dels.iter().skip(pairs) {
                    out.push(Variation {
                        kind: classify(&a[ai].normalized_tag, &a[ai].kind),
                        primary_index: ai,
                        value_a: a[ai].raw.clone(),
                        value_b: String::new(),
                        expr_a: a[ai].expr,
                        expr_b: None,
                    });
                }
            }
        }
    }
    out
}

/// Per-position, per-sequence raw value bindings (§3), grouped by variation
/// position for downstream parameter resolution.
pub fn value_bindings(variations: &[Variation]) -> HashMap<usize, (String, String)> {
    variations
        .iter()
        .map(|v| (v.primary_index, (v.value_a.clone(), v.value_b.clone())))
        .collect()
}

/// Whether any variation is a control-flow difference (§3 `hasControlFlowDifferences`).
pub fn has_control_flow_differences(variations: &[Variation]) -> bool {
    variations.iter().any(|v| v.kind == VariationKind::ControlFlow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(tag: &str, raw: &str) -> Token {
        Token {
            kind: match tag {
                "STRING_LIT" => TokenKind::StringLit,
                "VAR" => TokenKind::Var,
                _ => TokenKind::MethodCall,
            },
            raw: raw.to_string(),
            normalized_tag: tag.to_string(),
            line: 0,
            column: 0,
            expr: None,
        }
    }

    #[test]
    fn equal_length_identical_sequences_have_no_variations() {
        let a = vec![tok("VAR", "x"), tok("STRING_LIT", "\"a\"")];
        let b = a.clone();
        let vs = align_tokens(&a, &b);
        assert!(vs.is_empty());
    }

    #[test]
    fn literal_substitution_detected() {
        let a = vec![tok("VAR", "x"), tok("STRING_LIT", "\"PENDING\"")];
        let b = vec![tok("VAR", "x"), tok("STRING_LIT", "\"APPROVED\"")];
        let vs = align_tokens(&a, &b);
        assert_eq!(vs.len(), 1);
        assert_eq!(vs[0].kind, VariationKind::Literal);
        assert_eq!(vs[0].value_a, "\"PENDING\"");
        assert_eq!(vs[0].value_b, "\"APPROVED\"");
    }

    #[test]
    fn trailing_extra_statement_handled_by_backtrace() {
        let a = vec![tok("VAR", "x"), tok("VAR", "y")];
        let b = vec![tok("VAR", "x"), tok("VAR", "y"), tok("METHOD_CALL", "println")];
        let vs = align_tokens(&a, &b);
        assert!(vs.is_empty());
    }
}
