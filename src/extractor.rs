//! Statement Extractor (§4.1): enumerates candidate statement sequences from
//! every container by sliding a window across its top-level statements.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ast::{CompilationUnit, ContainerId, ContainerKind, SourceSpan, StmtId};
use crate::error::{CloneForgeError, Result};

/// A contiguous run of top-level statements from one container (§3).
#[derive(Debug, Clone)]
pub struct StatementSequence {
    pub file: Arc<std::path::PathBuf>,
    pub unit: Arc<CompilationUnit>,
    pub container: ContainerId,
    pub container_kind: ContainerKind,
    /// Index of `stmts[0]` within the container's top-level body.
    pub start_index: usize,
    pub stmts: Vec<StmtId>,
    pub span: SourceSpan,
}

impl StatementSequence {
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Deterministic ordering key used to pick cluster primaries (§5, §8):
    /// lexicographic by (path, start line, start column).
    pub fn order_key(&self) -> (String, usize, usize) {
        (self.file.display().to_string(), self.span.start_line, self.span.start_col)
    }
}

/// Sliding-window extraction parameters.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionConfig {
    pub min_statements: usize,
    pub max_window_growth: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { min_statements: 5, max_window_growth: 5 }
    }
}

/// Enumerate all candidate sequences in one compilation unit.
pub fn extract_sequences(
    unit: &Arc<CompilationUnit>,
    config: &ExtractionConfig,
) -> Result<Vec<StatementSequence>> {
    let mut out = Vec::new();
    for container in &unit.containers {
        if container.span == SourceSpan::default() && container.body.is_empty() {
            return Err(CloneForgeError::Extraction {
                container: container.name.clone(),
                reason: "container body has no source range".to_string(),
            });
        }
        let body = &container.body;
        if body.len() < config.min_statements {
            continue;
        }
        let max_len = (config.min_statements + config.max_window_growth).min(body.len());
        for len in config.min_statements..=max_len {
            for start in 0..=(body.len() - len) {
                let stmts = body[start..start + len].to_vec();
                let span = span_of_stmts(unit, &stmts);
                out.push(StatementSequence {
                    file: Arc::new(unit.file.clone()),
                    unit: Arc::clone(unit),
                    container: container.id,
                    container_kind: container.kind,
                    start_index: start,
                    stmts,
                    span,
                });
            }
        }
    }
    Ok(out)
}

/// Source span covering a contiguous run of statements, from the first's
/// start to the last's end. Exposed so boundary refinement can recompute a
/// sequence's span after trimming or extending it.
pub fn span_of_stmts(unit: &CompilationUnit, stmts: &[StmtId]) -> SourceSpan {
    let first = unit.stmt(stmts[0]).span;
    let last = unit.stmt(*stmts.last().expect("non-empty")).span;
    SourceSpan {
        start_line: first.start_line,
        start_col: first.start_col,
        end_line: last.end_line,
        end_col: last.end_col,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Container, ExprNode, StmtKind, StmtNode};

    fn dummy_unit(body_len: usize) -> Arc<CompilationUnit> {
        let stmts: Vec<StmtNode> = (0..body_len)
            .map(|i| StmtNode {
                kind: StmtKind::Break,
                span: SourceSpan { start_line: i + 1, start_col: 0, end_line: i + 1, end_col: 1 },
            })
            .collect();
        let container = Container {
            id: ContainerId(0),
            kind: ContainerKind::Method,
            name: "m".into(),
            is_static: false,
            owner_type: "T".into(),
            owner_nested: false,
            owner_is_enum: false,
            body: (0..body_len).map(|i| StmtId(i as u32)).collect(),
            span: SourceSpan { start_line: 1, start_col: 0, end_line: body_len, end_col: 1 },
            parent: None,
        };
        Arc::new(CompilationUnit {
            file: "t.rs".into(),
            stmts,
            exprs: Vec::<ExprNode>::new(),
            containers: vec![container],
        })
    }

    #[test]
    fn window_respects_min_and_max() {
        let unit = dummy_unit(8);
        let cfg = ExtractionConfig { min_statements: 3, max_window_growth: 2 };
        let seqs = extract_sequences(&unit, &cfg).unwrap();
        assert!(seqs.iter().all(|s| s.len() >= 3 && s.len() <= 5));
        assert!(seqs.iter().any(|s| s.len() == 3));
        assert!(seqs.iter().any(|s| s.len() == 5));
    }

    #[test]
    fn short_container_produces_no_sequences() {
        let unit = dummy_unit(2);
        let cfg = ExtractionConfig { min_statements: 5, max_window_growth: 5 };
        let seqs = extract_sequences(&unit, &cfg).unwrap();
        assert!(seqs.is_empty());
    }

    #[test]
    fn order_key_is_lexicographic_by_path_then_position() {
        let unit = dummy_unit(6);
        let cfg = ExtractionConfig { min_statements: 3, max_window_growth: 0 };
        let seqs = extract_sequences(&unit, &cfg).unwrap();
        let mut keys: Vec<_> = seqs.iter().map(|s| s.order_key()).collect();
        let sorted = {
            let mut k = keys.clone();
            k.sort();
            k
        };
        keys.sort();
        assert_eq!(keys, sorted);
    }
}
