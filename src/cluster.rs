//! Clusterer (§4.8): connected components over the similarity graph, with
//! deterministic primary selection and output ordering (§5, §8).

use std::collections::{HashMap, HashSet};

use crate::extractor::StatementSequence;
use crate::similarity::SimilarityPair;

/// A maximal duplicate group (§3): a primary sequence plus every pair
/// connecting it (transitively) to the rest of the cluster.
pub struct DuplicateCluster {
    pub primary: usize,
    pub members: Vec<usize>,
    pub pairs: Vec<SimilarityPair>,
    pub estimated_loc_reduction: i64,
}

/// Union-find over sequence indices, then group by root. Components of size
/// 1 (no accepted pair) are dropped — a cluster needs at least two members
/// (§3 invariant).
pub fn cluster_pairs(seqs: &[StatementSequence], pairs: Vec<SimilarityPair>) -> Vec<DuplicateCluster> {
    let mut parent: Vec<usize> = (0..seqs.len()).collect();

    fn find(parent: &mut Vec<usize>, x: usize) -> usize {
        if parent[x] != x {
            parent[x] = find(parent, parent[x]);
        }
        parent[x]
    }
    fn union(parent: &mut Vec<usize>, a: usize, b: usize) {
        let (ra, rb) = (find(parent, a), find(parent, b));
        if ra != rb {
            parent[ra.max(rb)] = ra.min(rb);
        }
    }

    for p in &pairs {
        union(&mut parent, p.a, p.b);
    }

    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..seqs.len() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(i);
    }

    let mut pairs_by_root: HashMap<usize, Vec<SimilarityPair>> = HashMap::new();
    for p in pairs {
        let root = find(&mut parent, p.a);
        pairs_by_root.entry(root).or_default().push(p);
    }

    let mut clusters: Vec<DuplicateCluster> = groups
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(root, members)| {
            let primary = members
                .iter()
                .copied()
                .min_by_key(|&i| seqs[i].order_key())
                .expect("non-empty group");
            let member_pairs = pairs_by_root.remove(&root).unwrap_or_default();
            let loc = loc_reduction(seqs, &members);
            DuplicateCluster { primary, members, pairs: member_pairs, estimated_loc_reduction: loc }
        })
        .collect();

    // Output order: LOC reduction descending, lexicographic tie-break on
    // primary's order key (§5, §8).
    clusters.sort_by(|a, b| {
        b.estimated_loc_reduction
            .cmp(&a.estimated_loc_reduction)
            .then_with(|| seqs[a.primary].order_key().cmp(&seqs[b.primary].order_key()))
    });
    clusters
}

/// Σ(duplicate.size) − (members − 1) − 1: every duplicate's lines vanish
/// except a one-line call site, minus the helper declaration itself (§4.8).
fn loc_reduction(seqs: &[StatementSequence], members: &[usize]) -> i64 {
    let total: i64 = members.iter().map(|&i| seqs[i].len() as i64).sum();
    total - (members.len() as i64 - 1) - 1
}

/// Re-clustering an already-clustered result must produce the same
/// partition (§8 idempotence). Exposed so pipeline/tests can verify this
/// directly on a cluster's own members and pairs.
pub fn is_idempotent(seqs: &[StatementSequence], pairs: &[SimilarityPair]) -> bool {
    let first = cluster_pairs(seqs, pairs.to_vec());
    let member_sets: Vec<HashSet<usize>> = first.iter().map(|c| c.members.iter().copied().collect()).collect();
    let second = cluster_pairs(seqs, pairs.to_vec());
    let member_sets_2: Vec<HashSet<usize>> = second.iter().map(|c| c.members.iter().copied().collect()).collect();
    member_sets == member_sets_2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Container, ContainerId, ContainerKind, ExprNode, SourceSpan, StmtKind, StmtNode};
    use crate::similarity::SimilarityResult;
    use std::sync::Arc;

    fn seq_at(line: usize) -> StatementSequence {
        let container = Container {
            id: ContainerId(0),
            kind: ContainerKind::Method,
            name: "m".into(),
            is_static: false,
            owner_type: "T".into(),
            owner_nested: false,
            owner_is_enum: false,
            body: vec![],
            span: SourceSpan::default(),
            parent: None,
        };
        let unit = Arc::new(crate::ast::CompilationUnit {
            file: "t.rs".into(),
            stmts: vec![StmtNode { kind: StmtKind::Break, span: SourceSpan::default() }],
            exprs: Vec::<ExprNode>::new(),
            containers: vec![container],
        });
        StatementSequence {
            file: Arc::new("t.rs".into()),
            unit,
            container: ContainerId(0),
            container_kind: ContainerKind::Method,
            start_index: 0,
            stmts: vec![crate::ast::StmtId(0)],
            span: SourceSpan { start_line: line, start_col: 0, end_line: line, end_col: 1 },
        }
    }

    fn dummy_result() -> SimilarityResult {
        SimilarityResult { overall: 0.9, lcs_ratio: 0.9, edit_ratio: 0.9, structural_ratio: 0.9, variations: vec![] }
    }

    #[test]
    fn connected_pairs_form_one_cluster_with_lexicographic_primary() {
        let seqs = vec![seq_at(10), seq_at(3), seq_at(7)];
        let pairs = vec![
            SimilarityPair { a: 0, b: 1, result: dummy_result() },
            SimilarityPair { a: 1, b: 2, result: dummy_result() },
        ];
        let clusters = cluster_pairs(&seqs, pairs);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].primary, 1); // line 3 is lexicographically earliest
        assert_eq!(clusters[0].members.len(), 3);
    }

    #[test]
    fn singleton_components_are_dropped() {
        let seqs = vec![seq_at(1), seq_at(2), seq_at(3)];
        let pairs = vec![SimilarityPair { a: 0, b: 1, result: dummy_result() }];
        let clusters = cluster_pairs(&seqs, pairs);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 2);
    }

    #[test]
    fn clustering_is_idempotent() {
        let seqs = vec![seq_at(1), seq_at(2), seq_at(3)];
        let pairs = vec![
            SimilarityPair { a: 0, b: 1, result: dummy_result() },
            SimilarityPair { a: 1, b: 2, result: dummy_result() },
        ];
        assert!(is_idempotent(&seqs, &pairs));
    }
}
