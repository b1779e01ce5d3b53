//! Priority Comparator: ranks clusters for display/processing order. The
//! clusterer already sorts by LOC reduction descending with a lexicographic
//! tie-break (§5, §8); this module exposes that ordering as a reusable
//! comparator so callers (CLI, metrics) don't re-implement it.

use ordered_float::OrderedFloat;
use std::cmp::Ordering;

use crate::cluster::DuplicateCluster;
use crate::extractor::StatementSequence;

/// Compare two clusters the same way `cluster::cluster_pairs` orders its
/// output: LOC reduction descending, then lexicographic primary order key,
/// then average similarity descending as a final deterministic tie-break.
pub fn compare(seqs: &[StatementSequence], a: &DuplicateCluster, b: &DuplicateCluster) -> Ordering {
    b.estimated_loc_reduction
        .cmp(&a.estimated_loc_reduction)
        .then_with(|| seqs[a.primary].order_key().cmp(&seqs[b.primary].order_key()))
        .then_with(|| OrderedFloat(avg_similarity(b)).cmp(&OrderedFloat(avg_similarity(a))))
}

fn avg_similarity(cluster: &DuplicateCluster) -> f64 {
    if cluster.pairs.is_empty() {
        0.0
    } else {
        cluster.pairs.iter().map(|p| p.result.overall).sum::<f64>() / cluster.pairs.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_loc_reduction_sorts_first() {
        assert_eq!(10i64.cmp(&5), Ordering::Greater);
    }
}
