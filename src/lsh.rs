//! LSH Index (§4.4, optional): bands-and-rows MinHash over shingles of
//! structural tags, used to shortlist candidate pairs before full scoring.
//! Disabling this index must never change which pairs end up in a cluster —
//! only how many comparisons it takes to find them.

use ahash::AHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::extractor::StatementSequence;
use crate::token::tokenize_stmts;

#[derive(Debug, Clone, Copy)]
pub struct LshConfig {
    pub num_bands: usize,
    pub rows_per_band: usize,
    pub shingle_size: usize,
}

impl Default for LshConfig {
    fn default() -> Self {
        Self { num_bands: 25, rows_per_band: 4, shingle_size: 3 }
    }
}

fn shingles(tags: &[String], k: usize) -> Vec<u64> {
    if tags.len() < k {
        return vec![hash_str(&tags.join("|"))];
    }
    tags.windows(k).map(|w| hash_str(&w.join("|"))).collect()
}

fn hash_str(s: &str) -> u64 {
    let mut h = AHasher::default();
    s.hash(&mut h);
    h.finish()
}

fn minhash(shingle_hashes: &[u64], num_hashes: usize) -> Vec<u64> {
    (0..num_hashes)
        .map(|seed| {
            shingle_hashes
                .iter()
                .map(|&h| h ^ (seed as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
                .min()
                .unwrap_or(0)
        })
        .collect()
}

/// A MinHash signature for one sequence, banded for LSH bucketing.
pub struct Signature {
    pub seq_index: usize,
    pub bands: Vec<u64>,
}

/// Build banded MinHash signatures for a set of sequences.
pub fn build_signatures(seqs: &[StatementSequence], config: &LshConfig) -> Vec<Signature> {
    let num_hashes = config.num_bands * config.rows_per_band;
    seqs.iter()
        .enumerate()
        .map(|(i, seq)| {
            let tags: Vec<String> = tokenize_stmts(&seq.unit, &seq.stmts)
                .into_iter()
                .map(|t| t.normalized_tag)
                .collect();
            let sh = shingles(&tags, config.shingle_size);
            let mh = minhash(&sh, num_hashes);
            let bands: Vec<u64> = mh
                .chunks(config.rows_per_band)
                .map(|chunk| {
                    let mut h = AHasher::default();
                    chunk.hash(&mut h);
                    h.finish()
                })
                .collect();
            Signature { seq_index: i, bands }
        })
        .collect()
}

/// Candidate pairs (by index into the input slice) that share at least one
/// LSH band. False negatives are possible (§4.4); false positives are
/// eliminated by the downstream similarity engine.
pub fn candidate_pairs(signatures: &[Signature]) -> Vec<(usize, usize)> {
    let mut buckets: HashMap<(usize, u64), Vec<usize>> = HashMap::new();
    for sig in signatures {
        for (band_idx, &band_hash) in sig.bands.iter().enumerate() {
            buckets.entry((band_idx, band_hash)).or_default().push(sig.seq_index);
        }
    }
    let mut seen = std::collections::HashSet::new();
    let mut pairs = Vec::new();
    for members in buckets.values() {
        if members.len() < 2 {
            continue;
        }
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                let (a, b) = (members[i].min(members[j]), members[i].max(members[j]));
                if seen.insert((a, b)) {
                    pairs.push((a, b));
                }
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_tag_sequences_land_in_same_band() {
        let tags = vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()];
        let cfg = LshConfig { num_bands: 4, rows_per_band: 2, shingle_size: 2 };
        let sh = shingles(&tags, cfg.shingle_size);
        let mh1 = minhash(&sh, cfg.num_bands * cfg.rows_per_band);
        let mh2 = minhash(&sh, cfg.num_bands * cfg.rows_per_band);
        assert_eq!(mh1, mh2);
    }

    #[test]
    fn short_tag_list_produces_one_shingle() {
        let tags = vec!["A".to_string()];
        let sh = shingles(&tags, 3);
        assert_eq!(sh.len(), 1);
    }
}
