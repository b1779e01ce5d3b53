//! Similarity engine performance benchmarks
//!
//! Measures scoring latency for normalized-token sequences of various sizes
//! and divergence, since `score_tokens` is the innermost loop of pairwise
//! candidate scoring (O(n*m) LCS + edit distance per pair).
//!
//! Run with: cargo bench --bench similarity

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cloneforge::similarity::{score_tokens, SimilarityWeights};
use cloneforge::token::{Token, TokenKind};

fn tok(tag: &str) -> Token {
    Token {
        kind: TokenKind::Var,
        raw: tag.to_string(),
        normalized_tag: tag.to_string(),
        line: 0,
        column: 0,
        expr: None,
    }
}

/// A sequence of `len` structurally-varied tokens, cycling through a small
/// alphabet so the LCS/edit-distance DP tables aren't trivially degenerate.
fn synthetic_sequence(len: usize) -> Vec<Token> {
    const ALPHABET: &[&str] = &["VAR", "METHOD_CALL", "STRING_LIT", "CONTROL_FLOW(if)", "TYPE"];
    (0..len).map(|i| tok(ALPHABET[i % ALPHABET.len()])).collect()
}

/// Same shape as `synthetic_sequence` but with every `skip`th token swapped
/// for a different tag, simulating near-duplicate candidate pairs with a
/// handful of literal/variable variations.
fn synthetic_variant(len: usize, skip: usize) -> Vec<Token> {
    const ALPHABET: &[&str] = &["VAR", "METHOD_CALL", "STRING_LIT", "CONTROL_FLOW(if)", "TYPE"];
    (0..len)
        .map(|i| {
            if skip > 0 && i % skip == 0 {
                tok("INT_LIT")
            } else {
                tok(ALPHABET[i % ALPHABET.len()])
            }
        })
        .collect()
}

fn bench_identical_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_tokens_identical");
    let weights = SimilarityWeights::default();

    for &len in &[5usize, 10, 20, 40] {
        let seq = synthetic_sequence(len);
        group.throughput(Throughput::Elements((len * len) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| score_tokens(black_box(&seq), black_box(&seq), black_box(&weights)));
        });
    }
    group.finish();
}

fn bench_near_duplicate_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_tokens_near_duplicate");
    let weights = SimilarityWeights::default();

    for &len in &[5usize, 10, 20, 40] {
        let a = synthetic_sequence(len);
        let b = synthetic_variant(len, 4);
        group.throughput(Throughput::Elements((len * len) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b_, _| {
            b_.iter(|| score_tokens(black_box(&a), black_box(&b), black_box(&weights)));
        });
    }
    group.finish();
}

fn bench_disjoint_pairs(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_tokens_disjoint");
    let weights = SimilarityWeights::default();

    for &len in &[5usize, 10, 20, 40] {
        let a = synthetic_sequence(len);
        let b: Vec<Token> = (0..len).map(|i| tok(&format!("UNIQUE_{i}"))).collect();
        group.throughput(Throughput::Elements((len * len) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |bencher, _| {
            bencher.iter(|| score_tokens(black_box(&a), black_box(&b), black_box(&weights)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_identical_pairs, bench_near_duplicate_pairs, bench_disjoint_pairs);
criterion_main!(benches);
