//! Orchestration (§5): wires extraction through to recommendations, running
//! file parsing and per-cluster analysis in parallel the way this lineage's
//! analysis driver parallelizes across files with `rayon` and an atomic
//! progress counter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::ast::{CompilationUnit, ParsedUnit, Resolver};
use crate::boundary;
use crate::cluster::{self, DuplicateCluster};
use crate::config::Config;
use crate::error::{Result, SkipReason, StageOutcome, ValidationIssue};
use crate::extractor::{self, ExtractionConfig, StatementSequence};
use crate::lsh::{self, LshConfig};
use crate::namer::NameSuggester;
use crate::recommend::{self, RefactoringRecommendation};
use crate::resolver;
use crate::resume::ResumeLog;
use crate::safety;
use crate::similarity::{self, SimilarityPair, SimilarityWeights};
use crate::truncate;

/// A cluster that was scored and clustered but rejected by the safety
/// validator, kept for reporting (§7).
pub struct SkippedCluster {
    pub primary_file: std::path::PathBuf,
    pub primary_line: usize,
    pub reason: SkipReason,
}

pub struct PipelineReport {
    pub files_scanned: usize,
    pub clusters: Vec<DuplicateCluster>,
    pub recommendations: Vec<RefactoringRecommendation>,
    pub skipped: Vec<SkippedCluster>,
}

/// Parse every file into a `CompilationUnit` in parallel, tracking progress
/// with an atomic counter (mirrors the file-level parallelism this
/// lineage's parallel analysis entry point uses).
pub fn parse_files<F>(paths: &[std::path::PathBuf], parse_one: F) -> Vec<ParsedUnit>
where
    F: Fn(&std::path::Path) -> Result<ParsedUnit> + Sync,
{
    let done = AtomicUsize::new(0);
    let total = paths.len();
    paths
        .par_iter()
        .filter_map(|path| {
            let result = parse_one(path);
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            if n % 50 == 0 || n == total {
                tracing::debug!(parsed = n, total, "parsing progress");
            }
            match result {
                Ok(unit) => Some(unit),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unparseable file");
                    None
                }
            }
        })
        .collect()
}

/// Extract every candidate sequence from every parsed unit.
pub fn extract_all(units: &[ParsedUnit], config: &ExtractionConfig) -> Vec<StatementSequence> {
    units
        .par_iter()
        .flat_map(|pu| match extractor::extract_sequences(&pu.unit, config) {
            Ok(seqs) => seqs,
            Err(e) => {
                tracing::warn!(file = %pu.unit.file.display(), error = %e, "extraction failed for unit");
                Vec::new()
            }
        })
        .collect()
}

/// Refine every candidate sequence's boundaries in parallel (§4.7): trim
/// trailing usage-only statements and extend over leading declarations it
/// depends on. Sequences that can't be refined without dropping below
/// `min_statements` are kept as extracted.
pub fn refine_all(seqs: Vec<StatementSequence>, min_statements: usize) -> Vec<StatementSequence> {
    seqs.into_par_iter()
        .map(|seq| {
            let container_body = seq.unit.container(seq.container).body.clone();
            boundary::refine_sequence(&seq, &container_body, min_statements).unwrap_or(seq)
        })
        .collect()
}

/// Score all (LSH-shortlisted, or all-pairs) candidate pairs in parallel.
pub fn score_pairs(seqs: &[StatementSequence], config: &Config) -> Vec<SimilarityPair> {
    let candidates: Vec<(usize, usize)> = if config.enable_lsh {
        let lsh_cfg = LshConfig {
            num_bands: config.num_bands,
            rows_per_band: config.rows_per_band,
            ..LshConfig::default()
        };
        let sigs = lsh::build_signatures(seqs, &lsh_cfg);
        lsh::candidate_pairs(&sigs)
    } else {
        let mut pairs = Vec::new();
        for i in 0..seqs.len() {
            for j in (i + 1)..seqs.len() {
                pairs.push((i, j));
            }
        }
        pairs
    };

    candidates
        .into_par_iter()
        .filter_map(|(a, b)| {
            let result = similarity::score_sequences(&seqs[a], &seqs[b], &config.similarity_weights);
            if similarity::passes_threshold(seqs[a].len(), seqs[b].len(), &result, config.threshold, config.min_lines)
            {
                Some(SimilarityPair { a, b, result })
            } else {
                None
            }
        })
        .collect()
}

/// Turn one clustered group into a recommendation, or a documented skip.
#[allow(clippy::too_many_arguments)]
fn analyze_cluster(
    seqs: &[StatementSequence],
    cluster: &DuplicateCluster,
    resolver: &dyn Resolver,
    namer: &dyn NameSuggester,
    resume: &ResumeLog,
) -> StageOutcome<RefactoringRecommendation> {
    let primary = &seqs[cluster.primary];
    let members: Vec<&StatementSequence> = cluster.members.iter().filter(|&&i| i != cluster.primary).map(|&i| &seqs[i]).collect();

    let id = crate::resume::cluster_id(seqs, cluster);
    if resume.contains(id) {
        return StageOutcome::Skipped(SkipReason::ExtractionFailed { reason: "already applied".to_string() });
    }

    let variations: Vec<_> = members
        .iter()
        .flat_map(|m| similarity::score_sequences(primary, m, &SimilarityWeights::default()).variations)
        .collect();

    let all_members: Vec<&StatementSequence> = std::iter::once(primary).chain(members.iter().copied()).collect();
    let truncation = truncate::truncate_cluster(primary, &members, &variations);

    let truncated_primary_stmts = primary.stmts[..truncation.k.min(primary.len())].to_vec();
    let mut truncated_primary = primary.clone();
    truncated_primary.stmts = truncated_primary_stmts;

    let params = resolver::resolve_parameters(&truncated_primary, &variations, resolver, Some(truncation.k));
    let return_type = resolver::resolve_return_type(&all_members, truncation.primary_return_var.as_deref(), resolver);

    let strategy = recommend::choose_strategy(primary, &members);
    let candidate_name = recommend::heuristic_name(primary);

    let target_type = recommend::target_type_for(strategy, primary);
    let mut existing_members: Vec<String> =
        all_members.iter().flat_map(|s| s.unit.member_names(&target_type)).collect();
    existing_members.sort();
    existing_members.dedup();

    let issues =
        safety::validate(primary, &members, &variations, &params, strategy, &candidate_name, &existing_members);
    if let Some(ValidationIssue::Error(reason)) = issues.into_iter().find(|i| matches!(i, ValidationIssue::Error(_))) {
        return StageOutcome::Skipped(reason);
    }

    let max_live_out = all_members
        .iter()
        .map(|s| {
            let facts = crate::dataflow::analyze(&s.unit, &s.stmts);
            let container = s.unit.container(s.container);
            crate::dataflow::live_out(&s.unit, &container.body, s.start_index, s.len(), &facts).len()
        })
        .max()
        .unwrap_or(0);

    // §4.12: confidence is docked when type compatibility isn't fully safe,
    // i.e. a parameter or the return type never resolved past the universal
    // placeholder (no concrete type could be inferred for it).
    let type_compat_safe =
        !return_type.ty.is_universal() && params.iter().all(|p| !p.ty.is_universal());

    let rec =
        recommend::generate(cluster, primary, &members, params, return_type, type_compat_safe, max_live_out, namer);
    StageOutcome::Ok(rec)
}

/// Run the full pipeline over an already-parsed set of compilation units.
pub fn run(
    units: &[ParsedUnit],
    config: &Config,
    namer: &dyn NameSuggester,
    resume: &ResumeLog,
) -> PipelineReport {
    let extraction_cfg = ExtractionConfig { min_statements: config.min_lines, max_window_growth: config.max_window_growth };
    let seqs = extract_all(units, &extraction_cfg);
    let seqs = refine_all(seqs, config.min_lines);
    let pairs = score_pairs(&seqs, config);
    let clusters = cluster::cluster_pairs(&seqs, pairs);

    let resolvers: Vec<Arc<dyn Resolver>> = units.iter().map(|pu| Arc::clone(&pu.resolver)).collect();
    let resolver_for = |unit: &CompilationUnit| -> Arc<dyn Resolver> {
        units
            .iter()
            .find(|pu| std::ptr::eq(pu.unit.as_ref(), unit))
            .map(|pu| Arc::clone(&pu.resolver))
            .unwrap_or_else(|| resolvers.first().cloned().expect("at least one parsed unit"))
    };

    let outcomes: Vec<(DuplicateCluster, StageOutcome<RefactoringRecommendation>)> = clusters
        .into_par_iter()
        .map(|cluster| {
            let resolver = resolver_for(&seqs[cluster.primary].unit);
            let outcome = analyze_cluster(&seqs, &cluster, resolver.as_ref(), namer, resume);
            (cluster, outcome)
        })
        .collect();

    let mut accepted: Vec<(DuplicateCluster, RefactoringRecommendation)> = Vec::new();
    let mut skipped = Vec::new();
    for (cluster, outcome) in outcomes {
        match outcome {
            StageOutcome::Ok(rec) => accepted.push((cluster, rec)),
            StageOutcome::Skipped(reason) => {
                let primary = &seqs[cluster.primary];
                skipped.push(SkippedCluster {
                    primary_file: primary.file.as_ref().clone(),
                    primary_line: primary.span.start_line,
                    reason,
                });
            }
        }
    }

    accepted.sort_by(|(a, _), (b, _)| crate::priority::compare(&seqs, a, b));
    let (clusters, recommendations): (Vec<_>, Vec<_>) = accepted.into_iter().unzip();

    PipelineReport { files_scanned: units.len(), clusters, recommendations, skipped }
}
