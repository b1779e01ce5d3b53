//! Metrics exporter (§6): summary statistics for a completed run, written as
//! CSV or JSON depending on the output path's extension.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cluster::DuplicateCluster;
use crate::error::{CloneForgeError, Result};
use crate::recommend::RefactoringRecommendation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    pub files_scanned: usize,
    pub duplicate_sequences: usize,
    pub cluster_count: usize,
    pub estimated_loc_reduction: i64,
    pub average_similarity: f64,
    pub strategy_histogram: HashMap<String, usize>,
}

impl RunMetrics {
    pub fn collect(
        files_scanned: usize,
        clusters: &[DuplicateCluster],
        recommendations: &[RefactoringRecommendation],
    ) -> Self {
        let duplicate_sequences: usize = clusters.iter().map(|c| c.members.len()).sum();
        let estimated_loc_reduction: i64 = clusters.iter().map(|c| c.estimated_loc_reduction).sum();

        let pair_count: usize = clusters.iter().map(|c| c.pairs.len()).sum();
        let similarity_sum: f64 = clusters.iter().flat_map(|c| c.pairs.iter()).map(|p| p.result.overall).sum();
        let average_similarity = if pair_count == 0 { 0.0 } else { similarity_sum / pair_count as f64 };

        let mut strategy_histogram: HashMap<String, usize> = HashMap::new();
        for rec in recommendations {
            *strategy_histogram.entry(rec.strategy.as_str().to_string()).or_insert(0) += 1;
        }

        Self {
            files_scanned,
            duplicate_sequences,
            cluster_count: clusters.len(),
            estimated_loc_reduction,
            average_similarity,
            strategy_histogram,
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                let text = serde_json::to_string_pretty(self)
                    .map_err(|e| CloneForgeError::Analysis { stage: "metrics".into(), message: e.to_string() })?;
                std::fs::write(path, text)?;
            }
            _ => self.write_csv(path)?,
        }
        Ok(())
    }

    fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
        writer
            .write_record([
                "files_scanned",
                "duplicate_sequences",
                "cluster_count",
                "estimated_loc_reduction",
                "average_similarity",
            ])
            .map_err(csv_err)?;
        writer
            .write_record([
                self.files_scanned.to_string(),
                self.duplicate_sequences.to_string(),
                self.cluster_count.to_string(),
                self.estimated_loc_reduction.to_string(),
                self.average_similarity.to_string(),
            ])
            .map_err(csv_err)?;
        writer.write_record(["strategy", "count"]).map_err(csv_err)?;
        let mut strategies: Vec<_> = self.strategy_histogram.iter().collect();
        strategies.sort_by_key(|(name, _)| name.clone());
        for (name, count) in strategies {
            writer.write_record([name.as_str(), &count.to_string()]).map_err(csv_err)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn csv_err(e: csv::Error) -> CloneForgeError {
    CloneForgeError::Analysis { stage: "metrics".into(), message: e.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn collect_handles_empty_run() {
        let metrics = RunMetrics::collect(0, &[], &[]);
        assert_eq!(metrics.cluster_count, 0);
        assert_eq!(metrics.average_similarity, 0.0);
    }

    #[test]
    fn json_round_trips() {
        let metrics = RunMetrics {
            files_scanned: 3,
            duplicate_sequences: 4,
            cluster_count: 2,
            estimated_loc_reduction: 10,
            average_similarity: 0.9,
            strategy_histogram: HashMap::new(),
        };
        let text = serde_json::to_string(&metrics).unwrap();
        let back: RunMetrics = serde_json::from_str(&text).unwrap();
        assert_eq!(back.files_scanned, 3);
    }
}
