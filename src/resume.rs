//! Resume log (§6): records which clusters a run has already acted on, so a
//! subsequent invocation over the same tree can skip them. One JSON object
//! per line, appended as clusters are applied.

use std::io::{BufRead, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cluster::DuplicateCluster;
use crate::error::{CloneForgeError, Result};
use crate::extractor::StatementSequence;

/// Stable identity for a cluster: a hash of its primary sequence's
/// file/line/column/token-count, independent of in-process indices.
pub type ClusterId = u64;

pub fn cluster_id(seqs: &[StatementSequence], cluster: &DuplicateCluster) -> ClusterId {
    use std::hash::{Hash, Hasher};
    let primary = &seqs[cluster.primary];
    let mut hasher = ahash::AHasher::default();
    primary.file.display().to_string().hash(&mut hasher);
    primary.span.start_line.hash(&mut hasher);
    primary.span.start_col.hash(&mut hasher);
    primary.len().hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeEntry {
    pub cluster_id: ClusterId,
    pub applied_at: DateTime<Utc>,
    pub strategy: String,
}

/// Ordered list of already-applied clusters, backed by a JSON-lines file.
#[derive(Debug, Default, Clone)]
pub struct ResumeLog {
    entries: Vec<ResumeEntry>,
}

impl ResumeLog {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: ResumeEntry = serde_json::from_str(&line)
                .map_err(|e| CloneForgeError::Configuration { message: format!("malformed resume log line: {e}") })?;
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    pub fn contains(&self, id: ClusterId) -> bool {
        self.entries.iter().any(|e| e.cluster_id == id)
    }

    pub fn record(&mut self, id: ClusterId, strategy: &str, applied_at: DateTime<Utc>) {
        self.entries.push(ResumeEntry { cluster_id: id, applied_at, strategy: strategy.to_string() });
    }

    pub fn append_to(&self, path: &Path, new_entries: &[ResumeEntry]) -> Result<()> {
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        for entry in new_entries {
            let line = serde_json::to_string(entry)
                .map_err(|e| CloneForgeError::Analysis { stage: "resume".into(), message: e.to_string() })?;
            writeln!(file, "{line}")?;
        }
        Ok(())
    }

    pub fn entries(&self) -> &[ResumeEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.jsonl");
        let mut log = ResumeLog::default();
        let now: DateTime<Utc> = DateTime::from_timestamp(0, 0).unwrap();
        log.record(42, "EXTRACT_HELPER_METHOD", now);
        log.append_to(&path, &log.entries().to_vec()).unwrap();

        let reloaded = ResumeLog::load(&path).unwrap();
        assert!(reloaded.contains(42));
        assert!(!reloaded.contains(7));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.jsonl");
        let log = ResumeLog::load(&path).unwrap();
        assert!(log.entries().is_empty());
    }
}
