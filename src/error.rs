//! Error taxonomy and exit codes (§7).
//!
//! Recoverable stages don't propagate `Result` through the whole pipeline —
//! they return a [`StageOutcome`] so a failure degrades the affected cluster
//! instead of aborting the run (see SPEC_FULL.md's design notes). Only
//! configuration loading and collaborator-level failures are fatal.

use std::process::ExitCode;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloneForgeError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("extraction failed in container {container}: {reason}")]
    Extraction { container: String, reason: String },

    #[error("analysis error in {stage}: {message}")]
    Analysis { stage: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CloneForgeError {
    /// - 0: success
    /// - 1: I/O error
    /// - 2: configuration error
    /// - 3: parse failure
    /// - 4: internal analysis failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Configuration { .. } => ExitCode::from(2),
            Self::Parse { .. } => ExitCode::from(3),
            Self::Extraction { .. } | Self::Analysis { .. } => ExitCode::from(4),
            Self::Io(_) => ExitCode::from(1),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloneForgeError>;

/// The reason a cluster was reported-but-not-refactored (§7, §4.11).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SkipReason {
    NameCollision { name: String },
    InconsistentCapture,
    ControlFlowMismatch,
    TooManyParameters { count: usize },
    AssignsFinalField { field: String },
    AssignsFinalLocal { name: String },
    StrategyIncompatible { strategy: String, rule: String },
    ExtractionFailed { reason: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameCollision { name } => write!(f, "Suggested name '{name}' collides with an existing member"),
            Self::InconsistentCapture => write!(f, "Cannot extract code with inconsistent variable capture across duplicates"),
            Self::ControlFlowMismatch => write!(f, "Cannot extract code with differing control flow"),
            Self::TooManyParameters { count } => write!(f, "Extraction would require {count} parameters"),
            Self::AssignsFinalField { field } => write!(f, "Cannot extract code that assigns to final field '{field}'"),
            Self::AssignsFinalLocal { name } => write!(f, "Cannot extract code that assigns to final local variables ('{name}')"),
            Self::StrategyIncompatible { strategy, rule } => write!(f, "Cannot refactor using strategy {strategy}: {rule}"),
            Self::ExtractionFailed { reason } => write!(f, "Extraction failed: {reason}"),
        }
    }
}

/// Outcome of a recoverable pipeline stage: either a value, or a documented
/// reason the input was skipped. Distinct from `Result` so callers aren't
/// tempted to treat a skip as an exceptional control-flow path.
#[derive(Debug, Clone)]
pub enum StageOutcome<T> {
    Ok(T),
    Skipped(SkipReason),
}

impl<T> StageOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(v) => Some(v),
            Self::Skipped(_) => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// A non-fatal validation finding attached to a cluster (§4.11): either an
/// error that blocks the recommendation, or a warning that only lowers
/// confidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    Error(SkipReason),
    Warning(String),
}
