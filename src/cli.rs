//! CLI argument definitions (§6): configuration options recognized by the
//! pipeline, exposed as flags with the documented defaults, plus the
//! `strict`/`lenient` presets.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{Config, Preset};
use crate::error::{CloneForgeError, Result};

/// Detects duplicate code and proposes helper-extraction refactorings.
#[derive(Parser, Debug)]
#[command(name = "cloneforge")]
#[command(about = "Detects duplicate code across a body of source files and proposes helper-extraction refactorings")]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Base path to scan for source files (required unless --config sets one)
    #[arg(value_name = "PATH")]
    pub base_path: Option<PathBuf>,

    /// Load configuration from a TOML file; CLI flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Apply the `strict` or `lenient` preset before other overrides
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Minimum statement count for a candidate sequence
    #[arg(long, value_name = "N")]
    pub min_lines: Option<usize>,

    /// Similarity threshold in [0,1] (accepts a percentage like "75" too)
    #[arg(long, value_name = "FLOAT")]
    pub threshold: Option<f64>,

    /// Disable the LSH candidate shortlist (falls back to all-pairs scoring)
    #[arg(long)]
    pub no_lsh: bool,

    /// Number of LSH bands
    #[arg(long, value_name = "N")]
    pub num_bands: Option<usize>,

    /// Rows per LSH band
    #[arg(long, value_name = "N")]
    pub rows_per_band: Option<usize>,

    /// Maximum window growth above `min_lines` when generating candidates
    #[arg(long, value_name = "N")]
    pub max_window_growth: Option<usize>,

    /// Report only maximal duplicate groups (drop sub-range duplicates)
    #[arg(long)]
    pub maximal_only: Option<bool>,

    /// Fully-qualified target type to place extracted helpers into
    #[arg(long, value_name = "TYPE")]
    pub target_class: Option<String>,

    /// Additional exclude glob, relative to base_path (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude_patterns: Vec<String>,

    /// Source file extensions to scan
    #[arg(long = "ext", value_name = "EXT", default_values = ["rs"])]
    pub extensions: Vec<String>,

    /// Output format for the recommendation report
    #[arg(short, long, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Write run metrics (CSV or JSON, by extension) to this path
    #[arg(long, value_name = "FILE")]
    pub metrics_out: Option<PathBuf>,

    /// Resume-file path tracking clusters already applied in a prior run
    #[arg(long, value_name = "FILE")]
    pub resume_file: Option<PathBuf>,

    /// Emit verbose progress logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PresetArg {
    Strict,
    Lenient,
}

impl From<PresetArg> for Preset {
    fn from(p: PresetArg) -> Self {
        match p {
            PresetArg::Strict => Preset::Strict,
            PresetArg::Lenient => Preset::Lenient,
        }
    }
}

/// Output format for the human/machine-readable recommendation report.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build a [`Config`] by layering, in increasing priority: defaults,
    /// an optional `--config` TOML file, an optional preset, then any
    /// explicit CLI flags.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_toml(path)?,
            None => Config::default(),
        };

        if let Some(preset) = self.preset {
            config.apply_preset(preset.into());
        }

        if let Some(base_path) = &self.base_path {
            config.base_path = base_path.clone();
        }
        if let Some(min_lines) = self.min_lines {
            config.min_lines = min_lines;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = normalize_threshold(threshold);
        }
        if self.no_lsh {
            config.enable_lsh = false;
        }
        if let Some(n) = self.num_bands {
            config.num_bands = n;
        }
        if let Some(n) = self.rows_per_band {
            config.rows_per_band = n;
        }
        if let Some(n) = self.max_window_growth {
            config.max_window_growth = n;
        }
        if let Some(maximal_only) = self.maximal_only {
            config.maximal_only = maximal_only;
        }
        if let Some(target_class) = &self.target_class {
            config.target_class = Some(target_class.clone());
        }
        if !self.exclude_patterns.is_empty() {
            config.exclude_patterns.extend(self.exclude_patterns.iter().cloned());
        }

        if config.base_path.as_os_str().is_empty() {
            return Err(CloneForgeError::Configuration { message: "base_path is required (positional argument or config file)".to_string() });
        }
        config.validate()?;
        Ok(config)
    }

    /// Extensions to scan, as `&str`s (clap stores them as `String`).
    pub fn extension_refs(&self) -> Vec<&str> {
        self.extensions.iter().map(String::as_str).collect()
    }
}

/// `--threshold` accepts either a fraction (`0.75`) or a percentage (`75`),
/// matching the documented config option (§6).
fn normalize_threshold(value: f64) -> f64 {
    if value > 1.0 {
        value / 100.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_threshold_accepts_percent_or_fraction() {
        assert_eq!(normalize_threshold(75.0), 0.75);
        assert_eq!(normalize_threshold(0.75), 0.75);
    }

    #[test]
    fn resolve_config_requires_base_path() {
        let cli = Cli {
            base_path: None,
            config: None,
            preset: None,
            min_lines: None,
            threshold: None,
            no_lsh: false,
            num_bands: None,
            rows_per_band: None,
            max_window_growth: None,
            maximal_only: None,
            target_class: None,
            exclude_patterns: Vec::new(),
            extensions: vec!["rs".to_string()],
            format: OutputFormat::Text,
            metrics_out: None,
            resume_file: None,
            verbose: false,
        };
        assert!(cli.resolve_config().is_err());
    }

    #[test]
    fn resolve_config_applies_preset_before_overrides() {
        let cli = Cli {
            base_path: Some(PathBuf::from(".")),
            config: None,
            preset: Some(PresetArg::Strict),
            min_lines: Some(3),
            threshold: None,
            no_lsh: false,
            num_bands: None,
            rows_per_band: None,
            max_window_growth: None,
            maximal_only: None,
            target_class: None,
            exclude_patterns: Vec::new(),
            extensions: vec!["rs".to_string()],
            format: OutputFormat::Text,
            metrics_out: None,
            resume_file: None,
            verbose: false,
        };
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.min_lines, 3);
        assert!(config.threshold > 0.75);
    }
}
