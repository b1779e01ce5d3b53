//! Configuration (§6): recognized options, TOML file loading, and the
//! `strict`/`lenient` presets.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CloneForgeError, Result};
use crate::similarity::SimilarityWeights;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_path: PathBuf,
    pub min_lines: usize,
    pub threshold: f64,
    pub enable_lsh: bool,
    pub num_bands: usize,
    pub rows_per_band: usize,
    pub max_window_growth: usize,
    pub maximal_only: bool,
    pub similarity_weights: SimilarityWeights,
    pub exclude_patterns: Vec<String>,
    pub target_class: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            min_lines: 5,
            threshold: 0.75,
            enable_lsh: true,
            num_bands: 25,
            rows_per_band: 4,
            max_window_growth: 5,
            maximal_only: true,
            similarity_weights: SimilarityWeights::default(),
            exclude_patterns: default_excludes(),
            target_class: None,
        }
    }
}

fn default_excludes() -> Vec<String> {
    vec![
        "**/target/**".to_string(),
        "**/.git/**".to_string(),
        "**/tests/**".to_string(),
        "**/*_test.rs".to_string(),
        "**/build/**".to_string(),
    ]
}

/// `strict`/`lenient` presets override threshold and min_lines (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Strict,
    Lenient,
}

impl Config {
    pub fn apply_preset(&mut self, preset: Preset) {
        match preset {
            Preset::Strict => {
                self.threshold = 0.9;
                self.min_lines = 8;
            }
            Preset::Lenient => {
                self.threshold = 0.6;
                self.min_lines = 3;
            }
        }
    }

    pub fn load_toml(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| CloneForgeError::Configuration { message: e.to_string() })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_path.as_os_str().is_empty() && self.base_path == PathBuf::new() {
            return Err(CloneForgeError::Configuration { message: "base_path is required".to_string() });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(CloneForgeError::Configuration {
                message: format!("threshold must be in [0, 1], got {}", self.threshold),
            });
        }
        if self.min_lines == 0 {
            return Err(CloneForgeError::Configuration { message: "min_lines must be >= 1".to_string() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_preset_raises_threshold() {
        let mut cfg = Config::default();
        cfg.apply_preset(Preset::Strict);
        assert!(cfg.threshold > 0.75);
    }

    #[test]
    fn lenient_preset_lowers_threshold() {
        let mut cfg = Config::default();
        cfg.apply_preset(Preset::Lenient);
        assert!(cfg.threshold < 0.75);
    }

    #[test]
    fn invalid_threshold_rejected() {
        let mut cfg = Config::default();
        cfg.threshold = 1.5;
        assert!(cfg.validate().is_err());
    }
}
