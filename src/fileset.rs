//! File enumerator collaborator (§6): walks a base path honoring
//! `.gitignore` plus configured include/exclude globs. Grounded on the
//! `ignore::WalkBuilder` usage this lineage's ripgrep-backed search module
//! relies on for gitignore-aware traversal.

use std::path::{Path, PathBuf};

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

use crate::error::{CloneForgeError, Result};

/// Enumerate source files under `base_path`, respecting `.gitignore` and the
/// configured exclude globs (default-excludes test trees, build output, and
/// VCS metadata per §6).
pub fn enumerate_files(base_path: &Path, exclude_patterns: &[String], extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut overrides = OverrideBuilder::new(base_path);
    for pattern in exclude_patterns {
        let negated = format!("!{pattern}");
        overrides
            .add(&negated)
            .map_err(|e| CloneForgeError::Configuration { message: format!("invalid exclude pattern {pattern}: {e}") })?;
    }
    let overrides = overrides
        .build()
        .map_err(|e| CloneForgeError::Configuration { message: e.to_string() })?;

    let mut walker = WalkBuilder::new(base_path);
    walker.overrides(overrides).git_ignore(true).git_global(true).git_exclude(true).hidden(true);

    let mut files = Vec::new();
    for entry in walker.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if extensions.is_empty() || extensions.contains(&ext) {
                files.push(path.to_path_buf());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Pluggable "is this a test file" predicate (§9 open question): default
/// heuristic matches a `Test`/`test` suffix in the file stem or a `tests/`
/// path component; callers needing different semantics can post-filter.
pub fn is_test_file(path: &Path) -> bool {
    let s = path.to_string_lossy();
    if s.contains("/tests/") || s.contains("\\tests\\") {
        return true;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|stem| stem.ends_with("_test") || stem.ends_with("Test") || stem.starts_with("test_"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_test_file_suffixes() {
        assert!(is_test_file(Path::new("src/foo_test.rs")));
        assert!(is_test_file(Path::new("src/tests/bar.rs")));
        assert!(!is_test_file(Path::new("src/foo.rs")));
    }

    #[test]
    fn enumerate_finds_rust_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn main() {}").unwrap();
        std::fs::write(dir.path().join("b.txt"), "not rust").unwrap();
        let files = enumerate_files(dir.path(), &[], &["rs"]).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.rs"));
    }
}
