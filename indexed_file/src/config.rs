//! Core configuration, threaded through constructors rather than read from
//! global mutable state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::CoreError;
use crate::line_parser::{ILineParser, RegexParser, Repository};

/// Tunables for the indexing/filtering/searching core. None of these are
/// read from globals; callers build one and pass it to `LogFile::open`.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Upper bound on worker threads for the parallel indexer. `None` means
    /// "use available parallelism".
    pub max_index_threads: Option<usize>,
    /// Sparsity of the `OffsetIndex`: every Dth line's byte offset is
    /// actually stored. Must be a power of two.
    pub offset_index_delta: usize,
    /// Histogram resolution (number of buckets) built during a search.
    pub hist_buckets: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_index_threads: None,
            offset_index_delta: 32,
            hist_buckets: 100,
        }
    }
}

impl CoreConfig {
    pub fn resolved_threads(&self) -> usize {
        self.max_index_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4))
    }
}

/// A bundled or user-supplied parser definition file, named
/// `DDD_name.json` where `DDD` is a zero-padded decimal priority (lower
/// wins ties in `Repository::resolve`).
fn parse_priority_and_name(file_stem: &str) -> Option<(u32, &str)> {
    let (digits, rest) = file_stem.split_once('_')?;
    let priority: u32 = digits.parse().ok()?;
    Some((priority, rest))
}

/// Load every `*.json` parser definition under `dir` into a fresh
/// `Repository`, in addition to the two bundled defaults. Malformed files
/// are skipped with their error returned alongside the name that failed to
/// load; other parsers still register.
pub fn load_repository(dir: Option<&Path>) -> (Repository, Vec<(String, CoreError)>) {
    let mut repo = Repository::new();
    let mut failures = Vec::new();

    for (name, text) in bundled_parsers() {
        register_one(&mut repo, name, text, &mut failures);
    }

    if let Some(dir) = dir {
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let Ok(text) = std::fs::read_to_string(&path) else {
                    continue;
                };
                register_one(&mut repo, stem, &text, &mut failures);
            }
        }
    }

    (repo, failures)
}

fn register_one(repo: &mut Repository, stem: &str, text: &str, failures: &mut Vec<(String, CoreError)>) {
    let Some((priority, name)) = parse_priority_and_name(stem) else {
        return;
    };
    match RegexParser::load(name, text) {
        Ok(parser) => repo.register(priority, Arc::new(parser) as Arc<dyn ILineParser>),
        Err(e) => failures.push((stem.to_string(), e)),
    }
}

fn bundled_parsers() -> [(&'static str, &'static str); 2] {
    [
        ("200_journalctl", include_str!("../resources/regex/200_journalctl.json")),
        ("500_logseer", include_str!("../resources/regex/500_logseer.json")),
    ]
}

/// The conventional location for user parser definitions: `<config_dir>/regex/`.
pub fn regex_config_dir(config_dir: &Path) -> PathBuf {
    config_dir.join("regex")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_parsers_load_without_error() {
        let (repo, failures) = load_repository(None);
        assert!(failures.is_empty(), "bundled parser failed to load: {failures:?}");
        assert!(!repo.is_empty());
    }

    #[test]
    fn priority_name_split() {
        assert_eq!(parse_priority_and_name("200_journalctl"), Some((200, "journalctl")));
        assert_eq!(parse_priority_and_name("not_numeric_x"), None);
    }

    #[test]
    fn user_directory_is_merged_with_bundled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("050_custom.json"),
            r#"{"regex": "^(.*)$", "columns": [{"name": "Message", "group": 1, "indexed": false, "autosize": true}]}"#,
        )
        .unwrap();
        let (repo, failures) = load_repository(Some(dir.path()));
        assert!(failures.is_empty());
        assert!(repo.resolve_by_name("custom").is_some());
    }
}
