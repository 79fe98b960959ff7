//! Priority-ordered registry of line parsers.

use std::sync::Arc;

use super::{DefaultParser, ILineParser};

/// A parser plus the priority its config file name encoded (e.g. the `200`
/// in `200_journalctl.json`). Lower numbers are tried first.
struct Entry {
    priority: u32,
    parser: Arc<dyn ILineParser>,
}

pub struct Repository {
    entries: Vec<Entry>,
    default: Arc<dyn ILineParser>,
}

impl Default for Repository {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            default: Arc::new(DefaultParser::default()),
        }
    }
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parser at the given priority, keeping `entries` sorted so
    /// `resolve` can try candidates in priority order.
    pub fn register(&mut self, priority: u32, parser: Arc<dyn ILineParser>) {
        let pos = self
            .entries
            .partition_point(|e| e.priority <= priority);
        self.entries.insert(pos, Entry { priority, parser });
    }

    /// Pick the first registered parser whose `is_match` accepts the sample,
    /// falling back to the built-in passthrough parser if none claims it.
    pub fn resolve(&self, sample_lines: &[String], file_name: Option<&str>) -> Arc<dyn ILineParser> {
        self.entries
            .iter()
            .find(|e| e.parser.is_match(sample_lines, file_name))
            .map(|e| Arc::clone(&e.parser))
            .unwrap_or_else(|| Arc::clone(&self.default))
    }

    pub fn resolve_by_name(&self, name: &str) -> Option<Arc<dyn ILineParser>> {
        if name == self.default.name() {
            return Some(Arc::clone(&self.default));
        }
        self.entries
            .iter()
            .find(|e| e.parser.name() == name)
            .map(|e| Arc::clone(&e.parser))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_parser::RegexParser;

    const CONFIG: &str = r#"{
        "regex": "^ERROR: (.*)$",
        "magic": "ERROR: ",
        "columns": [{"name": "Message", "group": 1, "indexed": false, "autosize": true}]
    }"#;

    #[test]
    fn falls_back_to_default_when_nothing_matches() {
        let repo = Repository::new();
        let parser = repo.resolve(&["plain line".to_string()], None);
        assert_eq!(parser.name(), "default");
    }

    #[test]
    fn resolves_registered_parser_by_priority() {
        let mut repo = Repository::new();
        let parser = RegexParser::load("errors", CONFIG).unwrap();
        repo.register(200, Arc::new(parser));

        let resolved = repo.resolve(&["ERROR: disk full".to_string()], None);
        assert_eq!(resolved.name(), "errors");
    }

    #[test]
    fn resolve_by_name_finds_registered_and_default() {
        let mut repo = Repository::new();
        let parser = RegexParser::load("errors", CONFIG).unwrap();
        repo.register(200, Arc::new(parser));

        assert!(repo.resolve_by_name("errors").is_some());
        assert!(repo.resolve_by_name("default").is_some());
        assert!(repo.resolve_by_name("nope").is_none());
    }
}
