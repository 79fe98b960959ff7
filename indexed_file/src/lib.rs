//! Core of an interactive log-file explorer: parse a byte stream into
//! lines, build a per-column inverted index over it in parallel, filter and
//! search without re-scanning the file, and wrap the long-running pieces of
//! that in cancelable, progress-reporting background tasks.

pub mod bitset;
pub mod config;
pub mod error;
pub mod files;
pub mod hist;
pub mod index;
pub mod line_parser;
pub mod log_file;
pub mod offset_index;
pub mod task;

pub use config::{load_repository, regex_config_dir, CoreConfig};
pub use error::{CoreError, CoreResult};
pub use files::{new_text_file, open_log_source, FileParser, LogSource};
pub use hist::Hist;
pub use index::{ColumnFilter, Index, IndexSnapshot, LineMap};
pub use line_parser::{DefaultParser, ILineParser, RegexParser, Repository};
pub use log_file::{LogFile, LogFileState};
pub use offset_index::OffsetIndex;
pub use task::searching::SearchRequest;
pub use task::{Task, TaskHandle, TaskState};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn missing_file_is_an_error() {
        let path = PathBuf::from("/tmp/indexed_file_does_not_exist_12345");
        assert!(new_text_file(Some(&path)).is_err());
    }

    #[test]
    fn opens_and_indexes_a_real_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        for i in 0..50 {
            writeln!(tmp, "line {i}").unwrap();
        }
        let path = tmp.path().to_path_buf();
        let mut file = new_text_file(Some(&path)).unwrap();
        assert!(file.index(|_, _| {}, || false).unwrap());
        assert_eq!(file.line_count(), 50);
    }

    #[test]
    fn bundled_parsers_resolve_by_name() {
        let (repo, failures) = load_repository(None);
        assert!(failures.is_empty());
        assert!(repo.resolve_by_name("journalctl").is_some());
        assert!(repo.resolve_by_name("logseer").is_some());
    }
}
