use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use indexed_file::{new_text_file, CoreConfig, ILineParser, Index, LogFile, LogFileState, RegexParser, SearchRequest};

const LEVEL_MESSAGE: &str = r#"{
    "regex": "^(\\w+) (.*)$",
    "columns": [
        {"name": "Level", "group": 1, "indexed": true, "autosize": false},
        {"name": "Message", "group": 2, "indexed": false, "autosize": true}
    ]
}"#;

fn wait_for(log: &LogFile, target: LogFileState) {
    for _ in 0..1000 {
        if log.state() == target {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("timed out waiting for {target:?}, got {:?}", log.state());
}

#[test]
fn opens_a_real_file_and_filters_after_indexing() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    for line in ["INFO one", "WARN two", "INFO three", "ERROR four"] {
        writeln!(tmp, "{line}").unwrap();
    }
    let path = tmp.path().to_path_buf();
    let mut fp = new_text_file(Some(&path)).unwrap();
    assert!(fp.index(|_, _| {}, || false).unwrap());

    let parser = RegexParser::load("test", LEVEL_MESSAGE).unwrap();
    let mut index = Index::new(parser.column_formats().to_vec());
    assert!(index.build(&mut fp, &parser, 2, &|| false, |_, _| {}).unwrap());

    let mut values = index.get_values(0);
    values.sort();
    assert_eq!(
        values,
        vec![
            ("ERROR".to_string(), true, 1),
            ("INFO".to_string(), true, 2),
            ("WARN".to_string(), true, 1),
        ]
    );

    index.filter(vec![indexed_file::ColumnFilter {
        column: 0,
        selected: ["INFO".to_string()].into_iter().collect(),
    }]);
    assert_eq!(index.line_map().iter().collect::<Vec<_>>(), vec![0, 2]);
}

/// A file with a bad parser definition alongside good ones still lets the
/// good ones load; the bad one's error comes back named.
#[test]
fn malformed_parser_definition_does_not_block_the_others() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("050_good.json"),
        r#"{"regex": "^(.*)$", "columns": [{"name": "Message", "group": 1, "indexed": false, "autosize": true}]}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("060_bad.json"),
        r#"{"regex": "^(.*)$", "columns": [{"name": "Message", "group": 9, "indexed": false, "autosize": true}]}"#,
    )
    .unwrap();

    let (repo, failures) = indexed_file::load_repository(Some(dir.path()));
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "060_bad");
    assert!(repo.resolve_by_name("good").is_some());
}

#[test]
fn interrupting_a_large_index_leaves_no_partial_line_count() {
    let mut big = String::new();
    for i in 0..20_000 {
        big.push_str(&format!("INFO line number {i} with some extra padding text\n"));
    }
    let source = indexed_file::LogSource::InMemory(std::io::Cursor::new(big.into_bytes()));
    let parser = Arc::new(RegexParser::load("test", LEVEL_MESSAGE).unwrap());
    let log = LogFile::open(source, parser, CoreConfig::default(), |_| {}).unwrap();

    log.index();
    log.interrupt();
    wait_for(&log, LogFileState::Interrupted);
    assert!(log.column_widths().is_empty());
}

#[test]
fn second_search_supersedes_the_first_after_filtering() {
    let text = "INFO alpha\nWARN beta\nINFO gamma needle\nWARN delta\n";
    let source = indexed_file::LogSource::InMemory(std::io::Cursor::new(text.as_bytes().to_vec()));
    let parser = Arc::new(RegexParser::load("test", LEVEL_MESSAGE).unwrap());
    let log = LogFile::open(source, parser, CoreConfig::default(), |_| {}).unwrap();

    log.index();
    wait_for(&log, LogFileState::Complete);

    log.filter(vec![indexed_file::ColumnFilter {
        column: 0,
        selected: ["INFO".to_string()].into_iter().collect(),
    }]);

    log.search(SearchRequest {
        text: "alpha".to_string(),
        is_regex: false,
        case_sensitive: true,
        unicode_aware: true,
        message_only: false,
    });
    log.search(SearchRequest {
        text: "needle".to_string(),
        is_regex: false,
        case_sensitive: true,
        unicode_aware: true,
        message_only: false,
    });
    wait_for(&log, LogFileState::Complete);
}
