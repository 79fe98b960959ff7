//! Orchestrates `FileParser`/`Index`/`Task` across a user session: open,
//! index, present, search, interrupt, reload.

use std::sync::{Arc, Mutex};

use crate::config::CoreConfig;
use crate::files::{FileParser, LogSource};
use crate::hist::Hist;
use crate::index::{ColumnFilter, Index};
use crate::line_parser::ILineParser;
use crate::task::searching::{SearchRequest, SearchingTask};
use crate::task::{Task, TaskHandle, TaskState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFileState {
    Idle,
    Indexing,
    Complete,
    Searching,
    Failed,
    Interrupted,
}

struct PendingReload {
    source: LogSource,
    parser: Option<Arc<dyn ILineParser>>,
}

struct Inner {
    state: LogFileState,
    file: Arc<Mutex<FileParser<LogSource>>>,
    parser: Arc<dyn ILineParser>,
    index: Arc<Mutex<Index>>,
    config: CoreConfig,
    hist: Arc<Hist>,
    active_filters: Vec<ColumnFilter>,
    column_widths: Vec<(usize, u64)>,
    indexing_task: Option<Task>,
    searching_task: Option<SearchingTask>,
    pending_search: Option<SearchRequest>,
    pending_reload: Option<PendingReload>,
}

/// Orchestrates the open -> index -> complete -> search -> reload session
/// for a single log file. Cheap to clone: every clone shares the same
/// underlying session.
#[derive(Clone)]
pub struct LogFile {
    inner: Arc<Mutex<Inner>>,
    on_state_changed: Arc<dyn Fn(LogFileState) + Send + Sync>,
}

impl LogFile {
    pub fn open(
        source: LogSource,
        parser: Arc<dyn ILineParser>,
        config: CoreConfig,
        on_state_changed: impl Fn(LogFileState) + Send + Sync + 'static,
    ) -> std::io::Result<Self> {
        log::trace!("Instantiate LogFile with parser `{}`", parser.name());
        let file = FileParser::new(source)?;
        let index = Index::new(parser.column_formats().to_vec());
        let hist = Arc::new(Hist::new(config.hist_buckets));
        let inner = Inner {
            state: LogFileState::Idle,
            file: Arc::new(Mutex::new(file)),
            parser,
            index: Arc::new(Mutex::new(index)),
            config,
            hist,
            active_filters: Vec::new(),
            column_widths: Vec::new(),
            indexing_task: None,
            searching_task: None,
            pending_search: None,
            pending_reload: None,
        };
        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            on_state_changed: Arc::new(on_state_changed),
        })
    }

    pub fn state(&self) -> LogFileState {
        self.inner.lock().expect("LogFile mutex poisoned").state
    }

    pub fn column_widths(&self) -> Vec<(usize, u64)> {
        self.inner.lock().expect("LogFile mutex poisoned").column_widths.clone()
    }

    pub fn column_formats(&self) -> Vec<crate::line_parser::ColumnFormat> {
        self.inner.lock().expect("LogFile mutex poisoned").parser.column_formats().to_vec()
    }

    /// Number of currently visible rows: the filtered/searched count if a
    /// filter or search is in effect, else the whole file's line count.
    pub fn line_count(&self) -> usize {
        let guard = self.inner.lock().expect("LogFile mutex poisoned");
        guard.index.lock().expect("Index mutex poisoned").line_count()
    }

    /// Read visible row `visible_index` (i.e. `LineMap::get(visible_index)`)
    /// into `out`. Panics if `visible_index` is out of range, same contract
    /// as `FileParser::read_line`.
    pub fn read_line(&self, visible_index: usize, out: &mut String) -> crate::error::CoreResult<()> {
        let guard = self.inner.lock().expect("LogFile mutex poisoned");
        let file_line = guard.index.lock().expect("Index mutex poisoned").line_map().get(visible_index);
        let mut file = guard.file.lock().expect("FileParser mutex poisoned");
        file.read_line(file_line as usize, out)
    }

    /// Enumerate a column's known values alongside filter/selection state,
    /// per `Index::get_values`.
    pub fn get_values(&self, column: usize) -> Vec<(String, bool, u64)> {
        let guard = self.inner.lock().expect("LogFile mutex poisoned");
        guard.index.lock().expect("Index mutex poisoned").get_values(column)
    }

    /// The search histogram built by the most recently completed search.
    /// Empty (all zero) until a search has run.
    pub fn hist(&self) -> Arc<Hist> {
        self.inner.lock().expect("LogFile mutex poisoned").hist.clone()
    }

    fn set_state(&self, state: LogFileState) {
        self.inner.lock().expect("LogFile mutex poisoned").state = state;
        (self.on_state_changed)(state);
    }

    /// `IndexEvent`: Idle/Interrupted -> Indexing. Applies any queued reload
    /// first. A no-op from any other state.
    pub fn index(&self) {
        log::trace!("index() requested");
        {
            let mut guard = self.inner.lock().expect("LogFile mutex poisoned");
            if !matches!(guard.state, LogFileState::Idle | LogFileState::Interrupted) {
                return;
            }
            if let Some(reload) = guard.pending_reload.take() {
                let Ok(file) = FileParser::new(reload.source) else {
                    guard.state = LogFileState::Failed;
                    drop(guard);
                    (self.on_state_changed)(LogFileState::Failed);
                    return;
                };
                if let Some(parser) = reload.parser {
                    guard.parser = parser;
                }
                guard.index = Arc::new(Mutex::new(Index::new(guard.parser.column_formats().to_vec())));
                guard.file = Arc::new(Mutex::new(file));
            }
        }

        let this = self.clone();
        let (file, index, parser, threads) = {
            let guard = self.inner.lock().expect("LogFile mutex poisoned");
            (
                Arc::clone(&guard.file),
                Arc::clone(&guard.index),
                Arc::clone(&guard.parser),
                guard.config.resolved_threads(),
            )
        };

        let body = move |handle: &TaskHandle| {
            let parse_result = {
                let mut f = file.lock().expect("FileParser mutex poisoned");
                f.index(
                    |done, total| {
                        let pct = if total == 0 { 0 } else { (done * 50 / total.max(1)).min(50) as u8 };
                        handle.report_progress(pct);
                    },
                    || handle.stop_requested(),
                )
            };
            match parse_result {
                Ok(true) => {}
                Ok(false) => {
                    handle.report_stopped();
                    return;
                }
                Err(_) => {
                    handle.report_failed();
                    return;
                }
            }

            let build_result = {
                let mut f = file.lock().expect("FileParser mutex poisoned");
                let mut idx = index.lock().expect("Index mutex poisoned");
                idx.build(
                    &mut f,
                    parser.as_ref(),
                    threads,
                    &|| handle.stop_requested(),
                    |done, total| {
                        let pct = if total == 0 { 100 } else { 50 + (done * 50 / total).min(50) as u8 };
                        handle.report_progress(pct);
                    },
                )
            };
            match build_result {
                Ok(true) => {}
                Ok(false) => handle.report_stopped(),
                Err(_) => handle.report_failed(),
            }
        };

        let on_changed = move |s: TaskState| match s {
            TaskState::Finished => this.on_indexing_finished(),
            TaskState::Stopped => this.set_state(LogFileState::Interrupted),
            TaskState::Failed => this.set_state(LogFileState::Failed),
            TaskState::Running | TaskState::Paused | TaskState::Idle => {}
        };

        let task = Task::new(body, on_changed, |_| {});
        {
            let mut guard = self.inner.lock().expect("LogFile mutex poisoned");
            guard.indexing_task = Some(task);
            guard.state = LogFileState::Indexing;
        }
        (self.on_state_changed)(LogFileState::Indexing);
        self.inner
            .lock()
            .expect("LogFile mutex poisoned")
            .indexing_task
            .as_mut()
            .expect("just inserted")
            .start();
    }

    /// Runs once on first entry to `Complete` after an index build:
    /// publish column widths and re-adapt/re-apply any existing filters to
    /// the new value set (intersected, since old selections may no longer
    /// exist).
    fn on_indexing_finished(&self) {
        let mut guard = self.inner.lock().expect("LogFile mutex poisoned");
        let formats = guard.parser.column_formats().to_vec();
        let index = Arc::clone(&guard.index);
        let idx = index.lock().expect("Index mutex poisoned");
        guard.column_widths = formats
            .iter()
            .enumerate()
            .map(|(i, _)| idx.max_width(i))
            .collect();

        let adapted: Vec<ColumnFilter> = guard
            .active_filters
            .iter()
            .map(|f| {
                let known: std::collections::HashSet<String> =
                    idx.get_values(f.column).into_iter().map(|(v, _, _)| v).collect();
                ColumnFilter {
                    column: f.column,
                    selected: f.selected.intersection(&known).cloned().collect(),
                }
            })
            .collect();
        drop(idx);
        if !adapted.is_empty() {
            index.lock().expect("Index mutex poisoned").filter(adapted.clone());
        }
        guard.active_filters = adapted;
        guard.state = LogFileState::Complete;
        drop(guard);
        (self.on_state_changed)(LogFileState::Complete);
    }

    /// `filter` is UI-thread bookkeeping only (no task involved): it mutates
    /// the live `Index` directly and remembers the filter set for
    /// re-adaptation after a future reindex.
    pub fn filter(&self, filters: Vec<ColumnFilter>) {
        log::trace!("filter() applied to {} column(s)", filters.len());
        let guard = self.inner.lock().expect("LogFile mutex poisoned");
        guard.index.lock().expect("Index mutex poisoned").filter(filters);
    }

    /// `SearchEvent`: Complete -> Searching (start on copy); Searching ->
    /// Searching (stop current, queue this one to start once Stopped
    /// lands).
    pub fn search(&self, request: SearchRequest) {
        log::trace!("search() requested: {:?}", request.text);
        let mut guard = self.inner.lock().expect("LogFile mutex poisoned");
        match guard.state {
            LogFileState::Complete => {
                drop(guard);
                self.start_search(request);
            }
            LogFileState::Searching => {
                guard.pending_search = Some(request);
                if let Some(task) = &guard.searching_task {
                    task.stop();
                }
            }
            _ => {}
        }
    }

    fn start_search(&self, request: SearchRequest) {
        let (file, snapshot, parser, hist) = {
            let guard = self.inner.lock().expect("LogFile mutex poisoned");
            let file = Arc::clone(&guard.file);
            let snapshot = guard.index.lock().expect("Index mutex poisoned").snapshot();
            let parser = Arc::clone(&guard.parser);
            let hist = Arc::clone(&guard.hist);
            (file, snapshot, parser, hist)
        };

        let this = self.clone();
        let this_for_progress = self.clone();
        let task = SearchingTask::new(
            file,
            snapshot,
            parser,
            request,
            hist,
            move |s: TaskState| match s {
                TaskState::Finished => this.on_search_finished(),
                TaskState::Stopped => this.on_search_stopped(),
                TaskState::Failed => this.set_state(LogFileState::Failed),
                TaskState::Running | TaskState::Paused | TaskState::Idle => {}
            },
            move |_| {
                let _ = &this_for_progress;
            },
        );
        {
            let mut guard = self.inner.lock().expect("LogFile mutex poisoned");
            guard.searching_task = Some(task);
            guard.state = LogFileState::Searching;
        }
        (self.on_state_changed)(LogFileState::Searching);
        self.inner
            .lock()
            .expect("LogFile mutex poisoned")
            .searching_task
            .as_mut()
            .expect("just inserted")
            .start();
    }

    fn on_search_finished(&self) {
        let map = {
            let guard = self.inner.lock().expect("LogFile mutex poisoned");
            guard.searching_task.as_ref().and_then(|t| t.take_result())
        };
        if let Some(map) = map {
            let guard = self.inner.lock().expect("LogFile mutex poisoned");
            guard.index.lock().expect("Index mutex poisoned").adopt_line_map(map);
        }
        let pending = self.inner.lock().expect("LogFile mutex poisoned").pending_search.take();
        match pending {
            Some(request) => self.start_search(request),
            None => self.set_state(LogFileState::Complete),
        }
    }

    fn on_search_stopped(&self) {
        let pending = self.inner.lock().expect("LogFile mutex poisoned").pending_search.take();
        match pending {
            Some(request) => self.start_search(request),
            None => self.set_state(LogFileState::Interrupted),
        }
    }

    /// `InterruptEvent`: stop whatever task is running and transition to
    /// `Interrupted` directly (Complete/Failed have no task to stop).
    pub fn interrupt(&self) {
        log::trace!("interrupt() requested, current state {:?}", self.state());
        let guard = self.inner.lock().expect("LogFile mutex poisoned");
        if let Some(task) = &guard.indexing_task {
            task.stop();
        }
        if let Some(task) = &guard.searching_task {
            task.stop();
        }
        let had_task = guard.state == LogFileState::Indexing || guard.state == LogFileState::Searching;
        drop(guard);
        if !had_task {
            self.set_state(LogFileState::Interrupted);
        }
    }

    /// `ReloadEvent`: queues a new byte source (and optionally a new
    /// parser) to take effect on the next `IndexEvent`.
    pub fn reload(&self, source: LogSource, parser: Option<Arc<dyn ILineParser>>) {
        let mut guard = self.inner.lock().expect("LogFile mutex poisoned");
        guard.pending_reload = Some(PendingReload { source, parser });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_parser::RegexParser;
    use std::io::Cursor;
    use std::time::Duration;

    const CONFIG: &str = r#"{
        "regex": "^(\\w+) (.*)$",
        "columns": [
            {"name": "Level", "group": 1, "indexed": true, "autosize": false},
            {"name": "Message", "group": 2, "indexed": false, "autosize": true}
        ]
    }"#;

    fn wait_for(log: &LogFile, target: LogFileState) {
        for _ in 0..400 {
            if log.state() == target {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("timed out waiting for {target:?}, got {:?}", log.state());
    }

    #[test]
    fn indexes_then_reaches_complete() {
        let text = "INFO a\nWARN b\nINFO c\n";
        let source = LogSource::InMemory(Cursor::new(text.as_bytes().to_vec()));
        let parser = Arc::new(RegexParser::load("test", CONFIG).unwrap());
        let transitions = Arc::new(Mutex::new(Vec::new()));
        let transitions2 = Arc::clone(&transitions);
        let log = LogFile::open(source, parser, CoreConfig::default(), move |s| {
            transitions2.lock().unwrap().push(s);
        })
        .unwrap();
        assert_eq!(log.state(), LogFileState::Idle);
        log.index();
        wait_for(&log, LogFileState::Complete);
        assert!(!log.column_widths().is_empty());
        assert!(transitions.lock().unwrap().contains(&LogFileState::Indexing));
    }

    #[test]
    fn search_transitions_back_to_complete() {
        let text = "INFO a\nWARN needle\nINFO c\n";
        let source = LogSource::InMemory(Cursor::new(text.as_bytes().to_vec()));
        let parser = Arc::new(RegexParser::load("test", CONFIG).unwrap());
        let log = LogFile::open(source, parser, CoreConfig::default(), |_| {}).unwrap();
        log.index();
        wait_for(&log, LogFileState::Complete);

        log.search(SearchRequest {
            text: "needle".to_string(),
            is_regex: false,
            case_sensitive: true,
            unicode_aware: true,
            message_only: false,
        });
        wait_for(&log, LogFileState::Complete);
    }

    #[test]
    fn read_line_and_get_values_reflect_the_indexed_file() {
        let text = "INFO a\nWARN b\nINFO c\n";
        let source = LogSource::InMemory(Cursor::new(text.as_bytes().to_vec()));
        let parser = Arc::new(RegexParser::load("test", CONFIG).unwrap());
        let log = LogFile::open(source, parser, CoreConfig::default(), |_| {}).unwrap();
        log.index();
        wait_for(&log, LogFileState::Complete);

        assert_eq!(log.line_count(), 3);
        let mut line = String::new();
        log.read_line(1, &mut line).unwrap();
        assert_eq!(line, "WARN b");

        let mut values = log.get_values(0);
        values.sort();
        assert_eq!(
            values,
            vec![("INFO".to_string(), true, 2), ("WARN".to_string(), true, 1)]
        );

        log.filter(vec![ColumnFilter {
            column: 0,
            selected: ["INFO".to_string()].into_iter().collect(),
        }]);
        assert_eq!(log.line_count(), 2);
        let mut line = String::new();
        log.read_line(1, &mut line).unwrap();
        assert_eq!(line, "INFO c");
    }

    #[test]
    fn interrupt_during_indexing_reaches_interrupted() {
        let mut big = String::new();
        for i in 0..5000 {
            big.push_str(&format!("INFO line {i}\n"));
        }
        let source = LogSource::InMemory(Cursor::new(big.into_bytes()));
        let parser = Arc::new(RegexParser::load("test", CONFIG).unwrap());
        let log = LogFile::open(source, parser, CoreConfig::default(), |_| {}).unwrap();
        log.index();
        log.interrupt();
        wait_for(&log, LogFileState::Interrupted);
    }

    #[test]
    fn interrupt_from_complete_needs_no_task_and_lands_directly() {
        let text = "INFO a\nWARN b\n";
        let source = LogSource::InMemory(Cursor::new(text.as_bytes().to_vec()));
        let parser = Arc::new(RegexParser::load("test", CONFIG).unwrap());
        let log = LogFile::open(source, parser, CoreConfig::default(), |_| {}).unwrap();
        log.index();
        wait_for(&log, LogFileState::Complete);

        log.interrupt();
        assert_eq!(log.state(), LogFileState::Interrupted);
    }

    #[test]
    fn reload_applies_queued_source_on_next_index() {
        let first = "INFO a\nWARN b\n";
        let source = LogSource::InMemory(Cursor::new(first.as_bytes().to_vec()));
        let parser = Arc::new(RegexParser::load("test", CONFIG).unwrap());
        let log = LogFile::open(source, parser, CoreConfig::default(), |_| {}).unwrap();
        log.index();
        wait_for(&log, LogFileState::Complete);
        assert_eq!(log.line_count(), 2);

        log.interrupt();
        assert_eq!(log.state(), LogFileState::Interrupted);

        let second = "INFO a\nWARN b\nINFO c\nERROR d\n";
        log.reload(LogSource::InMemory(Cursor::new(second.as_bytes().to_vec())), None);
        log.index();
        wait_for(&log, LogFileState::Complete);
        assert_eq!(log.line_count(), 4);
    }

    #[test]
    fn second_search_while_first_is_running_does_not_hang() {
        let text = "INFO a\nWARN b\nINFO needle\nWARN other\n";
        let source = LogSource::InMemory(Cursor::new(text.as_bytes().to_vec()));
        let parser = Arc::new(RegexParser::load("test", CONFIG).unwrap());
        let log = LogFile::open(source, parser, CoreConfig::default(), |_| {}).unwrap();
        log.index();
        wait_for(&log, LogFileState::Complete);

        log.search(SearchRequest {
            text: "a".to_string(),
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
}
