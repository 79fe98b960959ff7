//! Wraps `IndexSnapshot::search` in a `Task`.
//!
//! Takes an immutable snapshot of the pre-search `Index` rather than the
//! live one, so a filter change on the UI thread while a search is running
//! can't corrupt the in-flight result.

use std::sync::{Arc, Mutex};

use crate::files::{FileParser, SeekableRead};
use crate::hist::Hist;
use crate::index::{IndexSnapshot, LineMap};
use crate::line_parser::ILineParser;

use super::{Task, TaskHandle};

pub struct SearchRequest {
    pub text: String,
    pub is_regex: bool,
    pub case_sensitive: bool,
    pub unicode_aware: bool,
    pub message_only: bool,
}

pub struct SearchingTask {
    task: Task,
    result: Arc<Mutex<Option<LineMap>>>,
}

impl SearchingTask {
    #[allow(clippy::too_many_arguments)]
    pub fn new<R: SeekableRead + 'static>(
        file: Arc<Mutex<FileParser<R>>>,
        snapshot: IndexSnapshot,
        parser: Arc<dyn ILineParser>,
        request: SearchRequest,
        hist: Arc<Hist>,
        on_state_changed: impl Fn(super::TaskState) + Send + Sync + 'static,
        on_progress_changed: impl Fn(u8) + Send + Sync + 'static,
    ) -> Self {
        let result: Arc<Mutex<Option<LineMap>>> = Arc::new(Mutex::new(None));
        let result_for_body = Arc::clone(&result);
        let body = move |handle: &TaskHandle| {
            let mut file = file.lock().expect("FileParser mutex poisoned");
            let outcome = snapshot.search(
                &mut file,
                parser.as_ref(),
                &request.text,
                request.is_regex,
                request.case_sensitive,
                request.unicode_aware,
                request.message_only,
                &hist,
                &|| handle.stop_requested(),
                |done, total| {
                    let pct = if total == 0 { 100 } else { (done * 100 / total).min(100) as u8 };
                    handle.report_progress(pct);
                },
            );
            match outcome {
                Ok(Some(map)) => {
                    *result_for_body.lock().expect("result mutex poisoned") = Some(map);
                }
                Ok(None) => handle.report_stopped(),
                Err(_) => handle.report_failed(),
            }
        };
        Self {
            task: Task::new(body, on_state_changed, on_progress_changed),
            result,
        }
    }

    pub fn start(&mut self) {
        self.task.start();
    }

    pub fn stop(&self) {
        self.task.stop();
    }

    pub fn state(&self) -> super::TaskState {
        self.task.state()
    }

    /// Takes the completed result, if any. Only meaningful once `state()`
    /// is `Finished`; a stopped or failed search leaves this `None`.
    pub fn take_result(&self) -> Option<LineMap> {
        self.result.lock().expect("result mutex poisoned").take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::file_parser::FileParser as FP;
    use crate::index::Index;
    use crate::line_parser::RegexParser;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    const CONFIG: &str = r#"{
        "regex": "^(\\w+) (.*)$",
        "columns": [
            {"name": "Level", "group": 1, "indexed": true, "autosize": false},
            {"name": "Message", "group": 2, "indexed": false, "autosize": true}
        ]
    }"#;

    #[test]
    fn searches_in_background() {
        let text = "INFO a\nWARN needle\nINFO c\n".to_string();
        let mut fp = FP::new(Cursor::new(text.into_bytes())).unwrap();
        fp.index(|_, _| {}, || false).unwrap();
        let parser = Arc::new(RegexParser::load("test", CONFIG).unwrap());
        let mut index = Index::new(parser.column_formats().to_vec());
        index.build(&mut fp, parser.as_ref(), 2, &|| false, |_, _| {}).unwrap();
        let snapshot = index.snapshot();
        let file = Arc::new(Mutex::new(fp));

        let finished = Arc::new(AtomicBool::new(false));
        let finished2 = Arc::clone(&finished);
        let mut task = SearchingTask::new(
            file,
            snapshot,
            parser,
            SearchRequest {
                text: "needle".to_string(),
                is_regex: false,
                case_sensitive: true,
                unicode_aware: true,
                message_only: false,
            },
            Arc::new(Hist::new(4)),
            move |s| {
                if s == super::super::TaskState::Finished {
                    finished2.store(true, Ordering::SeqCst);
                }
            },
            |_| {},
        );
        task.start();
        for _ in 0..200 {
            if finished.load(Ordering::SeqCst) {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(finished.load(Ordering::SeqCst));
        let map = task.take_result().unwrap();
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![1]);
    }
}
