//! Wraps `Index::build`, the parallel per-column indexer, in a `Task`.

use std::sync::{Arc, Mutex};

use crate::files::{FileParser, SeekableRead};
use crate::index::Index;
use crate::line_parser::ILineParser;

use super::{Task, TaskHandle};

pub struct IndexingTask {
    task: Task,
}

impl IndexingTask {
    #[allow(clippy::too_many_arguments)]
    pub fn new<R: SeekableRead + 'static>(
        file: Arc<Mutex<FileParser<R>>>,
        index: Arc<Mutex<Index>>,
        parser: Arc<dyn ILineParser>,
        max_threads: usize,
        on_state_changed: impl Fn(super::TaskState) + Send + Sync + 'static,
        on_progress_changed: impl Fn(u8) + Send + Sync + 'static,
    ) -> Self {
        let body = move |handle: &TaskHandle| {
            let mut file = file.lock().expect("FileParser mutex poisoned");
            let mut index = index.lock().expect("Index mutex poisoned");
            let result = index.build(
                &mut file,
                parser.as_ref(),
                max_threads,
                &|| handle.stop_requested(),
                |done, total| {
                    let pct = if total == 0 { 100 } else { (done * 100 / total).min(100) as u8 };
                    handle.report_progress(pct);
                },
            );
            match result {
                Ok(true) => {}
                Ok(false) => handle.report_stopped(),
                Err(_) => handle.report_failed(),
            }
        };
        Self {
            task: Task::new(body, on_state_changed, on_progress_changed),
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
}
