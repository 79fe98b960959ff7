//! Wraps `FileParser::index` in a cancelable, progress-reporting `Task`.

use std::sync::{Arc, Mutex};

use crate::files::{FileParser, SeekableRead};

use super::{Task, TaskHandle};

/// Background task that builds a `FileParser`'s offset index.
pub struct ParsingTask {
    task: Task,
}

impl ParsingTask {
    pub fn new<R: SeekableRead + 'static>(
        file: Arc<Mutex<FileParser<R>>>,
        on_state_changed: impl Fn(super::TaskState) + Send + Sync + 'static,
        on_progress_changed: impl Fn(u8) + Send + Sync + 'static,
    ) -> Self {
        let body = move |handle: &TaskHandle| {
            let result = {
                let mut file = file.lock().expect("FileParser mutex poisoned");
                file.index(
                    |done, total| {
                        let pct = if total == 0 { 100 } else { (done * 100 / total).min(100) as u8 };
                        handle.report_progress(pct);
                    },
                    || handle.stop_requested(),
                )
            };
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
