//! Cancelable, pausable unit of background work.
//!
//! Concrete tasks (`parsing`, `indexing`, `searching`) wrap a long-running
//! core operation in a `Task`, giving callers `start`/`stop`/`pause` and
//! state/progress callbacks fired on the worker thread, matching the
//! `parking_lot`-based worker/condvar pattern used throughout the sibling
//! example repos for long-lived background threads.

pub mod indexing;
pub mod parsing;
pub mod searching;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Running,
    Paused,
    Finished,
    Failed,
    Stopped,
}

/// What the worker body hands back to the task loop while it runs: the
/// cooperative flags to observe, and the callbacks to report through.
pub struct TaskHandle {
    state: Arc<Mutex<TaskState>>,
    stop_requested: Arc<AtomicBool>,
    pause_requested: Arc<AtomicBool>,
    resume: Arc<(Mutex<()>, Condvar)>,
    outcome: Arc<Mutex<Option<TaskState>>>,
    last_progress: Arc<Mutex<Option<u8>>>,
    on_state_changed: Arc<dyn Fn(TaskState) + Send + Sync>,
    on_progress: Arc<dyn Fn(u8) + Send + Sync>,
}

impl TaskHandle {
    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Relaxed)
    }

    /// Block here if `pause()` was called, until `start()` clears the
    /// pause flag and notifies. A no-op if no pause is pending. Reports the
    /// `Paused`/`Running` state transitions itself, since only the worker
    /// knows exactly when it has actually suspended.
    pub fn wait_pause(&self) {
        if !self.pause_requested.load(Ordering::Relaxed) {
            return;
        }
        *self.state.lock() = TaskState::Paused;
        (self.on_state_changed)(TaskState::Paused);

        let (lock, cv) = &*self.resume;
        let mut guard = lock.lock();
        while self.pause_requested.load(Ordering::Relaxed) && !self.stop_requested.load(Ordering::Relaxed) {
            cv.wait(&mut guard);
        }
        drop(guard);

        if !self.stop_requested.load(Ordering::Relaxed) {
            *self.state.lock() = TaskState::Running;
            (self.on_state_changed)(TaskState::Running);
        }
    }

    /// Drop duplicate consecutive values.
    pub fn report_progress(&self, percent: u8) {
        let mut last = self.last_progress.lock();
        if *last != Some(percent) {
            *last = Some(percent);
            (self.on_progress)(percent);
        }
    }

    pub fn report_failed(&self) {
        *self.outcome.lock() = Some(TaskState::Failed);
    }

    pub fn report_stopped(&self) {
        *self.outcome.lock() = Some(TaskState::Stopped);
    }
}

/// Cooperative background task. Holds exactly one worker invocation: a
/// `Finished`/`Stopped`/`Failed` task does not restart itself from `start()`
/// (concrete task types are constructed fresh per operation, e.g. a new
/// `SearchingTask` per search rather than a reused one).
pub struct Task {
    state: Arc<Mutex<TaskState>>,
    stop_requested: Arc<AtomicBool>,
    pause_requested: Arc<AtomicBool>,
    resume: Arc<(Mutex<()>, Condvar)>,
    outcome: Arc<Mutex<Option<TaskState>>>,
    last_progress: Arc<Mutex<Option<u8>>>,
    body: Option<Box<dyn FnOnce(&TaskHandle) + Send + 'static>>,
    handle: Option<JoinHandle<()>>,
    on_state_changed: Arc<dyn Fn(TaskState) + Send + Sync>,
    on_progress_changed: Arc<dyn Fn(u8) + Send + Sync>,
}

impl Task {
    pub fn new(
        body: impl FnOnce(&TaskHandle) + Send + 'static,
        on_state_changed: impl Fn(TaskState) + Send + Sync + 'static,
        on_progress_changed: impl Fn(u8) + Send + Sync + 'static,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(TaskState::Idle)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            pause_requested: Arc::new(AtomicBool::new(false)),
            resume: Arc::new((Mutex::new(()), Condvar::new())),
            outcome: Arc::new(Mutex::new(None)),
            last_progress: Arc::new(Mutex::new(None)),
            body: Some(Box::new(body)),
            handle: None,
            on_state_changed: Arc::new(on_state_changed),
            on_progress_changed: Arc::new(on_progress_changed),
        }
    }

    pub fn state(&self) -> TaskState {
        *self.state.lock()
    }

    fn set_state(&self, state: TaskState) {
        *self.state.lock() = state;
        (self.on_state_changed)(state);
    }

    /// First call spawns the worker; a call while `Paused` wakes it.
    pub fn start(&mut self) {
        match self.state() {
            TaskState::Paused => {
                self.pause_requested.store(false, Ordering::Relaxed);
                let (_, cv) = &*self.resume;
                cv.notify_all();
            }
            _ => {
                let Some(body) = self.body.take() else { return };
                let handle = TaskHandle {
                    state: Arc::clone(&self.state),
                    stop_requested: Arc::clone(&self.stop_requested),
                    pause_requested: Arc::clone(&self.pause_requested),
                    resume: Arc::clone(&self.resume),
                    outcome: Arc::clone(&self.outcome),
                    last_progress: Arc::clone(&self.last_progress),
                    on_state_changed: Arc::clone(&self.on_state_changed),
                    on_progress: Arc::clone(&self.on_progress_changed),
                };
                let state = Arc::clone(&self.state);
                let outcome = Arc::clone(&self.outcome);
                let on_state_changed = Arc::clone(&self.on_state_changed);
                self.set_state(TaskState::Running);
                self.handle = Some(std::thread::spawn(move || {
                    body(&handle);
                    let final_state = outcome.lock().take().unwrap_or(TaskState::Finished);
                    *state.lock() = final_state;
                    on_state_changed(final_state);
                }));
            }
        }
    }

    /// Cooperative cancellation: the worker observes this at its next
    /// checkpoint and reports `Stopped`.
    pub fn stop(&self) {
        log::trace!("Task::stop requested, state was {:?}", self.state());
        self.stop_requested.store(true, Ordering::Relaxed);
        self.pause_requested.store(false, Ordering::Relaxed);
        let (_, cv) = &*self.resume;
        cv.notify_all();
    }

    /// Cooperative pause: the worker observes this at its next `wait_pause`
    /// checkpoint and blocks until `start()` is called again.
    pub fn pause(&self) {
        self.pause_requested.store(true, Ordering::Relaxed);
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
