//! Background work that must not block the UI loop.
//!
//! Photo and cover imports run on the tokio runtime and report back over a
//! channel; the app polls the channels once per frame.

pub mod manager;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use manager::BackgroundTaskManager;

/// Process-unique id of a background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

impl TaskId {
    pub fn new() -> Self {
        use std::sync::atomic::AtomicU64;
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TaskId(NEXT.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind of import a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    ImportPhotos,
    ImportCover,
}

impl TaskType {
    /// Single-letter marker for the status bar.
    pub fn short_name(&self) -> &'static str {
        match self {
            TaskType::ImportPhotos => "P",
            TaskType::ImportCover => "C",
        }
    }

    /// Label shown next to progress in the album form.
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskType::ImportPhotos => "Loading photos",
            TaskType::ImportCover => "Loading cover",
        }
    }
}

/// How far a task has got through its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskProgress {
    pub current: usize,
    pub total: usize,
    /// Name of the file converted last.
    pub current_item: Option<String>,
}

impl TaskProgress {
    pub fn new(current: usize, total: usize) -> Self {
        Self {
            current,
            total,
            current_item: None,
        }
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.current_item = Some(item.into());
        self
    }

    /// Completion as a percentage, 0..=100.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.current.min(self.total) * 100 / self.total) as u8
    }
}

/// Lifecycle of a background task as seen by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Completed,
    Cancelled,
    Failed(String),
}

/// Message a worker sends back to the UI loop.
#[derive(Debug, Clone)]
pub enum TaskUpdate {
    /// Work began; `total` files will be converted.
    Started { total: usize },
    /// A chunk of files finished.
    Progress(TaskProgress),
    /// Every file converted.
    Completed { message: String },
    /// The cancel flag was seen between chunks.
    Cancelled,
    /// A conversion failed and the batch was abandoned.
    Failed { error: String },
}

/// A registered task: its latest state plus the channel and cancel flag
/// shared with the worker.
pub struct BackgroundTask {
    pub id: TaskId,
    pub task_type: TaskType,
    pub state: TaskState,
    pub progress: Option<TaskProgress>,
    pub cancel_flag: Arc<AtomicBool>,
    pub receiver: mpsc::Receiver<TaskUpdate>,
    pub started_at: Instant,
}

impl BackgroundTask {
    /// Start tracking a task in the `Running` state.
    pub fn new(task_type: TaskType, cancel_flag: Arc<AtomicBool>, receiver: mpsc::Receiver<TaskUpdate>) -> Self {
        Self {
            id: TaskId::new(),
            task_type,
            state: TaskState::Running,
            progress: None,
            cancel_flag,
            receiver,
            started_at: Instant::now(),
        }
    }

    /// Ask the worker to stop at its next chunk boundary.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    /// Time since the task was registered.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// True until a terminal update has been received.
    pub fn is_running(&self) -> bool {
        self.state == TaskState::Running
    }
}

/// A task that finished (in any way) since the last poll.
#[derive(Debug, Clone)]
pub struct TaskCompletionInfo {
    pub id: TaskId,
    pub task_type: TaskType,
    pub message: String,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(TaskProgress::new(0, 0).percent(), 0);
        assert_eq!(TaskProgress::new(5, 20).percent(), 25);
        assert_eq!(TaskProgress::new(30, 20).percent(), 100);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }
}
