//! Tracks running imports and drains their update channels.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;
use std::sync::Arc;

use super::{BackgroundTask, TaskCompletionInfo, TaskId, TaskProgress, TaskState, TaskType, TaskUpdate};

pub struct BackgroundTaskManager {
    tasks: HashMap<TaskId, BackgroundTask>,
    /// Registration order, oldest first.
    order: Vec<TaskId>,
}

impl BackgroundTaskManager {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a task. The sender goes to the worker, the flag lets the UI
    /// cancel it.
    pub fn register_task(&mut self, task_type: TaskType) -> (TaskId, mpsc::Sender<TaskUpdate>, Arc<AtomicBool>) {
        let (tx, rx) = mpsc::channel();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let task = BackgroundTask::new(task_type, cancel_flag.clone(), rx);
        let id = task.id;
        tracing::debug!(task = ?id, kind = task_type.display_name(), "Task registered");

        self.tasks.insert(id, task);
        self.order.push(id);
        (id, tx, cancel_flag)
    }

    pub fn is_running(&self, task_type: TaskType) -> bool {
        self.tasks
            .values()
            .any(|t| t.task_type == task_type && t.is_running())
    }

    /// Cancel the newest running task. Returns false when nothing is running.
    pub fn cancel_most_recent(&mut self) -> bool {
        let newest = self
            .order
            .iter()
            .rev()
            .filter_map(|id| self.tasks.get(id))
            .find(|t| t.is_running());
        match newest {
            Some(task) => {
                task.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        self.tasks
            .values()
            .filter(|t| t.is_running())
            .for_each(BackgroundTask::cancel);
    }

    /// Drain every channel. Finished tasks are returned once and forgotten.
    pub fn poll_updates(&mut self) -> Vec<TaskCompletionInfo> {
        let mut finished = Vec::new();

        for (&id, task) in self.tasks.iter_mut() {
            while let Ok(update) = task.receiver.try_recv() {
                let outcome = match update {
                    TaskUpdate::Started { total } => {
                        task.progress = Some(TaskProgress::new(0, total));
                        continue;
                    }
                    TaskUpdate::Progress(progress) => {
                        task.progress = Some(progress);
                        continue;
                    }
                    TaskUpdate::Completed { message } => (TaskState::Completed, message, true),
                    TaskUpdate::Cancelled => (TaskState::Cancelled, "Cancelled".to_string(), false),
                    TaskUpdate::Failed { error } => (TaskState::Failed(error.clone()), error, false),
                };
                let (state, message, success) = outcome;
                task.state = state;
                finished.push(TaskCompletionInfo {
                    id,
                    task_type: task.task_type,
                    message,
                    success,
                });
                break;
            }
        }

        for info in &finished {
            self.tasks.remove(&info.id);
            self.order.retain(|id| *id != info.id);
        }
        finished
    }

    /// Mark a task finished without waiting for its channel, e.g. when the
    /// worker panicked and never reported.
    pub fn forget(&mut self, id: TaskId) {
        self.tasks.remove(&id);
        self.order.retain(|t| *t != id);
    }

    pub fn running_tasks(&self) -> Vec<&BackgroundTask> {
        self.order
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .filter(|t| t.is_running())
            .collect()
    }

    pub fn has_running_tasks(&self) -> bool {
        self.tasks.values().any(BackgroundTask::is_running)
    }
}

impl Default for BackgroundTaskManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_progress_then_completion() {
        let mut manager = BackgroundTaskManager::new();
        let (id, tx, _cancel) = manager.register_task(TaskType::ImportPhotos);
        assert!(manager.is_running(TaskType::ImportPhotos));
        assert!(!manager.is_running(TaskType::ImportCover));

        tx.send(TaskUpdate::Started { total: 4 }).unwrap();
        tx.send(TaskUpdate::Progress(TaskProgress::new(2, 4))).unwrap();
        assert!(manager.poll_updates().is_empty());
        assert_eq!(manager.running_tasks()[0].progress.as_ref().unwrap().percent(), 50);

        tx.send(TaskUpdate::Completed { message: "done".into() }).unwrap();
        let finished = manager.poll_updates();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].id, id);
        assert!(finished[0].success);
        assert!(!manager.has_running_tasks());
    }

    #[test]
    fn test_cancel_most_recent() {
        let mut manager = BackgroundTaskManager::new();
        let (_, _tx1, first) = manager.register_task(TaskType::ImportCover);
        let (_, _tx2, second) = manager.register_task(TaskType::ImportPhotos);

        assert!(manager.cancel_most_recent());
        assert!(second.load(Ordering::SeqCst));
        assert!(!first.load(Ordering::SeqCst));

        manager.cancel_all();
        assert!(first.load(Ordering::SeqCst));
    }

    #[test]
    fn test_failure_reported() {
        let mut manager = BackgroundTaskManager::new();
        let (id, tx, _) = manager.register_task(TaskType::ImportPhotos);
        tx.send(TaskUpdate::Failed { error: "boom".into() }).unwrap();
        let finished = manager.poll_updates();
        assert_eq!(finished[0].message, "boom");
        assert!(!finished[0].success);

        manager.forget(id);
        assert!(manager.running_tasks().is_empty());
    }
}
