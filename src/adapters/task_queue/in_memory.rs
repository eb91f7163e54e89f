//! In-process task queue for single-node deployments and tests.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::ports::{TaskQueue, TaskQueueError};

use super::worker::QueuedTask;

/// Receiving half of an in-process queue, consumed by `TaskWorker::run`.
pub type TaskReceiver = mpsc::UnboundedReceiver<QueuedTask>;

/// Unbounded in-process queue. Enqueue never waits.
#[derive(Clone)]
pub struct InMemoryTaskQueue {
    sender: mpsc::UnboundedSender<QueuedTask>,
}

impl InMemoryTaskQueue {
    /// Create a queue and the receiver its worker drains.
    pub fn new() -> (Self, TaskReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, task_name: &str, payload: Value) -> Result<(), TaskQueueError> {
        let task = QueuedTask::new(task_name, payload);
        tracing::debug!(task_id = %task.id, task = task_name, "Enqueued in-process task");
        self.sender.send(task).map_err(|_| TaskQueueError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn enqueue_preserves_name_payload_and_order() {
        let (queue, mut tasks) = InMemoryTaskQueue::new();

        queue.enqueue("a", json!({"n": 1})).await.unwrap();
        queue.enqueue("b", json!({"n": 2})).await.unwrap();

        let first = tasks.recv().await.unwrap();
        let second = tasks.recv().await.unwrap();
        assert_eq!((first.task_name.as_str(), first.payload), ("a", json!({"n": 1})));
        assert_eq!(second.task_name, "b");
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn enqueue_after_receiver_dropped_is_closed() {
        let (queue, tasks) = InMemoryTaskQueue::new();
        drop(tasks);

        let result = queue.enqueue("a", json!(null)).await;

        assert!(matches!(result, Err(TaskQueueError::Closed)));
    }
}
