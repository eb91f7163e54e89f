//! Task worker: pulls queued tasks and hands them to handlers by name.
//!
//! Handler failures are logged and the task is dropped. Retries are the
//! queue backend's business, not the worker's.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::foundation::Timestamp;
use crate::ports::TaskHandler;

use super::in_memory::TaskReceiver;

/// One unit of background work as it travels through a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedTask {
    pub id: Uuid,
    pub task_name: String,
    pub payload: Value,
    pub enqueued_at: Timestamp,
}

impl QueuedTask {
    pub fn new(task_name: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_name: task_name.into(),
            payload,
            enqueued_at: Timestamp::now(),
        }
    }
}

/// Dispatches tasks to every registered handler.
#[derive(Clone, Default)]
pub struct TaskWorker {
    handlers: Vec<Arc<dyn TaskHandler>>,
}

impl TaskWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Handlers skip task names they do not own.
    pub fn with_handler(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Run one task through all handlers. Returns how many failed.
    pub async fn process(&self, task: QueuedTask) -> usize {
        let mut failures = 0;
        for handler in &self.handlers {
            if let Err(e) = handler.handle(&task.task_name, task.payload.clone()).await {
                failures += 1;
                tracing::warn!(
                    task_id = %task.id,
                    task = %task.task_name,
                    handler = handler.name(),
                    "Task handler failed: {}",
                    e
                );
            }
        }
        failures
    }

    /// Drain an in-process queue until shutdown is signalled or every
    /// sender is gone.
    ///
    /// On shutdown, tasks already queued are processed before returning.
    pub async fn run(&self, mut tasks: TaskReceiver, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(handlers = self.handlers.len(), "Task worker started");
        loop {
            tokio::select! {
                // Check for shutdown signal
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        while let Ok(task) = tasks.try_recv() {
                            self.process(task).await;
                        }
                        break;
                    }
                }

                task = tasks.recv() => {
                    match task {
                        Some(task) => {
                            self.process(task).await;
                        }
                        None => break,
                    }
                }
            }
        }
        tracing::info!("Task worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::task_queue::InMemoryTaskQueue;
    use crate::ports::{TaskQueue, TaskQueueError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl TaskHandler for Recorder {
        async fn handle(&self, task_name: &str, _payload: Value) -> Result<(), TaskQueueError> {
            self.seen.lock().unwrap().push(task_name.to_string());
            if self.fail {
                return Err(TaskQueueError::Handler {
                    task: task_name.to_string(),
                    reason: "boom".to_string(),
                });
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn process_counts_failing_handlers() {
        let ok = Arc::new(Recorder::default());
        let bad = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let worker = TaskWorker::new().with_handler(ok.clone()).with_handler(bad.clone());

        let failures = worker.process(QueuedTask::new("t", json!({}))).await;

        assert_eq!(failures, 1);
        assert_eq!(ok.seen.lock().unwrap().len(), 1);
        assert_eq!(bad.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn run_drains_queue_on_shutdown() {
        let recorder = Arc::new(Recorder::default());
        let worker = TaskWorker::new().with_handler(recorder.clone());
        let (queue, tasks) = InMemoryTaskQueue::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        queue.enqueue("first", json!(1)).await.unwrap();
        queue.enqueue("second", json!(2)).await.unwrap();
        shutdown_tx.send(true).unwrap();
        worker.run(tasks, shutdown_rx).await;

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn run_stops_when_queue_is_dropped() {
        let recorder = Arc::new(Recorder::default());
        let worker = TaskWorker::new().with_handler(recorder.clone());
        let (queue, tasks) = InMemoryTaskQueue::new();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        queue.enqueue("only", json!(null)).await.unwrap();
        drop(queue);
        worker.run(tasks, shutdown_rx).await;

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["only"]);
    }
}
