//! TaskQueue port - Interface to the background job queue.
//!
//! The realtime core only needs `enqueue`. Retry, backoff and delivery
//! guarantees belong to the queue implementation and its workers.

use async_trait::async_trait;
use serde_json::Value;

/// Errors that can occur while enqueueing or handling background tasks.
#[derive(Debug, thiserror::Error)]
pub enum TaskQueueError {
    /// Redis communication error
    #[error("Redis error: {0}")]
    Redis(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The queue (or its worker) has shut down.
    #[error("Task queue is closed")]
    Closed,

    /// A task handler failed.
    #[error("Task '{task}' failed: {reason}")]
    Handler { task: String, reason: String },
}

impl From<serde_json::Error> for TaskQueueError {
    fn from(err: serde_json::Error) -> Self {
        TaskQueueError::Serialization(err.to_string())
    }
}

/// Port for handing work to an out-of-band worker.
///
/// # Example
///
/// ```ignore
/// queue.enqueue("send_unread_message", json!({"user_ids": ["u1"]})).await?;
/// ```
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Enqueue one task by name with a JSON payload.
    async fn enqueue(&self, task_name: &str, payload: Value) -> Result<(), TaskQueueError>;
}

/// Consumer side of the queue: executes tasks by name.
///
/// Handlers should ignore task names they do not own so that several
/// handlers can share one worker.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Execute one task.
    async fn handle(&self, task_name: &str, payload: Value) -> Result<(), TaskQueueError>;

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_queue_object_safe(_: &dyn TaskQueue) {}

    #[allow(dead_code)]
    fn assert_handler_object_safe(_: &dyn TaskHandler) {}

    #[test]
    fn serde_errors_convert_to_serialization_variant() {
        let err = serde_json::from_str::<Value>("{").unwrap_err();
        let converted: TaskQueueError = err.into();
        assert!(matches!(converted, TaskQueueError::Serialization(_)));
    }
}
