//! Redis-backed task queue for multi-process deployments.
//!
//! Jobs are JSON-encoded `QueuedTask`s pushed with LPUSH onto one list.
//! Consumers pop from the other end with BRPOP, so order is FIFO.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde_json::Value;
use tokio::sync::watch;

use crate::config::RedisConfig;
use crate::ports::{TaskQueue, TaskQueueError};

use super::worker::{QueuedTask, TaskWorker};

/// Seconds a consumer blocks on BRPOP before re-checking for shutdown.
const POP_TIMEOUT_SECS: f64 = 1.0;

#[derive(Clone)]
pub struct RedisTaskQueue {
    conn: MultiplexedConnection,
    queue_key: String,
}

impl RedisTaskQueue {
    /// Create a queue over an existing connection.
    pub fn new(conn: MultiplexedConnection, queue_key: impl Into<String>) -> Self {
        Self {
            conn,
            queue_key: queue_key.into(),
        }
    }

    /// Open a connection using the configured URL and timeout.
    pub async fn connect(config: &RedisConfig) -> Result<Self, TaskQueueError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| TaskQueueError::Redis(e.to_string()))?;
        let conn = tokio::time::timeout(config.timeout(), client.get_multiplexed_tokio_connection())
            .await
            .map_err(|_| TaskQueueError::Redis("connection timed out".to_string()))?
            .map_err(|e| TaskQueueError::Redis(e.to_string()))?;

        tracing::info!(queue = %config.queue_key, "Connected Redis task queue");
        Ok(Self::new(conn, config.queue_key.clone()))
    }

    /// Underlying connection, for adapters sharing it.
    pub fn connection(&self) -> MultiplexedConnection {
        self.conn.clone()
    }

    /// Pop at most one job, waiting up to `POP_TIMEOUT_SECS`.
    pub async fn pop(&self) -> Result<Option<QueuedTask>, TaskQueueError> {
        let mut conn = self.conn.clone();
        let popped: Option<(String, String)> = conn
            .brpop(&self.queue_key, POP_TIMEOUT_SECS)
            .await
            .map_err(|e: redis::RedisError| TaskQueueError::Redis(e.to_string()))?;

        match popped {
            Some((_, raw)) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Consume jobs with `worker` until shutdown is signalled.
    ///
    /// BRPOP holds the multiplexed connection while it waits, so run the
    /// consumer on its own `RedisTaskQueue` rather than the one producers
    /// enqueue through.
    ///
    /// Undecodable jobs are logged and discarded. Connection errors back
    /// off for one pop interval and retry.
    pub async fn consume(&self, worker: &TaskWorker, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(queue = %self.queue_key, "Redis task consumer started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                popped = self.pop() => match popped {
                    Ok(Some(task)) => {
                        worker.process(task).await;
                    }
                    Ok(None) => {}
                    Err(TaskQueueError::Serialization(e)) => {
                        tracing::warn!(queue = %self.queue_key, "Discarding malformed job: {}", e);
                    }
                    Err(e) => {
                        tracing::warn!(queue = %self.queue_key, "Failed to pop job: {}", e);
                        tokio::time::sleep(Duration::from_secs_f64(POP_TIMEOUT_SECS)).await;
                    }
                },
            }
        }
        tracing::info!(queue = %self.queue_key, "Redis task consumer stopped");
    }
}

#[async_trait]
impl TaskQueue for RedisTaskQueue {
    async fn enqueue(&self, task_name: &str, payload: Value) -> Result<(), TaskQueueError> {
        let task = QueuedTask::new(task_name, payload);
        let job = serde_json::to_string(&task)?;

        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(&self.queue_key, job)
            .await
            .map_err(|e: redis::RedisError| TaskQueueError::Redis(e.to_string()))?;

        tracing::debug!(task_id = %task.id, task = task_name, queue = %self.queue_key, "Enqueued Redis job");
        Ok(())
    }
}
