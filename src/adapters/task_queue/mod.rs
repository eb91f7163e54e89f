//! Background task queue adapters.
//!
//! - `InMemoryTaskQueue` - Single-process queue drained by a local `TaskWorker`
//! - `RedisTaskQueue` - JSON jobs on a Redis list, shared across processes
//! - `TaskWorker` - Runs queued tasks through registered handlers

mod in_memory;
mod redis;
mod worker;

pub use in_memory::{InMemoryTaskQueue, TaskReceiver};
pub use redis::RedisTaskQueue;
pub use worker::{QueuedTask, TaskWorker};
