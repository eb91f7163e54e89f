//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the realtime core to external systems:
//! - `websocket` - Socket transport, client protocol and upgrade handler
//! - `task_queue` - Background job queues (in-process, Redis) and the worker
//! - `unread` - Unread count stores (in-memory, Redis)
//! - `http` - Internal delivery API for business services

pub mod http;
pub mod task_queue;
pub mod unread;
pub mod websocket;

pub use task_queue::{InMemoryTaskQueue, QueuedTask, RedisTaskQueue, TaskWorker};
pub use unread::{InMemoryUnreadCounter, RedisUnreadCounter};
pub use websocket::{realtime_router, LocalTransport, RealtimeState};
