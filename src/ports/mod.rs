//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the realtime core and its collaborators. Adapters implement these ports.
//!
//! - `RoomTransport` - Socket layer with room subscription and per-connection send
//! - `TaskQueue` / `TaskHandler` - Background job queue for offline fallback
//! - `UnreadCounter` - Data store hook for unread counts

mod task_queue;
mod transport;
mod unread_counter;

pub use task_queue::{TaskHandler, TaskQueue, TaskQueueError};
pub use transport::{RoomTransport, TransportError};
pub use unread_counter::{UnreadCounter, UnreadCounterError};
