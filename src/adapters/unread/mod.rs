//! Unread count adapters.
//!
//! - `InMemoryUnreadCounter` - Process-local counts for development and tests
//! - `RedisUnreadCounter` - Counts kept in Redis hashes keyed per channel

mod in_memory;
mod redis;

pub use in_memory::InMemoryUnreadCounter;
pub use redis::RedisUnreadCounter;
