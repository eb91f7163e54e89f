//! Domain layer containing the realtime vocabulary.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `realtime` - Rooms, events, connection status, offline notification kinds
//!
//! Nothing in this layer performs I/O.

pub mod foundation;
pub mod realtime;
