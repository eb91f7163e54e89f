//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, validation errors and the status state machine
//! trait shared by the realtime core.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{ChannelId, ConnectionId, UserId, WorkspaceId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
