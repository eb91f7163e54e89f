//! Catalogue of realtime event names pushed to clients.
//!
//! The realtime core never inspects payloads; it only routes by target.
//! These enums exist so business services name events consistently.

use serde_json::Value;

/// Events addressed to a single user's room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserEventType {
    MessageUnread,
    /// Private, DM and group DM channel creation.
    ChannelCreate,
    MentionCreate,
    ChannelRoleUpdate,
    WorkspaceRemove,
}

impl UserEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserEventType::MessageUnread => "message:unread",
            UserEventType::ChannelCreate => "channel:create",
            UserEventType::MentionCreate => "mention:create",
            UserEventType::ChannelRoleUpdate => "channel:role:update",
            UserEventType::WorkspaceRemove => "workspace:remove",
        }
    }
}

/// Events addressed to a workspace room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkspaceEventType {
    WorkspaceUpdate,
    WorkspaceDelete,
    WorkspaceTransfer,
    WorkspaceJoin,
    WorkspaceLeave,
    WorkspaceRoleUpdate,
    /// Public channel creation.
    ChannelCreate,
}

impl WorkspaceEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceEventType::WorkspaceUpdate => "workspace:update",
            WorkspaceEventType::WorkspaceDelete => "workspace:delete",
            WorkspaceEventType::WorkspaceTransfer => "workspace:transfer",
            WorkspaceEventType::WorkspaceJoin => "workspace:join",
            WorkspaceEventType::WorkspaceLeave => "workspace:leave",
            WorkspaceEventType::WorkspaceRoleUpdate => "workspace:role:update",
            WorkspaceEventType::ChannelCreate => "channel:create",
        }
    }
}

/// Events addressed to a channel room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelEventType {
    ChannelUpdate,
    ChannelDelete,
    ChannelTransfer,
    ChannelJoin,
    ChannelLeave,
    MessageCreate,
    MessageUpdate,
    MessageDelete,
    ReactionCreate,
    ReactionDelete,
}

impl ChannelEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelEventType::ChannelUpdate => "channel:update",
            ChannelEventType::ChannelDelete => "channel:delete",
            ChannelEventType::ChannelTransfer => "channel:transfer",
            ChannelEventType::ChannelJoin => "channel:join",
            ChannelEventType::ChannelLeave => "channel:leave",
            ChannelEventType::MessageCreate => "message:create",
            ChannelEventType::MessageUpdate => "message:update",
            ChannelEventType::MessageDelete => "message:delete",
            ChannelEventType::ReactionCreate => "reaction:create",
            ChannelEventType::ReactionDelete => "reaction:delete",
        }
    }
}

impl AsRef<str> for UserEventType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for WorkspaceEventType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for ChannelEventType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A (type, payload) pair routed to clients.
///
/// Both halves are opaque to the realtime core.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeEvent {
    pub event_type: String,
    pub payload: Value,
}

impl RealtimeEvent {
    pub fn new(event_type: impl AsRef<str>, payload: Value) -> Self {
        Self {
            event_type: event_type.as_ref().to_string(),
            payload,
        }
    }
}
