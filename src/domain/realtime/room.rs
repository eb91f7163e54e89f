//! Room naming for transport-level delivery groups.
//!
//! Clients and the dispatcher both address rooms by their string name,
//! so the `user_{id}` / `workspace_{id}` / `channel_{id}` format is part
//! of the wire contract and must not change.

use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{ChannelId, UserId, ValidationError, WorkspaceId};

const USER_PREFIX: &str = "user_";
const WORKSPACE_PREFIX: &str = "workspace_";
const CHANNEL_PREFIX: &str = "channel_";

/// A named delivery group at the transport level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomName {
    /// Every connection bound to one user.
    User(UserId),
    /// Every connection that joined a workspace.
    Workspace(WorkspaceId),
    /// Every connection that joined a channel.
    Channel(ChannelId),
}

impl RoomName {
    /// Returns the channel id when this is a channel room.
    pub fn channel(&self) -> Option<&ChannelId> {
        match self {
            RoomName::Channel(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomName::User(id) => write!(f, "{}{}", USER_PREFIX, id),
            RoomName::Workspace(id) => write!(f, "{}{}", WORKSPACE_PREFIX, id),
            RoomName::Channel(id) => write!(f, "{}{}", CHANNEL_PREFIX, id),
        }
    }
}

impl FromStr for RoomName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix(USER_PREFIX) {
            return Ok(RoomName::User(UserId::new(id)?));
        }
        if let Some(id) = s.strip_prefix(WORKSPACE_PREFIX) {
            return Ok(RoomName::Workspace(WorkspaceId::new(id)?));
        }
        if let Some(id) = s.strip_prefix(CHANNEL_PREFIX) {
            return Ok(RoomName::Channel(ChannelId::new(id)?));
        }
        Err(ValidationError::invalid_format("room", "unknown prefix"))
    }
}

impl From<UserId> for RoomName {
    fn from(id: UserId) -> Self {
        RoomName::User(id)
    }
}

impl From<WorkspaceId> for RoomName {
    fn from(id: WorkspaceId) -> Self {
        RoomName::Workspace(id)
    }
}

impl From<ChannelId> for RoomName {
    fn from(id: ChannelId) -> Self {
        RoomName::Channel(id)
    }
}
