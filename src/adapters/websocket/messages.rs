//! WebSocket message protocol.
//!
//! Every frame in either direction is a JSON object `{"event": ..., "data": ...}`.
//! - Client → Server: room join/leave requests, pings
//! - Server → Client: acks, the connected greeting, pongs, realtime events

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{ConnectionId, Timestamp};
use crate::domain::realtime::{RealtimeEvent, RoomName};

// ============================================
// Event names
// ============================================

pub const JOIN_USER_ROOM: &str = "join_user_room";
pub const LEAVE_USER_ROOM: &str = "leave_user_room";
pub const JOIN_WORKSPACE_ROOM: &str = "join_workspace_room";
pub const LEAVE_WORKSPACE_ROOM: &str = "leave_workspace_room";
pub const JOIN_CHANNEL_ROOM: &str = "join_channel_room";
pub const LEAVE_CHANNEL_ROOM: &str = "leave_channel_room";
pub const PING: &str = "ping";

pub const ROOM_JOIN_ACK: &str = "room_join_ack";
pub const ROOM_LEAVE_ACK: &str = "room_leave_ack";
pub const CONNECTED: &str = "connected";
pub const PONG: &str = "pong";

// ============================================
// Client → Server Messages
// ============================================

/// Raw frame as sent by the client.
#[derive(Debug, Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Body of `join_user_room` / `leave_user_room`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserRoomRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Body of `join_workspace_room` / `leave_workspace_room`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorkspaceRoomRequest {
    #[serde(default)]
    pub workspace_id: Option<String>,
}

/// Body of `join_channel_room` / `leave_channel_room`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChannelRoomRequest {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
}

/// All message types that can be received from a client.
///
/// Request bodies are parsed leniently: a body of the wrong shape is
/// treated as one with every id missing, which the lifecycle answers with
/// a failure ack rather than dropping the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    JoinUserRoom(UserRoomRequest),
    LeaveUserRoom(UserRoomRequest),
    JoinWorkspaceRoom(WorkspaceRoomRequest),
    LeaveWorkspaceRoom(WorkspaceRoomRequest),
    JoinChannelRoom(ChannelRoomRequest),
    LeaveChannelRoom(ChannelRoomRequest),
    Ping,
    /// Any event name the server does not handle.
    Unknown(String),
}

impl ClientMessage {
    /// Parse one text frame. Fails only if the frame is not a JSON object
    /// with a string `event` field.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let frame: RawFrame = serde_json::from_str(text)?;

        let msg = match frame.event.as_str() {
            JOIN_USER_ROOM => ClientMessage::JoinUserRoom(body(frame.data)),
            LEAVE_USER_ROOM => ClientMessage::LeaveUserRoom(body(frame.data)),
            JOIN_WORKSPACE_ROOM => ClientMessage::JoinWorkspaceRoom(body(frame.data)),
            LEAVE_WORKSPACE_ROOM => ClientMessage::LeaveWorkspaceRoom(body(frame.data)),
            JOIN_CHANNEL_ROOM => ClientMessage::JoinChannelRoom(body(frame.data)),
            LEAVE_CHANNEL_ROOM => ClientMessage::LeaveChannelRoom(body(frame.data)),
            PING => ClientMessage::Ping,
            _ => ClientMessage::Unknown(frame.event),
        };
        Ok(msg)
    }

    /// Wire name of the request, for logging.
    pub fn event_name(&self) -> &str {
        match self {
            ClientMessage::JoinUserRoom(_) => JOIN_USER_ROOM,
            ClientMessage::LeaveUserRoom(_) => LEAVE_USER_ROOM,
            ClientMessage::JoinWorkspaceRoom(_) => JOIN_WORKSPACE_ROOM,
            ClientMessage::LeaveWorkspaceRoom(_) => LEAVE_WORKSPACE_ROOM,
            ClientMessage::JoinChannelRoom(_) => JOIN_CHANNEL_ROOM,
            ClientMessage::LeaveChannelRoom(_) => LEAVE_CHANNEL_ROOM,
            ClientMessage::Ping => PING,
            ClientMessage::Unknown(name) => name,
        }
    }
}

fn body<T: serde::de::DeserializeOwned + Default>(data: Value) -> T {
    serde_json::from_value(data).unwrap_or_default()
}

// ============================================
// Server → Client Messages
// ============================================

/// Outcome carried by an ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Success,
    Failure,
}

/// Body of `room_join_ack` and `room_leave_ack`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    pub status: AckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RoomAck {
    pub fn success(room: &RoomName) -> Self {
        Self {
            room_name: Some(room.to_string()),
            status: AckStatus::Success,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            room_name: None,
            status: AckStatus::Failure,
            message: Some(message.into()),
        }
    }

    /// Failure that still names the room the client asked for.
    pub fn failure_for(room: &RoomName, message: impl Into<String>) -> Self {
        Self {
            room_name: Some(room.to_string()),
            ..Self::failure(message)
        }
    }

    pub fn into_join_event(self) -> RealtimeEvent {
        RealtimeEvent::new(ROOM_JOIN_ACK, to_payload(&self))
    }

    pub fn into_leave_event(self) -> RealtimeEvent {
        RealtimeEvent::new(ROOM_LEAVE_ACK, to_payload(&self))
    }
}

/// Sent once when the socket is accepted.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedMessage {
    pub connection_id: String,
    pub timestamp: String,
}

impl ConnectedMessage {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }

    pub fn into_event(self) -> RealtimeEvent {
        RealtimeEvent::new(CONNECTED, to_payload(&self))
    }
}

/// Heartbeat response.
#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

impl PongMessage {
    pub fn now() -> Self {
        Self {
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }

    pub fn into_event(self) -> RealtimeEvent {
        RealtimeEvent::new(PONG, to_payload(&self))
    }
}

fn to_payload<T: Serialize>(body: &T) -> Value {
    serde_json::to_value(body).unwrap_or(Value::Null)
}

/// Frame written to the socket.
#[derive(Debug, Serialize)]
pub struct ServerFrame<'a> {
    pub event: &'a str,
    pub data: &'a Value,
}

impl<'a> From<&'a RealtimeEvent> for ServerFrame<'a> {
    fn from(event: &'a RealtimeEvent) -> Self {
        Self {
            event: &event.event_type,
            data: &event.payload,
        }
    }
}

/// Encode an event as a text frame.
pub fn encode(event: &RealtimeEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ServerFrame::from(event))
}
