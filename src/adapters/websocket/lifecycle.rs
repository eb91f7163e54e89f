//! Per-connection protocol state machine.
//!
//! One `ConnectionLifecycle` lives inside each socket task. It turns client
//! requests into registry and transport mutations and answers with acks on
//! the same connection. Nothing here can affect another connection.
//!
//! ```text
//! Connected ──join_user_room──▶ Bound ──disconnect──▶ Closed
//!     └──────────────disconnect──────────────────────────▲
//! ```

use std::sync::Arc;

use crate::application::realtime::{BindOutcome, RegistryError, RoomRegistry};
use crate::domain::foundation::{ChannelId, ConnectionId, StateMachine, UserId, WorkspaceId};
use crate::domain::realtime::{ConnectionStatus, RealtimeEvent, RoomName};
use crate::ports::RoomTransport;

use super::messages::{
    ChannelRoomRequest, ClientMessage, PongMessage, RoomAck, UserRoomRequest,
    WorkspaceRoomRequest,
};

const MISSING_USER_ID: &str = "Missing user_id";
const MISSING_WORKSPACE_IDS: &str = "Missing user_id or workspace_id";
const MISSING_CHANNEL_IDS: &str = "Missing required IDs";
const ALREADY_BOUND: &str = "Connection is bound to a different user";
const JOIN_FAILED: &str = "Failed to join room";

/// What the socket task should do after a message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Close,
}

pub struct ConnectionLifecycle {
    connection_id: ConnectionId,
    status: ConnectionStatus,
    user_id: Option<UserId>,
    registry: Arc<RoomRegistry>,
    transport: Arc<dyn RoomTransport>,
}

impl ConnectionLifecycle {
    /// Start tracking an accepted connection. Nothing is recorded and no
    /// room is joined until the client asks.
    pub fn new(
        connection_id: ConnectionId,
        registry: Arc<RoomRegistry>,
        transport: Arc<dyn RoomTransport>,
    ) -> Self {
        tracing::info!(connection_id = %connection_id, "Connection accepted, awaiting join_user_room");
        Self {
            connection_id,
            status: ConnectionStatus::Connected,
            user_id: None,
            registry,
            transport,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Process one client message.
    pub async fn handle(&mut self, message: ClientMessage) -> Step {
        if self.status.is_terminal() {
            return Step::Close;
        }
        tracing::debug!(
            connection_id = %self.connection_id,
            event = message.event_name(),
            "Handling client event"
        );

        match message {
            ClientMessage::JoinUserRoom(req) => self.join_user_room(req).await,
            ClientMessage::LeaveUserRoom(req) => return self.leave_user_room(req).await,
            ClientMessage::JoinWorkspaceRoom(req) => self.join_workspace_room(req).await,
            ClientMessage::LeaveWorkspaceRoom(req) => self.leave_workspace_room(req).await,
            ClientMessage::JoinChannelRoom(req) => self.join_channel_room(req).await,
            ClientMessage::LeaveChannelRoom(req) => self.leave_channel_room(req).await,
            ClientMessage::Ping => self.reply(PongMessage::now().into_event()).await,
            ClientMessage::Unknown(_) => {
                tracing::debug!(connection_id = %self.connection_id, "Ignoring unknown client event");
            }
        }
        Step::Continue
    }

    /// Tear down everything recorded for this connection. Safe to call
    /// more than once.
    pub async fn disconnect(&mut self) {
        let unbound = self.registry.unbind(self.connection_id).await;
        self.transport.disconnect(self.connection_id).await;
        self.user_id = None;
        if !self.status.is_terminal() {
            self.transition(ConnectionStatus::Closed);
            tracing::info!(
                connection_id = %self.connection_id,
                user_id = unbound.as_ref().map(|u| u.as_str()).unwrap_or("unknown"),
                "Connection closed"
            );
        }
    }

    async fn join_user_room(&mut self, req: UserRoomRequest) {
        let Some(user_id) = parse_id::<UserId>(req.user_id) else {
            tracing::debug!(connection_id = %self.connection_id, "join_user_room without user_id");
            return self.reply(RoomAck::failure(MISSING_USER_ID).into_join_event()).await;
        };
        let room = RoomName::User(user_id.clone());

        let outcome = match self.registry.bind(self.connection_id, &user_id).await {
            Ok(outcome) => outcome,
            Err(RegistryError::AlreadyBound { bound_to, .. }) => {
                tracing::warn!(
                    connection_id = %self.connection_id,
                    bound_to = %bound_to,
                    requested = %user_id,
                    "Rejected re-bind of connection to a different user"
                );
                return self
                    .reply(RoomAck::failure_for(&room, ALREADY_BOUND).into_join_event())
                    .await;
            }
            Err(e) => {
                tracing::warn!(connection_id = %self.connection_id, "Bind failed: {}", e);
                return self
                    .reply(RoomAck::failure_for(&room, JOIN_FAILED).into_join_event())
                    .await;
            }
        };

        if let Err(e) = self.enter(&room).await {
            if outcome == BindOutcome::Bound {
                self.registry.unbind(self.connection_id).await;
            }
            tracing::warn!(connection_id = %self.connection_id, room = %room, "Join failed: {}", e);
            return self
                .reply(RoomAck::failure_for(&room, JOIN_FAILED).into_join_event())
                .await;
        }

        if self.status.can_transition_to(&ConnectionStatus::Bound) {
            self.transition(ConnectionStatus::Bound);
        }
        tracing::info!(
            connection_id = %self.connection_id,
            user_id = %user_id,
            room = %room,
            "Joined user room"
        );
        self.user_id = Some(user_id);
        self.reply(RoomAck::success(&room).into_join_event()).await;
    }

    /// Leaving one's own user room drops the identity, and since a
    /// connection never re-binds, closes it.
    async fn leave_user_room(&mut self, req: UserRoomRequest) -> Step {
        let Some(user_id) = parse_id::<UserId>(req.user_id) else {
            tracing::debug!(connection_id = %self.connection_id, "leave_user_room without user_id");
            return Step::Continue;
        };
        let room = RoomName::User(user_id.clone());
        self.transport.leave_room(self.connection_id, &room).await;

        if self.user_id.as_ref() != Some(&user_id) {
            self.reply(RoomAck::success(&room).into_leave_event()).await;
            return Step::Continue;
        }

        self.registry.unbind(self.connection_id).await;
        self.user_id = None;
        self.transition(ConnectionStatus::Closed);
        tracing::info!(
            connection_id = %self.connection_id,
            user_id = %user_id,
            "Left user room, closing connection"
        );
        self.reply(RoomAck::success(&room).into_leave_event()).await;
        Step::Close
    }

    async fn join_workspace_room(&mut self, req: WorkspaceRoomRequest) {
        let workspace_id = parse_id::<WorkspaceId>(req.workspace_id);
        let (Some(user_id), Some(workspace_id)) = (self.user_id.clone(), workspace_id) else {
            tracing::debug!(connection_id = %self.connection_id, "Invalid join_workspace_room request");
            return self
                .reply(RoomAck::failure(MISSING_WORKSPACE_IDS).into_join_event())
                .await;
        };

        self.join_room(RoomName::Workspace(workspace_id), &user_id).await;
    }

    async fn leave_workspace_room(&mut self, req: WorkspaceRoomRequest) {
        let workspace_id = parse_id::<WorkspaceId>(req.workspace_id);
        let (true, Some(workspace_id)) = (self.user_id.is_some(), workspace_id) else {
            tracing::debug!(connection_id = %self.connection_id, "Invalid leave_workspace_room request");
            return;
        };

        self.leave_room(RoomName::Workspace(workspace_id)).await;
    }

    async fn join_channel_room(&mut self, req: ChannelRoomRequest) {
        let channel_id = parse_id::<ChannelId>(req.channel_id);
        let workspace_id = parse_id::<WorkspaceId>(req.workspace_id);
        let (Some(user_id), Some(channel_id), Some(_)) =
            (self.user_id.clone(), channel_id, workspace_id)
        else {
            tracing::debug!(connection_id = %self.connection_id, "Invalid join_channel_room request");
            return self
                .reply(RoomAck::failure(MISSING_CHANNEL_IDS).into_join_event())
                .await;
        };

        self.join_room(RoomName::Channel(channel_id), &user_id).await;
    }

    async fn leave_channel_room(&mut self, req: ChannelRoomRequest) {
        let channel_id = parse_id::<ChannelId>(req.channel_id);
        let (true, Some(channel_id)) = (self.user_id.is_some(), channel_id) else {
            tracing::debug!(connection_id = %self.connection_id, "Invalid leave_channel_room request");
            return;
        };

        self.leave_room(RoomName::Channel(channel_id)).await;
    }

    async fn join_room(&mut self, room: RoomName, user_id: &UserId) {
        if let Err(e) = self.enter(&room).await {
            tracing::warn!(connection_id = %self.connection_id, room = %room, "Join failed: {}", e);
            return self
                .reply(RoomAck::failure_for(&room, JOIN_FAILED).into_join_event())
                .await;
        }

        tracing::info!(
            connection_id = %self.connection_id,
            user_id = %user_id,
            room = %room,
            "Joined room"
        );
        self.reply(RoomAck::success(&room).into_join_event()).await;
    }

    async fn leave_room(&mut self, room: RoomName) {
        self.transport.leave_room(self.connection_id, &room).await;
        self.registry.unsubscribe(self.connection_id, &room).await;

        tracing::info!(connection_id = %self.connection_id, room = %room, "Left room");
        self.reply(RoomAck::success(&room).into_leave_event()).await;
    }

    /// Record the room in the registry, then subscribe at the transport.
    /// The registry entry is rolled back if the transport refuses.
    async fn enter(&self, room: &RoomName) -> Result<(), String> {
        self.registry
            .subscribe(self.connection_id, room)
            .await
            .map_err(|e| e.to_string())?;

        if let Err(e) = self.transport.join_room(self.connection_id, room).await {
            self.registry.unsubscribe(self.connection_id, room).await;
            return Err(e.to_string());
        }
        Ok(())
    }

    async fn reply(&self, event: RealtimeEvent) {
        if let Err(e) = self.transport.send(self.connection_id, &event).await {
            tracing::debug!(
                connection_id = %self.connection_id,
                event_type = %event.event_type,
                "Could not deliver reply: {}",
                e
            );
        }
    }

    fn transition(&mut self, target: ConnectionStatus) {
        match self.status.transition_to(target) {
            Ok(next) => self.status = next,
            Err(e) => {
                tracing::warn!(connection_id = %self.connection_id, "Ignoring status change: {}", e);
            }
        }
    }
}

/// Absent and empty ids are treated alike.
fn parse_id<T: TryFrom<String>>(raw: Option<String>) -> Option<T> {
    raw.and_then(|s| T::try_from(s).ok())
}
