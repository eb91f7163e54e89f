//! Event dispatcher: routes one event to a user, a room, or everyone.
//!
//! Delivery goes through the transport's room subscriptions, never through
//! registry membership. Every recipient is sent to independently and
//! failures are logged per connection; nothing is raised to the caller.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;

use crate::domain::foundation::{ChannelId, ConnectionId, UserId, WorkspaceId};
use crate::domain::realtime::{RealtimeEvent, RoomName};
use crate::ports::RoomTransport;

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections targeted.
    pub recipients: usize,
    /// Connections the event was queued for.
    pub delivered: usize,
    /// Connections the transport refused.
    pub failed: usize,
}

impl DeliveryReport {
    /// True if every targeted connection accepted the event.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Best-effort, at-most-once event fan-out.
pub struct EventDispatcher {
    transport: Arc<dyn RoomTransport>,
}

impl EventDispatcher {
    pub fn new(transport: Arc<dyn RoomTransport>) -> Self {
        Self { transport }
    }

    /// Deliver to every live connection of a user. Offline users get nothing.
    pub async fn send_to_user(
        &self,
        user_id: &UserId,
        event_type: impl AsRef<str>,
        payload: Value,
    ) -> DeliveryReport {
        let room = RoomName::User(user_id.clone());
        self.send_to_room(&room, RealtimeEvent::new(event_type, payload))
            .await
    }

    /// Deliver to every connection in a workspace room.
    pub async fn send_to_workspace(
        &self,
        workspace_id: &WorkspaceId,
        event_type: impl AsRef<str>,
        payload: Value,
    ) -> DeliveryReport {
        let room = RoomName::Workspace(workspace_id.clone());
        self.send_to_room(&room, RealtimeEvent::new(event_type, payload))
            .await
    }

    /// Deliver to every connection in a channel room.
    pub async fn send_to_channel(
        &self,
        channel_id: &ChannelId,
        event_type: impl AsRef<str>,
        payload: Value,
    ) -> DeliveryReport {
        let room = RoomName::Channel(channel_id.clone());
        self.send_to_room(&room, RealtimeEvent::new(event_type, payload))
            .await
    }

    /// Deliver to every connection, bound or not.
    pub async fn broadcast(&self, event_type: impl AsRef<str>, payload: Value) -> DeliveryReport {
        let event = RealtimeEvent::new(event_type, payload);
        let recipients = self.transport.connections().await;
        let report = self.fan_out(recipients, &event).await;

        tracing::info!(
            event_type = %event.event_type,
            recipients = report.recipients,
            failed = report.failed,
            "Broadcast realtime event"
        );
        report
    }

    /// Deliver to whatever connections the transport has in `room`.
    pub async fn send_to_room(&self, room: &RoomName, event: RealtimeEvent) -> DeliveryReport {
        let recipients = self.transport.room_members(room).await;
        let report = self.fan_out(recipients, &event).await;

        tracing::debug!(
            room = %room,
            event_type = %event.event_type,
            recipients = report.recipients,
            failed = report.failed,
            "Emitted realtime event"
        );
        report
    }

    async fn fan_out(&self, recipients: Vec<ConnectionId>, event: &RealtimeEvent) -> DeliveryReport {
        let sends = recipients.iter().map(|connection| async move {
            match self.transport.send(*connection, event).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection,
                        event_type = %event.event_type,
                        "Dropping realtime event: {}",
                        e
                    );
                    false
                }
            }
        });
        let results = join_all(sends).await;

        let delivered = results.iter().filter(|ok| **ok).count();
        DeliveryReport {
            recipients: results.len(),
            delivered,
            failed: results.len() - delivered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::websocket::LocalTransport;
    use serde_json::json;

    fn setup() -> (Arc<LocalTransport>, EventDispatcher) {
        let transport = Arc::new(LocalTransport::new(8));
        let dispatcher = EventDispatcher::new(transport.clone());
        (transport, dispatcher)
    }

    #[tokio::test]
    async fn send_to_offline_user_reaches_nobody() {
        let (_transport, dispatcher) = setup();

        let report = dispatcher
            .send_to_user(&UserId::new("ghost").unwrap(), "message:unread", json!({}))
            .await;

        assert_eq!(report, DeliveryReport::default());
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn send_to_user_reaches_every_connection_in_user_room() {
        let (transport, dispatcher) = setup();
        let alice = UserId::new("alice").unwrap();
        let (c1, c2) = (ConnectionId::new(), ConnectionId::new());
        let mut rx1 = transport.register(c1).await;
        let mut rx2 = transport.register(c2).await;
        transport.join_room(c1, &RoomName::User(alice.clone())).await.unwrap();
        transport.join_room(c2, &RoomName::User(alice.clone())).await.unwrap();

        let report = dispatcher
            .send_to_user(&alice, "mention:create", json!({"id": 1}))
            .await;

        assert_eq!(report.delivered, 2);
        assert_eq!(rx1.recv().await.unwrap().event_type, "mention:create");
        assert_eq!(rx2.recv().await.unwrap().payload, json!({"id": 1}));
    }

    #[tokio::test]
    async fn send_to_workspace_skips_connections_outside_the_room() {
        let (transport, dispatcher) = setup();
        let workspace = WorkspaceId::new("w1").unwrap();
        let (inside, outside) = (ConnectionId::new(), ConnectionId::new());
        let mut rx_in = transport.register(inside).await;
        let mut rx_out = transport.register(outside).await;
        transport
            .join_room(inside, &RoomName::Workspace(workspace.clone()))
            .await
            .unwrap();

        let report = dispatcher
            .send_to_workspace(&workspace, "workspace:update", json!({}))
            .await;

        assert_eq!(report.recipients, 1);
        assert!(rx_in.try_recv().is_ok());
        assert!(rx_out.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_reaches_unbound_connections_too() {
        let (transport, dispatcher) = setup();
        let mut rx = transport.register(ConnectionId::new()).await;

        let report = dispatcher.broadcast("maintenance", json!({"in": 5})).await;

        assert_eq!(report.delivered, 1);
        assert_eq!(rx.recv().await.unwrap().event_type, "maintenance");
    }

    #[tokio::test]
    async fn full_buffer_fails_one_recipient_without_blocking_others() {
        let transport = Arc::new(LocalTransport::new(1));
        let dispatcher = EventDispatcher::new(transport.clone());
        let channel = ChannelId::new("c1").unwrap();
        let room = RoomName::Channel(channel.clone());
        let (stuck, healthy) = (ConnectionId::new(), ConnectionId::new());
        let _rx_stuck = transport.register(stuck).await;
        let mut rx_healthy = transport.register(healthy).await;
        transport.join_room(stuck, &room).await.unwrap();
        transport.join_room(healthy, &room).await.unwrap();

        dispatcher.send_to_channel(&channel, "message:create", json!(1)).await;
        rx_healthy.recv().await.unwrap();
        let report = dispatcher.send_to_channel(&channel, "message:create", json!(2)).await;

        assert_eq!(report.recipients, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(rx_healthy.recv().await.unwrap().payload, json!(2));
    }
}
