//! In-process room transport backing the WebSocket endpoint.
//!
//! Each accepted connection gets a bounded outbox drained by its socket
//! writer task. Rooms map a room name to the connections subscribed to it.
//!
//! ```text
//! Room: channel_c1          Outboxes
//! ├── conn-a  ───────────▶  conn-a [ev, ev, ...] ──▶ socket writer
//! └── conn-b  ───────────▶  conn-b [ev, ...]     ──▶ socket writer
//! ```
//!
//! `send` uses `try_send`, so a connection whose outbox is full loses the
//! event instead of stalling the fan-out for everyone else.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::ConnectionId;
use crate::domain::realtime::{RealtimeEvent, RoomName};
use crate::ports::{RoomTransport, TransportError};

struct Outbox {
    sender: mpsc::Sender<RealtimeEvent>,
    rooms: HashSet<RoomName>,
}

#[derive(Default)]
struct TransportState {
    outboxes: HashMap<ConnectionId, Outbox>,
    rooms: HashMap<RoomName, HashSet<ConnectionId>>,
}

/// Room transport for connections served by this process.
///
/// # Thread Safety
///
/// One `RwLock` guards both maps. Sends only take the read half, so
/// concurrent fan-outs to different rooms do not contend.
pub struct LocalTransport {
    state: RwLock<TransportState>,
    buffer: usize,
}

impl LocalTransport {
    /// Create a transport whose per-connection outbox holds `buffer` events.
    pub fn new(buffer: usize) -> Self {
        Self {
            state: RwLock::new(TransportState::default()),
            buffer: buffer.max(1),
        }
    }

    /// Accept a connection and hand back the receiving end of its outbox.
    ///
    /// Registering the same id again replaces the previous outbox.
    pub async fn register(&self, connection: ConnectionId) -> mpsc::Receiver<RealtimeEvent> {
        let (sender, receiver) = mpsc::channel(self.buffer);
        let mut state = self.state.write().await;
        if let Some(previous) = state.outboxes.insert(
            connection,
            Outbox {
                sender,
                rooms: HashSet::new(),
            },
        ) {
            for room in previous.rooms {
                detach(&mut state.rooms, &room, connection);
            }
        }
        receiver
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.outboxes.len()
    }

    /// Number of rooms with at least one subscriber.
    pub async fn room_count(&self) -> usize {
        self.state.read().await.rooms.len()
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new(64)
    }
}

fn detach(
    rooms: &mut HashMap<RoomName, HashSet<ConnectionId>>,
    room: &RoomName,
    connection: ConnectionId,
) {
    if let Some(members) = rooms.get_mut(room) {
        members.remove(&connection);
        if members.is_empty() {
            rooms.remove(room);
        }
    }
}

#[async_trait]
impl RoomTransport for LocalTransport {
    async fn join_room(
        &self,
        connection: ConnectionId,
        room: &RoomName,
    ) -> Result<(), TransportError> {
        let mut state = self.state.write().await;
        let outbox = state
            .outboxes
            .get_mut(&connection)
            .ok_or(TransportError::UnknownConnection(connection))?;
        if outbox.rooms.insert(room.clone()) {
            state.rooms.entry(room.clone()).or_default().insert(connection);
        }
        Ok(())
    }

    async fn leave_room(&self, connection: ConnectionId, room: &RoomName) {
        let mut state = self.state.write().await;
        let removed = state
            .outboxes
            .get_mut(&connection)
            .map(|outbox| outbox.rooms.remove(room))
            .unwrap_or(false);
        if removed {
            detach(&mut state.rooms, room, connection);
        }
    }

    async fn room_members(&self, room: &RoomName) -> Vec<ConnectionId> {
        self.state
            .read()
            .await
            .rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    async fn connections(&self) -> Vec<ConnectionId> {
        self.state.read().await.outboxes.keys().copied().collect()
    }

    async fn send(
        &self,
        connection: ConnectionId,
        event: &RealtimeEvent,
    ) -> Result<(), TransportError> {
        let state = self.state.read().await;
        let outbox = state
            .outboxes
            .get(&connection)
            .ok_or(TransportError::UnknownConnection(connection))?;

        outbox.sender.try_send(event.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Backpressure(connection),
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed(connection),
        })
    }

    async fn disconnect(&self, connection: ConnectionId) {
        let mut state = self.state.write().await;
        if let Some(outbox) = state.outboxes.remove(&connection) {
            for room in &outbox.rooms {
                detach(&mut state.rooms, room, connection);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ChannelId;
    use serde_json::json;

    fn channel_room(id: &str) -> RoomName {
        RoomName::Channel(ChannelId::new(id).unwrap())
    }

    #[tokio::test]
    async fn join_unknown_connection_fails() {
        let transport = LocalTransport::new(4);
        let conn = ConnectionId::new();

        let result = transport.join_room(conn, &channel_room("c1")).await;

        assert_eq!(result, Err(TransportError::UnknownConnection(conn)));
    }

    #[tokio::test]
    async fn join_twice_lists_connection_once() {
        let transport = LocalTransport::new(4);
        let conn = ConnectionId::new();
        let _rx = transport.register(conn).await;
        let room = channel_room("c1");

        transport.join_room(conn, &room).await.unwrap();
        transport.join_room(conn, &room).await.unwrap();

        assert_eq!(transport.room_members(&room).await, vec![conn]);
    }

    #[tokio::test]
    async fn leaving_last_member_removes_room() {
        let transport = LocalTransport::new(4);
        let conn = ConnectionId::new();
        let _rx = transport.register(conn).await;
        let room = channel_room("c1");
        transport.join_room(conn, &room).await.unwrap();

        transport.leave_room(conn, &room).await;
        transport.leave_room(conn, &room).await;

        assert!(transport.room_members(&room).await.is_empty());
        assert_eq!(transport.room_count().await, 0);
    }

    #[tokio::test]
    async fn send_preserves_order_per_connection() {
        let transport = LocalTransport::new(4);
        let conn = ConnectionId::new();
        let mut rx = transport.register(conn).await;

        for n in 0..3 {
            transport
                .send(conn, &RealtimeEvent::new("tick", json!(n)))
                .await
                .unwrap();
        }

        for n in 0..3 {
            assert_eq!(rx.recv().await.unwrap().payload, json!(n));
        }
    }

    #[tokio::test]
    async fn full_outbox_reports_backpressure() {
        let transport = LocalTransport::new(1);
        let conn = ConnectionId::new();
        let _rx = transport.register(conn).await;
        let event = RealtimeEvent::new("tick", json!(null));

        transport.send(conn, &event).await.unwrap();
        let result = transport.send(conn, &event).await;

        assert_eq!(result, Err(TransportError::Backpressure(conn)));
    }

    #[tokio::test]
    async fn dropped_receiver_reports_closed() {
        let transport = LocalTransport::new(4);
        let conn = ConnectionId::new();
        drop(transport.register(conn).await);

        let result = transport
            .send(conn, &RealtimeEvent::new("tick", json!(null)))
            .await;

        assert_eq!(result, Err(TransportError::Closed(conn)));
    }

    #[tokio::test]
    async fn disconnect_clears_rooms_and_outbox() {
        let transport = LocalTransport::new(4);
        let conn = ConnectionId::new();
        let _rx = transport.register(conn).await;
        transport.join_room(conn, &channel_room("c1")).await.unwrap();
        transport.join_room(conn, &channel_room("c2")).await.unwrap();

        transport.disconnect(conn).await;
        transport.disconnect(conn).await;

        assert_eq!(transport.connection_count().await, 0);
        assert_eq!(transport.room_count().await, 0);
        assert!(transport.connections().await.is_empty());
    }
}
