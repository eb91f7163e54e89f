//! RoomTransport port - Interface to the realtime socket layer.
//!
//! The transport owns socket-level room subscription. Delivery always goes
//! through these rooms; the registry's bookkeeping is only consulted for
//! presence questions.

use async_trait::async_trait;

use crate::domain::foundation::ConnectionId;
use crate::domain::realtime::{RealtimeEvent, RoomName};

/// Errors raised by the transport for a single connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connection was never accepted or has already gone away.
    #[error("Connection {0} is not registered with the transport")]
    UnknownConnection(ConnectionId),

    /// The connection's outbound buffer is full; the event was dropped.
    #[error("Outbound buffer full for connection {0}")]
    Backpressure(ConnectionId),

    /// The socket writer for the connection has shut down.
    #[error("Connection {0} is closed")]
    Closed(ConnectionId),
}

/// Port for the socket layer that tracks room subscriptions and sends frames.
///
/// Implementations must not wait on the remote peer inside `send`: a slow
/// or stuck client has to surface as an error (or a silent drop), never as
/// a future that blocks the caller's fan-out loop.
#[async_trait]
pub trait RoomTransport: Send + Sync {
    /// Subscribe a connection to a room. Joining twice is a no-op.
    async fn join_room(&self, connection: ConnectionId, room: &RoomName)
        -> Result<(), TransportError>;

    /// Unsubscribe a connection from a room. Leaving a room the connection
    /// never joined is not an error.
    async fn leave_room(&self, connection: ConnectionId, room: &RoomName);

    /// Connections currently subscribed to a room.
    async fn room_members(&self, room: &RoomName) -> Vec<ConnectionId>;

    /// Every live connection.
    async fn connections(&self) -> Vec<ConnectionId>;

    /// Queue one event for one connection.
    async fn send(&self, connection: ConnectionId, event: &RealtimeEvent)
        -> Result<(), TransportError>;

    /// Forget a connection and all of its room subscriptions.
    ///
    /// Frames already queued may still be flushed; nothing new is accepted.
    async fn disconnect(&self, connection: ConnectionId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn RoomTransport) {}

    #[test]
    fn transport_error_names_connection() {
        let id = ConnectionId::new();
        let err = TransportError::Backpressure(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
