//! Room registry: the authoritative record of who is connected and where.
//!
//! # Maps
//!
//! ```text
//! connections: conn-1 → { user: alice, rooms: {user_alice, channel_c1} }
//!              conn-2 → { user: alice, rooms: {user_alice} }
//! users:       alice  → {conn-1, conn-2}
//! channels:    c1     → {alice}
//! ```
//!
//! All three maps sit behind one `RwLock`, so every call is a single
//! critical section. The lock is never held across an await on I/O.
//! Empty user and channel entries are removed as soon as they empty out.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::domain::foundation::{ChannelId, ConnectionId, UserId};
use crate::domain::realtime::RoomName;

/// Errors returned by registry mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A connection's identity is immutable once bound.
    #[error("Connection {connection} is already bound to user {bound_to}")]
    AlreadyBound {
        connection: ConnectionId,
        bound_to: UserId,
        requested: UserId,
    },

    /// Room bookkeeping requires a bound connection.
    #[error("Connection {0} is not bound to a user")]
    NotBound(ConnectionId),
}

/// Result of a successful `bind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// The connection was bound now.
    Bound,
    /// The connection was already bound to the same user.
    AlreadyBound,
}

/// Counts for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub connections: usize,
    pub users: usize,
    pub channels: usize,
}

#[derive(Debug)]
struct ConnectionRecord {
    user_id: UserId,
    rooms: HashSet<RoomName>,
}

#[derive(Debug, Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, ConnectionRecord>,
    users: HashMap<UserId, HashSet<ConnectionId>>,
    channels: HashMap<ChannelId, HashSet<UserId>>,
}

impl RegistryState {
    fn add_member(&mut self, channel_id: &ChannelId, user_id: &UserId) {
        self.channels
            .entry(channel_id.clone())
            .or_default()
            .insert(user_id.clone());
    }

    fn remove_member(&mut self, channel_id: &ChannelId, user_id: &UserId) -> bool {
        let Some(members) = self.channels.get_mut(channel_id) else {
            return false;
        };
        let removed = members.remove(user_id);
        if members.is_empty() {
            self.channels.remove(channel_id);
        }
        removed
    }

    /// True if another live connection of `user_id` still holds `room`.
    fn held_elsewhere(&self, user_id: &UserId, except: &ConnectionId, room: &RoomName) -> bool {
        self.users
            .get(user_id)
            .into_iter()
            .flatten()
            .filter(|conn| *conn != except)
            .filter_map(|conn| self.connections.get(conn))
            .any(|record| record.rooms.contains(room))
    }
}

/// Thread-safe store of connection, user and channel relationships.
///
/// One instance per process, shared by `Arc` between connection tasks and
/// business services.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    state: RwLock<RegistryState>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a connection to a user.
    ///
    /// Binding the same pair twice is a no-op. Binding an already-bound
    /// connection to a different user is rejected and leaves state untouched.
    pub async fn bind(
        &self,
        connection_id: ConnectionId,
        user_id: &UserId,
    ) -> Result<BindOutcome, RegistryError> {
        let mut state = self.state.write().await;

        if let Some(record) = state.connections.get(&connection_id) {
            if &record.user_id == user_id {
                return Ok(BindOutcome::AlreadyBound);
            }
            return Err(RegistryError::AlreadyBound {
                connection: connection_id,
                bound_to: record.user_id.clone(),
                requested: user_id.clone(),
            });
        }

        state.connections.insert(
            connection_id,
            ConnectionRecord {
                user_id: user_id.clone(),
                rooms: HashSet::new(),
            },
        );
        state
            .users
            .entry(user_id.clone())
            .or_default()
            .insert(connection_id);

        Ok(BindOutcome::Bound)
    }

    /// Remove a connection from every room and from its user's set.
    ///
    /// Channel membership acquired through this connection is dropped
    /// unless another live connection of the same user still holds the
    /// channel room. Returns the user that was unbound; `None` on every
    /// call after the first.
    pub async fn unbind(&self, connection_id: ConnectionId) -> Option<UserId> {
        let mut state = self.state.write().await;

        let record = state.connections.remove(&connection_id)?;

        if let Some(conns) = state.users.get_mut(&record.user_id) {
            conns.remove(&connection_id);
            if conns.is_empty() {
                state.users.remove(&record.user_id);
            }
        }

        for room in &record.rooms {
            let Some(channel_id) = room.channel() else {
                continue;
            };
            if !state.held_elsewhere(&record.user_id, &connection_id, room) {
                state.remove_member(channel_id, &record.user_id);
            }
        }

        Some(record.user_id)
    }

    /// Record that a bound connection joined a room.
    ///
    /// Channel rooms also add the connection's user to the channel's
    /// member set.
    pub async fn subscribe(
        &self,
        connection_id: ConnectionId,
        room: &RoomName,
    ) -> Result<UserId, RegistryError> {
        let mut state = self.state.write().await;

        let record = state
            .connections
            .get_mut(&connection_id)
            .ok_or(RegistryError::NotBound(connection_id))?;
        record.rooms.insert(room.clone());
        let user_id = record.user_id.clone();

        if let Some(channel_id) = room.channel() {
            state.add_member(channel_id, &user_id);
        }

        Ok(user_id)
    }

    /// Record that a connection left a room. Best-effort: unknown
    /// connections and rooms never joined are ignored.
    ///
    /// Returns true if the connection had the room recorded.
    pub async fn unsubscribe(&self, connection_id: ConnectionId, room: &RoomName) -> bool {
        let mut state = self.state.write().await;

        let Some(record) = state.connections.get_mut(&connection_id) else {
            return false;
        };
        if !record.rooms.remove(room) {
            return false;
        }
        let user_id = record.user_id.clone();

        if let Some(channel_id) = room.channel() {
            if !state.held_elsewhere(&user_id, &connection_id, room) {
                state.remove_member(channel_id, &user_id);
            }
        }

        true
    }

    /// Add a user to a channel's member set.
    pub async fn join_channel(&self, channel_id: &ChannelId, user_id: &UserId) {
        self.state.write().await.add_member(channel_id, user_id);
    }

    /// Remove a user from a channel's member set, pruning the channel
    /// when it empties. Returns true if the user was a member.
    pub async fn leave_channel(&self, channel_id: &ChannelId, user_id: &UserId) -> bool {
        self.state.write().await.remove_member(channel_id, user_id)
    }

    /// Current members of a channel (empty if unknown).
    pub async fn members_of(&self, channel_id: &ChannelId) -> HashSet<UserId> {
        self.state
            .read()
            .await
            .channels
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Live connections of a user (empty if offline).
    pub async fn connections_of(&self, user_id: &UserId) -> HashSet<ConnectionId> {
        self.state
            .read()
            .await
            .users
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The user a connection is bound to, if any.
    pub async fn user_of(&self, connection_id: ConnectionId) -> Option<UserId> {
        self.state
            .read()
            .await
            .connections
            .get(&connection_id)
            .map(|record| record.user_id.clone())
    }

    /// Rooms recorded for a connection (empty if unbound).
    pub async fn rooms_of(&self, connection_id: ConnectionId) -> HashSet<RoomName> {
        self.state
            .read()
            .await
            .connections
            .get(&connection_id)
            .map(|record| record.rooms.clone())
            .unwrap_or_default()
    }

    /// Snapshot of map sizes.
    pub async fn stats(&self) -> RegistryStats {
        let state = self.state.read().await;
        RegistryStats {
            connections: state.connections.len(),
            users: state.users.len(),
            channels: state.channels.len(),
        }
    }
}
