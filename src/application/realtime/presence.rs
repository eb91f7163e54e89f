//! Presence queries for the online/offline branch of the notification path.
//!
//! "Online in a channel" means the registry has the user recorded as
//! holding a subscription to the channel room. It is a best-effort signal:
//! no round-trip to the client is made to confirm reachability.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::domain::foundation::{ChannelId, UserId};

use super::registry::RoomRegistry;

/// Channel members split by delivery path.
///
/// Every member lands in exactly one of the two sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientPartition {
    /// Subscribed to the channel room: receives the realtime push only.
    pub online: BTreeSet<UserId>,
    /// Not subscribed: receives an unread increment and a queued notification.
    pub offline: BTreeSet<UserId>,
}

/// Answers which users are reachable right now.
#[derive(Clone)]
pub struct PresenceQueryService {
    registry: Arc<RoomRegistry>,
}

impl PresenceQueryService {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Users believed reachable in a channel.
    pub async fn online_users_in_channel(&self, channel_id: &ChannelId) -> HashSet<UserId> {
        self.registry.members_of(channel_id).await
    }

    /// True if the user has at least one live bound connection.
    pub async fn is_connected(&self, user_id: &UserId) -> bool {
        !self.registry.connections_of(user_id).await.is_empty()
    }

    /// Split a channel's full member list into online and offline sets.
    ///
    /// Subscribers that are not in `members` are ignored: they are not
    /// recipients of this event as far as the data store is concerned.
    pub async fn partition<I>(&self, channel_id: &ChannelId, members: I) -> RecipientPartition
    where
        I: IntoIterator<Item = UserId>,
    {
        let online_now = self.online_users_in_channel(channel_id).await;

        let (online, offline) = members
            .into_iter()
            .partition(|member| online_now.contains(member));

        RecipientPartition { online, offline }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConnectionId;
    use crate::domain::realtime::RoomName;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn unknown_channel_has_no_online_users() {
        let presence = PresenceQueryService::new(Arc::new(RoomRegistry::new()));
        let channel = ChannelId::new("quiet").unwrap();

        assert!(presence.online_users_in_channel(&channel).await.is_empty());
    }

    #[tokio::test]
    async fn partition_covers_every_member_exactly_once() {
        let registry = Arc::new(RoomRegistry::new());
        let presence = PresenceQueryService::new(registry.clone());
        let channel = ChannelId::new("c1").unwrap();
        let conn = ConnectionId::new();
        registry.bind(conn, &user("alice")).await.unwrap();
        registry
            .subscribe(conn, &RoomName::Channel(channel.clone()))
            .await
            .unwrap();
        registry.join_channel(&channel, &user("lurker")).await;

        let members = [user("alice"), user("bob"), user("carol")];
        let split = presence.partition(&channel, members.clone()).await;

        assert_eq!(split.online, BTreeSet::from([user("alice")]));
        assert_eq!(split.offline, BTreeSet::from([user("bob"), user("carol")]));
        assert!(split.online.is_disjoint(&split.offline));
        assert_eq!(split.online.len() + split.offline.len(), members.len());
    }

    #[tokio::test]
    async fn is_connected_follows_bind_and_unbind() {
        let registry = Arc::new(RoomRegistry::new());
        let presence = PresenceQueryService::new(registry.clone());
        let conn = ConnectionId::new();

        registry.bind(conn, &user("alice")).await.unwrap();
        assert!(presence.is_connected(&user("alice")).await);

        registry.unbind(conn).await;
        assert!(!presence.is_connected(&user("alice")).await);
    }
}
