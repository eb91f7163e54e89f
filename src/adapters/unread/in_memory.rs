//! Process-local unread counts.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{ChannelId, UserId, WorkspaceId};
use crate::ports::{UnreadCounter, UnreadCounterError};

type CountKey = (WorkspaceId, ChannelId, UserId);

#[derive(Default)]
pub struct InMemoryUnreadCounter {
    counts: RwLock<HashMap<CountKey, u64>>,
}

impl InMemoryUnreadCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for one member of one channel.
    pub async fn count(&self, workspace_id: &WorkspaceId, channel_id: &ChannelId, user_id: &UserId) -> u64 {
        let key = (workspace_id.clone(), channel_id.clone(), user_id.clone());
        self.counts.read().await.get(&key).copied().unwrap_or(0)
    }

    /// Reset a member's count, as when they read the channel.
    pub async fn clear(&self, workspace_id: &WorkspaceId, channel_id: &ChannelId, user_id: &UserId) {
        let key = (workspace_id.clone(), channel_id.clone(), user_id.clone());
        self.counts.write().await.remove(&key);
    }
}

#[async_trait]
impl UnreadCounter for InMemoryUnreadCounter {
    async fn increment_unread(
        &self,
        workspace_id: &WorkspaceId,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<(), UnreadCounterError> {
        let key = (workspace_id.clone(), channel_id.clone(), user_id.clone());
        *self.counts.write().await.entry(key).or_insert(0) += 1;
        Ok(())
    }
}
