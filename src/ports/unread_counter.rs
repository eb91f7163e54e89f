//! UnreadCounter port - Per-user unread message counts in the data store.

use async_trait::async_trait;

use crate::domain::foundation::{ChannelId, UserId, WorkspaceId};

/// Errors from the unread-count store.
#[derive(Debug, thiserror::Error)]
pub enum UnreadCounterError {
    #[error("Unread counter unavailable: {0}")]
    Unavailable(String),
}

/// Port for bumping a member's unread count when they miss a push.
#[async_trait]
pub trait UnreadCounter: Send + Sync {
    /// Increment the unread count of `user` in `channel`.
    async fn increment_unread(
        &self,
        workspace_id: &WorkspaceId,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<(), UnreadCounterError>;
}
