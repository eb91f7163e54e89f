//! Redis-backed unread counts.
//!
//! One hash per channel, `{prefix}:{workspace_id}:{channel_id}`, with a
//! field per user. HINCRBY keeps each increment atomic across processes.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{ChannelId, UserId, WorkspaceId};
use crate::ports::{UnreadCounter, UnreadCounterError};

#[derive(Clone)]
pub struct RedisUnreadCounter {
    conn: MultiplexedConnection,
    prefix: String,
}

impl RedisUnreadCounter {
    pub fn new(conn: MultiplexedConnection, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, workspace_id: &WorkspaceId, channel_id: &ChannelId) -> String {
        format!("{}:{}:{}", self.prefix, workspace_id, channel_id)
    }
}

#[async_trait]
impl UnreadCounter for RedisUnreadCounter {
    async fn increment_unread(
        &self,
        workspace_id: &WorkspaceId,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Result<(), UnreadCounterError> {
        let mut conn = self.conn.clone();
        conn.hincr::<_, _, _, i64>(self.key(workspace_id, channel_id), user_id.as_str(), 1_i64)
            .await
            .map_err(|e: redis::RedisError| UnreadCounterError::Unavailable(e.to_string()))?;
        Ok(())
    }
}
