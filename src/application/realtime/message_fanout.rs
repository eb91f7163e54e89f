//! Channel message fan-out use case.
//!
//! Pushes a new message to everyone subscribed to the channel room and
//! routes the rest of the membership through the unread counter and the
//! notification bridge. Each member takes exactly one of the two paths.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::{json, Value};

use crate::domain::foundation::{ChannelId, UserId, WorkspaceId};
use crate::domain::realtime::{ChannelEventType, NotificationKind};
use crate::ports::{TaskQueueError, UnreadCounter};

use super::dispatcher::{DeliveryReport, EventDispatcher};
use super::notification_bridge::{NotificationBridge, NotifyOutcome};
use super::presence::PresenceQueryService;

/// A message that was just persisted to a channel.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub workspace_id: WorkspaceId,
    pub channel_id: ChannelId,
    /// Full member list as recorded by the data store.
    pub members: BTreeSet<UserId>,
    /// Message body, forwarded to clients untouched.
    pub message: Value,
}

/// What happened to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutSummary {
    pub online: BTreeSet<UserId>,
    pub offline: BTreeSet<UserId>,
    pub push: DeliveryReport,
    /// Offline members whose unread count could not be bumped.
    pub unread_failures: usize,
    pub notification: NotifyOutcome,
}

pub struct ChannelMessageFanout {
    presence: PresenceQueryService,
    dispatcher: Arc<EventDispatcher>,
    bridge: NotificationBridge,
    unread: Arc<dyn UnreadCounter>,
}

impl ChannelMessageFanout {
    pub fn new(
        presence: PresenceQueryService,
        dispatcher: Arc<EventDispatcher>,
        bridge: NotificationBridge,
        unread: Arc<dyn UnreadCounter>,
    ) -> Self {
        Self {
            presence,
            dispatcher,
            bridge,
            unread,
        }
    }

    /// Deliver one message.
    ///
    /// Push and unread failures are logged and counted. Only a failure to
    /// enqueue the offline notification is returned to the caller.
    pub async fn deliver(&self, message: ChannelMessage) -> Result<FanoutSummary, TaskQueueError> {
        let ChannelMessage {
            workspace_id,
            channel_id,
            members,
            message,
        } = message;

        let split = self.presence.partition(&channel_id, members).await;

        let push = self
            .dispatcher
            .send_to_channel(
                &channel_id,
                ChannelEventType::MessageCreate,
                json!({
                    "workspace_id": workspace_id,
                    "channel_id": channel_id,
                    "message": message,
                }),
            )
            .await;

        let increments = split.offline.iter().map(|user_id| {
            let (workspace_id, channel_id) = (&workspace_id, &channel_id);
            async move {
                self.unread
                    .increment_unread(workspace_id, channel_id, user_id)
                    .await
                    .map_err(|e| {
                        tracing::warn!(
                            user_id = %user_id,
                            channel_id = %channel_id,
                            "Failed to increment unread count: {}",
                            e
                        );
                    })
                    .is_err()
            }
        });
        let unread_failures = join_all(increments).await.into_iter().filter(|f| *f).count();

        let notification = self
            .bridge
            .notify(
                NotificationKind::MessageUnread,
                &split.offline,
                json!({
                    "workspace_id": workspace_id,
                    "channel_id": channel_id,
                }),
            )
            .await?;

        tracing::info!(
            channel_id = %channel_id,
            online = split.online.len(),
            offline = split.offline.len(),
            "Fanned out channel message"
        );

        Ok(FanoutSummary {
            online: split.online,
            offline: split.offline,
            push,
            unread_failures,
            notification,
        })
    }
}
