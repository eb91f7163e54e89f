//! Consumer for `send_unread_message` tasks.
//!
//! Pushes `message:unread` to every user id in the task. Users still
//! offline when the task runs simply receive nothing.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::realtime::{NotificationKind, NotificationTask, SEND_UNREAD_MESSAGE_TASK};
use crate::ports::{TaskHandler, TaskQueueError};

use super::dispatcher::EventDispatcher;

pub struct UnreadNotificationWorker {
    dispatcher: Arc<EventDispatcher>,
}

impl UnreadNotificationWorker {
    pub fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl TaskHandler for UnreadNotificationWorker {
    async fn handle(&self, task_name: &str, payload: Value) -> Result<(), TaskQueueError> {
        if task_name != SEND_UNREAD_MESSAGE_TASK {
            return Ok(());
        }

        let task: NotificationTask = serde_json::from_value(payload)?;
        let kind = task.kind().ok_or_else(|| TaskQueueError::Handler {
            task: task_name.to_string(),
            reason: format!("unsupported event type '{}'", task.event_type),
        })?;
        if kind != NotificationKind::MessageUnread {
            return Ok(());
        }

        let mut reached = 0;
        for user_id in &task.user_ids {
            let report = self
                .dispatcher
                .send_to_user(user_id, kind.event_type(), task.data.clone())
                .await;
            if report.delivered > 0 {
                reached += 1;
            }
        }

        tracing::debug!(
            task = task_name,
            users = task.user_ids.len(),
            reached,
            "Processed unread notification task"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "unread_notification_worker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::websocket::LocalTransport;
    use crate::domain::foundation::{ConnectionId, UserId};
    use crate::domain::realtime::RoomName;
    use crate::ports::RoomTransport;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn pushes_message_unread_to_each_user_room() {
        let transport = Arc::new(LocalTransport::new(8));
        let worker = UnreadNotificationWorker::new(Arc::new(EventDispatcher::new(transport.clone())));
        let bob = UserId::new("bob").unwrap();
        let conn = ConnectionId::new();
        let mut rx = transport.register(conn).await;
        transport.join_room(conn, &RoomName::User(bob.clone())).await.unwrap();

        let task = NotificationTask::new(
            NotificationKind::MessageUnread,
            BTreeSet::from([bob, UserId::new("offline").unwrap()]),
            json!({"channel_id": "c1"}),
        );
        worker
            .handle(SEND_UNREAD_MESSAGE_TASK, serde_json::to_value(task).unwrap())
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, "message:unread");
        assert_eq!(event.payload, json!({"channel_id": "c1"}));
    }

    #[tokio::test]
    async fn ignores_other_task_names() {
        let transport = Arc::new(LocalTransport::new(8));
        let worker = UnreadNotificationWorker::new(Arc::new(EventDispatcher::new(transport)));

        let result = worker.handle("send_digest_email", json!("not a task")).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn malformed_payload_is_a_serialization_error() {
        let transport = Arc::new(LocalTransport::new(8));
        let worker = UnreadNotificationWorker::new(Arc::new(EventDispatcher::new(transport)));

        let result = worker
            .handle(SEND_UNREAD_MESSAGE_TASK, json!({"user_ids": 7}))
            .await;

        assert!(matches!(result, Err(TaskQueueError::Serialization(_))));
    }
}
