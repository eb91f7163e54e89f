//! Notification bridge: hands offline recipients to the background queue.
//!
//! One task is enqueued per event, carrying the whole offline set, so the
//! worker can fan out on its own schedule.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use crate::domain::foundation::UserId;
use crate::domain::realtime::{NotificationKind, NotificationTask};
use crate::ports::{TaskQueue, TaskQueueError};

/// What the bridge did with a notification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// One task was enqueued for this many users.
    Enqueued { recipients: usize },
    /// Nobody was offline.
    NoRecipients,
    /// The event type has no offline notification kind.
    Unrecognised,
}

/// Adapter between business services and the background task queue.
#[derive(Clone)]
pub struct NotificationBridge {
    queue: Arc<dyn TaskQueue>,
}

impl NotificationBridge {
    pub fn new(queue: Arc<dyn TaskQueue>) -> Self {
        Self { queue }
    }

    /// Enqueue a fallback for an event identified by its wire name.
    ///
    /// Event types without a notification kind are a no-op.
    pub async fn notify_offline(
        &self,
        event_type: &str,
        user_ids: &BTreeSet<UserId>,
        data: Value,
    ) -> Result<NotifyOutcome, TaskQueueError> {
        match NotificationKind::from_event_type(event_type) {
            Some(kind) => self.notify(kind, user_ids, data).await,
            None => {
                tracing::debug!(event_type, "No offline notification for event type");
                Ok(NotifyOutcome::Unrecognised)
            }
        }
    }

    /// Enqueue one task of `kind` for every user in `user_ids`.
    pub async fn notify(
        &self,
        kind: NotificationKind,
        user_ids: &BTreeSet<UserId>,
        data: Value,
    ) -> Result<NotifyOutcome, TaskQueueError> {
        if user_ids.is_empty() {
            return Ok(NotifyOutcome::NoRecipients);
        }

        let task = NotificationTask::new(kind, user_ids.clone(), data);
        let payload = serde_json::to_value(&task)?;
        self.queue.enqueue(kind.task_name(), payload).await?;

        tracing::info!(
            task = kind.task_name(),
            recipients = user_ids.len(),
            "Enqueued offline notification"
        );
        Ok(NotifyOutcome::Enqueued {
            recipients: user_ids.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::task_queue::InMemoryTaskQueue;
    use serde_json::json;

    fn users(ids: &[&str]) -> BTreeSet<UserId> {
        ids.iter().map(|id| UserId::new(*id).unwrap()).collect()
    }

    #[tokio::test]
    async fn enqueues_one_task_for_the_whole_offline_set() {
        let (queue, mut jobs) = InMemoryTaskQueue::new();
        let bridge = NotificationBridge::new(Arc::new(queue));

        let outcome = bridge
            .notify_offline("message:unread", &users(&["a", "b", "c"]), json!({"channel_id": "c1"}))
            .await
            .unwrap();

        assert_eq!(outcome, NotifyOutcome::Enqueued { recipients: 3 });
        let job = jobs.recv().await.unwrap();
        assert_eq!(job.task_name, "send_unread_message");
        assert_eq!(job.payload["user_ids"], json!(["a", "b", "c"]));
        assert!(jobs.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_offline_set_enqueues_nothing() {
        let (queue, mut jobs) = InMemoryTaskQueue::new();
        let bridge = NotificationBridge::new(Arc::new(queue));

        let outcome = bridge
            .notify(NotificationKind::MessageUnread, &BTreeSet::new(), json!({}))
            .await
            .unwrap();

        assert_eq!(outcome, NotifyOutcome::NoRecipients);
        assert!(jobs.try_recv().is_err());
    }

    #[tokio::test]
    async fn unrecognised_event_type_is_a_noop() {
        let (queue, mut jobs) = InMemoryTaskQueue::new();
        let bridge = NotificationBridge::new(Arc::new(queue));

        let outcome = bridge
            .notify_offline("reaction:create", &users(&["a"]), json!({}))
            .await
            .unwrap();

        assert_eq!(outcome, NotifyOutcome::Unrecognised);
        assert!(jobs.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_queue_surfaces_error() {
        let (queue, jobs) = InMemoryTaskQueue::new();
        drop(jobs);
        let bridge = NotificationBridge::new(Arc::new(queue));

        let result = bridge
            .notify(NotificationKind::MessageUnread, &users(&["a"]), json!({}))
            .await;

        assert!(matches!(result, Err(TaskQueueError::Closed)));
    }
}
