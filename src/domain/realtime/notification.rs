//! Cross-process notification kinds for users who were not reachable by push.
//!
//! The set of kinds is closed: an event type that does not map to a kind
//! produces no fallback task at all.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::UserId;

use super::events::UserEventType;

/// Task name the worker registers for unread-message fan-out.
pub const SEND_UNREAD_MESSAGE_TASK: &str = "send_unread_message";

/// Kinds of offline notification the fallback worker knows how to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// A channel received a message while the user was not subscribed.
    MessageUnread,
}

impl NotificationKind {
    /// Maps a realtime event type onto a notification kind.
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            t if t == UserEventType::MessageUnread.as_str() => Some(NotificationKind::MessageUnread),
            _ => None,
        }
    }

    /// Name of the background task that handles this kind.
    pub fn task_name(&self) -> &'static str {
        match self {
            NotificationKind::MessageUnread => SEND_UNREAD_MESSAGE_TASK,
        }
    }

    /// Event pushed to each user once the worker picks the task up.
    pub fn event_type(&self) -> UserEventType {
        match self {
            NotificationKind::MessageUnread => UserEventType::MessageUnread,
        }
    }
}

/// Payload of one fallback task: one per event, carrying every offline user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationTask {
    pub event_type: String,
    pub user_ids: BTreeSet<UserId>,
    #[serde(default)]
    pub data: Value,
}

impl NotificationTask {
    pub fn new(kind: NotificationKind, user_ids: BTreeSet<UserId>, data: Value) -> Self {
        Self {
            event_type: kind.event_type().as_str().to_string(),
            user_ids,
            data,
        }
    }

    /// Returns the kind this task was enqueued for, if still recognised.
    pub fn kind(&self) -> Option<NotificationKind> {
        NotificationKind::from_event_type(&self.event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_unread_maps_to_unread_task() {
        let kind = NotificationKind::from_event_type("message:unread").unwrap();
        assert_eq!(kind, NotificationKind::MessageUnread);
        assert_eq!(kind.task_name(), "send_unread_message");
    }

    #[test]
    fn unrecognised_event_types_have_no_kind() {
        assert!(NotificationKind::from_event_type("mention:create").is_none());
        assert!(NotificationKind::from_event_type("").is_none());
    }

    #[test]
    fn task_serializes_with_user_id_list() {
        let users: BTreeSet<UserId> = ["b", "a"]
            .into_iter()
            .map(|u| UserId::new(u).unwrap())
            .collect();
        let task = NotificationTask::new(
            NotificationKind::MessageUnread,
            users,
            json!({"channel_id": "c1"}),
        );

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["event_type"], "message:unread");
        assert_eq!(value["user_ids"], json!(["a", "b"]));
        assert_eq!(value["data"]["channel_id"], "c1");
    }
}
