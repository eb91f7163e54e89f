//! HTTP DTOs for the internal delivery API.
//!
//! Business services in other processes use these to push events, ask
//! about presence and hand over new channel messages.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::realtime::{DeliveryReport, FanoutSummary, NotifyOutcome};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to emit one event to a user, workspace, channel or everyone.
#[derive(Debug, Clone, Deserialize)]
pub struct EmitEventRequest {
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
}

/// Request to deliver a newly persisted channel message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelMessageRequest {
    pub workspace_id: String,
    /// Full channel membership from the data store.
    pub members: Vec<String>,
    #[serde(default)]
    pub message: Value,
}

/// Request to queue an offline notification.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyOfflineRequest {
    pub event_type: String,
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub data: Value,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResponse {
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl From<DeliveryReport> for DeliveryResponse {
    fn from(report: DeliveryReport) -> Self {
        Self {
            recipients: report.recipients,
            delivered: report.delivered,
            failed: report.failed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OnlineUsersResponse {
    pub channel_id: String,
    pub user_ids: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresenceResponse {
    pub user_id: String,
    pub connected: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotifyResponse {
    Enqueued { recipients: usize },
    NoRecipients,
    Unrecognised,
}

impl From<NotifyOutcome> for NotifyResponse {
    fn from(outcome: NotifyOutcome) -> Self {
        match outcome {
            NotifyOutcome::Enqueued { recipients } => NotifyResponse::Enqueued { recipients },
            NotifyOutcome::NoRecipients => NotifyResponse::NoRecipients,
            NotifyOutcome::Unrecognised => NotifyResponse::Unrecognised,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelMessageResponse {
    pub online: BTreeSet<String>,
    pub offline: BTreeSet<String>,
    pub push: DeliveryResponse,
    pub unread_failures: usize,
    pub notification: NotifyResponse,
}

impl From<FanoutSummary> for ChannelMessageResponse {
    fn from(summary: FanoutSummary) -> Self {
        Self {
            online: summary.online.iter().map(|u| u.to_string()).collect(),
            offline: summary.offline.iter().map(|u| u.to_string()).collect(),
            push: summary.push.into(),
            unread_failures: summary.unread_failures,
            notification: summary.notification.into(),
        }
    }
}

/// Standard error response format.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emit_request_payload_defaults_to_null() {
        let req: EmitEventRequest =
            serde_json::from_value(json!({"event_type": "workspace:update"})).unwrap();
        assert_eq!(req.payload, Value::Null);
    }

    #[test]
    fn notify_response_is_tagged_by_status() {
        let body = serde_json::to_value(NotifyResponse::Enqueued { recipients: 2 }).unwrap();
        assert_eq!(body, json!({"status": "enqueued", "recipients": 2}));

        let body = serde_json::to_value(NotifyResponse::NoRecipients).unwrap();
        assert_eq!(body, json!({"status": "no_recipients"}));
    }
}
