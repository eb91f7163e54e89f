//! HTTP handlers for the internal delivery API.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::realtime::{
    ChannelMessage, ChannelMessageFanout, EventDispatcher, NotificationBridge,
    PresenceQueryService,
};
use crate::domain::foundation::{ChannelId, UserId, ValidationError, WorkspaceId};
use crate::ports::TaskQueueError;

use super::dto::{
    ChannelMessageRequest, ChannelMessageResponse, DeliveryResponse, EmitEventRequest,
    ErrorResponse, NotifyOfflineRequest, NotifyResponse, OnlineUsersResponse, PresenceResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct DeliveryAppState {
    pub dispatcher: Arc<EventDispatcher>,
    pub presence: PresenceQueryService,
    pub bridge: NotificationBridge,
    pub fanout: Arc<ChannelMessageFanout>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Event Emission
// ════════════════════════════════════════════════════════════════════════════════

/// POST /users/:user_id/events
pub async fn emit_to_user(
    State(state): State<DeliveryAppState>,
    Path(user_id): Path<String>,
    Json(request): Json<EmitEventRequest>,
) -> Result<impl IntoResponse, DeliveryApiError> {
    let user_id = UserId::new(user_id)?;
    let report = state
        .dispatcher
        .send_to_user(&user_id, &request.event_type, request.payload)
        .await;
    Ok(Json(DeliveryResponse::from(report)))
}

/// POST /workspaces/:workspace_id/events
pub async fn emit_to_workspace(
    State(state): State<DeliveryAppState>,
    Path(workspace_id): Path<String>,
    Json(request): Json<EmitEventRequest>,
) -> Result<impl IntoResponse, DeliveryApiError> {
    let workspace_id = WorkspaceId::new(workspace_id)?;
    let report = state
        .dispatcher
        .send_to_workspace(&workspace_id, &request.event_type, request.payload)
        .await;
    Ok(Json(DeliveryResponse::from(report)))
}

/// POST /channels/:channel_id/events
pub async fn emit_to_channel(
    State(state): State<DeliveryAppState>,
    Path(channel_id): Path<String>,
    Json(request): Json<EmitEventRequest>,
) -> Result<impl IntoResponse, DeliveryApiError> {
    let channel_id = ChannelId::new(channel_id)?;
    let report = state
        .dispatcher
        .send_to_channel(&channel_id, &request.event_type, request.payload)
        .await;
    Ok(Json(DeliveryResponse::from(report)))
}

/// POST /broadcast
pub async fn broadcast(
    State(state): State<DeliveryAppState>,
    Json(request): Json<EmitEventRequest>,
) -> impl IntoResponse {
    let report = state
        .dispatcher
        .broadcast(&request.event_type, request.payload)
        .await;
    Json(DeliveryResponse::from(report))
}

// ════════════════════════════════════════════════════════════════════════════════
// Presence
// ════════════════════════════════════════════════════════════════════════════════

/// GET /channels/:channel_id/online
pub async fn online_users(
    State(state): State<DeliveryAppState>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, DeliveryApiError> {
    let channel_id = ChannelId::new(channel_id)?;
    let user_ids = state
        .presence
        .online_users_in_channel(&channel_id)
        .await
        .into_iter()
        .map(|u| u.to_string())
        .collect();
    Ok(Json(OnlineUsersResponse {
        channel_id: channel_id.to_string(),
        user_ids,
    }))
}

/// GET /users/:user_id/presence
pub async fn user_presence(
    State(state): State<DeliveryAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, DeliveryApiError> {
    let user_id = UserId::new(user_id)?;
    let connected = state.presence.is_connected(&user_id).await;
    Ok(Json(PresenceResponse {
        user_id: user_id.to_string(),
        connected,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Fan-out and Notifications
// ════════════════════════════════════════════════════════════════════════════════

/// POST /channels/:channel_id/messages
pub async fn deliver_channel_message(
    State(state): State<DeliveryAppState>,
    Path(channel_id): Path<String>,
    Json(request): Json<ChannelMessageRequest>,
) -> Result<impl IntoResponse, DeliveryApiError> {
    let message = ChannelMessage {
        workspace_id: WorkspaceId::new(request.workspace_id)?,
        channel_id: ChannelId::new(channel_id)?,
        members: parse_users(request.members)?,
        message: request.message,
    };

    let summary = state.fanout.deliver(message).await?;
    Ok((StatusCode::ACCEPTED, Json(ChannelMessageResponse::from(summary))))
}

/// POST /notifications
pub async fn notify_offline(
    State(state): State<DeliveryAppState>,
    Json(request): Json<NotifyOfflineRequest>,
) -> Result<impl IntoResponse, DeliveryApiError> {
    let user_ids = parse_users(request.user_ids)?;
    let outcome = state
        .bridge
        .notify_offline(&request.event_type, &user_ids, request.data)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(NotifyResponse::from(outcome))))
}

fn parse_users(raw: Vec<String>) -> Result<BTreeSet<UserId>, ValidationError> {
    raw.into_iter().map(UserId::new).collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts delivery errors to HTTP responses.
#[derive(Debug)]
pub enum DeliveryApiError {
    Validation(ValidationError),
    Queue(TaskQueueError),
}

impl From<ValidationError> for DeliveryApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<TaskQueueError> for DeliveryApiError {
    fn from(err: TaskQueueError) -> Self {
        Self::Queue(err)
    }
}

impl IntoResponse for DeliveryApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message) = match &self {
            DeliveryApiError::Validation(e) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_FAILED", e.to_string())
            }
            DeliveryApiError::Queue(e) => {
                tracing::error!("Task queue unavailable: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "QUEUE_UNAVAILABLE",
                    "Notification queue is unavailable".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse::new(error_code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_maps_to_400() {
        let err = DeliveryApiError::from(ValidationError::empty_field("user_id"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn queue_error_maps_to_503() {
        let err = DeliveryApiError::from(TaskQueueError::Closed);
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn parse_users_rejects_empty_ids() {
        assert!(parse_users(vec!["a".into(), "".into()]).is_err());
        assert_eq!(parse_users(vec!["a".into(), "a".into()]).unwrap().len(), 1);
    }
}
