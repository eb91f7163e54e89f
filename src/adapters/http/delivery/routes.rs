//! Axum router configuration for the internal delivery API.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    broadcast, deliver_channel_message, emit_to_channel, emit_to_user, emit_to_workspace,
    notify_offline, online_users, user_presence, DeliveryAppState,
};

/// Create the delivery API router.
///
/// # Routes
///
/// - `POST /users/:user_id/events` - Emit to every connection of a user
/// - `POST /workspaces/:workspace_id/events` - Emit to a workspace room
/// - `POST /channels/:channel_id/events` - Emit to a channel room
/// - `POST /broadcast` - Emit to every connection
/// - `POST /channels/:channel_id/messages` - Deliver a new channel message
/// - `POST /notifications` - Queue an offline notification
/// - `GET /channels/:channel_id/online` - Users subscribed to a channel
/// - `GET /users/:user_id/presence` - Whether a user has a live connection
///
/// Mount under a path that is not reachable from the public internet.
pub fn delivery_router() -> Router<DeliveryAppState> {
    Router::new()
        .route("/users/:user_id/events", post(emit_to_user))
        .route("/users/:user_id/presence", get(user_presence))
        .route("/workspaces/:workspace_id/events", post(emit_to_workspace))
        .route("/channels/:channel_id/events", post(emit_to_channel))
        .route("/channels/:channel_id/messages", post(deliver_channel_message))
        .route("/channels/:channel_id/online", get(online_users))
        .route("/broadcast", post(broadcast))
        .route("/notifications", post(notify_offline))
}
