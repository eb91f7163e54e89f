//! WebSocket adapters for realtime presence and event delivery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │               Business services / task worker                        │
//! │        EventDispatcher::send_to_{user,workspace,channel}             │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ room_members + send
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        LocalTransport                                │
//! │   Room: user_u1        Room: workspace_w1     Room: channel_c1       │
//! │   ├── conn-a           ├── conn-a             ├── conn-a             │
//! │   └── conn-b           └── conn-c             └── conn-c             │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ bounded outbox per connection
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │          handle_socket: writer task + ConnectionLifecycle            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types
//! - [`transport`] - Room subscriptions and per-connection outboxes
//! - [`lifecycle`] - Per-connection join/leave state machine
//! - [`handler`] - Axum WebSocket upgrade handler and health probe

pub mod handler;
pub mod lifecycle;
pub mod messages;
pub mod transport;

pub use handler::{health, realtime_router, ws_handler, HealthResponse, RealtimeState};
pub use lifecycle::{ConnectionLifecycle, Step};
pub use messages::{AckStatus, ClientMessage, ConnectedMessage, PongMessage, RoomAck};
pub use transport::LocalTransport;
