//! Realtime presence and event fan-out.
//!
//! - `registry` - Authoritative connection/user/channel bookkeeping
//! - `dispatcher` - Routes events to users, rooms, or everyone
//! - `presence` - Online/offline partitioning of channel members
//! - `notification_bridge` - Offline fallback onto the task queue
//! - `message_fanout` - New channel message delivery
//! - `unread_worker` - Consumer for queued unread notifications

mod dispatcher;
mod message_fanout;
mod notification_bridge;
mod presence;
mod registry;
mod unread_worker;

pub use dispatcher::{DeliveryReport, EventDispatcher};
pub use message_fanout::{ChannelMessage, ChannelMessageFanout, FanoutSummary};
pub use notification_bridge::{NotificationBridge, NotifyOutcome};
pub use presence::{PresenceQueryService, RecipientPartition};
pub use registry::{BindOutcome, RegistryError, RegistryStats, RoomRegistry};
pub use unread_worker::UnreadNotificationWorker;
