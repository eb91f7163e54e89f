//! Application layer - Use cases over the realtime domain.
//!
//! This layer owns the room registry and coordinates the transport, task
//! queue and unread counter ports on behalf of connections and business
//! services.

pub mod realtime;

pub use realtime::{
    BindOutcome, ChannelMessage, ChannelMessageFanout, DeliveryReport, EventDispatcher,
    FanoutSummary, NotificationBridge, NotifyOutcome, PresenceQueryService, RecipientPartition,
    RegistryError, RegistryStats, RoomRegistry, UnreadNotificationWorker,
};
