//! Realtime domain vocabulary: rooms, events, connection status and
//! offline notification kinds.

mod events;
mod notification;
mod room;
mod status;

pub use events::{ChannelEventType, RealtimeEvent, UserEventType, WorkspaceEventType};
pub use notification::{NotificationKind, NotificationTask, SEND_UNREAD_MESSAGE_TASK};
pub use room::RoomName;
pub use status::ConnectionStatus;
