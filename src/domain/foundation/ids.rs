//! Strongly-typed identifier value objects.
//!
//! User, workspace and channel ids are issued by the data store
//! collaborator and are opaque to the realtime core, so they wrap a
//! non-empty string. Connection ids are minted here on accept.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates the id, rejecting empty or whitespace-only values.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(value))
            }

            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

opaque_id!(
    /// Identifier of an authenticated chat user.
    UserId,
    "user_id"
);

opaque_id!(
    /// Identifier of a workspace.
    WorkspaceId,
    "workspace_id"
);

opaque_id!(
    /// Identifier of a channel (public, private, DM or group DM).
    ChannelId,
    "channel_id"
);

/// Unique identifier for one live transport session.
///
/// Generated server-side when a socket is accepted and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random ConnectionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConnectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_empty_value() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
    }

    #[test]
    fn user_id_keeps_value_verbatim() {
        let id = UserId::new("u-42").unwrap();
        assert_eq!(id.as_str(), "u-42");
        assert_eq!(id.to_string(), "u-42");
    }

    #[test]
    fn channel_id_error_names_the_field() {
        let err = ChannelId::new("").unwrap_err();
        assert_eq!(err.to_string(), "Field 'channel_id' cannot be empty");
    }

    #[test]
    fn workspace_id_deserializes_through_validation() {
        let ok: WorkspaceId = serde_json::from_str(r#""ws-1""#).unwrap();
        assert_eq!(ok.as_str(), "ws-1");

        let err = serde_json::from_str::<WorkspaceId>(r#""""#);
        assert!(err.is_err());
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[test]
    fn connection_id_round_trips_through_display() {
        let id = ConnectionId::new();
        let parsed: ConnectionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
