//! Realtime connection configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MAX_CONNECTION_BUFFER: usize = 10_000;
const MAX_SEND_TIMEOUT_MS: u64 = 60_000;

/// Per-connection limits and WebSocket endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Events queued per connection before new ones are dropped
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer: usize,

    /// Longest a single socket write may take before the connection is dropped
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// Refuse WebSocket upgrades that carry no `user_id` query hint
    #[serde(default)]
    pub require_connect_identity: bool,

    /// Route the WebSocket endpoint is served on
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
}

impl RealtimeConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.connection_buffer == 0 || self.connection_buffer > MAX_CONNECTION_BUFFER {
            return Err(ValidationError::InvalidConnectionBuffer {
                max: MAX_CONNECTION_BUFFER,
            });
        }
        if self.send_timeout_ms == 0 || self.send_timeout_ms > MAX_SEND_TIMEOUT_MS {
            return Err(ValidationError::InvalidSendTimeout {
                max_ms: MAX_SEND_TIMEOUT_MS,
            });
        }
        if !self.ws_path.starts_with('/') {
            return Err(ValidationError::InvalidWsPath(self.ws_path.clone()));
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            connection_buffer: default_connection_buffer(),
            send_timeout_ms: default_send_timeout_ms(),
            require_connect_identity: false,
            ws_path: default_ws_path(),
        }
    }
}

fn default_connection_buffer() -> usize {
    256
}

fn default_send_timeout_ms() -> u64 {
    5_000
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RealtimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.send_timeout(), Duration::from_secs(5));
        assert!(!config.require_connect_identity);
    }

    #[test]
    fn zero_buffer_is_rejected() {
        let config = RealtimeConfig {
            connection_buffer: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidConnectionBuffer { .. })
        ));
    }

    #[test]
    fn relative_ws_path_is_rejected() {
        let config = RealtimeConfig {
            ws_path: "ws".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidWsPath("ws".to_string()))
        );
    }
}
