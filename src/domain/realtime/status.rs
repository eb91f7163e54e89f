//! ConnectionStatus enum for tracking the lifecycle of one socket.

use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a realtime connection.
///
/// `Connected` means accepted but not yet bound to a user. A connection
/// that never binds goes straight to `Closed` on disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionStatus {
    #[default]
    Connected,
    Bound,
    Closed,
}

impl ConnectionStatus {
    /// Returns true once the connection has bound a user identity.
    pub fn is_bound(&self) -> bool {
        matches!(self, ConnectionStatus::Bound)
    }
}

impl StateMachine for ConnectionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionStatus::*;
        matches!(
            (self, target),
            (Connected, Bound) | (Connected, Closed) | (Bound, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionStatus::*;
        match self {
            Connected => vec![Bound, Closed],
            Bound => vec![Closed],
            Closed => vec![],
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Bound => "bound",
            ConnectionStatus::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}
