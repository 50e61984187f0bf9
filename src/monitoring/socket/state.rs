//! Connection state machine of the health channel

use serde::Serialize;
use std::fmt;

/// Connection state of the WebSocket health channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Error,
}

impl ConnectionState {
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Allowed edges:
    ///
    /// `disconnected -> connecting -> connected -> reconnecting -> connected`,
    /// any state to `error`, `error -> connecting` on retry, and any state to
    /// `disconnected` on a manual disconnect.
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        if *self == next {
            return false;
        }

        matches!(
            (*self, next),
            (_, Error)
                | (_, Disconnected)
                | (Disconnected, Connecting)
                | (Error, Connecting)
                | (Connecting, Connected)
                | (Reconnecting, Connected)
                | (Connected, Reconnecting)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Error => "error",
        };
        f.write_str(name)
    }
}
