//! Public types for the hub connection.

use std::fmt;
use std::time::Duration;

use hublink_protocol::constants::{
    HEARTBEAT_INTERVAL, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY, WS_API_PATH,
};

/// Liveness of the hub session, as seen by observers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket, or the socket is closed.
    #[default]
    Disconnected,
    /// Socket opening, or authentication/discovery in progress.
    Connecting,
    /// Subscribed to state changes.
    Connected,
}

/// Where and how to reach the hub. Immutable once built.
#[derive(Clone)]
pub struct HubEndpoint {
    /// Host, optionally with port (`"10.0.0.5:8123"`).
    pub host: String,
    pub token: String,
    pub tls: bool,
    pub ignore_cert_errors: bool,
    /// Display name used in user-facing notifications.
    pub name: String,
    /// Registry owner id of discovered devices.
    pub owner_id: String,
}

impl HubEndpoint {
    /// `ws(s)://<host>/api/websocket`
    pub fn url(&self) -> String {
        let scheme = if self.tls { "wss" } else { "ws" };
        format!("{scheme}://{}{WS_API_PATH}", self.host)
    }

    /// Base address for resolving hub-relative URLs.
    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}", self.host)
    }
}

impl fmt::Debug for HubEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubEndpoint")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("tls", &self.tls)
            .field("ignore_cert_errors", &self.ignore_cert_errors)
            .field("name", &self.name)
            .field("owner_id", &self.owner_id)
            .finish()
    }
}

/// Timer settings of the connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Delay before each automatic reconnect attempt.
    pub reconnect_delay: Duration,
    /// Ping period while connected.
    pub heartbeat_interval: Duration,
    /// Automatic attempts per outage before giving up.
    pub max_reconnect_attempts: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            reconnect_delay: RECONNECT_DELAY,
            heartbeat_interval: HEARTBEAT_INTERVAL,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl Timings {
    /// How long a ping may stay unanswered.
    pub fn heartbeat_timeout(&self) -> Duration {
        self.heartbeat_interval / 2
    }
}
