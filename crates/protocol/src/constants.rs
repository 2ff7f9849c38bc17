use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Path of the hub's WebSocket API, appended to the configured host.
pub const WS_API_PATH: &str = "/api/websocket";

/// Maximum accepted frame size in bytes (16 MB). A full `get_states`
/// result on a large installation runs into several megabytes.
pub const WS_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Reserved request id of the "fetch all states" call.
pub const GET_STATES_ID: u64 = 2;

/// Reserved request id of the `state_changed` subscription. Pushed events
/// carry this id as well.
pub const SUBSCRIBE_ID: u64 = 3;

/// First id handed out to commands and pings after each connection attempt.
pub const FIRST_COMMAND_ID: u64 = 4;

/// Event type the client subscribes to.
pub const STATE_CHANGED_EVENT: &str = "state_changed";

/// Delay before a reconnect attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// Consecutive failed reconnect attempts before giving up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// How often a ping is sent while connected. The pong deadline is half of it.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Frame type discriminator (`"type"` field) of hub-to-client frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    AuthRequired,
    AuthOk,
    AuthInvalid,
    Result,
    Event,
    Pong,

    /// Forward compatibility: unknown or missing frame types land here.
    #[default]
    #[serde(other)]
    Unknown,
}
