//! Client connection to a home-automation hub's WebSocket API.
//!
//! Keeps one authenticated socket open, mirrors hub entities into the host's
//! device registry, forwards device commands as service calls, and recovers
//! from dropped connections with a bounded retry policy.

mod actor;
pub mod config;
pub mod error;
pub mod handle;
pub mod notifier;
mod pumps;
pub(crate) mod reconnection;
pub mod registry;
mod socket;
mod timers;
pub mod transport;
pub mod types;

pub use config::{ConnectionData, HubConfig};
pub use error::{ConfigError, TransportError};
pub use handle::HubConnection;
pub use notifier::{LogNotifier, Notification, NotificationAction, Notifier};
pub use registry::{DeviceRegistration, DeviceRegistry, InMemoryRegistry};
pub use transport::{Connector, FrameSink, FrameStream, OpenFuture, TungsteniteConnector};
pub use types::{ConnectionState, HubEndpoint, Timings};
