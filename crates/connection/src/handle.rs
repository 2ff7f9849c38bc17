//! Host-facing handle of a hub connection.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{Instrument, info_span};

use hublink_devices::{Category, Command, Param};

use crate::actor::{Actor, Collaborators, Request};
use crate::notifier::Notifier;
use crate::registry::DeviceRegistry;
use crate::transport::Connector;
use crate::types::{ConnectionState, HubEndpoint, Timings};

/// Handle to a running connection task.
///
/// Every method only queues a request; requests are processed in order by
/// the task. Cloning the handle is cheap. The task stops on
/// [`shutdown`](Self::shutdown) or once every handle is dropped.
#[derive(Clone)]
pub struct HubConnection {
    requests: mpsc::UnboundedSender<Request>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl HubConnection {
    /// Starts the connection task. Nothing is opened until
    /// [`connect`](Self::connect) is called.
    pub fn spawn(
        endpoint: HubEndpoint,
        timings: Timings,
        registry: Arc<dyn DeviceRegistry>,
        notifier: Arc<dyn Notifier>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let (requests, requests_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let span = info_span!("hub", name = %endpoint.name);
        let actor = Actor::new(
            endpoint,
            timings,
            Collaborators {
                registry,
                notifier,
                connector,
            },
            requests_rx,
            requests.downgrade(),
            state_tx,
        );
        tokio::spawn(actor.run().instrument(span));

        Self { requests, state_rx }
    }

    /// Opens a fresh socket, dropping any current one, and re-enables
    /// automatic reconnects.
    pub fn connect(&self) {
        self.request(Request::Connect);
    }

    /// Closes the socket and suppresses automatic reconnects.
    pub fn disconnect(&self) {
        self.request(Request::Disconnect);
    }

    /// Translates and sends a device command. Dropped silently when no
    /// socket is open or the command has no hub mapping.
    pub fn send_command(
        &self,
        category: Category,
        device_id: impl Into<String>,
        command: Command,
        param: Param,
    ) {
        self.request(Request::SendCommand {
            category,
            device_id: device_id.into(),
            command,
            param,
        });
    }

    /// Pauses pings while the host sleeps.
    pub fn enter_standby(&self) {
        self.request(Request::EnterStandby);
    }

    /// Resumes pings if connected.
    pub fn leave_standby(&self) {
        self.request(Request::LeaveStandby);
    }

    /// Disconnects and stops the task.
    pub fn shutdown(&self) {
        self.request(Request::Shutdown);
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// A receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Resolves once the task has stopped.
    pub async fn stopped(&self) {
        self.requests.closed().await;
    }

    fn request(&self, request: Request) {
        if self.requests.send(request).is_err() {
            tracing::debug!("connection task already stopped");
        }
    }
}
