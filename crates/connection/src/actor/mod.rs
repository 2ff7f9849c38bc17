//! The connection state machine.
//!
//! One task owns the socket, the request counter, the retry counter and the
//! three timers (reconnect, heartbeat, heartbeat timeout). Host requests and
//! socket events are handled one at a time, so protocol state is never
//! touched concurrently.

mod inbound;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, warn};

use hublink_devices::{Category, Command, Param, to_service_call};
use hublink_protocol::{ClientFrame, RequestPurpose, RequestTracker, encode};

use crate::notifier::{Notification, NotificationAction, Notifier};
use crate::reconnection::{Heartbeat, RetryCounter};
use crate::registry::DeviceRegistry;
use crate::socket::{Socket, SocketEvent, SocketEventKind};
use crate::timers::{Timer, expired};
use crate::transport::Connector;
use crate::types::{ConnectionState, HubEndpoint, Timings};

/// Host requests, in submission order.
#[derive(Debug)]
pub(crate) enum Request {
    Connect,
    Disconnect,
    SendCommand {
        category: Category,
        device_id: String,
        command: Command,
        param: Param,
    },
    EnterStandby,
    LeaveStandby,
    Shutdown,
}

/// External collaborators of the state machine.
#[derive(Clone)]
pub(crate) struct Collaborators {
    pub(crate) registry: Arc<dyn DeviceRegistry>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) connector: Arc<dyn Connector>,
}

pub(crate) struct Actor {
    endpoint: HubEndpoint,
    base_url: String,
    timings: Timings,
    registry: Arc<dyn DeviceRegistry>,
    notifier: Arc<dyn Notifier>,
    connector: Arc<dyn Connector>,

    requests: mpsc::UnboundedReceiver<Request>,
    /// Used by notification actions; never keeps the task alive.
    requests_weak: mpsc::WeakUnboundedSender<Request>,
    events_tx: mpsc::UnboundedSender<SocketEvent>,
    events_rx: mpsc::UnboundedReceiver<SocketEvent>,
    state_tx: watch::Sender<ConnectionState>,

    socket: Option<Socket>,
    opening: Option<JoinHandle<()>>,
    /// Bumped on every open and close; events from older sockets are stale.
    generation: u64,
    tracker: RequestTracker,
    retries: RetryCounter,
    heartbeat: Heartbeat,
    user_disconnect: bool,
    standby: bool,

    reconnect_timer: Timer,
    heartbeat_timer: Timer,
    heartbeat_timeout: Timer,
}

impl Actor {
    pub(crate) fn new(
        endpoint: HubEndpoint,
        timings: Timings,
        collaborators: Collaborators,
        requests: mpsc::UnboundedReceiver<Request>,
        requests_weak: mpsc::WeakUnboundedSender<Request>,
        state_tx: watch::Sender<ConnectionState>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            base_url: endpoint.base_url(),
            endpoint,
            timings,
            registry: collaborators.registry,
            notifier: collaborators.notifier,
            connector: collaborators.connector,
            requests,
            requests_weak,
            events_tx,
            events_rx,
            state_tx,
            socket: None,
            opening: None,
            generation: 0,
            tracker: RequestTracker::new(),
            retries: RetryCounter::new(timings.max_reconnect_attempts),
            heartbeat: Heartbeat::default(),
            user_disconnect: false,
            standby: false,
            reconnect_timer: Timer::default(),
            heartbeat_timer: Timer::default(),
            heartbeat_timeout: Timer::default(),
        }
    }

    /// Runs until [`Request::Shutdown`] or until every handle is dropped.
    pub(crate) async fn run(mut self) {
        debug!("connection task started");

        loop {
            let reconnect_at = self.reconnect_timer.deadline();
            let heartbeat_at = self.heartbeat_timer.deadline();
            let timeout_at = self.heartbeat_timeout.deadline();

            tokio::select! {
                biased;

                request = self.requests.recv() => match request {
                    Some(Request::Shutdown) | None => break,
                    Some(request) => self.handle_request(request),
                },
                Some(event) = self.events_rx.recv() => self.handle_socket_event(event),
                () = expired(reconnect_at) => {
                    self.reconnect_timer.stop();
                    self.on_reconnect_timer();
                }
                () = expired(timeout_at) => {
                    self.heartbeat_timeout.stop();
                    self.on_heartbeat_timeout();
                }
                () = expired(heartbeat_at) => {
                    self.heartbeat_timer.stop();
                    self.on_heartbeat_timer();
                }
            }
        }

        self.disconnect();
        debug!("connection task stopped");
    }

    fn handle_request(&mut self, request: Request) {
        match request {
            Request::Connect => self.connect(),
            Request::Disconnect => self.disconnect(),
            Request::SendCommand {
                category,
                device_id,
                command,
                param,
            } => self.send_command(category, &device_id, &command, &param),
            Request::EnterStandby => self.enter_standby(),
            Request::LeaveStandby => self.leave_standby(),
            Request::Shutdown => self.disconnect(),
        }
    }

    // -----------------------------------------------------------------------
    // Host operations
    // -----------------------------------------------------------------------

    fn connect(&mut self) {
        info!(url = %self.endpoint.url(), "connecting to hub");
        self.user_disconnect = false;
        self.retries.reset();
        self.reconnect_timer.stop();
        self.close_socket();
        self.open_socket();
    }

    fn disconnect(&mut self) {
        if self.socket.is_some() || self.opening.is_some() {
            info!("disconnecting from hub");
        }
        self.user_disconnect = true;
        self.reconnect_timer.stop();
        self.close_socket();
        self.set_state(ConnectionState::Disconnected);
    }

    fn send_command(&mut self, category: Category, device_id: &str, command: &Command, param: &Param) {
        if self.socket.is_none() {
            debug!(device = %device_id, ?command, "no open socket, dropping command");
            return;
        }

        let remote_codes = match category {
            Category::Remote => self
                .registry
                .lookup(device_id)
                .map(|device| device.remote_codes)
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        let Some(call) = to_service_call(&category, device_id, command, param, &remote_codes) else {
            debug!(device = %device_id, %category, ?command, ?param, "command has no hub mapping");
            return;
        };

        let service = format!("{}.{}", call.domain, call.service);
        debug!(entity = %call.entity_id, service = %service, "sending command");
        let id = self.tracker.allocate(RequestPurpose::Command {
            entity_id: call.entity_id.clone(),
            service,
        });
        self.send(ClientFrame::call_service(id, call));
    }

    fn enter_standby(&mut self) {
        info!("entering standby");
        self.standby = true;
        self.stop_heartbeat();
    }

    fn leave_standby(&mut self) {
        info!("leaving standby");
        self.standby = false;
        if self.state() == ConnectionState::Connected && !self.heartbeat_timer.is_active() {
            self.start_heartbeat();
        }
    }

    // -----------------------------------------------------------------------
    // Socket lifecycle
    // -----------------------------------------------------------------------

    fn open_socket(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let unanswered = self.tracker.pending_len();
        if unanswered > 0 {
            debug!(unanswered, "discarding requests of the previous socket");
        }
        self.tracker.reset();
        self.set_state(ConnectionState::Connecting);

        let open = self.connector.open(&self.endpoint);
        let events = self.events_tx.clone();
        self.opening = Some(tokio::spawn(
            async move {
                let kind = match open.await {
                    Ok((sink, stream)) => SocketEventKind::Opened(sink, stream),
                    Err(e) => SocketEventKind::OpenFailed(e),
                };
                let _ = events.send(SocketEvent { generation, kind });
            }
            .in_current_span(),
        ));
    }

    /// Stops the heartbeat and drops the socket (or the pending open).
    fn close_socket(&mut self) {
        self.stop_heartbeat();
        self.generation += 1;
        if let Some(task) = self.opening.take() {
            task.abort();
        }
        if let Some(socket) = self.socket.take() {
            debug!(generation = socket.generation(), "closing socket");
        }
    }

    fn handle_socket_event(&mut self, event: SocketEvent) {
        if event.generation != self.generation {
            debug!(
                generation = event.generation,
                current = self.generation,
                "ignoring event from a closed socket"
            );
            return;
        }

        match event.kind {
            SocketEventKind::Opened(sink, stream) => {
                self.opening = None;
                debug!(generation = event.generation, "socket open");
                self.socket = Some(Socket::spawn(
                    sink,
                    stream,
                    event.generation,
                    self.events_tx.clone(),
                ));
            }
            SocketEventKind::OpenFailed(e) => {
                self.opening = None;
                if e.is_certificate() && !self.endpoint.ignore_cert_errors {
                    self.on_certificate_error(&e.to_string());
                } else {
                    warn!(error = %e, "failed to open socket");
                    self.on_socket_lost();
                }
            }
            SocketEventKind::Frame(text) => self.handle_frame(&text),
            SocketEventKind::Closed => {
                if self.user_disconnect {
                    debug!("socket closed");
                    self.close_socket();
                    self.set_state(ConnectionState::Disconnected);
                } else {
                    info!("hub closed the socket");
                    self.on_socket_lost();
                }
            }
            SocketEventKind::Error(e) => {
                warn!(error = %e, "socket error");
                self.on_socket_lost();
            }
        }
    }

    /// Drops the socket and schedules the next automatic attempt.
    fn on_socket_lost(&mut self) {
        self.close_socket();
        self.set_state(ConnectionState::Disconnected);
        self.reconnect_timer.start(self.timings.reconnect_delay);
    }

    fn on_certificate_error(&mut self, reason: &str) {
        warn!(reason, "hub certificate rejected");
        self.close_socket();
        self.reconnect_timer.stop();
        self.set_state(ConnectionState::Disconnected);
        self.notifier.raise(Notification {
            persistent: true,
            message: format!(
                "SSL certificate validation error. Please check your certificate. {}.",
                self.endpoint.name
            ),
            action: None,
        });
    }

    fn on_reconnect_timer(&mut self) {
        if self.retries.exhausted() {
            warn!(
                attempts = self.retries.attempts(),
                "hub unreachable, giving up automatic reconnects"
            );
            self.disconnect();
            self.notifier.raise(Notification {
                persistent: true,
                message: self.cannot_connect_message(),
                action: Some(self.reconnect_action()),
            });
            self.retries.reset();
            return;
        }

        let attempt = self.retries.bump();
        info!(attempt, "reconnecting to hub");
        self.close_socket();
        self.open_socket();
    }

    // -----------------------------------------------------------------------
    // Heartbeat
    // -----------------------------------------------------------------------

    fn start_heartbeat(&mut self) {
        self.heartbeat.clear();
        self.heartbeat_timeout.stop();
        if self.standby {
            return;
        }
        self.heartbeat_timer.start(self.timings.heartbeat_interval);
    }

    fn stop_heartbeat(&mut self) {
        self.heartbeat_timer.stop();
        self.heartbeat_timeout.stop();
        self.heartbeat.clear();
    }

    fn on_heartbeat_timer(&mut self) {
        if self.state() != ConnectionState::Connected {
            return;
        }
        if self.heartbeat.is_outstanding() {
            warn!(ping = ?self.heartbeat.last_ping_id(), "previous ping still unanswered");
            self.on_heartbeat_timeout();
            return;
        }

        let id = self.tracker.allocate(RequestPurpose::Ping);
        if self.send(ClientFrame::ping(id)) {
            self.heartbeat.sent(id);
            self.heartbeat_timeout.start(self.timings.heartbeat_timeout());
        }
        self.heartbeat_timer.start(self.timings.heartbeat_interval);
    }

    fn on_heartbeat_timeout(&mut self) {
        warn!(ping = ?self.heartbeat.last_ping_id(), "hub stopped answering pings");
        self.disconnect();
        self.notifier.raise(Notification {
            persistent: true,
            message: format!("Connection lost to {}.", self.endpoint.name),
            action: Some(self.reconnect_action()),
        });
    }

    fn on_pong(&mut self, id: Option<u64>) {
        if let Some(id) = id {
            self.tracker.resolve(id);
        }
        if self.heartbeat.answered() {
            self.heartbeat_timeout.stop();
        }
        debug!(?id, "pong");
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    fn set_state(&mut self, state: ConnectionState) {
        let changed = self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            info!(?state, "connection state changed");
        }
    }

    /// Encodes and queues a frame. Returns `false` when nothing was sent.
    fn send(&mut self, frame: ClientFrame) -> bool {
        let Some(socket) = &self.socket else {
            debug!(id = ?frame.id(), "no open socket, dropping frame");
            return false;
        };
        match encode(&frame) {
            Ok(text) => socket.send_text(text),
            Err(e) => {
                error!(error = %e, "failed to encode frame");
                false
            }
        }
    }

    fn cannot_connect_message(&self) -> String {
        format!("Cannot connect to {}.", self.endpoint.name)
    }

    fn reconnect_action(&self) -> NotificationAction {
        let requests = self.requests_weak.clone();
        NotificationAction::new("Reconnect", move || {
            if let Some(tx) = requests.upgrade() {
                let _ = tx.send(Request::Connect);
            }
        })
    }
}
