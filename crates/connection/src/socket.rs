//! One open hub socket and its pumps.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, warn};

use crate::error::TransportError;
use crate::transport::{FrameSink, FrameStream};

/// Outbound frames buffered per socket.
const WRITE_QUEUE: usize = 256;

/// Something that happened to the socket of a given generation.
pub(crate) struct SocketEvent {
    pub(crate) generation: u64,
    pub(crate) kind: SocketEventKind,
}

pub(crate) enum SocketEventKind {
    /// The open task finished the handshake.
    Opened(FrameSink, FrameStream),
    OpenFailed(TransportError),
    Frame(String),
    /// Remote close or end of stream.
    Closed,
    Error(String),
}

/// A running socket. Dropping it stops both pumps; the write pump gets a
/// chance to send a close frame first.
pub(crate) struct Socket {
    generation: u64,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
    read_handle: JoinHandle<()>,
    _write_handle: JoinHandle<()>,
}

impl Socket {
    pub(crate) fn spawn(
        sink: FrameSink,
        stream: FrameStream,
        generation: u64,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) -> Self {
        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(WRITE_QUEUE);
        let cancel = CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            let events = events.clone();
            tokio::spawn(
                crate::pumps::write::write_pump(sink, write_rx, generation, events, cancel)
                    .in_current_span(),
            )
        };

        let read_handle = {
            let cancel = cancel.clone();
            let write_tx = write_tx.clone();
            tokio::spawn(
                crate::pumps::read::read_pump(stream, generation, events, write_tx, cancel)
                    .in_current_span(),
            )
        };

        Self {
            generation,
            write_tx,
            cancel,
            read_handle,
            _write_handle: write_handle,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Queues a text frame. Returns `false` if it could not be queued.
    pub(crate) fn send_text(&self, text: String) -> bool {
        match self.write_tx.try_send(tungstenite::Message::Text(text.into())) {
            Ok(()) => true,
            Err(e) => {
                warn!(generation = self.generation, "dropping outbound frame: {e}");
                false
            }
        }
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.read_handle.abort();
    }
}
