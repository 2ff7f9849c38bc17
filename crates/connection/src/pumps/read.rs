//! WebSocket read pump. Forwards text frames to the connection task.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::socket::{SocketEvent, SocketEventKind};

/// Reads frames until the stream ends, errors, or `cancel` fires.
///
/// The end of the stream is reported once, tagged with `generation`. A
/// cancelled pump reports nothing: the owner already knows.
pub(crate) async fn read_pump<S>(
    mut read: S,
    generation: u64,
    events: mpsc::UnboundedSender<SocketEvent>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let end = loop {
        tokio::select! {
            _ = cancel.cancelled() => return,

            msg = read.next() => {
                match msg {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        trace!(generation, len = text.len(), "received text frame");
                        let frame = SocketEvent {
                            generation,
                            kind: SocketEventKind::Frame(text.to_string()),
                        };
                        if events.send(frame).is_err() {
                            return;
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(data))) => {
                        trace!("received ping, sending pong");
                        let _ = write_tx.try_send(tungstenite::Message::Pong(data));
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        debug!(?frame, "received close frame");
                        break SocketEventKind::Closed;
                    }
                    Some(Ok(_)) => {} // Binary and Pong are unused by the hub API
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        break SocketEventKind::Error(e.to_string());
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break SocketEventKind::Closed;
                    }
                }
            }
        }
    };

    if !cancel.is_cancelled() {
        let _ = events.send(SocketEvent {
            generation,
            kind: end,
        });
    }
}
