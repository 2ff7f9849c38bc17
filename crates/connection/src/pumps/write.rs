//! WebSocket write pump. Serialises outbound frames onto the socket.

use std::time::Duration;

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::socket::{SocketEvent, SocketEventKind};

/// Upper bound for sending the close frame on shutdown.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Writes frames to the WebSocket until cancelled, then sends a close frame.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut write_rx: mpsc::Receiver<tungstenite::Message>,
    generation: u64,
    events: mpsc::UnboundedSender<SocketEvent>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = write_rx.recv() => {
                match msg {
                    Some(m) => {
                        if let Err(e) = write.send(m).await {
                            error!("WebSocket write error: {e}");
                            if !cancel.is_cancelled() {
                                let _ = events.send(SocketEvent {
                                    generation,
                                    kind: SocketEventKind::Error(e.to_string()),
                                });
                            }
                            return;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    let _ = tokio::time::timeout(CLOSE_GRACE, write.send(tungstenite::Message::Close(None))).await;
}
