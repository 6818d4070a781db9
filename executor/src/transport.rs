//! Websocket transport task.
//!
//! DESIGN
//! ======
//! `spawn_transport` connects in a tokio task and bridges the socket to two
//! unbounded channels: envelopes in, [`TransportEvent`]s out. The host feeds
//! events to its [`Executor`](crate::Executor) one at a time, which keeps all
//! scene mutation on the host's side of the channel. Frames are forwarded in
//! the order the socket yields them.
//!
//! The task ends when the socket closes, the connection fails, or the host
//! drops the sender; a final `Closed` event is sent in every case.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use futures_util::{SinkExt, StreamExt};
use protocol::Envelope;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Text(String),
    Closed,
}

/// Connect to `url` in a background task.
///
/// Must be called from within a tokio runtime.
pub fn spawn_transport(
    url: impl Into<String>,
) -> (mpsc::UnboundedSender<Envelope>, mpsc::UnboundedReceiver<TransportEvent>) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_transport(url.into(), out_rx, event_tx));
    (out_tx, event_rx)
}

async fn run_transport(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Envelope>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            warn!(%url, error = %e, "transport: connect failed");
            let _ = events.send(TransportEvent::Closed);
            return;
        }
    };
    info!(%url, "transport: connected");
    if events.send(TransportEvent::Opened).is_err() {
        return;
    }

    let (mut write, mut read) = stream.split();
    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(WsMessage::Text(text))) => {
                    if events.send(TransportEvent::Text(text.as_str().to_owned())).is_err() {
                        break;
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(%url, error = %e, "transport: receive failed");
                    break;
                }
            },
            envelope = outbound.recv() => {
                let Some(envelope) = envelope else {
                    debug!(%url, "transport: host hung up");
                    let _ = write.send(WsMessage::Close(None)).await;
                    break;
                };
                match protocol::encode(&envelope) {
                    Ok(text) => {
                        if let Err(e) = write.send(WsMessage::Text(text.into())).await {
                            warn!(%url, error = %e, "transport: send failed");
                            break;
                        }
                    }
                    Err(e) => warn!(kind = envelope.message.kind(), error = %e, "transport: encode failed"),
                }
            }
        }
    }

    let _ = events.send(TransportEvent::Closed);
    info!(%url, "transport: closed");
}
