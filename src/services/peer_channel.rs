//! Live notices exchanged with other participants through the shared relay.

use std::sync::Arc;

use async_stream::stream;
use futures::{SinkExt, StreamExt, stream::BoxStream};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::{
    dto::peer::{PeerEvent, PeerMessage},
    services::ports::{DisplayPort, LogLine},
};

/// Outbound side of the peer channel. Delivery is fire-and-forget.
pub trait PeerBroadcast: Send + Sync {
    /// Publish `event` to every connected participant.
    fn broadcast(&self, event: PeerEvent);
}

/// Inbound activity of the relay connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerSignal {
    /// The relay connection is open.
    Connected,
    /// The relay connection closed; no further signals follow.
    Disconnected,
    /// Notice received from a participant.
    Event(PeerEvent),
}

/// Stream of inbound signals, ending after [`PeerSignal::Disconnected`].
pub type PeerSignals = BoxStream<'static, PeerSignal>;

/// Errors raised while talking to the relay.
#[derive(Debug, Error)]
pub enum PeerChannelError {
    /// Handshake with the relay failed.
    #[error("failed to connect to relay `{url}`")]
    Connect {
        /// Relay URL.
        url: String,
        /// Underlying failure.
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    /// Outbound notice could not be encoded.
    #[error("failed to encode peer message")]
    Encode(#[from] serde_json::Error),
    /// The writer task is gone.
    #[error("relay connection closed")]
    Closed,
}

/// WebSocket connection to the relay, established once per process.
#[derive(Debug, Clone)]
pub struct WsPeerChannel {
    outbound: mpsc::UnboundedSender<Message>,
}

impl WsPeerChannel {
    /// Open the relay connection and return the broadcast handle together with
    /// the stream of inbound signals.
    pub async fn connect(url: &str) -> Result<(Self, PeerSignals), PeerChannelError> {
        let (socket, _) = connect_async(url)
            .await
            .map_err(|source| PeerChannelError::Connect {
                url: url.to_string(),
                source,
            })?;
        info!(url, "relay connected");

        let (mut sender, mut receiver) = socket.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

        // Dedicated writer task keeps outbound notices flowing while the reader awaits frames.
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(err) = sender.send(message).await {
                    warn!(error = %err, "relay send failed");
                    break;
                }
            }
        });

        let pong_tx = outbound_tx.clone();
        let signals = stream! {
            yield PeerSignal::Connected;

            while let Some(frame) = receiver.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                        Ok(text) => text,
                        Err(err) => {
                            warn!(error = %err, "ignoring non UTF-8 relay frame");
                            continue;
                        }
                    },
                    Ok(Message::Ping(payload)) => {
                        let _ = pong_tx.send(Message::Pong(payload));
                        continue;
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(err) => {
                        warn!(error = %err, "relay receive error");
                        break;
                    }
                };

                if let Some(event) = decode_frame(&text) {
                    yield PeerSignal::Event(event);
                }
            }

            info!("relay disconnected");
            yield PeerSignal::Disconnected;
        };

        Ok((
            Self {
                outbound: outbound_tx,
            },
            Box::pin(signals),
        ))
    }

    fn send(&self, event: &PeerEvent) -> Result<(), PeerChannelError> {
        let text = serde_json::to_string(&event.to_message())?;
        self.outbound
            .send(Message::Text(text))
            .map_err(|_| PeerChannelError::Closed)
    }
}

impl PeerBroadcast for WsPeerChannel {
    fn broadcast(&self, event: PeerEvent) {
        if let Err(err) = self.send(&event) {
            warn!(error = %err, from = event.from(), "failed to broadcast peer event");
        }
    }
}

/// Broadcaster used when the relay is unreachable: notices are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisconnectedBroadcaster;

impl PeerBroadcast for DisconnectedBroadcaster {
    fn broadcast(&self, event: PeerEvent) {
        debug!(from = event.from(), "relay unavailable; dropping peer event");
    }
}

/// Decode one relay frame; malformed frames and unknown types yield `None`.
pub fn decode_frame(text: &str) -> Option<PeerEvent> {
    let message = match PeerMessage::from_json_str(text) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "failed to parse or validate peer message");
            return None;
        }
    };

    let kind = message.kind.clone();
    match PeerEvent::from_message(message) {
        Ok(Some(event)) => Some(event),
        Ok(None) => {
            debug!(kind = %kind, "ignoring unknown peer message type");
            None
        }
        Err(err) => {
            warn!(error = %err, "ignoring peer message with invalid payload");
            None
        }
    }
}

/// Activity-log line for an inbound signal.
pub fn render_signal(signal: &PeerSignal) -> LogLine {
    match signal {
        PeerSignal::Connected => LogLine::system("connected"),
        PeerSignal::Disconnected => LogLine::system("disconnected"),
        PeerSignal::Event(PeerEvent::SessionStarted { from }) => {
            LogLine::player(from.as_str(), "started a new game")
        }
        PeerSignal::Event(PeerEvent::SessionEnded { from, record }) => {
            LogLine::player(from.as_str(), format!("scored {}", record.score))
        }
    }
}

/// Render every inbound signal at the top of the activity log until the
/// connection ends.
pub async fn pump_inbound(mut signals: PeerSignals, display: Arc<dyn DisplayPort>) {
    while let Some(signal) = signals.next().await {
        display.prepend_log(render_signal(&signal));
    }
}
