//! WebSocket channel to the chat endpoint.
//!
//! [`connect`] returns immediately. The handshake, the read half and the
//! write half run in background tasks; lifecycle and inbound frames come
//! back as [`ChannelEvent`]s so the UI loop can process them one at a time.

use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use crate::error::{ChatError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Frame(String),
    Closed,
}

/// Outbound half of a channel.
pub trait Channel {
    fn transmit(&mut self, text: String) -> Result<()>;
}

/// Sends text frames through the writer task.
#[derive(Debug, Clone)]
pub struct WsChannel {
    tx: mpsc::UnboundedSender<String>,
}

impl Channel for WsChannel {
    fn transmit(&mut self, text: String) -> Result<()> {
        self.tx.send(text).map_err(|_| ChatError::ChannelClosed)
    }
}

pub struct Connection {
    pub channel: WsChannel,
    pub events: mpsc::UnboundedReceiver<ChannelEvent>,
}

/// Start connecting to `url`. Must be called inside a tokio runtime.
///
/// Exactly one `Closed` event is sent, after which the event stream ends.
/// Frames transmitted while the handshake is still running are written once
/// it completes; after `Closed` every transmit fails with
/// [`ChatError::ChannelClosed`].
pub fn connect(url: Url) -> Connection {
    let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ChannelEvent>();

    tokio::spawn(run(url, out_rx, event_tx));

    Connection {
        channel: WsChannel { tx: out_tx },
        events: event_rx,
    }
}

async fn run(
    url: Url,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) {
    tracing::info!("connecting to {}", url);

    let ws_stream = match connect_async(url.as_str()).await {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            let err = ChatError::from(e);
            tracing::warn!("{}", err);
            drop(outbound);
            let _ = events.send(ChannelEvent::Closed);
            return;
        }
    };

    tracing::info!("channel open");
    let _ = events.send(ChannelEvent::Opened);

    let (mut write, mut read) = ws_stream.split();

    // Forward outbound text to the socket
    let writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            tracing::debug!("sending {} bytes", text.len());
            if let Err(e) = write.send(Message::Text(text.into())).await {
                tracing::warn!("send failed: {}", e);
                break;
            }
        }
    });

    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if events.send(ChannelEvent::Frame(text.to_string())).is_err() {
                    break;
                }
            }
            Ok(Message::Close(reason)) => {
                tracing::info!("server closed the channel: {:?}", reason);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("channel error: {}", e);
                break;
            }
        }
    }

    // Drop the outbound receiver before reporting the close
    writer.abort();
    let _ = writer.await;

    tracing::info!("channel closed");
    let _ = events.send(ChannelEvent::Closed);
}
