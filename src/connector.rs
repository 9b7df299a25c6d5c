use std::time::Duration;

use futures_util::StreamExt;
use log::{info, warn};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Source of raw messages for the ingestion loop.
///
/// `None` means the source is permanently finished; the loop then runs its
/// final flush. A source must not produce further messages after returning
/// `None`.
#[allow(async_fn_in_trait)]
pub trait MessageSource {
    async fn next_message(&mut self) -> Option<String>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Owns the websocket subscription and its reconnect policy.
///
/// Transport failures never surface to the caller: the connector logs, waits
/// out the fixed backoff interval and dials again, indefinitely. Only a
/// cancelled token ends the stream, and it interrupts the blocking receive
/// and the backoff wait alike.
pub struct StreamConnector {
    endpoint: Url,
    reconnect_delay: Duration,
    cancel: CancellationToken,
    stream: Option<WsStream>,
}

impl StreamConnector {
    pub fn new(
        endpoint: Url,
        reconnect_delay: Duration,
        cancel: CancellationToken,
    ) -> StreamConnector {
        StreamConnector {
            endpoint,
            reconnect_delay,
            cancel,
            stream: None,
        }
    }

    /// One connection attempt, backing off on failure. `None` when stopped.
    async fn connect(&mut self) -> Option<()> {
        let attempt = tokio::select! {
            _ = self.cancel.cancelled() => return None,
            attempt = connect_async(self.endpoint.as_str()) => attempt,
        };
        match attempt {
            Ok((stream, _response)) => {
                info!("connected to {}", self.endpoint);
                self.stream = Some(stream);
                Some(())
            }
            Err(err) => {
                warn!("connection error: {err}");
                self.wait_reconnect().await
            }
        }
    }

    /// Cancellable backoff before the next dial. `None` when stopped.
    async fn wait_reconnect(&self) -> Option<()> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            _ = tokio::time::sleep(self.reconnect_delay) => Some(()),
        }
    }
}

impl MessageSource for StreamConnector {
    async fn next_message(&mut self) -> Option<String> {
        loop {
            if self.cancel.is_cancelled() {
                self.stream = None;
                return None;
            }
            let Some(stream) = self.stream.as_mut() else {
                self.connect().await?;
                continue;
            };
            let frame = tokio::select! {
                _ = self.cancel.cancelled() => return None,
                frame = stream.next() => frame,
            };
            match frame {
                Some(Ok(Message::Text(text))) => return Some(text.as_str().to_owned()),
                Some(Ok(Message::Close(_))) | None => {
                    warn!("connection closed, attempting to reconnect");
                    self.stream = None;
                    self.wait_reconnect().await?;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    // Control frames; tungstenite answers pings itself.
                }
                Some(Ok(other)) => {
                    // A malformed unit, not a transport failure. Skip it and
                    // keep the stream alive.
                    warn!("skipping unexpected {} frame", frame_kind(&other));
                }
                Some(Err(err)) => {
                    warn!("transport error: {err}");
                    self.stream = None;
                    self.wait_reconnect().await?;
                }
            }
        }
    }
}

fn frame_kind(message: &Message) -> &'static str {
    match message {
        Message::Text(_) => "text",
        Message::Binary(_) => "binary",
        Message::Ping(_) => "ping",
        Message::Pong(_) => "pong",
        Message::Close(_) => "close",
        Message::Frame(_) => "raw",
    }
}
