//! Production WebSocket transport over `tokio-tungstenite`.

use async_trait::async_trait;
use firewatch_types::FirewatchError;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::transport::{Transport, TransportConn, TransportEvent};

/// [`Transport`] implementation backed by `tokio_tungstenite::connect_async`.
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn open(&mut self, url: &str) -> Result<Box<dyn TransportConn>, FirewatchError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| FirewatchError::Transport(format!("connect to {url}: {e}")))?;
        Ok(Box::new(WsConn { stream }))
    }
}

struct WsConn {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl TransportConn for WsConn {
    async fn recv(&mut self) -> TransportEvent {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return TransportEvent::Text(text.to_string()),
                Some(Ok(Message::Close(_))) | None => return TransportEvent::Closed,
                // Control frames and binary payloads are not part of the
                // telemetry protocol; tungstenite answers pings itself.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return TransportEvent::Error(e.to_string()),
            }
        }
    }

    async fn send_text(&mut self, payload: String) -> Result<(), FirewatchError> {
        self.stream
            .send(Message::Text(payload.into()))
            .await
            .map_err(|e| FirewatchError::Transport(e.to_string()))
    }
}
