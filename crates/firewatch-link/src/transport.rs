//! Transport seam for the telemetry link.
//!
//! The link never talks to a socket directly.  It opens connections
//! through the [`Transport`] trait and reads them through
//! [`TransportConn`], so tests can drive the full reconnect cycle with a
//! scripted in-memory transport while production uses
//! [`WsTransport`][crate::ws::WsTransport].

use async_trait::async_trait;
use firewatch_types::FirewatchError;

/// One event surfaced by an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame arrived.
    Text(String),
    /// The transport reported an error.  The link treats this as fatal
    /// for the connection: it is discarded and the close path runs.
    Error(String),
    /// The connection is gone.  No further events will be produced.
    Closed,
}

/// Opens one duplex, message-oriented connection to the telemetry
/// endpoint.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Open a connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FirewatchError::Transport`] when the endpoint is
    /// unreachable or the handshake fails.  The link handles an open
    /// failure exactly like a close of the attempted connection.
    async fn open(&mut self, url: &str) -> Result<Box<dyn TransportConn>, FirewatchError>;
}

/// A single open connection.
#[async_trait]
pub trait TransportConn: Send {
    /// Wait for the next event on this connection.
    async fn recv(&mut self) -> TransportEvent;

    /// Transmit one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`FirewatchError::Transport`] when the frame could not be
    /// written.
    async fn send_text(&mut self, payload: String) -> Result<(), FirewatchError>;
}
