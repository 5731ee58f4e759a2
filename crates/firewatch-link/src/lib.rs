//! `firewatch-link` – The Telemetry Channel
//!
//! Owns the one persistent connection between the console and the
//! fire-safety installation, and nothing else: establishing it, detecting
//! loss, retrying with a bounded budget, and handing decoded frames
//! upward.  Connection-level failures are absorbed here and surfaced as
//! state + notifications; nothing is thrown past this crate's boundary.
//!
//! # Modules
//!
//! - [`state`] – [`LinkState`][state::LinkState]: the pure connection
//!   lifecycle state machine.  One authoritative
//!   [`ConnectionState`][state::ConnectionState], a retry-attempt
//!   counter, and a transport-generation guard against stale close
//!   events.  No I/O; fully testable in isolation.
//! - [`transport`] – [`Transport`][transport::Transport] /
//!   [`TransportConn`][transport::TransportConn]: the seam between the
//!   link and the wire, so tests can script connections in memory.
//! - [`ws`] – [`WsTransport`][ws::WsTransport]: the production WebSocket
//!   transport over `tokio-tungstenite`.
//! - [`link`] – [`TelemetryLink`][link::TelemetryLink]: the single-task
//!   actor that drives the state machine against a real transport, plus
//!   the fixed-interval retry timer and the
//!   [`LinkEvent`][link::LinkEvent] notification stream.
//!
//! # Retry policy
//!
//! Fixed-interval retry (default 3000 ms) with a hard cap (default 5
//! attempts), not exponential backoff: bounded resource usage against an
//! unreachable endpoint, and a deliberate, operator-visible `Exhausted`
//! state instead of a silent infinite retry loop.  Both knobs are
//! configurable through [`LinkConfig`][link::LinkConfig].

pub mod link;
pub mod state;
pub mod transport;
pub mod ws;

pub use link::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL, LinkConfig, LinkEvent, TelemetryLink};
pub use state::{ConnectionState, LinkStatus};
pub use transport::{Transport, TransportConn, TransportEvent};
pub use ws::WsTransport;
