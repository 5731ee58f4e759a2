//! [`TelemetryLink`] – resilient telemetry connection manager.
//!
//! Owns the lifecycle of one persistent, message-oriented connection to
//! the telemetry endpoint: establishing it, detecting loss, retrying at a
//! fixed interval with a hard attempt cap, and exposing a manual
//! override once the budget is spent.
//!
//! All work happens on a single worker task.  Operator commands, transport
//! events, and the retry timer are multiplexed through one
//! `tokio::select!` loop and processed to completion one at a time, so
//! there is no parallelism inside the manager.  The retry delay is the
//! only suspension point; it is an owned, cancellable timer handle, and
//! at most one transport and one pending timer exist at any moment.
//!
//! Consumers observe the link two ways:
//!
//! * [`TelemetryLink::subscribe`] – a broadcast stream of [`LinkEvent`]
//!   notifications (connect, disconnect, decoded frames, errors), fired
//!   in arrival order.
//! * [`TelemetryLink::watch_status`] – a watch channel carrying the
//!   current [`LinkStatus`], suitable for rendering.
//!
//! Notifications are informational only; nothing a consumer does with
//! them feeds back into the state machine.

use std::pin::Pin;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Sleep, sleep};
use tracing::{debug, info, warn};

use firewatch_types::{FirewatchError, TelemetrySnapshot};

use crate::state::{CloseAction, ConnectionState, LinkState, LinkStatus, RetryAction};
use crate::transport::{Transport, TransportConn, TransportEvent};

/// Delay between automatic reconnect attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(3000);

/// Automatic reconnect attempts before the link gives up and waits for
/// the operator.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Buffered notifications per subscriber before old ones are dropped for
/// slow consumers.
const EVENT_CAPACITY: usize = 256;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Configuration for a [`TelemetryLink`].
///
/// The retry interval and attempt cap are deliberately overridable so
/// tests can run the full reconnect cycle in milliseconds.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// WebSocket URL of the telemetry endpoint.
    pub url: String,
    /// Delay between automatic reconnect attempts.
    pub retry_interval: Duration,
    /// Automatic attempts before entering `Exhausted`.
    pub max_attempts: u32,
}

impl LinkConfig {
    /// Configuration for `url` with the default retry policy.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the inter-attempt delay (builder-style).
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Override the attempt cap (builder-style).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Notifications
// ────────────────────────────────────────────────────────────────────────────

/// Notification fired by the link worker.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// The transport opened; frames may start flowing.
    Connected,
    /// The transport closed, intentionally or not.
    Disconnected,
    /// A frame arrived and decoded successfully.
    Telemetry(TelemetrySnapshot),
    /// The transport failed to open or reported an error mid-stream.
    Error(String),
}

/// Operator commands accepted by the worker.
enum LinkCommand {
    Connect,
    Disconnect,
    ManualReconnect,
    Send(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Handle
// ────────────────────────────────────────────────────────────────────────────

/// Cloneable handle to the link worker task.
///
/// All commands are fire-and-forget: they return nothing and never block.
///
/// # Example
///
/// ```rust,no_run
/// use firewatch_link::{LinkConfig, TelemetryLink, WsTransport};
///
/// #[tokio::main]
/// async fn main() {
///     let link = TelemetryLink::spawn(
///         LinkConfig::new("ws://localhost:4000/ws/sensors"),
///         WsTransport,
///     );
///     let mut events = link.subscribe();
///     link.connect();
///     while let Ok(event) = events.recv().await {
///         println!("{event:?}");
///     }
/// }
/// ```
#[derive(Clone)]
pub struct TelemetryLink {
    cmd_tx: mpsc::UnboundedSender<LinkCommand>,
    status_rx: watch::Receiver<LinkStatus>,
    event_tx: broadcast::Sender<LinkEvent>,
}

impl TelemetryLink {
    /// Spawn the worker task and return a handle to it.
    ///
    /// The link starts out `Disconnected`; call
    /// [`connect`][Self::connect] to begin.
    pub fn spawn(config: LinkConfig, transport: impl Transport) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let state = LinkState::new(config.max_attempts);
        let (status_tx, status_rx) = watch::channel(state.status());

        let worker = LinkWorker {
            config,
            transport,
            state,
            status_tx,
            event_tx: event_tx.clone(),
        };
        tokio::spawn(worker.run(cmd_rx));

        Self {
            cmd_tx,
            status_rx,
            event_tx,
        }
    }

    /// Begin or resume connection attempts.  Idempotent while already
    /// connected or mid-cycle; a no-op while `Exhausted` (use
    /// [`manual_reconnect`][Self::manual_reconnect]).
    pub fn connect(&self) {
        let _ = self.cmd_tx.send(LinkCommand::Connect);
    }

    /// Terminate intentionally: cancel any pending retry, close the
    /// transport, and reset all retry bookkeeping.  Callable any number
    /// of times from any state.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(LinkCommand::Disconnect);
    }

    /// Operator-triggered reset-and-retry: clears the attempt counter and
    /// exhaustion unconditionally, cancels any pending timer, forces the
    /// transport closed, then reconnects immediately.
    pub fn manual_reconnect(&self) {
        let _ = self.cmd_tx.send(LinkCommand::ManualReconnect);
    }

    /// Transmit a text frame if currently connected; silently dropped
    /// otherwise.  Nothing is queued — a live control channel prefers
    /// freshness over completeness.
    pub fn send_text(&self, payload: impl Into<String>) {
        let _ = self.cmd_tx.send(LinkCommand::Send(payload.into()));
    }

    /// Current status snapshot.
    pub fn status(&self) -> LinkStatus {
        *self.status_rx.borrow()
    }

    /// Watch channel carrying the current [`LinkStatus`].
    pub fn watch_status(&self) -> watch::Receiver<LinkStatus> {
        self.status_rx.clone()
    }

    /// Subscribe to [`LinkEvent`] notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.event_tx.subscribe()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Worker
// ────────────────────────────────────────────────────────────────────────────

/// A live transport tagged with the generation of the open attempt that
/// produced it.
type ActiveConn = (u64, Box<dyn TransportConn>);

struct LinkWorker<T: Transport> {
    config: LinkConfig,
    transport: T,
    state: LinkState,
    status_tx: watch::Sender<LinkStatus>,
    event_tx: broadcast::Sender<LinkEvent>,
}

impl<T: Transport> LinkWorker<T> {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<LinkCommand>) {
        let mut conn: Option<ActiveConn> = None;
        let mut retry_timer: Option<Pin<Box<Sleep>>> = None;

        loop {
            tokio::select! {
                maybe_cmd = cmd_rx.recv() => {
                    // All handles dropped: tear the worker down.
                    let Some(cmd) = maybe_cmd else { break };
                    self.handle_command(cmd, &mut conn, &mut retry_timer).await;
                }
                event = async {
                    match conn.as_mut() {
                        Some((_, c)) => c.recv().await,
                        None => std::future::pending().await,
                    }
                } => {
                    self.handle_transport_event(event, &mut conn, &mut retry_timer);
                }
                () = async {
                    match retry_timer.as_mut() {
                        Some(timer) => timer.as_mut().await,
                        None => std::future::pending().await,
                    }
                } => {
                    // The owned handle is spent; a new one is created only
                    // if another retry gets scheduled.
                    retry_timer = None;
                    self.handle_retry_elapsed(&mut conn, &mut retry_timer).await;
                }
            }
        }
    }

    async fn handle_command(
        &mut self,
        cmd: LinkCommand,
        conn: &mut Option<ActiveConn>,
        retry_timer: &mut Option<Pin<Box<Sleep>>>,
    ) {
        match cmd {
            LinkCommand::Connect => {
                if self.state.connect_requested() {
                    self.open_transport(conn, retry_timer).await;
                } else {
                    debug!(state = %self.state.state(), "connect request ignored");
                }
            }
            LinkCommand::Disconnect => {
                // Cancelling an absent timer and closing an absent
                // transport are both no-ops, so repeated disconnects are
                // harmless.
                *retry_timer = None;
                if conn.take().is_some() {
                    self.emit(LinkEvent::Disconnected);
                }
                self.state.reset();
                self.publish_status();
                info!("telemetry link closed by request");
            }
            LinkCommand::ManualReconnect => {
                *retry_timer = None;
                if conn.take().is_some() {
                    self.emit(LinkEvent::Disconnected);
                }
                self.state.reset();
                info!("manual reconnect requested");
                self.open_transport(conn, retry_timer).await;
            }
            LinkCommand::Send(payload) => {
                if self.state.state() == ConnectionState::Connected {
                    if let Some((_, c)) = conn.as_mut() {
                        if let Err(e) = c.send_text(payload).await {
                            // The close event that follows a dead socket
                            // drives the state machine; here we only log.
                            warn!(error = %e, "failed to transmit frame");
                        }
                    }
                } else {
                    debug!(state = %self.state.state(), "dropping outbound frame; not connected");
                }
            }
        }
    }

    fn handle_transport_event(
        &mut self,
        event: TransportEvent,
        conn: &mut Option<ActiveConn>,
        retry_timer: &mut Option<Pin<Box<Sleep>>>,
    ) {
        match event {
            TransportEvent::Text(raw) => self.handle_frame(&raw),
            TransportEvent::Error(e) => {
                warn!(error = %e, "telemetry transport error");
                self.emit(LinkEvent::Error(e));
                if let Some((generation, _)) = conn.take() {
                    self.handle_close(generation, retry_timer);
                }
            }
            TransportEvent::Closed => {
                if let Some((generation, _)) = conn.take() {
                    self.handle_close(generation, retry_timer);
                }
            }
        }
    }

    /// Open a new transport, driving the state machine through either
    /// outcome.  An open failure is handled exactly like a close of the
    /// attempted transport.
    async fn open_transport(
        &mut self,
        conn: &mut Option<ActiveConn>,
        retry_timer: &mut Option<Pin<Box<Sleep>>>,
    ) {
        let generation = self.state.begin_attempt();
        self.publish_status();

        match self.transport.open(&self.config.url).await {
            Ok(new_conn) => {
                *conn = Some((generation, new_conn));
                self.state.transport_opened();
                self.publish_status();
                self.emit(LinkEvent::Connected);
                info!(url = %self.config.url, "telemetry link established");
            }
            Err(e) => {
                warn!(error = %e, "telemetry endpoint unreachable");
                self.emit(LinkEvent::Error(e.to_string()));
                self.handle_close(generation, retry_timer);
            }
        }
    }

    /// Drive the state machine through a close of the transport tagged
    /// `generation` and schedule (or refuse to schedule) the retry timer
    /// accordingly.
    fn handle_close(&mut self, generation: u64, retry_timer: &mut Option<Pin<Box<Sleep>>>) {
        match self.state.transport_closed(generation) {
            CloseAction::Ignore => return,
            CloseAction::ScheduleRetry => {
                self.emit(LinkEvent::Disconnected);
                *retry_timer = Some(Box::pin(sleep(self.config.retry_interval)));
                debug!(
                    attempts = self.state.attempts(),
                    interval_ms = self.config.retry_interval.as_millis() as u64,
                    "telemetry link lost; retry scheduled"
                );
            }
            CloseAction::GiveUp => {
                self.emit(LinkEvent::Disconnected);
                *retry_timer = None;
                warn!(
                    attempts = self.state.attempts(),
                    "telemetry retries exhausted; manual reconnect required"
                );
            }
        }
        self.publish_status();
    }

    async fn handle_retry_elapsed(
        &mut self,
        conn: &mut Option<ActiveConn>,
        retry_timer: &mut Option<Pin<Box<Sleep>>>,
    ) {
        match self.state.retry_elapsed() {
            RetryAction::Reopen => {
                debug!(attempt = self.state.attempts(), "retrying telemetry connection");
                self.open_transport(conn, retry_timer).await;
            }
            RetryAction::GiveUp => {
                self.publish_status();
                warn!(
                    attempts = self.state.attempts(),
                    "telemetry retries exhausted; manual reconnect required"
                );
            }
            RetryAction::Ignore => {}
        }
    }

    /// Decode one inbound frame.  A malformed frame is not a connection
    /// failure: it is dropped, logged, and nothing else changes.
    fn handle_frame(&mut self, raw: &str) {
        match serde_json::from_str::<TelemetrySnapshot>(raw) {
            Ok(snapshot) => {
                self.emit(LinkEvent::Telemetry(snapshot));
            }
            Err(e) => {
                let err = FirewatchError::MalformedFrame(e.to_string());
                warn!(error = %err, "discarding inbound frame");
            }
        }
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(self.state.status());
    }

    fn emit(&self, event: LinkEvent) {
        // Best-effort publish – no subscribers is not an error.
        let _ = self.event_tx.send(event);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
