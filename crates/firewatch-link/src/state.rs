//! [`LinkState`] – connection lifecycle state machine.
//!
//! A pure, synchronous core: no I/O, no timers, no channels.  The async
//! actor in [`link`][crate::link] feeds it transport and timer events and
//! executes whatever action it returns, which keeps the
//! `Exhausted`/reconnect interplay testable without opening a socket.
//!
//! # States
//!
//! | State | Meaning |
//! |---|---|
//! | `Disconnected` | Intentionally idle; no transport, no pending retry |
//! | `Connecting` | A transport open is in flight |
//! | `Connected` | Live transport; frames are flowing |
//! | `Reconnecting` | Transport lost; the retry timer is pending |
//! | `Exhausted` | Retry budget spent; only a manual reconnect resumes |
//!
//! # Transport generations
//!
//! Every open attempt is tagged with a monotonically increasing
//! generation.  A close event carrying a generation other than the
//! current one belongs to a superseded transport (e.g. one forcibly
//! closed by a manual reconnect) and is ignored, so a stale close can
//! never schedule a competing retry chain.

use std::fmt;

// ────────────────────────────────────────────────────────────────────────────
// Public types
// ────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of the telemetry connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Exhausted,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Exhausted => "exhausted",
        };
        f.write_str(label)
    }
}

/// Externally observable status: the current state plus the number of
/// retry attempts consumed since the last successful open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus {
    pub state: ConnectionState,
    pub attempts: u32,
}

/// What the actor must do after a transport close event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Start the retry timer; the state is now `Reconnecting`.
    ScheduleRetry,
    /// Retry budget already spent; the state is now `Exhausted`.
    GiveUp,
    /// Stale or out-of-place event; nothing changed.
    Ignore,
}

/// What the actor must do after the retry delay elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Open a new transport (the subsequent
    /// [`begin_attempt`][LinkState::begin_attempt] marks `Connecting`).
    Reopen,
    /// The attempt budget is now spent; the state is `Exhausted` and no
    /// further timer may be scheduled.
    GiveUp,
    /// Timer fired outside `Reconnecting`; nothing changed.
    Ignore,
}

// ────────────────────────────────────────────────────────────────────────────
// LinkState
// ────────────────────────────────────────────────────────────────────────────

/// The single authoritative record of connection lifecycle state.
///
/// # Example
///
/// ```
/// use firewatch_link::state::{ConnectionState, LinkState, RetryAction};
///
/// let mut state = LinkState::new(2);
/// assert!(state.connect_requested());
/// let generation = state.begin_attempt();
///
/// // The open attempt fails and the transport closes.
/// state.transport_closed(generation);
/// assert_eq!(state.state(), ConnectionState::Reconnecting);
///
/// // First retry: counter increments before anything is reopened.
/// assert_eq!(state.retry_elapsed(), RetryAction::Reopen);
/// assert_eq!(state.attempts(), 1);
/// ```
#[derive(Debug)]
pub struct LinkState {
    state: ConnectionState,
    attempts: u32,
    max_attempts: u32,
    generation: u64,
}

impl LinkState {
    /// Create a machine in `Disconnected` with a fresh attempt budget.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempts: 0,
            max_attempts,
            generation: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Retry attempts consumed since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Generation of the most recent open attempt.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Status snapshot for publication to observers.
    pub fn status(&self) -> LinkStatus {
        LinkStatus {
            state: self.state,
            attempts: self.attempts,
        }
    }

    /// Handle a `connect()` request.
    ///
    /// Returns `true` when the actor should open a transport.  A no-op in
    /// every state except `Disconnected`: while connected or mid-cycle the
    /// request is idempotent, and `Exhausted` is only left via
    /// [`reset`][Self::reset] (the manual-reconnect path).
    pub fn connect_requested(&self) -> bool {
        self.state == ConnectionState::Disconnected
    }

    /// Record the start of an open attempt and return its generation.
    ///
    /// Any event tagged with an earlier generation is stale from here on.
    pub fn begin_attempt(&mut self) -> u64 {
        self.state = ConnectionState::Connecting;
        self.generation += 1;
        self.generation
    }

    /// The transport opened: connected, retry bookkeeping cleared.
    pub fn transport_opened(&mut self) {
        self.state = ConnectionState::Connected;
        self.attempts = 0;
    }

    /// The transport tagged `generation` closed (or failed to open).
    pub fn transport_closed(&mut self, generation: u64) -> CloseAction {
        if generation != self.generation {
            return CloseAction::Ignore;
        }
        match self.state {
            ConnectionState::Connected | ConnectionState::Connecting => {
                if self.attempts < self.max_attempts {
                    self.state = ConnectionState::Reconnecting;
                    CloseAction::ScheduleRetry
                } else {
                    self.state = ConnectionState::Exhausted;
                    CloseAction::GiveUp
                }
            }
            _ => CloseAction::Ignore,
        }
    }

    /// The retry delay elapsed.
    ///
    /// The attempt counter is incremented synchronously here, before any
    /// reconnect is initiated, so the count can never lag behind the
    /// number of scheduled retries.
    pub fn retry_elapsed(&mut self) -> RetryAction {
        if self.state != ConnectionState::Reconnecting {
            return RetryAction::Ignore;
        }
        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            self.state = ConnectionState::Exhausted;
            RetryAction::GiveUp
        } else {
            RetryAction::Reopen
        }
    }

    /// Full reset to `Disconnected`: attempt counter cleared, exhaustion
    /// cleared, and the generation bumped so any event still in flight
    /// from the previous transport is orphaned.
    ///
    /// Used by both `disconnect()` (which stops here) and
    /// `manual_reconnect()` (which immediately begins a new attempt).
    pub fn reset(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.attempts = 0;
        self.generation += 1;
    }
}
