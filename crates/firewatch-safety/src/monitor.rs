//! [`SafetyMonitor`] – owner of the current telemetry snapshot.
//!
//! Folds each inbound frame into the retained [`TelemetrySnapshot`]
//! (wholesale replacement, never a field-by-field merge) and derives the
//! safety classification on demand.  No other component mutates the
//! snapshot.  This component cannot fail: absent inputs derive to
//! `Unknown`, not to an error.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use firewatch_link::ConnectionState;
use firewatch_types::TelemetrySnapshot;

use crate::derive::DerivedSafetyState;
use crate::gate;

/// Holds the latest known reading and answers classification and gating
/// queries about it.
///
/// # Example
///
/// ```
/// use firewatch_safety::{GasLevel, SafetyMonitor};
/// use firewatch_types::TelemetrySnapshot;
///
/// let mut monitor = SafetyMonitor::new();
/// assert_eq!(monitor.derived().gas_level, GasLevel::Unknown);
///
/// let frame: TelemetrySnapshot = serde_json::from_str(
///     r#"{"gas":650,"flama":false,"modo":"MANUAL"}"#,
/// ).unwrap();
/// let derived = monitor.apply(frame);
/// assert!(derived.emergency);
/// ```
#[derive(Debug, Default)]
pub struct SafetyMonitor {
    snapshot: TelemetrySnapshot,
    received_at: Option<DateTime<Utc>>,
}

impl SafetyMonitor {
    /// Monitor holding the all-unknown initial snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with `frame` and return the freshly derived
    /// safety state.
    ///
    /// Emergency edges are logged: entering an emergency is a warning,
    /// leaving one is informational.
    pub fn apply(&mut self, frame: TelemetrySnapshot) -> DerivedSafetyState {
        let was_emergency = self.derived().emergency;

        self.snapshot = frame;
        self.received_at = Some(Utc::now());

        let derived = self.derived();
        if derived.emergency && !was_emergency {
            warn!(
                gas = ?self.snapshot.gas,
                flame = ?self.snapshot.flame,
                "emergency condition detected"
            );
        } else if !derived.emergency && was_emergency {
            info!("emergency condition cleared");
        }
        derived
    }

    /// The latest known reading.
    pub fn snapshot(&self) -> &TelemetrySnapshot {
        &self.snapshot
    }

    /// When the last frame was applied; `None` before the first frame.
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    /// Derive the safety classification of the current snapshot.
    pub fn derived(&self) -> DerivedSafetyState {
        DerivedSafetyState::derive(&self.snapshot)
    }

    /// Whether a manual actuator command may be issued right now, given
    /// the connection state reported by the link.
    pub fn can_issue_device_command(&self, link: ConnectionState) -> bool {
        gate::can_issue_device_command(self.snapshot.mode, link)
    }

    /// Whether a mode-change command may be issued right now.
    pub fn can_issue_mode_command(&self, link: ConnectionState) -> bool {
        gate::can_issue_mode_command(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::GasLevel;
    use firewatch_types::ControlMode;

    fn frame(raw: &str) -> TelemetrySnapshot {
        serde_json::from_str(raw).expect("test frame must decode")
    }

    #[test]
    fn starts_all_unknown_and_non_emergency() {
        let monitor = SafetyMonitor::new();
        let derived = monitor.derived();
        assert_eq!(derived.gas_level, GasLevel::Unknown);
        assert!(!derived.emergency);
        assert!(monitor.received_at().is_none());
    }

    #[test]
    fn apply_replaces_snapshot_wholesale() {
        let mut monitor = SafetyMonitor::new();
        monitor.apply(frame(
            r#"{"gas":650,"flama":true,"estadoVent":"ON","estadoAsp":"ON","modo":"MANUAL"}"#,
        ));

        // The next frame omits everything but gas; the previous flame and
        // actuator readings must NOT survive the replacement.
        monitor.apply(frame(r#"{"gas":100}"#));

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.gas, Some(100));
        assert_eq!(snapshot.flame, None);
        assert_eq!(snapshot.fan, None);
        assert_eq!(snapshot.mode, None);
        assert!(!monitor.derived().emergency);
    }

    #[test]
    fn apply_stamps_receive_time() {
        let mut monitor = SafetyMonitor::new();
        monitor.apply(frame(r#"{"gas":10}"#));
        assert!(monitor.received_at().is_some());
    }

    #[test]
    fn emergency_rises_and_clears_across_frames() {
        let mut monitor = SafetyMonitor::new();

        let derived = monitor.apply(frame(r#"{"gas":650,"flama":false}"#));
        assert!(derived.emergency);

        let derived = monitor.apply(frame(r#"{"gas":120,"flama":false}"#));
        assert!(!derived.emergency);
    }

    #[test]
    fn gate_follows_snapshot_mode() {
        let mut monitor = SafetyMonitor::new();

        monitor.apply(frame(r#"{"modo":"MANUAL"}"#));
        assert!(monitor.can_issue_device_command(ConnectionState::Connected));
        assert!(!monitor.can_issue_device_command(ConnectionState::Reconnecting));

        // The controller reports AUTOMATICO: locked even while connected.
        monitor.apply(frame(r#"{"modo":"AUTOMATICO"}"#));
        assert!(!monitor.can_issue_device_command(ConnectionState::Connected));
        assert_eq!(monitor.snapshot().mode, Some(ControlMode::Automatic));

        // Mode changes only need the live link.
        assert!(monitor.can_issue_mode_command(ConnectionState::Connected));
        assert!(!monitor.can_issue_mode_command(ConnectionState::Exhausted));
    }

    #[test]
    fn gate_is_closed_before_any_frame_arrives() {
        let monitor = SafetyMonitor::new();
        assert!(!monitor.can_issue_device_command(ConnectionState::Connected));
    }
}
