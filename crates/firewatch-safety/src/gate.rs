//! Command gate – the single decision point for whether an operator
//! request may be issued to the Command Service.
//!
//! The gate never issues commands itself; consumers check it before
//! calling out, and the same predicate doubles as the UI enable/disable
//! signal for the corresponding controls.

use firewatch_link::ConnectionState;
use firewatch_types::ControlMode;

/// `true` when a manual actuator command (fan or sprinkler) may be
/// issued: the installation must be in `Manual` mode *and* the telemetry
/// link must be live.
///
/// An unknown mode counts as not-manual: without a confirmed `MANUAL`
/// reading the controller may still be acting on its own, and a manual
/// command would race it.
pub fn can_issue_device_command(mode: Option<ControlMode>, link: ConnectionState) -> bool {
    mode == Some(ControlMode::Manual) && link == ConnectionState::Connected
}

/// `true` when a mode-change command may be issued: only a live link is
/// required, since switching to `MANUAL` is exactly how the operator
/// takes control out of `AUTOMATICO`.
pub fn can_issue_mode_command(link: ConnectionState) -> bool {
    link == ConnectionState::Connected
}
