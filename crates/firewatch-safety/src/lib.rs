//! `firewatch-safety` – Derived Safety State
//!
//! The judgement layer of the console.  It does not talk to the network;
//! it folds decoded telemetry into a current snapshot and answers two
//! questions about it: *how bad is it* and *may the operator act*.
//!
//! # Modules
//!
//! - [`derive`] – [`classify_gas`][derive::classify_gas] and
//!   [`DerivedSafetyState`][derive::DerivedSafetyState]: total, pure
//!   classification of a [`TelemetrySnapshot`][firewatch_types::TelemetrySnapshot]
//!   into gas bands, emergency flag, and control lockout.
//! - [`gate`] – [`can_issue_device_command`][gate::can_issue_device_command]:
//!   the predicate every actuator request must pass (manual mode + live
//!   link) and its mode-change counterpart.
//! - [`monitor`] – [`SafetyMonitor`][monitor::SafetyMonitor]: exclusive
//!   owner of the retained snapshot; replaces it wholesale per frame and
//!   logs emergency edges.

pub mod derive;
pub mod gate;
pub mod monitor;

pub use derive::{DerivedSafetyState, GAS_DANGER_PPM, GAS_WARNING_PPM, GasLevel, classify_gas};
pub use gate::{can_issue_device_command, can_issue_mode_command};
pub use monitor::SafetyMonitor;
