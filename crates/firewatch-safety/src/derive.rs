//! Pure classification of a telemetry snapshot.
//!
//! Everything here is a total function over any [`TelemetrySnapshot`],
//! including the all-unknown initial value: absent readings classify as
//! [`GasLevel::Unknown`] and never as an emergency.  Keeping the
//! derivation pure (rather than incrementally mutated flags) means these
//! rules are exercised in tests without spinning up a connection.

use firewatch_types::{ControlMode, TelemetrySnapshot};

/// Gas concentration at or above which the reading counts as a warning.
pub const GAS_WARNING_PPM: u32 = 300;

/// Gas concentration at or above which the reading counts as danger.
pub const GAS_DANGER_PPM: u32 = 600;

/// Classification of the gas concentration reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasLevel {
    Safe,
    Warning,
    Danger,
    /// No reading available.
    Unknown,
}

impl std::fmt::Display for GasLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            GasLevel::Safe => "safe",
            GasLevel::Warning => "warning",
            GasLevel::Danger => "danger",
            GasLevel::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Classify a gas reading in ppm.
///
/// Bands are contiguous with no gap or overlap: `< 300` is safe,
/// `300..=599` is a warning, `>= 600` is danger.
pub fn classify_gas(gas: Option<u32>) -> GasLevel {
    match gas {
        None => GasLevel::Unknown,
        Some(ppm) if ppm < GAS_WARNING_PPM => GasLevel::Safe,
        Some(ppm) if ppm < GAS_DANGER_PPM => GasLevel::Warning,
        Some(_) => GasLevel::Danger,
    }
}

/// Safety conditions derived from one [`TelemetrySnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedSafetyState {
    /// Classification of the gas reading.
    pub gas_level: GasLevel,
    /// A flame was detected or the gas reading is in the danger band.
    pub emergency: bool,
    /// The installation is in automatic mode, so manual actuator
    /// commands must be disabled.
    pub controls_locked: bool,
}

impl DerivedSafetyState {
    /// Derive the safety conditions from `snapshot`.
    pub fn derive(snapshot: &TelemetrySnapshot) -> Self {
        let gas_level = classify_gas(snapshot.gas);
        Self {
            gas_level,
            emergency: snapshot.flame == Some(true) || gas_level == GasLevel::Danger,
            controls_locked: snapshot.mode == Some(ControlMode::Automatic),
        }
    }
}
