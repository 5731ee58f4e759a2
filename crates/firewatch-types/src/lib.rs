use serde::{Deserialize, Serialize};
use thiserror::Error;

/// On/off state reported for, and commanded to, an actuator.
///
/// The wire encoding is the uppercase string the installation firmware
/// emits (`"ON"` / `"OFF"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceState::On => write!(f, "ON"),
            DeviceState::Off => write!(f, "OFF"),
        }
    }
}

/// Who drives the actuators: the operator (`Manual`) or the controller's
/// own sensor-reaction logic (`Automatic`).
///
/// While the installation is in `Automatic` mode, manual actuator
/// commands are locked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    #[serde(rename = "MANUAL")]
    Manual,
    #[serde(rename = "AUTOMATICO")]
    Automatic,
}

impl std::fmt::Display for ControlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlMode::Manual => write!(f, "MANUAL"),
            ControlMode::Automatic => write!(f, "AUTOMATICO"),
        }
    }
}

/// The two addressable actuators of the installation.
///
/// [`ActuatorTarget::wire_name`] yields the path segment the Command
/// Service expects (`/control/ventilador`, `/control/aspersor`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorTarget {
    /// Ventilation fan.
    Fan,
    /// Sprinkler system.
    Sprinkler,
}

impl ActuatorTarget {
    /// The Command Service identifier for this actuator.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ActuatorTarget::Fan => "ventilador",
            ActuatorTarget::Sprinkler => "aspersor",
        }
    }
}

impl std::fmt::Display for ActuatorTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// The latest known sensor reading.
///
/// One struct serves as both the decoded wire frame and the retained
/// snapshot: every successfully decoded inbound frame replaces the
/// snapshot wholesale, so the two are structurally identical. `None`
/// means the field is unknown — either the firmware sent `null` or no
/// frame has arrived yet. [`Default`] is the all-unknown initial value.
///
/// Wire field names are the installation firmware's own (Spanish):
///
/// | Field | Wire name | Wire values |
/// |---|---|---|
/// | `gas` | `gas` | ppm as a non-negative integer, or `null` |
/// | `flame` | `flama` | `true` / `false` / `null` |
/// | `fan` | `estadoVent` | `"ON"` / `"OFF"` / `null` |
/// | `sprinkler` | `estadoAsp` | `"ON"` / `"OFF"` / `null` |
/// | `mode` | `modo` | `"MANUAL"` / `"AUTOMATICO"` / `null` |
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Gas concentration in ppm.
    #[serde(default)]
    pub gas: Option<u32>,
    /// Flame detector reading.
    #[serde(default, rename = "flama")]
    pub flame: Option<bool>,
    /// Reported ventilation-fan state.
    #[serde(default, rename = "estadoVent")]
    pub fan: Option<DeviceState>,
    /// Reported sprinkler state.
    #[serde(default, rename = "estadoAsp")]
    pub sprinkler: Option<DeviceState>,
    /// Reported control mode.
    #[serde(default, rename = "modo")]
    pub mode: Option<ControlMode>,
}

/// Body of a set-actuator-state request to the Command Service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub state: DeviceState,
}

/// Body of a set-control-mode request to the Command Service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCommand {
    pub mode: ControlMode,
}

/// Global error type spanning transport failures, malformed telemetry,
/// Command Service rejections, and configuration problems.
#[derive(Error, Debug)]
pub enum FirewatchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed telemetry frame: {0}")]
    MalformedFrame(String),

    #[error("command to {target} failed: {reason}")]
    Command { target: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_decodes_full_frame() {
        let raw = r#"{"gas":650,"flama":false,"estadoVent":"ON","estadoAsp":"OFF","modo":"MANUAL"}"#;
        let snapshot: TelemetrySnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.gas, Some(650));
        assert_eq!(snapshot.flame, Some(false));
        assert_eq!(snapshot.fan, Some(DeviceState::On));
        assert_eq!(snapshot.sprinkler, Some(DeviceState::Off));
        assert_eq!(snapshot.mode, Some(ControlMode::Manual));
    }

    #[test]
    fn snapshot_decodes_null_fields_as_unknown() {
        let raw = r#"{"gas":null,"flama":null,"estadoVent":null,"estadoAsp":null,"modo":null}"#;
        let snapshot: TelemetrySnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot, TelemetrySnapshot::default());
    }

    #[test]
    fn snapshot_tolerates_missing_fields() {
        let snapshot: TelemetrySnapshot = serde_json::from_str(r#"{"gas":120}"#).unwrap();
        assert_eq!(snapshot.gas, Some(120));
        assert_eq!(snapshot.flame, None);
        assert_eq!(snapshot.mode, None);
    }

    #[test]
    fn snapshot_tolerates_unknown_fields() {
        let raw = r#"{"gas":10,"modo":"AUTOMATICO","firmware":"v2.1"}"#;
        let snapshot: TelemetrySnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.gas, Some(10));
        assert_eq!(snapshot.mode, Some(ControlMode::Automatic));
    }

    #[test]
    fn snapshot_rejects_wrong_field_type() {
        // A frame with a non-numeric gas reading is malformed, not coerced.
        assert!(serde_json::from_str::<TelemetrySnapshot>(r#"{"gas":"high"}"#).is_err());
    }

    #[test]
    fn default_snapshot_is_all_unknown() {
        let snapshot = TelemetrySnapshot::default();
        assert_eq!(snapshot.gas, None);
        assert_eq!(snapshot.flame, None);
        assert_eq!(snapshot.fan, None);
        assert_eq!(snapshot.sprinkler, None);
        assert_eq!(snapshot.mode, None);
    }

    #[test]
    fn device_state_wire_roundtrip() {
        let json = serde_json::to_string(&DeviceState::On).unwrap();
        assert_eq!(json, r#""ON""#);
        let back: DeviceState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DeviceState::On);
    }

    #[test]
    fn control_mode_wire_roundtrip() {
        let json = serde_json::to_string(&ControlMode::Automatic).unwrap();
        assert_eq!(json, r#""AUTOMATICO""#);
        let back: ControlMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ControlMode::Automatic);
    }

    #[test]
    fn actuator_wire_names_match_command_service_paths() {
        assert_eq!(ActuatorTarget::Fan.wire_name(), "ventilador");
        assert_eq!(ActuatorTarget::Sprinkler.wire_name(), "aspersor");
    }

    #[test]
    fn device_command_serializes_to_expected_body() {
        let body = serde_json::to_value(DeviceCommand {
            state: DeviceState::On,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"state": "ON"}));
    }

    #[test]
    fn mode_command_serializes_to_expected_body() {
        let body = serde_json::to_value(ModeCommand {
            mode: ControlMode::Manual,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"mode": "MANUAL"}));
    }

    #[test]
    fn error_display_includes_context() {
        let err = FirewatchError::Command {
            target: "ventilador".to_string(),
            reason: "HTTP 500".to_string(),
        };
        assert!(err.to_string().contains("ventilador"));
        assert!(err.to_string().contains("HTTP 500"));
    }
}
