//! Command Service client.
//!
//! Two request/response operations against the installation's REST API:
//! set an actuator state and set the control mode.  Calls are never
//! retried or queued here — a failure is returned to the caller, who
//! reports it to the operator.  Whether a command *should* be issued at
//! all is decided beforehand by the gate in `firewatch-safety`.

use firewatch_types::{
    ActuatorTarget, ControlMode, DeviceCommand, DeviceState, FirewatchError, ModeCommand,
};

/// HTTP client for the Command Service.
pub struct CommandClient {
    base_url: String,
    http: reqwest::Client,
}

impl CommandClient {
    /// Client for the Command Service rooted at `base_url`
    /// (e.g. `http://localhost:4000/api`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn control_url(&self, segment: &str) -> String {
        format!("{}/control/{segment}", self.base_url)
    }

    /// Command one actuator on or off.
    ///
    /// # Errors
    ///
    /// Returns [`FirewatchError::Command`] on a network failure or a
    /// non-success HTTP status.
    pub async fn set_device(
        &self,
        target: ActuatorTarget,
        state: DeviceState,
    ) -> Result<(), FirewatchError> {
        let url = self.control_url(target.wire_name());
        let response = self
            .http
            .post(&url)
            .json(&DeviceCommand { state })
            .send()
            .await
            .map_err(|e| FirewatchError::Command {
                target: target.to_string(),
                reason: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(FirewatchError::Command {
                target: target.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(())
    }

    /// Switch the installation between manual and automatic control.
    ///
    /// # Errors
    ///
    /// Returns [`FirewatchError::Command`] on a network failure or a
    /// non-success HTTP status.
    pub async fn set_mode(&self, mode: ControlMode) -> Result<(), FirewatchError> {
        let url = self.control_url("modo");
        let response = self
            .http
            .post(&url)
            .json(&ModeCommand { mode })
            .send()
            .await
            .map_err(|e| FirewatchError::Command {
                target: "modo".to_string(),
                reason: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(FirewatchError::Command {
                target: "modo".to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_urls_match_command_service_routes() {
        let client = CommandClient::new("http://localhost:4000/api");
        assert_eq!(
            client.control_url(ActuatorTarget::Fan.wire_name()),
            "http://localhost:4000/api/control/ventilador"
        );
        assert_eq!(
            client.control_url(ActuatorTarget::Sprinkler.wire_name()),
            "http://localhost:4000/api/control/aspersor"
        );
        assert_eq!(
            client.control_url("modo"),
            "http://localhost:4000/api/control/modo"
        );
    }

    #[test]
    fn trailing_slash_in_base_url_is_trimmed() {
        let client = CommandClient::new("http://localhost:4000/api/");
        assert_eq!(
            client.control_url("modo"),
            "http://localhost:4000/api/control/modo"
        );
    }

    #[tokio::test]
    async fn unreachable_service_surfaces_command_error() {
        // Nothing listens on port 1 – the request must fail, not panic,
        // and the error must name the target.
        let client = CommandClient::new("http://127.0.0.1:1/api");
        let result = client
            .set_device(ActuatorTarget::Fan, DeviceState::On)
            .await;
        assert!(
            matches!(&result, Err(FirewatchError::Command { target, .. }) if target == "ventilador"),
            "expected Command error, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_service_surfaces_mode_error() {
        let client = CommandClient::new("http://127.0.0.1:1/api");
        let result = client.set_mode(ControlMode::Manual).await;
        assert!(
            matches!(&result, Err(FirewatchError::Command { target, .. }) if target == "modo"),
            "expected Command error, got: {result:?}"
        );
    }
}
