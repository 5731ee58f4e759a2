//! Configuration – reads/writes `~/.firewatch/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use firewatch_link::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL, LinkConfig};
use firewatch_types::FirewatchError;

/// Persisted console configuration stored in `~/.firewatch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// WebSocket URL of the telemetry stream.
    #[serde(default = "default_telemetry_url")]
    pub telemetry_url: String,

    /// Base URL of the Command Service REST API.
    #[serde(default = "default_command_url")]
    pub command_url: String,

    /// Delay between automatic reconnect attempts, in milliseconds.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Automatic reconnect attempts before the link gives up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_telemetry_url() -> String {
    "ws://localhost:4000/ws/sensors".to_string()
}
fn default_command_url() -> String {
    "http://localhost:4000/api".to_string()
}
fn default_retry_interval_ms() -> u64 {
    DEFAULT_RETRY_INTERVAL.as_millis() as u64
}
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telemetry_url: default_telemetry_url(),
            command_url: default_command_url(),
            retry_interval_ms: default_retry_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Config {
    /// Build the [`LinkConfig`] this configuration describes.
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig::new(&self.telemetry_url)
            .with_retry_interval(Duration::from_millis(self.retry_interval_ms))
            .with_max_attempts(self.max_attempts)
    }
}

/// Return the path to `~/.firewatch/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".firewatch").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, FirewatchError> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, FirewatchError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        FirewatchError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| FirewatchError::Config(format!("failed to parse config: {e}")))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `FIREWATCH_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `FIREWATCH_TELEMETRY_URL` | `telemetry_url` |
/// | `FIREWATCH_COMMAND_URL` | `command_url` |
/// | `FIREWATCH_RETRY_INTERVAL_MS` | `retry_interval_ms` |
/// | `FIREWATCH_MAX_ATTEMPTS` | `max_attempts` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("FIREWATCH_TELEMETRY_URL") {
        cfg.telemetry_url = v;
    }
    if let Ok(v) = std::env::var("FIREWATCH_COMMAND_URL") {
        cfg.command_url = v;
    }
    if let Ok(v) = std::env::var("FIREWATCH_RETRY_INTERVAL_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.retry_interval_ms = ms;
    }
    if let Ok(v) = std::env::var("FIREWATCH_MAX_ATTEMPTS")
        && let Ok(attempts) = v.parse::<u32>()
    {
        cfg.max_attempts = attempts;
    }
}

/// Save the config to disk, creating `~/.firewatch/` if necessary.
pub fn save(cfg: &Config) -> Result<(), FirewatchError> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), FirewatchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            FirewatchError::Config(format!("failed to create config directory: {e}"))
        })?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| FirewatchError::Config(format!("failed to serialize config: {e}")))?;
    fs::write(path, raw).map_err(|e| {
        FirewatchError::Config(format!("failed to write config at {}: {e}", path.display()))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_retry_policy() {
        let cfg = Config::default();
        assert_eq!(cfg.retry_interval_ms, 3000);
        assert_eq!(cfg.max_attempts, 5);
        assert!(cfg.telemetry_url.starts_with("ws://"));
        assert!(cfg.command_url.starts_with("http://"));
    }

    #[test]
    fn link_config_carries_retry_policy() {
        let mut cfg = Config::default();
        cfg.retry_interval_ms = 250;
        cfg.max_attempts = 2;

        let link = cfg.link_config();
        assert_eq!(link.url, cfg.telemetry_url);
        assert_eq!(link.retry_interval, Duration::from_millis(250));
        assert_eq!(link.max_attempts, 2);
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config::default();
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "telemetry_url = \"ws://plant-floor:4000/ws/sensors\"\n").unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.telemetry_url, "ws://plant-floor:4000/ws/sensors");
        assert_eq!(loaded.retry_interval_ms, 3000);
        assert_eq!(loaded.max_attempts, 5);
    }

    #[test]
    fn config_path_points_to_firewatch_dir() {
        let p = config_path_for_home("/home/operator");
        assert!(p.to_string_lossy().contains(".firewatch"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        let result = load_from(&path).expect("no error");
        assert!(result.is_none());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "retry_interval_ms = \"soon\"").unwrap();

        let result = load_from(&path);
        assert!(matches!(result, Err(FirewatchError::Config(_))));
    }

    #[test]
    fn apply_env_overrides_changes_telemetry_url() {
        // SAFETY: single-threaded test; no other thread reads this env-var.
        unsafe { std::env::set_var("FIREWATCH_TELEMETRY_URL", "ws://rig:9000/ws") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.telemetry_url, "ws://rig:9000/ws");
        unsafe { std::env::remove_var("FIREWATCH_TELEMETRY_URL") };
    }

    #[test]
    fn apply_env_overrides_changes_retry_interval() {
        // SAFETY: single-threaded test; no other thread reads this env-var.
        unsafe { std::env::set_var("FIREWATCH_RETRY_INTERVAL_MS", "100") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.retry_interval_ms, 100);
        unsafe { std::env::remove_var("FIREWATCH_RETRY_INTERVAL_MS") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_max_attempts() {
        // SAFETY: single-threaded test; no other thread reads this env-var.
        unsafe { std::env::set_var("FIREWATCH_MAX_ATTEMPTS", "plenty") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.max_attempts, 5);
        unsafe { std::env::remove_var("FIREWATCH_MAX_ATTEMPTS") };
    }
}
