// ── Runtime settings ──
//
// Defaults, then settings.toml, then TVCTL_* environment variables.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use tvctl_core::SessionConfig;

use crate::ConfigError;

/// Timing and wake tuning. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: u64,
    pub pairing_timeout_secs: u64,
    pub power_on_attempts: u32,
    pub power_on_interval_ms: u64,
    /// `0` disables the keepalive task.
    pub keepalive_interval_secs: u64,
    /// How often interactive front ends re-check the connection.
    pub status_poll_interval_secs: u64,
    pub wol_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wol_broadcast: Option<IpAddr>,
    pub adb_program: String,
    pub remote_control_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            command_timeout_secs: 3,
            pairing_timeout_secs: 60,
            power_on_attempts: 10,
            power_on_interval_ms: 1000,
            keepalive_interval_secs: 25,
            status_poll_interval_secs: 30,
            wol_port: 9,
            wol_broadcast: None,
            adb_program: "adb".into(),
            remote_control_timeout_secs: 5,
        }
    }
}

impl Settings {
    /// Layer `path` (if it exists) and the environment over the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("TVCTL_").ignore(&["config", "settings"]))
            .extract()?;
        Ok(settings)
    }

    /// Status poll period for interactive sessions.
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_interval_secs.max(1))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            command_timeout: Duration::from_secs(self.command_timeout_secs),
            pairing_timeout: Duration::from_secs(self.pairing_timeout_secs),
            power_on_attempts: self.power_on_attempts,
            power_on_interval: Duration::from_millis(self.power_on_interval_ms),
            keepalive_interval: (self.keepalive_interval_secs > 0)
                .then(|| Duration::from_secs(self.keepalive_interval_secs)),
            wol_port: self.wol_port,
            wol_broadcast: self.wol_broadcast,
            adb_program: self.adb_program.clone(),
            remote_control_timeout: Duration::from_secs(self.remote_control_timeout_secs),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_session_defaults() {
        assert_eq!(Settings::default().session_config(), SessionConfig::default());
    }

    #[test]
    fn zero_keepalive_disables_task() {
        let settings = Settings {
            keepalive_interval_secs: 0,
            ..Settings::default()
        };
        assert_eq!(settings.session_config().keepalive_interval, None);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "power_on_attempts = 4\npower_on_interval_ms = 250\nwol_broadcast = \"192.168.1.255\"\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.power_on_attempts, 4);
        assert_eq!(settings.power_on_interval_ms, 250);
        assert_eq!(settings.wol_broadcast, Some("192.168.1.255".parse().unwrap()));
        assert_eq!(settings.command_timeout_secs, 3);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.wol_port, Settings::default().wol_port);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "power_on_attempts = \"many\"\n").unwrap();

        assert!(matches!(Settings::load(&path), Err(ConfigError::Figment(_))));
    }
}
