//! Configuration for tvctl.
//!
//! Two files live in the platform config directory:
//!
//! - `config.json`: the persisted device [`Config`](tvctl_core::Config),
//!   owned by [`ProfileStore`].
//! - `settings.toml`: optional runtime tuning, layered with `TVCTL_*`
//!   environment variables into [`Settings`].

mod settings;
mod store;

use std::path::PathBuf;

pub use settings::Settings;
pub use store::{ProfileStore, backup_path, load_config, save_config};

use tvctl_core::CoreError;

// ── Error type ──────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration at {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Failed to write configuration to {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("Settings error: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Corrupt { path, message } => CoreError::ConfigCorrupt {
                path: path.display().to_string(),
                message,
            },
            ConfigError::Write { path, message } => CoreError::ConfigWriteError {
                path: path.display().to_string(),
                message,
            },
            ConfigError::Figment(_) => CoreError::Internal(err.to_string()),
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

/// Platform config directory for tvctl.
pub fn config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "tvctl")
        .map_or_else(dirs_fallback, |dirs| dirs.config_dir().to_path_buf())
}

/// Default location of the persisted device configuration.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Default location of the runtime settings file.
pub fn settings_path() -> PathBuf {
    config_dir().join("settings.toml")
}

fn dirs_fallback() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    PathBuf::from(home).join(".config").join("tvctl")
}
