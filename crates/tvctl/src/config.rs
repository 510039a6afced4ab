//! CLI-side configuration wiring.
//!
//! Resolves file locations from global flags, then builds the profile
//! store, runtime settings, and session manager every command shares.

use std::path::PathBuf;
use std::sync::Arc;

use tvctl_api::{TransportConfig, WebSocketTransport};
use tvctl_config::{ProfileStore, Settings};
use tvctl_core::SessionManager;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(tvctl_config::config_path)
}

pub fn settings_path(global: &GlobalOpts) -> PathBuf {
    global
        .settings
        .clone()
        .unwrap_or_else(tvctl_config::settings_path)
}

pub fn load_settings(global: &GlobalOpts) -> Result<Settings, CliError> {
    Ok(Settings::load(&settings_path(global))?)
}

/// Open the device configuration. An unreadable file is logged and
/// replaced by an empty configuration on the next write.
pub fn open_store(global: &GlobalOpts) -> Arc<ProfileStore> {
    Arc::new(ProfileStore::open_or_default(config_path(global)))
}

/// Everything a device command needs.
pub struct Context {
    pub manager: SessionManager,
    pub store: Arc<ProfileStore>,
    pub settings: Settings,
}

impl Context {
    pub fn new(global: &GlobalOpts) -> Result<Self, CliError> {
        let settings = load_settings(global)?;
        let store = open_store(global);
        let transport = WebSocketTransport::new(&TransportConfig::default())
            .map_err(|e| CliError::Internal(format!("failed to set up transport: {e}")))?;

        let manager = SessionManager::new(
            settings.session_config(),
            store.clone(),
            Arc::new(transport),
        )?;

        Ok(Self {
            manager,
            store,
            settings,
        })
    }
}
