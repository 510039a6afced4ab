// ── Profile store ──
//
// File-backed ProfileRepository. The in-memory Config is the source of
// truth; each mutation updates it, then rewrites the whole file through a
// temporary sibling that is renamed into place. A failed save leaves the
// in-memory change in place so the caller can retry.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use tvctl_core::repository::{activate_profile, update_profile};
use tvctl_core::{
    CompanionDevice, Config, CoreError, Credential, DeviceProfile, HardwareAddress,
    ProfileRepository,
};

use crate::ConfigError;

/// Read the persisted configuration. A missing file is an empty default.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => {
            return Err(ConfigError::Corrupt {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }
    };
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }

    serde_json::from_str(&contents).map_err(|e| ConfigError::Corrupt {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Atomically replace the file at `path` with `config`.
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let write_err = |message: String| ConfigError::Write {
        path: path.to_path_buf(),
        message,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;

    let json = serde_json::to_string_pretty(config).map_err(|e| write_err(e.to_string()))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| write_err(e.to_string()))?;
    tmp.write_all(json.as_bytes())
        .and_then(|()| tmp.write_all(b"\n"))
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| write_err(e.to_string()))?;
    tmp.persist(path).map_err(|e| write_err(e.error.to_string()))?;

    debug!(path = %path.display(), "configuration saved");
    Ok(())
}

/// Where [`ProfileStore::open_or_default`] copies a file it could not read.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".corrupt");
    PathBuf::from(backup)
}

/// The next save replaces the file, so keep what was there.
fn backup_unreadable(path: &Path) {
    let backup = backup_path(path);
    match std::fs::copy(path, &backup) {
        Ok(_) => warn!(backup = %backup.display(), "saved a copy of the unreadable configuration"),
        Err(e) => warn!(error = %e, "could not back up the unreadable configuration"),
    }
}

/// The process-wide owner of [`Config`].
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    config: Mutex<Config>,
}

impl ProfileStore {
    /// Load from `path`, failing if the file exists but cannot be parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = load_config(&path)?;
        Ok(Self {
            path,
            config: Mutex::new(config),
        })
    }

    /// Load from `path`, starting empty if the file is unreadable.
    pub fn open_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = load_config(&path).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable configuration");
            backup_unreadable(&path);
            Config::default()
        });
        Self {
            path,
            config: Mutex::new(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current in-memory state.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config = self.lock();
        save_config(&self.path, &config)
    }

    fn lock(&self) -> MutexGuard<'_, Config> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate under the lock and persist before releasing it, so writers
    /// never interleave on disk.
    fn mutate(
        &self,
        apply: impl FnOnce(&mut Config) -> Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        let mut config = self.lock();
        apply(&mut config)?;
        save_config(&self.path, &config)?;
        Ok(())
    }
}

impl ProfileRepository for ProfileStore {
    fn snapshot(&self) -> Config {
        self.lock().clone()
    }

    fn upsert_profile(&self, name: &str, profile: DeviceProfile) -> Result<(), CoreError> {
        self.mutate(|c| {
            c.profiles.insert(name.to_owned(), profile);
            Ok(())
        })
    }

    fn set_active_profile(&self, name: &str) -> Result<(), CoreError> {
        self.mutate(|c| activate_profile(c, name))
    }

    fn set_credential(&self, name: &str, credential: Credential) -> Result<(), CoreError> {
        self.mutate(|c| update_profile(c, name, |p| p.pairing_credential = Some(credential)))
    }

    fn set_hardware_address(
        &self,
        name: &str,
        address: HardwareAddress,
    ) -> Result<(), CoreError> {
        self.mutate(|c| update_profile(c, name, |p| p.hardware_address = Some(address)))
    }

    fn set_companion_device(&self, device: Option<CompanionDevice>) -> Result<(), CoreError> {
        self.mutate(|c| {
            c.companion_device = device;
            Ok(())
        })
    }

    fn set_wake_companion_on_power_on(&self, enabled: bool) -> Result<(), CoreError> {
        self.mutate(|c| {
            c.wake_companion_on_power_on = enabled;
            Ok(())
        })
    }
}
