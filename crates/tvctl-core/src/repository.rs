// ── Profile persistence seam ──
//
// The session manager reads and mutates configuration through this
// trait; tvctl-config provides the file-backed implementation.

use std::sync::{Mutex, PoisonError};

use tvctl_api::HardwareAddress;

use crate::error::CoreError;
use crate::model::{CompanionDevice, Config, Credential, DeviceProfile};

/// Durable storage for [`Config`].
///
/// Every mutation is persisted before it returns. Callers never hold a
/// reference into the store; [`snapshot`](Self::snapshot) hands out a copy.
pub trait ProfileRepository: Send + Sync {
    fn snapshot(&self) -> Config;

    fn upsert_profile(&self, name: &str, profile: DeviceProfile) -> Result<(), CoreError>;

    fn set_active_profile(&self, name: &str) -> Result<(), CoreError>;

    fn set_credential(&self, name: &str, credential: Credential) -> Result<(), CoreError>;

    fn set_hardware_address(&self, name: &str, address: HardwareAddress)
    -> Result<(), CoreError>;

    fn set_companion_device(&self, device: Option<CompanionDevice>) -> Result<(), CoreError>;

    fn set_wake_companion_on_power_on(&self, enabled: bool) -> Result<(), CoreError>;
}

/// Apply a profile-scoped mutation, failing on unknown names.
pub fn update_profile(
    config: &mut Config,
    name: &str,
    apply: impl FnOnce(&mut DeviceProfile),
) -> Result<(), CoreError> {
    let profile = config
        .profiles
        .get_mut(name)
        .ok_or_else(|| CoreError::UnknownProfile { name: name.into() })?;
    apply(profile);
    Ok(())
}

/// Select `name` as active, failing on unknown names.
pub fn activate_profile(config: &mut Config, name: &str) -> Result<(), CoreError> {
    if !config.profiles.contains_key(name) {
        return Err(CoreError::UnknownProfile { name: name.into() });
    }
    config.active_profile = Some(name.to_owned());
    Ok(())
}

// ── In-memory implementation ─────────────────────────────────────────

/// Non-persistent repository for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    config: Mutex<Config>,
}

impl InMemoryRepository {
    pub fn new(config: Config) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut Config) -> T) -> T {
        let mut guard = self.config.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl ProfileRepository for InMemoryRepository {
    fn snapshot(&self) -> Config {
        self.with(|c| c.clone())
    }

    fn upsert_profile(&self, name: &str, profile: DeviceProfile) -> Result<(), CoreError> {
        self.with(|c| {
            c.profiles.insert(name.to_owned(), profile);
        });
        Ok(())
    }

    fn set_active_profile(&self, name: &str) -> Result<(), CoreError> {
        self.with(|c| activate_profile(c, name))
    }

    fn set_credential(&self, name: &str, credential: Credential) -> Result<(), CoreError> {
        self.with(|c| update_profile(c, name, |p| p.pairing_credential = Some(credential)))
    }

    fn set_hardware_address(
        &self,
        name: &str,
        address: HardwareAddress,
    ) -> Result<(), CoreError> {
        self.with(|c| update_profile(c, name, |p| p.hardware_address = Some(address)))
    }

    fn set_companion_device(&self, device: Option<CompanionDevice>) -> Result<(), CoreError> {
        self.with(|c| c.companion_device = device);
        Ok(())
    }

    fn set_wake_companion_on_power_on(&self, enabled: bool) -> Result<(), CoreError> {
        self.with(|c| c.wake_companion_on_power_on = enabled);
        Ok(())
    }
}
