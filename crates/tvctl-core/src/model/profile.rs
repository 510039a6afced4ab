// ── Persisted configuration aggregate ──

use std::collections::BTreeMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use tvctl_api::HardwareAddress;

use super::companion::CompanionDevice;

// ── Credential ───────────────────────────────────────────────────────

/// Pairing credential issued by the TV. Opaque, long-lived, redacted in
/// `Debug` output.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    pub fn secret(&self) -> &SecretString {
        &self.0
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<SecretString> for Credential {
    fn from(secret: SecretString) -> Self {
        Self(secret)
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

// ── DeviceProfile ────────────────────────────────────────────────────

/// A paired (or pairable) television, keyed by name in [`Config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    /// Host name or IP, optionally with `:port`.
    pub address: String,

    #[serde(default = "default_true")]
    pub use_transport_security: bool,

    #[serde(
        default,
        deserialize_with = "credential_or_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub pairing_credential: Option<Credential>,

    #[serde(
        default,
        deserialize_with = "hardware_address_or_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub hardware_address: Option<HardwareAddress>,
}

impl DeviceProfile {
    pub fn new(address: impl Into<String>, use_transport_security: bool) -> Self {
        Self {
            address: address.into(),
            use_transport_security,
            pairing_credential: None,
            hardware_address: None,
        }
    }

    pub fn is_paired(&self) -> bool {
        self.pairing_credential.is_some()
    }
}

fn default_true() -> bool {
    true
}

/// Older files write `""` for "not yet learned".
fn credential_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Credential>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.filter(|s| !s.is_empty()).map(Credential::new))
}

/// An unparseable address is dropped so the rest of the profile (and its
/// credential) still loads; it can be fetched or set again.
fn hardware_address_or_empty<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<HardwareAddress>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| match s.parse() {
            Ok(mac) => Some(mac),
            Err(e) => {
                warn!(value = %s, error = %e, "ignoring stored hardware address");
                None
            }
        }))
}

// ── Shortcut bindings ────────────────────────────────────────────────

/// Key combination bound to an action id. Capture and registration live
/// in the front end; core only persists them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutBinding {
    pub shortcut: String,
    #[serde(default)]
    pub global: bool,
}

/// Default bindings for the built-in actions.
pub fn default_shortcuts() -> BTreeMap<String, ShortcutBinding> {
    [
        ("up", "Up"),
        ("down", "Down"),
        ("left", "Left"),
        ("right", "Right"),
        ("enter", "Return"),
        ("back", "Backspace"),
        ("volume_up", "="),
        ("volume_down", "-"),
        ("mute", "Shift+-"),
        ("unmute", "Shift+="),
        ("power_on", "F7"),
        ("power_off", "F8"),
        ("home", "Home"),
    ]
    .into_iter()
    .map(|(action, key)| {
        (
            action.to_owned(),
            ShortcutBinding {
                shortcut: key.to_owned(),
                global: false,
            },
        )
    })
    .collect()
}

// ── Config ───────────────────────────────────────────────────────────

/// Everything that survives a restart.
///
/// Owned by the profile store; everyone else works on snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub profiles: BTreeMap<String, DeviceProfile>,

    #[serde(default)]
    pub active_profile: Option<String>,

    #[serde(default)]
    pub companion_device: Option<CompanionDevice>,

    #[serde(default)]
    pub wake_companion_on_power_on: bool,

    #[serde(default = "default_shortcuts")]
    pub shortcuts: BTreeMap<String, ShortcutBinding>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profiles: BTreeMap::new(),
            active_profile: None,
            companion_device: None,
            wake_companion_on_power_on: false,
            shortcuts: default_shortcuts(),
        }
    }
}

impl Config {
    /// The active profile, if one is set and still present.
    pub fn active(&self) -> Option<(&str, &DeviceProfile)> {
        let name = self.active_profile.as_deref()?;
        self.profiles.get(name).map(|p| (name, p))
    }
}
