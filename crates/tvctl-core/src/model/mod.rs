// ── Domain model ──
//
// Serializable types persisted by the profile store and handed out as
// snapshots by the session manager.

pub mod companion;
pub mod profile;

pub use companion::CompanionDevice;
pub use profile::{Config, Credential, DeviceProfile, ShortcutBinding, default_shortcuts};
