#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use tvctl_config::{ConfigError, ProfileStore, backup_path, load_config};
use tvctl_core::{
    CompanionDevice, Config, CoreError, Credential, DeviceProfile, ProfileRepository,
};

fn store_in(dir: &TempDir) -> ProfileStore {
    ProfileStore::open(dir.path().join("tvctl").join("config.json")).unwrap()
}

#[test]
fn missing_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    assert_eq!(store.snapshot(), Config::default());
    assert!(!store.path().exists(), "opening must not create the file");
}

#[test]
fn mutations_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store
        .upsert_profile("living-room", DeviceProfile::new("192.168.1.20", true))
        .unwrap();
    store.set_active_profile("living-room").unwrap();
    store
        .set_credential("living-room", Credential::new("c0ffee"))
        .unwrap();
    store
        .set_hardware_address("living-room", "a8-23-fe-01-9b-c4".parse().unwrap())
        .unwrap();
    store
        .set_companion_device(Some(CompanionDevice::DebugBridge {
            ip: "192.168.1.30".into(),
            port: 5555,
        }))
        .unwrap();
    store.set_wake_companion_on_power_on(true).unwrap();

    let reopened = store_in(&dir).snapshot();
    assert_eq!(reopened, store.snapshot());

    let (name, profile) = reopened.active().unwrap();
    assert_eq!(name, "living-room");
    assert_eq!(profile.pairing_credential, Some(Credential::new("c0ffee")));
    assert_eq!(
        profile.hardware_address.unwrap().to_string(),
        "A8:23:FE:01:9B:C4"
    );
    assert!(reopened.wake_companion_on_power_on);
}

#[test]
fn file_uses_documented_layout() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store
        .upsert_profile("tv", DeviceProfile::new("10.0.0.5", false))
        .unwrap();
    store
        .set_companion_device(Some(CompanionDevice::WakeOnLan {
            mac: "00:11:22:33:44:55".into(),
            broadcast_address: None,
        }))
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw["profiles"]["tv"]["address"], "10.0.0.5");
    assert_eq!(raw["profiles"]["tv"]["useTransportSecurity"], false);
    assert_eq!(raw["companionDevice"]["kind"], "wol");
    assert_eq!(raw["wakeCompanionOnPowerOn"], false);
}

#[test]
fn unknown_profile_is_rejected_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let err = store.set_active_profile("bedroom").unwrap_err();
    assert!(matches!(err, CoreError::UnknownProfile { ref name } if name == "bedroom"));
    let err = store
        .set_credential("bedroom", Credential::new("k"))
        .unwrap_err();
    assert!(matches!(err, CoreError::UnknownProfile { .. }));

    assert!(!store.path().exists());
}

#[test]
fn corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ \"profiles\": ").unwrap();

    assert!(matches!(
        ProfileStore::open(&path),
        Err(ConfigError::Corrupt { .. })
    ));

    let fallback = ProfileStore::open_or_default(&path);
    assert_eq!(fallback.snapshot(), Config::default());
    // The unreadable file stays untouched until the next mutation, and a
    // copy survives that mutation.
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ \"profiles\": ");
    fallback.set_wake_companion_on_power_on(true).unwrap();
    assert_eq!(
        std::fs::read_to_string(backup_path(&path)).unwrap(),
        "{ \"profiles\": "
    );
}

#[test]
fn bad_hardware_address_keeps_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "profiles": {
                "tv": {
                    "address": "10.0.0.5",
                    "pairingCredential": "secret-key",
                    "hardwareAddress": "not-a-mac"
                }
            },
            "activeProfile": "tv"
        }"#,
    )
    .unwrap();

    let store = ProfileStore::open_or_default(&path);
    store.set_wake_companion_on_power_on(true).unwrap();

    let saved = load_config(&path).unwrap();
    let (name, profile) = saved.active().unwrap();
    assert_eq!(name, "tv");
    assert_eq!(profile.pairing_credential, Some(Credential::new("secret-key")));
    assert_eq!(profile.hardware_address, None);
    assert!(saved.wake_companion_on_power_on);
    assert!(!backup_path(&path).exists());
}

#[test]
fn save_replaces_file_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{}").unwrap();

    let store = ProfileStore::open(&path).unwrap();
    for n in 0..5 {
        store
            .upsert_profile(&format!("tv-{n}"), DeviceProfile::new("10.0.0.5", true))
            .unwrap();
    }

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("config.json")]);
    assert_eq!(load_config(&path).unwrap().profiles.len(), 5);
}

#[test]
fn failed_write_keeps_memory_state() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the file should be makes the rename fail.
    let path = dir.path().join("config.json");
    std::fs::create_dir(&path).unwrap();
    let store = ProfileStore::open_or_default(&path);

    let err = store
        .upsert_profile("tv", DeviceProfile::new("10.0.0.5", true))
        .unwrap_err();
    assert!(matches!(err, CoreError::ConfigWriteError { .. }), "got {err:?}");
    assert!(store.snapshot().profiles.contains_key("tv"));
}
