// Session manager behavior against a scripted in-process TV.
#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use tvctl_api::Endpoint;
use tvctl_api::protocol::uri;
use tvctl_core::{
    CoreError, Credential, DeviceSession, InMemoryRepository, ProfileRepository, SessionState,
    SessionTarget,
};

use common::{Approval, FakeTv, WIRED_MAC, manager, paired_config, session_config, wol_receiver};

// ── Pairing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn authenticate_persists_credential_then_connect_skips_prompt() {
    let wol = wol_receiver().await;
    let tv = FakeTv::default();
    let repo = Arc::new(InMemoryRepository::default());
    let manager = manager(&tv, &repo, session_config(&wol));

    manager.authenticate("tv", "10.0.0.5", false).await.unwrap();
    assert!(manager.get_status());

    let config = repo.snapshot();
    let (name, profile) = config.active().unwrap();
    assert_eq!(name, "tv");
    assert_eq!(profile.pairing_credential, Some(Credential::new("issued-key")));
    // getStatus is refused by default, so the Wi-Fi address is used.
    assert_eq!(
        profile.hardware_address.map(|m| m.to_string()),
        Some("A8:23:FE:00:00:01".to_owned())
    );

    manager.disconnect().await;
    assert!(!manager.get_status());

    manager.connect().await.unwrap();
    assert!(manager.get_status());
    assert_eq!(
        tv.read(|s| s.registrations.clone()),
        vec![None, Some("issued-key".to_owned())]
    );
}

#[tokio::test]
async fn discovery_prefers_connected_interface() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.refused.clear());
    let repo = Arc::new(InMemoryRepository::default());
    let manager = manager(&tv, &repo, session_config(&wol));

    manager.authenticate("tv", "10.0.0.5", false).await.unwrap();
    let mac = manager.fetch_hardware_address().await.unwrap();
    assert_eq!(mac, WIRED_MAC.parse().unwrap());
}

#[tokio::test]
async fn rejected_pairing_keeps_previous_credential() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.approval = Approval::Reject);
    let repo = Arc::new(InMemoryRepository::new(paired_config(Some("old-key"), None)));
    let manager = manager(&tv, &repo, session_config(&wol));

    let err = manager
        .authenticate("tv", "10.0.0.5", false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PairingRejected { .. }), "got {err:?}");
    assert!(!manager.get_status());

    let config = repo.snapshot();
    let (_, profile) = config.active().unwrap();
    assert_eq!(profile.pairing_credential, Some(Credential::new("old-key")));
}

#[tokio::test(start_paused = true)]
async fn unanswered_prompt_times_out() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.approval = Approval::Ignore);
    let repo = Arc::new(InMemoryRepository::default());
    let manager = manager(&tv, &repo, session_config(&wol));
    let mut state = manager.state();

    let pairing = tokio::spawn({
        let manager = manager.clone();
        async move { manager.authenticate("tv", "10.0.0.5", false).await }
    });

    state
        .wait_for(|s| *s == SessionState::AwaitingPairingApproval)
        .await
        .unwrap();

    let err = pairing.await.unwrap().unwrap_err();
    assert!(matches!(err, CoreError::PairingTimeout { timeout_secs: 60 }), "got {err:?}");
    assert_eq!(manager.state().borrow().clone(), SessionState::Disconnected);
    assert!(repo.snapshot().profiles.is_empty());
}

#[tokio::test]
async fn stale_credential_is_reported() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.approval = Approval::Ignore);
    let repo = Arc::new(InMemoryRepository::new(paired_config(Some("stale"), None)));
    let manager = manager(&tv, &repo, session_config(&wol));

    let err = manager.connect().await.unwrap_err();
    assert!(matches!(err, CoreError::CredentialRejected), "got {err:?}");
    assert!(!manager.get_status());
}

// ── Connection state ────────────────────────────────────────────────

#[tokio::test]
async fn connect_without_profile_or_credential() {
    let wol = wol_receiver().await;
    let tv = FakeTv::default();

    let empty = Arc::new(InMemoryRepository::default());
    let err = manager(&tv, &empty, session_config(&wol))
        .connect()
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NoActiveProfile), "got {err:?}");

    let unpaired = Arc::new(InMemoryRepository::new(paired_config(None, None)));
    let err = manager(&tv, &unpaired, session_config(&wol))
        .connect()
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotPaired { .. }), "got {err:?}");

    assert!(tv.read(|s| s.open_times.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn concurrent_connect_is_refused() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| {
        s.accepted_key = Some("k".into());
        s.open_delay = Some(Duration::from_millis(500));
    });
    let repo = Arc::new(InMemoryRepository::new(paired_config(Some("k"), None)));
    let manager = manager(&tv, &repo, session_config(&wol));

    let (first, second) = tokio::join!(manager.connect(), manager.connect());
    first.unwrap();
    assert!(matches!(second, Err(CoreError::AlreadyConnecting)), "got {second:?}");
    assert!(manager.get_status());
}

#[tokio::test(start_paused = true)]
async fn connect_during_power_on_is_refused() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.failing_opens = usize::MAX);
    let repo = Arc::new(InMemoryRepository::new(paired_config(
        Some("k"),
        Some("a8:23:fe:01:9b:c4"),
    )));
    let manager = manager(&tv, &repo, session_config(&wol));

    let power_on = tokio::spawn({
        let manager = manager.clone();
        async move { manager.power_on().await }
    });
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(matches!(
        manager.state().borrow().clone(),
        SessionState::Reconnecting { .. }
    ));

    let err = manager.connect().await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyConnecting), "got {err:?}");
    let err = manager.authenticate("tv", "10.0.0.5", false).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyConnecting), "got {err:?}");

    // The retry loop carries on untouched.
    let err = power_on.await.unwrap().unwrap_err();
    assert!(matches!(err, CoreError::PowerOnTimeout { attempts: 10 }), "got {err:?}");
    assert_eq!(tv.read(|s| s.open_times.len()), 10);
}

#[tokio::test]
async fn reconnect_attempt_outside_retry_loop_is_refused() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.accepted_key = Some("k".into()));
    let session = DeviceSession::new(Arc::new(tv.clone()), session_config(&wol));
    let target = SessionTarget {
        profile: "tv".into(),
        endpoint: Endpoint::new("10.0.0.5", false).unwrap(),
    };

    let err = session
        .reconnect_attempt(1, &target, Credential::new("k").secret())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PowerOnCancelled), "got {err:?}");
    assert_eq!(session.current_state(), SessionState::Disconnected);
    assert!(tv.read(|s| s.open_times.is_empty()));
}

#[tokio::test]
async fn commands_while_disconnected_do_no_io() {
    let wol = wol_receiver().await;
    let tv = FakeTv::default();
    let repo = Arc::new(InMemoryRepository::new(paired_config(Some("k"), None)));
    let manager = manager(&tv, &repo, session_config(&wol));

    assert!(matches!(manager.volume_up().await, Err(CoreError::NotConnected)));
    assert!(matches!(manager.send_button("home").await, Err(CoreError::NotConnected)));
    assert!(matches!(manager.power_off().await, Err(CoreError::NotConnected)));

    tv.read(|s| {
        assert!(s.open_times.is_empty());
        assert!(s.requests.is_empty());
        assert!(s.buttons.is_empty());
    });
}

#[tokio::test]
async fn send_failure_disconnects() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.accepted_key = Some("k".into()));
    let repo = Arc::new(InMemoryRepository::new(paired_config(Some("k"), None)));
    let manager = manager(&tv, &repo, session_config(&wol));

    manager.connect().await.unwrap();
    manager.volume_up().await.unwrap();

    tv.update(|s| s.broken = true);
    let err = manager.volume_down().await.unwrap_err();
    assert!(matches!(err, CoreError::SendFailed { .. }), "got {err:?}");
    assert!(!manager.get_status());
    assert_eq!(manager.status().await.profile, None);

    // Nothing is attempted once the session is down.
    assert!(matches!(manager.volume_up().await, Err(CoreError::NotConnected)));
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn volume_and_mute_requests() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.accepted_key = Some("k".into()));
    let repo = Arc::new(InMemoryRepository::new(paired_config(Some("k"), None)));
    let manager = manager(&tv, &repo, session_config(&wol));

    manager.connect().await.unwrap();
    manager.volume_up().await.unwrap();
    manager.volume_down().await.unwrap();
    manager.set_mute(true).await.unwrap();

    let requests = tv.read(|s| s.requests.clone());
    assert_eq!(
        requests,
        vec![
            (uri::VOLUME_UP.to_owned(), json!({})),
            (uri::VOLUME_DOWN.to_owned(), json!({})),
            (uri::SET_MUTE.to_owned(), json!({ "mute": true })),
        ]
    );
}

#[tokio::test]
async fn buttons_open_input_socket_once() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.accepted_key = Some("k".into()));
    let repo = Arc::new(InMemoryRepository::new(paired_config(Some("k"), None)));
    let manager = manager(&tv, &repo, session_config(&wol));

    manager.connect().await.unwrap();
    manager.send_button("home").await.unwrap();
    manager.run_action("enter").await.unwrap();

    tv.read(|s| {
        assert_eq!(s.buttons, vec!["HOME".to_owned(), "ENTER".to_owned()]);
        assert_eq!(s.input_opens, 1);
    });
    let lookups = tv
        .request_uris()
        .into_iter()
        .filter(|u| u == uri::POINTER_INPUT_SOCKET)
        .count();
    assert_eq!(lookups, 1);
}

#[tokio::test]
async fn power_off_closes_session() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.accepted_key = Some("k".into()));
    let repo = Arc::new(InMemoryRepository::new(paired_config(Some("k"), None)));
    let manager = manager(&tv, &repo, session_config(&wol));

    manager.connect().await.unwrap();
    manager.power_off().await.unwrap();

    assert_eq!(tv.request_uris(), vec![uri::TURN_OFF.to_owned()]);
    assert!(!manager.get_status());
}

#[tokio::test]
async fn unknown_action_is_rejected() {
    let wol = wol_receiver().await;
    let tv = FakeTv::default();
    let repo = Arc::new(InMemoryRepository::default());
    let manager = manager(&tv, &repo, session_config(&wol));

    let err = manager.run_action("reboot").await.unwrap_err();
    assert!(matches!(err, CoreError::UnknownAction { .. }), "got {err:?}");
}

#[tokio::test(start_paused = true)]
async fn keepalive_probes_and_refreshes_input() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.accepted_key = Some("k".into()));
    let repo = Arc::new(InMemoryRepository::new(paired_config(Some("k"), None)));
    let config = tvctl_core::SessionConfig {
        keepalive_interval: Some(Duration::from_secs(25)),
        ..session_config(&wol)
    };
    let manager = manager(&tv, &repo, config);

    manager.connect().await.unwrap();
    tokio::time::sleep(Duration::from_secs(26)).await;

    assert_eq!(
        tv.request_uris(),
        vec![
            uri::CONNECTION_INFO.to_owned(),
            uri::POINTER_INPUT_SOCKET.to_owned()
        ]
    );
    assert_eq!(tv.read(|s| s.input_opens), 1);
    manager.shutdown().await;
}

// ── Hardware address ────────────────────────────────────────────────

#[tokio::test]
async fn manual_hardware_address_is_normalized() {
    let wol = wol_receiver().await;
    let tv = FakeTv::default();
    let repo = Arc::new(InMemoryRepository::new(paired_config(Some("k"), None)));
    let manager = manager(&tv, &repo, session_config(&wol));

    let mac = manager.set_hardware_address("a8-23-fe-01-9b-c4").unwrap();
    assert_eq!(mac.to_string(), "A8:23:FE:01:9B:C4");
    assert_eq!(
        repo.snapshot().profiles["tv"].hardware_address,
        Some(mac)
    );

    let err = manager.set_hardware_address("a8:23:fe:01:9b").unwrap_err();
    assert!(matches!(err, CoreError::InvalidHardwareAddress { .. }), "got {err:?}");
}

// ── Power-on ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn power_on_retries_ten_times_one_second_apart() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.failing_opens = usize::MAX);
    let repo = Arc::new(InMemoryRepository::new(paired_config(
        Some("k"),
        Some("a8:23:fe:01:9b:c4"),
    )));
    let manager = manager(&tv, &repo, session_config(&wol));

    let err = manager.power_on().await.unwrap_err();
    assert!(matches!(err, CoreError::PowerOnTimeout { attempts: 10 }), "got {err:?}");
    assert_eq!(manager.state().borrow().clone(), SessionState::Disconnected);

    let times = tv.read(|s| s.open_times.clone());
    assert_eq!(times.len(), 10);
    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_secs(1));
    }

    let mut buf = [0u8; 128];
    let len = wol.recv(&mut buf).await.unwrap();
    assert_eq!(len, 102);
    assert_eq!(&buf[6..12], &[0xa8, 0x23, 0xfe, 0x01, 0x9b, 0xc4]);
}

#[tokio::test(start_paused = true)]
async fn power_on_keeps_schedule_when_connects_hang() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.open_delay = Some(Duration::from_secs(3600)));
    let repo = Arc::new(InMemoryRepository::new(paired_config(
        Some("k"),
        Some("a8:23:fe:01:9b:c4"),
    )));
    let manager = manager(&tv, &repo, session_config(&wol));

    let started = tokio::time::Instant::now();
    let err = manager.power_on().await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, CoreError::PowerOnTimeout { attempts: 10 }), "got {err:?}");
    assert!(elapsed <= Duration::from_secs(11), "took {elapsed:?}");
    assert!(elapsed >= Duration::from_secs(9), "took {elapsed:?}");
    assert_eq!(manager.state().borrow().clone(), SessionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn power_on_connects_once_tv_is_up() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| {
        s.failing_opens = 3;
        s.accepted_key = Some("k".into());
    });
    let repo = Arc::new(InMemoryRepository::new(paired_config(
        Some("k"),
        Some("a8:23:fe:01:9b:c4"),
    )));
    let manager = manager(&tv, &repo, session_config(&wol));

    manager.power_on().await.unwrap();
    assert!(manager.get_status());
    assert_eq!(tv.read(|s| s.open_times.len()), 4);
}

#[tokio::test(start_paused = true)]
async fn other_command_cancels_power_on() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.failing_opens = usize::MAX);
    let repo = Arc::new(InMemoryRepository::new(paired_config(
        Some("k"),
        Some("a8:23:fe:01:9b:c4"),
    )));
    let manager = manager(&tv, &repo, session_config(&wol));

    let power_on = tokio::spawn({
        let manager = manager.clone();
        async move { manager.power_on().await }
    });
    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert!(matches!(manager.volume_up().await, Err(CoreError::NotConnected)));
    let err = power_on.await.unwrap().unwrap_err();
    assert!(matches!(err, CoreError::PowerOnCancelled), "got {err:?}");
    assert_eq!(tv.read(|s| s.open_times.len()), 3);
    assert_eq!(manager.state().borrow().clone(), SessionState::Disconnected);
}

#[tokio::test]
async fn power_on_needs_hardware_address() {
    let wol = wol_receiver().await;
    let tv = FakeTv::default();
    let repo = Arc::new(InMemoryRepository::new(paired_config(Some("k"), None)));
    let manager = manager(&tv, &repo, session_config(&wol));

    let err = manager.power_on().await.unwrap_err();
    assert!(matches!(err, CoreError::NoHardwareAddress { .. }), "got {err:?}");
    assert!(tv.read(|s| s.open_times.is_empty()));
}

#[tokio::test]
async fn power_on_while_connected_only_wakes() {
    let wol = wol_receiver().await;
    let tv = FakeTv::with(|s| s.accepted_key = Some("k".into()));
    let repo = Arc::new(InMemoryRepository::new(paired_config(
        Some("k"),
        Some("a8:23:fe:01:9b:c4"),
    )));
    let manager = manager(&tv, &repo, session_config(&wol));

    manager.connect().await.unwrap();
    manager.power_on().await.unwrap();

    assert!(manager.get_status());
    assert_eq!(tv.read(|s| s.open_times.len()), 1);
    let mut buf = [0u8; 128];
    assert_eq!(wol.recv(&mut buf).await.unwrap(), 102);
}

// ── Companion device ────────────────────────────────────────────────

#[tokio::test]
async fn companion_device_validation_and_wake() {
    let wol = wol_receiver().await;
    let tv = FakeTv::default();
    let repo = Arc::new(InMemoryRepository::default());
    let manager = manager(&tv, &repo, session_config(&wol));

    assert!(matches!(
        manager.wake_companion_device().await,
        Err(CoreError::NoCompanionDevice)
    ));

    let bad = tvctl_core::CompanionDevice::WakeOnLan {
        mac: "00:11:22".into(),
        broadcast_address: None,
    };
    assert!(matches!(
        manager.set_companion_device(Some(bad)),
        Err(CoreError::InvalidCompanionDevice { .. })
    ));
    assert_eq!(repo.snapshot().companion_device, None);

    let good = tvctl_core::CompanionDevice::WakeOnLan {
        mac: "00:11:22:33:44:55".into(),
        broadcast_address: Some("127.0.0.1".into()),
    };
    manager.set_companion_device(Some(good)).unwrap();
    manager.set_wake_companion_on_power_on(true).unwrap();
    assert!(repo.snapshot().wake_companion_on_power_on);

    manager.wake_companion_device().await.unwrap();
    let mut buf = [0u8; 128];
    let (len, _) = wol.recv_from(&mut buf).await.unwrap();
    assert_eq!(len, 102);
    assert_eq!(&buf[6..12], &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
}
