// Scripted in-process TV used by the session manager tests.
#![allow(clippy::unwrap_used, dead_code)]

use std::collections::{HashSet, VecDeque};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::net::UdpSocket;
use tokio::time::Instant;

use tvctl_api::message::{Inbound, Outbound};
use tvctl_api::protocol::uri;
use tvctl_api::{DeviceLink, DeviceTransport, Endpoint, Error, InputLink};
use tvctl_core::{
    Config, Credential, DeviceProfile, InMemoryRepository, SessionConfig, SessionManager,
};

pub const WIFI_MAC: &str = "a8:23:fe:00:00:01";
pub const WIRED_MAC: &str = "a8:23:fe:00:00:02";

/// How the fake answers a `register` frame that lacks an accepted key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    /// Prompt, then issue `issued_key`.
    Approve,
    /// Prompt, then send an error frame.
    Reject,
    /// Prompt and never answer.
    Ignore,
}

#[derive(Debug)]
pub struct TvState {
    /// Opens that fail before the TV is "up".
    pub failing_opens: usize,
    pub accepted_key: Option<String>,
    pub issued_key: String,
    pub approval: Approval,
    pub open_delay: Option<Duration>,
    /// Next request write fails as if the socket died.
    pub broken: bool,
    pub refused: HashSet<&'static str>,

    pub open_times: Vec<Instant>,
    pub registrations: Vec<Option<String>>,
    pub requests: Vec<(String, Value)>,
    pub input_opens: usize,
    pub buttons: Vec<String>,
}

impl Default for TvState {
    fn default() -> Self {
        Self {
            failing_opens: 0,
            accepted_key: None,
            issued_key: "issued-key".into(),
            approval: Approval::Approve,
            open_delay: None,
            broken: false,
            refused: HashSet::from([uri::CONNECTION_STATUS]),
            open_times: Vec::new(),
            registrations: Vec::new(),
            requests: Vec::new(),
            input_opens: 0,
            buttons: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeTv {
    pub state: Arc<Mutex<TvState>>,
}

impl FakeTv {
    pub fn with(f: impl FnOnce(&mut TvState)) -> Self {
        let tv = Self::default();
        f(&mut tv.state.lock().unwrap());
        tv
    }

    pub fn update(&self, f: impl FnOnce(&mut TvState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn read<T>(&self, f: impl FnOnce(&TvState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }

    pub fn request_uris(&self) -> Vec<String> {
        self.read(|s| s.requests.iter().map(|(u, _)| u.clone()).collect())
    }
}

#[async_trait]
impl DeviceTransport for FakeTv {
    async fn open(&self, endpoint: &Endpoint) -> Result<Box<dyn DeviceLink>, Error> {
        let delay = self.read(|s| s.open_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.open_times.push(Instant::now());
        if state.failing_opens > 0 {
            state.failing_opens -= 1;
            return Err(Error::WebSocketConnect(format!("{endpoint}: connection refused")));
        }
        drop(state);

        Ok(Box::new(FakeLink {
            tv: self.clone(),
            queue: VecDeque::new(),
        }))
    }

    async fn open_input(&self, socket_url: &str) -> Result<Box<dyn InputLink>, Error> {
        assert_eq!(socket_url, "ws://fake-tv/pointer");
        self.update(|s| s.input_opens += 1);
        Ok(Box::new(FakeInput { tv: self.clone() }))
    }
}

struct FakeLink {
    tv: FakeTv,
    queue: VecDeque<Value>,
}

#[async_trait]
impl DeviceLink for FakeLink {
    async fn send(&mut self, message: &Outbound) -> Result<(), Error> {
        let mut state = self.tv.state.lock().unwrap();
        match message {
            Outbound::Register { id, payload } => {
                state.registrations.push(payload.client_key.clone());
                let accepted = payload.client_key.is_some()
                    && payload.client_key == state.accepted_key;
                if accepted {
                    self.queue.push_back(json!({
                        "type": "registered", "id": id,
                        "payload": { "client-key": payload.client_key }
                    }));
                    return Ok(());
                }

                self.queue.push_back(json!({
                    "type": "response", "id": id,
                    "payload": { "pairingType": "PROMPT", "returnValue": true }
                }));
                match state.approval {
                    Approval::Approve => {
                        state.accepted_key = Some(state.issued_key.clone());
                        self.queue.push_back(json!({
                            "type": "registered", "id": id,
                            "payload": { "client-key": state.issued_key }
                        }));
                    }
                    Approval::Reject => self.queue.push_back(json!({
                        "type": "error", "id": id, "error": "403 User denied access"
                    })),
                    Approval::Ignore => {}
                }
            }
            Outbound::Request { id, uri, payload } => {
                if state.broken {
                    return Err(Error::Send("broken pipe".into()));
                }
                state.requests.push((uri.clone(), payload.clone()));

                if state.refused.contains(uri.as_str()) {
                    self.queue.push_back(json!({
                        "type": "error", "id": id, "error": "404 no such service or method"
                    }));
                    return Ok(());
                }
                let reply = match uri.as_str() {
                    uri::CONNECTION_INFO => json!({
                        "returnValue": true,
                        "wifiInfo": { "macAddress": WIFI_MAC },
                        "wiredInfo": { "macAddress": WIRED_MAC }
                    }),
                    uri::CONNECTION_STATUS => json!({
                        "returnValue": true,
                        "wired": { "state": "connected" }
                    }),
                    uri::POINTER_INPUT_SOCKET => json!({
                        "returnValue": true,
                        "socketPath": "ws://fake-tv/pointer"
                    }),
                    _ => json!({ "returnValue": true }),
                };
                self.queue
                    .push_back(json!({ "type": "response", "id": id, "payload": reply }));
            }
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Inbound, Error> {
        match self.queue.pop_front() {
            Some(frame) => Ok(Inbound::parse(&frame.to_string()).unwrap()),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {}
}

struct FakeInput {
    tv: FakeTv,
}

#[async_trait]
impl InputLink for FakeInput {
    async fn send_button(&mut self, name: &str) -> Result<(), Error> {
        self.tv.update(|s| s.buttons.push(name.to_owned()));
        Ok(())
    }

    async fn close(&mut self) {}
}

// ── Fixtures ─────────────────────────────────────────────────────────

/// UDP socket standing in for the broadcast domain.
pub async fn wol_receiver() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.unwrap()
}

pub fn session_config(wol: &UdpSocket) -> SessionConfig {
    SessionConfig {
        keepalive_interval: None,
        wol_port: wol.local_addr().unwrap().port(),
        wol_broadcast: Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        ..SessionConfig::default()
    }
}

/// A config with one active profile `tv`.
pub fn paired_config(key: Option<&str>, mac: Option<&str>) -> Config {
    let mut profile = DeviceProfile::new("10.0.0.5", false);
    profile.pairing_credential = key.map(Credential::new);
    profile.hardware_address = mac.map(|m| m.parse().unwrap());

    let mut config = Config::default();
    config.profiles.insert("tv".into(), profile);
    config.active_profile = Some("tv".into());
    config
}

pub fn manager(
    tv: &FakeTv,
    repo: &Arc<InMemoryRepository>,
    config: SessionConfig,
) -> SessionManager {
    SessionManager::new(config, repo.clone(), Arc::new(tv.clone())).unwrap()
}
