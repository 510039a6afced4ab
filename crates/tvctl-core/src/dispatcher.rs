// ── Command dispatcher ──
//
// Serializes commands onto the session: one processor task drains the
// mpsc channel, so requests never interleave on the socket. The
// keepalive task feeds the same channel.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tvctl_api::HardwareAddress;
use tvctl_api::protocol::uri;

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::error::CoreError;
use crate::session::DeviceSession;

const COMMAND_CHANNEL_SIZE: usize = 32;

/// Front door for [`Command`]s. Cheaply cloneable.
#[derive(Clone)]
pub struct CommandDispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    session: DeviceSession,
    keepalive_interval: Option<Duration>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl CommandDispatcher {
    pub fn new(
        session: DeviceSession,
        keepalive_interval: Option<Duration>,
        cancel: CancellationToken,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        Self {
            inner: Arc::new(DispatcherInner {
                session,
                keepalive_interval,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Spawn the command processor and keepalive tasks. Later calls are
    /// no-ops.
    pub async fn start(&self) {
        let Some(rx) = self.inner.command_rx.lock().await.take() else {
            return;
        };

        let mut handles = self.inner.task_handles.lock().await;
        handles.push(tokio::spawn(command_processor_task(
            self.inner.session.clone(),
            rx,
            self.inner.cancel.clone(),
        )));

        if let Some(interval) = self.inner.keepalive_interval {
            handles.push(tokio::spawn(keepalive_task(
                self.clone(),
                interval,
                self.inner.cancel.clone(),
            )));
        }
        debug!("command dispatcher started");
    }

    /// Execute a command.
    ///
    /// Fails fast with [`CoreError::NotConnected`] when no session is
    /// live; nothing is queued and no I/O happens.
    pub async fn send(&self, command: Command) -> Result<CommandResult, CoreError> {
        if !self.inner.session.is_connected() {
            return Err(CoreError::NotConnected);
        }
        self.start().await;
        self.enqueue(command).await
    }

    /// Queue a command for the processor task without starting it. The
    /// keepalive task uses this directly; it runs only once started.
    async fn enqueue(&self, command: Command) -> Result<CommandResult, CoreError> {
        if !self.inner.session.is_connected() {
            return Err(CoreError::NotConnected);
        }
        let (tx, rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::NotConnected)?;

        rx.await.map_err(|_| CoreError::NotConnected)?
    }

    /// Stop background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn command_processor_task(
    session: DeviceSession,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&session, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

/// Periodic liveness probe. Ticks while disconnected are skipped; a
/// failed probe has already torn the session down.
async fn keepalive_task(dispatcher: CommandDispatcher, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if !dispatcher.inner.session.is_connected() {
                    continue;
                }
                match dispatcher.enqueue(Command::Keepalive).await {
                    Ok(_) => debug!("keepalive ok"),
                    Err(CoreError::NotConnected) => {}
                    Err(e) => warn!(error = %e, "keepalive failed"),
                }
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────────

async fn route_command(session: &DeviceSession, cmd: Command) -> Result<CommandResult, CoreError> {
    match cmd {
        Command::VolumeUp => {
            session.request(uri::VOLUME_UP, None).await?;
            Ok(CommandResult::Ok)
        }
        Command::VolumeDown => {
            session.request(uri::VOLUME_DOWN, None).await?;
            Ok(CommandResult::Ok)
        }
        Command::SetMute { muted } => {
            session
                .request(uri::SET_MUTE, Some(json!({ "mute": muted })))
                .await?;
            Ok(CommandResult::Ok)
        }
        Command::Button { name } => {
            session.send_button(&name).await?;
            Ok(CommandResult::Ok)
        }
        Command::PowerOff => {
            session.request(uri::TURN_OFF, None).await?;
            info!("power-off sent");
            session.disconnect().await;
            Ok(CommandResult::Ok)
        }
        Command::ConnectionInfo => {
            let info = session.request(uri::CONNECTION_INFO, None).await?;
            Ok(CommandResult::Payload(info))
        }
        Command::Keepalive => {
            session.request(uri::CONNECTION_INFO, None).await?;
            if let Err(e) = session.refresh_input_socket().await {
                warn!(error = %e, "pointer input refresh failed; reopening on next button press");
            }
            Ok(CommandResult::Ok)
        }
        Command::DiscoverHardwareAddress => {
            let info = session.request(uri::CONNECTION_INFO, None).await?;
            let status = session.query(uri::CONNECTION_STATUS).await?;
            if status.is_none() {
                debug!("connection status unavailable; using first reported interface");
            }
            pick_hardware_address(&info, status.as_ref()).map(CommandResult::HardwareAddress)
        }
    }
}

/// Choose the hardware address of the interface the TV is using.
///
/// Prefers whichever interface the status payload marks as connected;
/// without that, Wi-Fi first, then wired.
fn pick_hardware_address(
    info: &Value,
    status: Option<&Value>,
) -> Result<HardwareAddress, CoreError> {
    let mac = |section: &str| {
        info.get(section)
            .and_then(|s| s.get("macAddress"))
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
    };
    let wifi = mac("wifiInfo");
    let wired = mac("wiredInfo");

    let state = |section: &str| {
        status
            .and_then(|s| s.get(section))
            .and_then(|s| s.get("state"))
            .and_then(Value::as_str)
    };
    let wired_connected = state("wired") == Some("connected");
    let wifi_connected = state("wifi") == Some("connected")
        || state("wifiInfo") == Some("connected")
        || status
            .and_then(|s| s.get("isConnected"))
            .and_then(Value::as_bool)
            == Some(true);

    let chosen = if wired_connected && wired.is_some() {
        wired
    } else if wifi_connected && wifi.is_some() {
        wifi
    } else {
        wifi.or(wired)
    };

    let raw = chosen.ok_or_else(|| CoreError::HardwareAddressUnavailable {
        reason: "TV reported no interface hardware address".into(),
    })?;
    raw.parse()
        .map_err(|e: tvctl_api::Error| CoreError::HardwareAddressUnavailable {
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn info() -> Value {
        json!({
            "wifiInfo": { "macAddress": "a8:23:fe:00:00:01" },
            "wiredInfo": { "macAddress": "a8:23:fe:00:00:02" }
        })
    }

    #[test]
    fn prefers_connected_interface() {
        let status = json!({ "wired": { "state": "connected" }, "wifi": { "state": "disconnected" } });
        let mac = pick_hardware_address(&info(), Some(&status)).unwrap();
        assert_eq!(mac.to_string(), "A8:23:FE:00:00:02");

        let status = json!({ "wifi": { "state": "connected" } });
        let mac = pick_hardware_address(&info(), Some(&status)).unwrap();
        assert_eq!(mac.to_string(), "A8:23:FE:00:00:01");
    }

    #[test]
    fn falls_back_without_status() {
        let mac = pick_hardware_address(&info(), None).unwrap();
        assert_eq!(mac.to_string(), "A8:23:FE:00:00:01");

        let wired_only = json!({ "wiredInfo": { "macAddress": "a8-23-fe-00-00-02" }, "wifiInfo": {} });
        let mac = pick_hardware_address(&wired_only, None).unwrap();
        assert_eq!(mac.to_string(), "A8:23:FE:00:00:02");
    }

    #[test]
    fn missing_or_malformed_is_unavailable() {
        assert!(matches!(
            pick_hardware_address(&json!({}), None),
            Err(CoreError::HardwareAddressUnavailable { .. })
        ));
        assert!(matches!(
            pick_hardware_address(&json!({ "wifiInfo": { "macAddress": "zz" } }), None),
            Err(CoreError::HardwareAddressUnavailable { .. })
        ));
    }
}
