// ── Session manager ──
//
// The facade front ends talk to. Resolves profiles from the repository,
// drives the session through pairing and connection, routes commands
// through the dispatcher, and owns the cancellable power-on sequence.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tvctl_api::{DeviceTransport, Endpoint, HardwareAddress};

use crate::command::catalog::Action;
use crate::command::{Command, CommandResult};
use crate::config::SessionConfig;
use crate::dispatcher::CommandDispatcher;
use crate::error::CoreError;
use crate::model::{CompanionDevice, Config, Credential, DeviceProfile};
use crate::repository::ProfileRepository;
use crate::session::{DeviceSession, SessionState, SessionTarget};
use crate::wake::WakeService;

const MIN_POWER_ON_INTERVAL: Duration = Duration::from_millis(1);

/// Connection summary for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub connected: bool,
    pub state: SessionState,
    pub profile: Option<String>,
}

/// Entry point for front ends. Cheaply cloneable.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    config: SessionConfig,
    repository: Arc<dyn ProfileRepository>,
    session: DeviceSession,
    dispatcher: CommandDispatcher,
    wake: WakeService,
    cancel: CancellationToken,
    /// Token of the running power-on sequence, tagged with a generation
    /// so a finished run never clears a newer one. Whoever cancels it
    /// also resets the session out of `Reconnecting`.
    power_on: Mutex<Option<(u64, CancellationToken)>>,
    power_on_generation: AtomicU64,
}

impl SessionManager {
    /// Build a manager. Does NOT connect.
    pub fn new(
        config: SessionConfig,
        repository: Arc<dyn ProfileRepository>,
        transport: Arc<dyn DeviceTransport>,
    ) -> Result<Self, CoreError> {
        let cancel = CancellationToken::new();
        let session = DeviceSession::new(transport, config.clone());
        let dispatcher = CommandDispatcher::new(
            session.clone(),
            config.keepalive_interval,
            cancel.child_token(),
        );
        let wake = WakeService::new(
            config.wol_port,
            &config.adb_program,
            config.remote_control_timeout,
        )?;

        Ok(Self {
            inner: Arc::new(ManagerInner {
                config,
                repository,
                session,
                dispatcher,
                wake,
                cancel,
                power_on: Mutex::new(None),
                power_on_generation: AtomicU64::new(0),
            }),
        })
    }

    // ── Observation ──────────────────────────────────────────────

    /// Subscribe to session state changes.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.inner.session.state()
    }

    /// `true` iff the session is `Connected`. Never performs I/O.
    pub fn get_status(&self) -> bool {
        self.inner.session.is_connected()
    }

    pub async fn status(&self) -> SessionStatus {
        SessionStatus {
            connected: self.inner.session.is_connected(),
            state: self.inner.session.current_state(),
            profile: self.inner.session.connected_profile().await,
        }
    }

    /// Snapshot of the persisted configuration.
    pub fn get_config(&self) -> Config {
        self.inner.repository.snapshot()
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the active profile with its stored credential.
    ///
    /// Refused with [`CoreError::AlreadyConnecting`] while another
    /// connection attempt or a power-on is in flight.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.ensure_idle().await?;

        let (name, profile) = self.active_profile()?;
        let credential = profile
            .pairing_credential
            .clone()
            .ok_or_else(|| CoreError::NotPaired {
                profile: name.clone(),
            })?;
        let target = target_for(&name, &profile)?;

        self.inner
            .session
            .connect(target, credential.secret())
            .await?;
        self.inner.dispatcher.start().await;
        Ok(())
    }

    /// Pair with the TV at `address` and store the result as profile
    /// `name`, which becomes active.
    ///
    /// The credential is persisted before this returns. A rejection
    /// leaves any previously stored credential untouched. After pairing,
    /// the TV's hardware address is fetched on a best-effort basis.
    pub async fn authenticate(
        &self,
        name: &str,
        address: &str,
        use_transport_security: bool,
    ) -> Result<(), CoreError> {
        self.ensure_idle().await?;

        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::UnknownProfile { name: name.into() });
        }

        let existing = self.inner.repository.snapshot().profiles.get(name).cloned();
        let mut profile = DeviceProfile::new(address.trim(), use_transport_security);
        let target = target_for(name, &profile)?;

        // Keep what we already learned about this TV when re-pairing.
        let previous = existing.as_ref().filter(|p| p.address == profile.address);
        profile.hardware_address = previous.and_then(|p| p.hardware_address);
        let previous_credential = previous.and_then(|p| p.pairing_credential.clone());

        let repository = Arc::clone(&self.inner.repository);
        self.inner
            .session
            .pair(
                target,
                previous_credential.as_ref().map(Credential::secret),
                |key| {
                    profile.pairing_credential = Some(Credential::from(key.clone()));
                    repository.upsert_profile(name, profile)?;
                    repository.set_active_profile(name)
                },
            )
            .await?;
        self.inner.dispatcher.start().await;

        match self.fetch_hardware_address().await {
            Ok(mac) => info!(profile = name, %mac, "stored TV hardware address"),
            Err(e) => warn!(profile = name, error = %e, "could not fetch TV hardware address"),
        }
        Ok(())
    }

    /// Close the session. Pending power-on is cancelled.
    pub async fn disconnect(&self) {
        self.cancel_power_on().await;
        self.inner.session.disconnect().await;
    }

    /// Tear down everything: power-on, background tasks, sockets.
    pub async fn shutdown(&self) {
        self.cancel_power_on().await;
        self.inner.cancel.cancel();
        self.inner.dispatcher.shutdown().await;
        self.inner.session.disconnect().await;
        debug!("session manager shut down");
    }

    // ── Commands ─────────────────────────────────────────────────

    pub async fn send_button(&self, name: &str) -> Result<(), CoreError> {
        self.command(Command::Button {
            name: name.trim().to_uppercase(),
        })
        .await
        .map(drop)
    }

    pub async fn volume_up(&self) -> Result<(), CoreError> {
        self.command(Command::VolumeUp).await.map(drop)
    }

    pub async fn volume_down(&self) -> Result<(), CoreError> {
        self.command(Command::VolumeDown).await.map(drop)
    }

    pub async fn set_mute(&self, muted: bool) -> Result<(), CoreError> {
        self.command(Command::SetMute { muted }).await.map(drop)
    }

    /// Turn the TV off and close the session.
    pub async fn power_off(&self) -> Result<(), CoreError> {
        self.command(Command::PowerOff).await.map(drop)
    }

    /// Raw network info as reported by the TV.
    pub async fn connection_info(&self) -> Result<serde_json::Value, CoreError> {
        match self.command(Command::ConnectionInfo).await? {
            CommandResult::Payload(value) => Ok(value),
            other => Err(CoreError::Internal(format!(
                "unexpected result for connection info: {other:?}"
            ))),
        }
    }

    async fn command(&self, command: Command) -> Result<CommandResult, CoreError> {
        self.cancel_power_on().await;
        self.inner.dispatcher.send(command).await
    }

    // ── Hardware address ─────────────────────────────────────────

    /// Ask the connected TV for its hardware address and store it on the
    /// active profile.
    pub async fn fetch_hardware_address(&self) -> Result<HardwareAddress, CoreError> {
        let (name, _) = self.active_profile()?;
        let mac = match self.command(Command::DiscoverHardwareAddress).await? {
            CommandResult::HardwareAddress(mac) => mac,
            other => {
                return Err(CoreError::Internal(format!(
                    "unexpected result for hardware address discovery: {other:?}"
                )));
            }
        };
        self.inner.repository.set_hardware_address(&name, mac)?;
        Ok(mac)
    }

    /// Store a user-supplied hardware address on the active profile.
    /// Separators and case are normalized.
    pub fn set_hardware_address(&self, raw: &str) -> Result<HardwareAddress, CoreError> {
        let mac = HardwareAddress::from_str(raw)?;
        let (name, _) = self.active_profile()?;
        self.inner.repository.set_hardware_address(&name, mac)?;
        Ok(mac)
    }

    // ── Companion device ─────────────────────────────────────────

    pub fn set_companion_device(&self, device: Option<CompanionDevice>) -> Result<(), CoreError> {
        if let Some(device) = &device {
            device.validate()?;
        }
        self.inner.repository.set_companion_device(device)
    }

    pub fn set_wake_companion_on_power_on(&self, enabled: bool) -> Result<(), CoreError> {
        self.inner.repository.set_wake_companion_on_power_on(enabled)
    }

    pub async fn wake_companion_device(&self) -> Result<(), CoreError> {
        let device = self
            .inner
            .repository
            .snapshot()
            .companion_device
            .ok_or(CoreError::NoCompanionDevice)?;
        self.inner.wake.wake_companion_device(&device).await
    }

    /// Magic packet to an arbitrary hardware address.
    pub async fn wake_by_hardware_address(
        &self,
        hardware_address: &[u8],
        broadcast: Option<&str>,
    ) -> Result<(), CoreError> {
        self.inner
            .wake
            .wake_by_hardware_address(hardware_address, broadcast)
            .await
    }

    // ── Power-on ─────────────────────────────────────────────────

    /// Wake the TV and reconnect.
    ///
    /// Sends a magic packet to the stored hardware address (to the
    /// limited broadcast address unless `wol_broadcast` says otherwise), then tries
    /// to connect up to `power_on_attempts` times, `power_on_interval`
    /// apart. The state channel reports `Reconnecting { attempt }` while
    /// this runs. Any other command cancels it; `connect` and
    /// `authenticate` are refused until it finishes.
    pub async fn power_on(&self) -> Result<(), CoreError> {
        let (name, profile) = self.active_profile()?;
        let mac = profile
            .hardware_address
            .ok_or_else(|| CoreError::NoHardwareAddress {
                profile: name.clone(),
            })?;
        let credential = profile
            .pairing_credential
            .clone()
            .ok_or_else(|| CoreError::NotPaired {
                profile: name.clone(),
            })?;
        let target = target_for(&name, &profile)?;

        let (generation, token) = self.begin_power_on().await;
        self.wake_companion_alongside();

        let result = self.run_power_on(&target, &credential, mac, &token).await;

        self.finish_power_on(generation).await;
        result
    }

    async fn run_power_on(
        &self,
        target: &SessionTarget,
        credential: &Credential,
        mac: HardwareAddress,
        token: &CancellationToken,
    ) -> Result<(), CoreError> {
        let session = &self.inner.session;

        // A live session that still answers needs only the wake signal.
        let alive = session.is_connected()
            && self
                .inner
                .dispatcher
                .send(Command::ConnectionInfo)
                .await
                .is_ok();

        self.inner
            .wake
            .wake_hardware_address(&mac, self.inner.config.wol_broadcast)
            .await?;
        if alive {
            debug!("session still alive after wake; not reconnecting");
            return Ok(());
        }

        session.begin_reconnect().await?;

        let attempts = self.inner.config.power_on_attempts;
        let period = self.inner.config.power_on_interval.max(MIN_POWER_ON_INTERVAL);
        // No attempt may outlive its slot in the schedule.
        let budget = period.min(self.inner.config.connect_timeout);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for attempt in 1..=attempts {
            tokio::select! {
                biased;
                () = token.cancelled() => return Err(CoreError::PowerOnCancelled),
                _ = interval.tick() => {}
            }

            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => return Err(CoreError::PowerOnCancelled),
                outcome = tokio::time::timeout(
                    budget,
                    session.reconnect_attempt(attempt, target, credential.secret()),
                ) => outcome.unwrap_or_else(|_| Err(CoreError::Timeout {
                    operation: "power-on attempt",
                    timeout_secs: budget.as_secs(),
                })),
            };

            match outcome {
                Ok(()) => {
                    self.inner.dispatcher.start().await;
                    return Ok(());
                }
                Err(CoreError::CredentialRejected) => {
                    session.abandon_reconnect();
                    return Err(CoreError::CredentialRejected);
                }
                Err(e) => debug!(attempt, error = %e, "power-on connection attempt failed"),
            }
        }

        session.abandon_reconnect();
        warn!(attempts, "TV did not come up after wake");
        Err(CoreError::PowerOnTimeout { attempts })
    }

    /// Fire the companion wake without waiting on it. Failures are logged.
    fn wake_companion_alongside(&self) {
        let config = self.inner.repository.snapshot();
        if !config.wake_companion_on_power_on {
            return;
        }
        let Some(device) = config.companion_device else {
            return;
        };

        let wake = self.inner.wake.clone();
        tokio::spawn(async move {
            if let Err(e) = wake.wake_companion_device(&device).await {
                warn!(kind = device.kind(), error = %e, "companion wake failed");
            }
        });
    }

    async fn begin_power_on(&self) -> (u64, CancellationToken) {
        let generation = self.inner.power_on_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let token = self.inner.cancel.child_token();
        let previous = self
            .inner
            .power_on
            .lock()
            .await
            .replace((generation, token.clone()));
        if let Some((_, previous)) = previous {
            previous.cancel();
            self.inner.session.abandon_reconnect();
        }
        (generation, token)
    }

    async fn finish_power_on(&self, generation: u64) {
        let mut slot = self.inner.power_on.lock().await;
        if slot.as_ref().is_some_and(|(g, _)| *g == generation) {
            *slot = None;
        }
    }

    /// Refuse a new connection while one is being established, including
    /// the retry loop of a power-on.
    async fn ensure_idle(&self) -> Result<(), CoreError> {
        let powering_on = self.inner.power_on.lock().await.is_some();
        let settling = matches!(
            self.inner.session.current_state(),
            SessionState::Connecting
                | SessionState::AwaitingPairingApproval
                | SessionState::Reconnecting { .. }
        );
        if powering_on || settling {
            return Err(CoreError::AlreadyConnecting);
        }
        Ok(())
    }

    async fn cancel_power_on(&self) {
        let pending = self.inner.power_on.lock().await.take();
        if let Some((_, token)) = pending {
            info!("cancelling pending power-on");
            token.cancel();
            self.inner.session.abandon_reconnect();
        }
    }

    // ── Actions ──────────────────────────────────────────────────

    /// Run a catalog action by id (`volume_up`, `home`, ...).
    pub async fn run_action(&self, id: &str) -> Result<(), CoreError> {
        let action = Action::from_str(id.trim()).map_err(|_| CoreError::UnknownAction {
            action: id.to_owned(),
        })?;

        if let Some(button) = action.button() {
            return self.send_button(button).await;
        }
        match action {
            Action::VolumeUp => self.volume_up().await,
            Action::VolumeDown => self.volume_down().await,
            Action::Mute => self.set_mute(true).await,
            Action::Unmute => self.set_mute(false).await,
            Action::PowerOn => self.power_on().await,
            Action::PowerOff => self.power_off().await,
            Action::WakeCompanion => self.wake_companion_device().await,
            Action::Up
            | Action::Down
            | Action::Left
            | Action::Right
            | Action::Enter
            | Action::Back
            | Action::Home => Err(CoreError::Internal(format!(
                "action {action} has no button mapping"
            ))),
        }
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn active_profile(&self) -> Result<(String, DeviceProfile), CoreError> {
        let config = self.inner.repository.snapshot();
        config
            .active()
            .map(|(name, profile)| (name.to_owned(), profile.clone()))
            .ok_or(CoreError::NoActiveProfile)
    }
}

fn target_for(name: &str, profile: &DeviceProfile) -> Result<SessionTarget, CoreError> {
    Ok(SessionTarget {
        profile: name.to_owned(),
        endpoint: Endpoint::new(&profile.address, profile.use_transport_security)?,
    })
}
