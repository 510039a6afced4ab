// ── Device session ──
//
// Owns the live control socket (and the lazily opened pointer-input
// socket) and the observable connection state. All socket I/O goes
// through the `link` mutex, so at most one exchange is in flight.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, info, warn};

use tvctl_api::protocol::{self, RegistrationEvent, uri};
use tvctl_api::{DeviceLink, DeviceTransport, Endpoint, InputLink};

use crate::config::SessionConfig;
use crate::error::CoreError;

// ── State ────────────────────────────────────────────────────────────

/// Observable connection state of a [`DeviceSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    /// First-time pairing: the TV is showing its approval prompt.
    AwaitingPairingApproval,
    Connected,
    /// Power-on retry loop; `attempt` is 1-based.
    Reconnecting { attempt: u32 },
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::AwaitingPairingApproval => f.write_str("awaiting approval on TV"),
            Self::Connected => f.write_str("connected"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
        }
    }
}

/// Where a session connects to, and which profile it belongs to.
#[derive(Debug, Clone)]
pub struct SessionTarget {
    pub profile: String,
    pub endpoint: Endpoint,
}

struct LiveLink {
    control: Box<dyn DeviceLink>,
    input: Option<Box<dyn InputLink>>,
    target: SessionTarget,
}

impl LiveLink {
    async fn close(mut self) {
        if let Some(mut input) = self.input.take() {
            input.close().await;
        }
        self.control.close().await;
    }
}

// ── DeviceSession ────────────────────────────────────────────────────

/// One television connection. Cheaply cloneable.
#[derive(Clone)]
pub struct DeviceSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    transport: Arc<dyn DeviceTransport>,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
    link: Mutex<Option<LiveLink>>,
    next_id: AtomicU64,
}

impl DeviceSession {
    pub fn new(transport: Arc<dyn DeviceTransport>, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            inner: Arc::new(SessionInner {
                transport,
                config,
                state,
                link: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to state changes.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.inner.state.borrow(), SessionState::Connected)
    }

    /// Profile of the live connection, if any.
    pub async fn connected_profile(&self) -> Option<String> {
        self.inner
            .link
            .lock()
            .await
            .as_ref()
            .map(|live| live.target.profile.clone())
    }

    fn set_state(&self, state: SessionState) {
        debug!(%state, "session state");
        self.inner.state.send_replace(state);
    }

    /// Move to `next` only from a settled state.
    fn claim(&self, next: SessionState) -> Result<(), CoreError> {
        let claimed = self.inner.state.send_if_modified(|state| {
            if matches!(state, SessionState::Disconnected | SessionState::Connected) {
                *state = next;
                true
            } else {
                false
            }
        });
        if claimed {
            Ok(())
        } else {
            Err(CoreError::AlreadyConnecting)
        }
    }

    fn next_id(&self) -> String {
        format!("cmd_{}", self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect and register with a stored credential.
    ///
    /// A TV that answers with a pairing prompt, or refuses the key
    /// outright, no longer trusts it: [`CoreError::CredentialRejected`].
    pub async fn connect(
        &self,
        target: SessionTarget,
        credential: &SecretString,
    ) -> Result<(), CoreError> {
        self.claim(SessionState::Connecting)?;
        self.drop_link().await;

        match self.establish(&target, credential).await {
            Ok(control) => {
                info!(profile = %target.profile, endpoint = %target.endpoint, "connected");
                self.install(control, target).await;
                self.set_state(SessionState::Connected);
                Ok(())
            }
            Err(e) => {
                self.set_state(SessionState::Disconnected);
                Err(e)
            }
        }
    }

    /// Pair with the TV, waiting for on-screen approval if it prompts.
    ///
    /// `persist` runs with the issued credential before the session
    /// reports `Connected`; its failure aborts the pairing.
    pub async fn pair<F>(
        &self,
        target: SessionTarget,
        previous: Option<&SecretString>,
        persist: F,
    ) -> Result<SecretString, CoreError>
    where
        F: FnOnce(&SecretString) -> Result<(), CoreError>,
    {
        self.claim(SessionState::Connecting)?;
        self.drop_link().await;

        let timeout = self.inner.config.pairing_timeout;
        let negotiated =
            match tokio::time::timeout(timeout, self.negotiate(&target.endpoint, previous)).await {
                Ok(result) => result,
                Err(_) => Err(CoreError::PairingTimeout {
                    timeout_secs: timeout.as_secs(),
                }),
            };

        let (mut control, credential) = match negotiated {
            Ok(pair) => pair,
            Err(e) => {
                warn!(profile = %target.profile, error = %e, "pairing failed");
                self.set_state(SessionState::Disconnected);
                return Err(e);
            }
        };

        if let Err(e) = persist(&credential) {
            control.close().await;
            self.set_state(SessionState::Disconnected);
            return Err(e);
        }

        info!(profile = %target.profile, endpoint = %target.endpoint, "paired");
        self.install(control, target).await;
        self.set_state(SessionState::Connected);
        Ok(credential)
    }

    /// Close both sockets and settle in `Disconnected`.
    pub async fn disconnect(&self) {
        if self.drop_link().await {
            info!("disconnected");
        }
        self.set_state(SessionState::Disconnected);
    }

    // ── Power-on reconnect support ───────────────────────────────

    /// Enter the retry loop. Fails if another connection attempt is
    /// already running.
    pub async fn begin_reconnect(&self) -> Result<(), CoreError> {
        self.claim(SessionState::Reconnecting { attempt: 0 })?;
        self.drop_link().await;
        Ok(())
    }

    /// One attempt of the retry loop. Failure leaves the state at
    /// `Reconnecting`; the caller decides whether to try again.
    pub async fn reconnect_attempt(
        &self,
        attempt: u32,
        target: &SessionTarget,
        credential: &SecretString,
    ) -> Result<(), CoreError> {
        let in_loop = self.inner.state.send_if_modified(|state| {
            if matches!(state, SessionState::Reconnecting { .. }) {
                *state = SessionState::Reconnecting { attempt };
                true
            } else {
                false
            }
        });
        if !in_loop {
            return Err(CoreError::PowerOnCancelled);
        }
        let control = self.establish(target, credential).await?;

        let mut slot = self.inner.link.lock().await;
        let still_ours = self.inner.state.send_if_modified(|state| {
            if matches!(state, SessionState::Reconnecting { .. }) {
                *state = SessionState::Connected;
                true
            } else {
                false
            }
        });
        if !still_ours {
            drop(slot);
            let mut control = control;
            control.close().await;
            return Err(CoreError::PowerOnCancelled);
        }

        info!(profile = %target.profile, attempt, "reconnected after power-on");
        *slot = Some(LiveLink {
            control,
            input: None,
            target: target.clone(),
        });
        Ok(())
    }

    /// Leave the retry loop without a connection.
    pub fn abandon_reconnect(&self) {
        self.inner.state.send_if_modified(|state| {
            if matches!(state, SessionState::Reconnecting { .. }) {
                *state = SessionState::Disconnected;
                true
            } else {
                false
            }
        });
    }

    // ── Requests ─────────────────────────────────────────────────

    /// Send a request and return the reply payload.
    ///
    /// Any failure, including a device refusal, tears the connection
    /// down.
    pub async fn request(&self, uri: &str, payload: Option<Value>) -> Result<Value, CoreError> {
        self.exchange(uri, payload, false)
            .await
            .map(Option::unwrap_or_default)
    }

    /// Like [`request`](Self::request), but a device refusal yields
    /// `None` and keeps the connection. For optional services that many
    /// models do not implement.
    pub async fn query(&self, uri: &str) -> Result<Option<Value>, CoreError> {
        self.exchange(uri, None, true).await
    }

    async fn exchange(
        &self,
        uri: &str,
        payload: Option<Value>,
        tolerate_refusal: bool,
    ) -> Result<Option<Value>, CoreError> {
        let mut guard = self.inner.link.lock().await;
        let Some(live) = guard.as_mut() else {
            return Err(CoreError::NotConnected);
        };

        let id = self.next_id();
        let timeout = self.inner.config.command_timeout;
        let outcome = tokio::time::timeout(
            timeout,
            protocol::request(live.control.as_mut(), &id, uri, payload),
        )
        .await;

        let err = match outcome {
            Ok(Ok(value)) => return Ok(Some(value)),
            Ok(Err(tvctl_api::Error::Device { message })) if tolerate_refusal => {
                debug!(uri, %message, "device refused optional request");
                return Ok(None);
            }
            Ok(Err(e)) => CoreError::from(e),
            Err(_) => CoreError::Timeout {
                operation: "request",
                timeout_secs: timeout.as_secs(),
            },
        };

        if err.is_connectivity_failure() {
            self.tear_down(&mut guard, &err).await;
        }
        Err(err)
    }

    // ── Pointer input ────────────────────────────────────────────

    /// Press a remote button. Opens the pointer-input socket on first
    /// use; any failure tears the whole connection down.
    pub async fn send_button(&self, name: &str) -> Result<(), CoreError> {
        let mut guard = self.inner.link.lock().await;
        let Some(live) = guard.as_mut() else {
            return Err(CoreError::NotConnected);
        };

        let result = self.press(live, name).await;
        if let Err(e) = &result {
            self.tear_down(&mut guard, e).await;
        }
        result
    }

    async fn press(&self, live: &mut LiveLink, name: &str) -> Result<(), CoreError> {
        if live.input.is_none() {
            let socket = self.open_input(live.control.as_mut()).await?;
            live.input = Some(socket);
        }
        let Some(input) = live.input.as_mut() else {
            return Err(CoreError::Internal("pointer input socket missing".into()));
        };

        let timeout = self.inner.config.command_timeout;
        tokio::time::timeout(timeout, input.send_button(name))
            .await
            .map_err(|_| CoreError::Timeout {
                operation: "button press",
                timeout_secs: timeout.as_secs(),
            })??;
        debug!(button = name, "button sent");
        Ok(())
    }

    /// Replace the pointer-input socket with a fresh one. On failure the
    /// slot is left empty and reopened by the next button press.
    pub async fn refresh_input_socket(&self) -> Result<(), CoreError> {
        let mut guard = self.inner.link.lock().await;
        let Some(live) = guard.as_mut() else {
            return Err(CoreError::NotConnected);
        };

        if let Some(mut old) = live.input.take() {
            old.close().await;
        }
        live.input = Some(self.open_input(live.control.as_mut()).await?);
        debug!("pointer input socket refreshed");
        Ok(())
    }

    async fn open_input(
        &self,
        control: &mut dyn DeviceLink,
    ) -> Result<Box<dyn InputLink>, CoreError> {
        let id = self.next_id();
        let command_timeout = self.inner.config.command_timeout;
        let payload = tokio::time::timeout(
            command_timeout,
            protocol::request(control, &id, uri::POINTER_INPUT_SOCKET, None),
        )
        .await
        .map_err(|_| CoreError::Timeout {
            operation: "pointer input lookup",
            timeout_secs: command_timeout.as_secs(),
        })??;

        let socket_url = payload
            .get("socketPath")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::TransportError {
                message: "TV did not return a pointer input socket".into(),
            })?;

        let connect_timeout = self.inner.config.connect_timeout;
        let input = tokio::time::timeout(
            connect_timeout,
            self.inner.transport.open_input(socket_url),
        )
        .await
        .map_err(|_| CoreError::Timeout {
            operation: "pointer input connect",
            timeout_secs: connect_timeout.as_secs(),
        })??;
        Ok(input)
    }

    // ── Internals ────────────────────────────────────────────────

    async fn open_control(&self, endpoint: &Endpoint) -> Result<Box<dyn DeviceLink>, CoreError> {
        let timeout = self.inner.config.connect_timeout;
        let link = tokio::time::timeout(timeout, self.inner.transport.open(endpoint))
            .await
            .map_err(|_| CoreError::Timeout {
                operation: "connect",
                timeout_secs: timeout.as_secs(),
            })??;
        Ok(link)
    }

    /// Open and register with a known credential, bounded by the connect
    /// timeout.
    async fn establish(
        &self,
        target: &SessionTarget,
        credential: &SecretString,
    ) -> Result<Box<dyn DeviceLink>, CoreError> {
        let timeout = self.inner.config.connect_timeout;
        let registered = tokio::time::timeout(timeout, async {
            let mut control = self.open_control(&target.endpoint).await?;
            control
                .send(&protocol::register_message(Some(credential)))
                .await?;
            let event = protocol::next_registration_event(control.as_mut()).await?;
            Ok::<_, CoreError>((control, event))
        })
        .await
        .map_err(|_| CoreError::Timeout {
            operation: "registration",
            timeout_secs: timeout.as_secs(),
        })?;

        match registered {
            Ok((control, RegistrationEvent::Registered(_))) => Ok(control),
            Ok((mut control, RegistrationEvent::Prompted)) => {
                control.close().await;
                Err(CoreError::CredentialRejected)
            }
            Err(CoreError::PairingRejected { message }) => {
                debug!(%message, "stored credential refused");
                Err(CoreError::CredentialRejected)
            }
            Err(e) => Err(e),
        }
    }

    /// Register, sitting through the approval prompt if the TV shows one.
    async fn negotiate(
        &self,
        endpoint: &Endpoint,
        previous: Option<&SecretString>,
    ) -> Result<(Box<dyn DeviceLink>, SecretString), CoreError> {
        let mut control = self.open_control(endpoint).await?;
        control.send(&protocol::register_message(previous)).await?;

        loop {
            match protocol::next_registration_event(control.as_mut()).await? {
                RegistrationEvent::Prompted => {
                    info!("waiting for pairing approval on the TV");
                    self.set_state(SessionState::AwaitingPairingApproval);
                }
                RegistrationEvent::Registered(Some(key)) => return Ok((control, key)),
                RegistrationEvent::Registered(None) => {
                    return match previous {
                        Some(key) => Ok((control, key.clone())),
                        None => Err(CoreError::PairingRejected {
                            message: "TV registered without issuing a credential".into(),
                        }),
                    };
                }
            }
        }
    }

    async fn install(&self, control: Box<dyn DeviceLink>, target: SessionTarget) {
        *self.inner.link.lock().await = Some(LiveLink {
            control,
            input: None,
            target,
        });
    }

    /// Close any live sockets. Returns whether there were any.
    async fn drop_link(&self) -> bool {
        let live = self.inner.link.lock().await.take();
        match live {
            Some(live) => {
                live.close().await;
                true
            }
            None => false,
        }
    }

    async fn tear_down(&self, slot: &mut MutexGuard<'_, Option<LiveLink>>, reason: &CoreError) {
        if let Some(live) = slot.take() {
            warn!(profile = %live.target.profile, error = %reason, "connection lost");
            live.close().await;
        }
        self.set_state(SessionState::Disconnected);
    }
}

impl fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}
