// ── Core error types ──
//
// Caller-facing errors from tvctl-core. Wire details (close codes,
// frame parse failures) never leak out raw: the `From<tvctl_api::Error>`
// impl classifies them into the session taxonomy.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session ──────────────────────────────────────────────────────
    #[error("Not connected to the TV")]
    NotConnected,

    #[error("A connection attempt is already in progress")]
    AlreadyConnecting,

    #[error("Profile '{profile}' has not been paired with the TV")]
    NotPaired { profile: String },

    #[error("The TV no longer accepts the stored pairing credential")]
    CredentialRejected,

    #[error("Send failed: {message}")]
    SendFailed { message: String },

    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout {
        operation: &'static str,
        timeout_secs: u64,
    },

    #[error("Transport error: {message}")]
    TransportError { message: String },

    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    // ── Pairing ──────────────────────────────────────────────────────
    #[error("Pairing was rejected on the TV: {message}")]
    PairingRejected { message: String },

    #[error("Pairing was not approved within {timeout_secs}s")]
    PairingTimeout { timeout_secs: u64 },

    // ── Power ────────────────────────────────────────────────────────
    #[error("TV did not accept a connection after {attempts} attempts")]
    PowerOnTimeout { attempts: u32 },

    #[error("Power-on was cancelled")]
    PowerOnCancelled,

    // ── Wake ─────────────────────────────────────────────────────────
    #[error("Invalid hardware address: {message}")]
    InvalidHardwareAddress { message: String },

    #[error("No hardware address stored for profile '{profile}'")]
    NoHardwareAddress { profile: String },

    #[error("Could not determine the TV's hardware address: {reason}")]
    HardwareAddressUnavailable { reason: String },

    #[error("No companion device configured")]
    NoCompanionDevice,

    #[error("Invalid companion device: {reason}")]
    InvalidCompanionDevice { reason: String },

    #[error("Debug bridge unreachable: {message}")]
    BridgeUnreachable { message: String },

    #[error("Remote control endpoint unreachable: {message}")]
    RemoteControlUnreachable { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration at {path} is corrupt: {message}")]
    ConfigCorrupt { path: String, message: String },

    #[error("Failed to write configuration to {path}: {message}")]
    ConfigWriteError { path: String, message: String },

    #[error("Unknown profile '{name}'")]
    UnknownProfile { name: String },

    #[error("No active profile -- pair with a TV first")]
    NoActiveProfile,

    // ── Actions ──────────────────────────────────────────────────────
    #[error("Unknown action '{action}'")]
    UnknownAction { action: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Errors that prove the live socket is unusable. Any of these forces
    /// the session to `Disconnected`.
    pub fn is_connectivity_failure(&self) -> bool {
        matches!(
            self,
            Self::SendFailed { .. }
                | Self::TransportError { .. }
                | Self::Timeout { .. }
                | Self::CredentialRejected
        )
    }
}

// ── Conversion from wire-layer errors ────────────────────────────────

impl From<tvctl_api::Error> for CoreError {
    fn from(err: tvctl_api::Error) -> Self {
        use tvctl_api::Error as Api;

        match err {
            Api::WebSocketClosed { .. }
            | Api::ConnectionClosed
            | Api::ConnectionLost(_)
            | Api::Send(_) => CoreError::SendFailed {
                message: err.to_string(),
            },
            Api::Device { message } => CoreError::SendFailed { message },
            Api::WebSocketConnect(_)
            | Api::Tls(_)
            | Api::Io(_)
            | Api::Encode(_)
            | Api::UnexpectedReply { .. } => CoreError::TransportError {
                message: err.to_string(),
            },
            Api::InvalidAddress { address, reason } => {
                CoreError::InvalidAddress { address, reason }
            }
            Api::InvalidUrl(e) => CoreError::InvalidAddress {
                address: String::new(),
                reason: e.to_string(),
            },
            Api::Rejected { message } => CoreError::PairingRejected { message },
            Api::InvalidHardwareAddress(message) => CoreError::InvalidHardwareAddress { message },
            Api::Bridge { message } => CoreError::BridgeUnreachable { message },
            Api::RemoteControl { host, message } => CoreError::RemoteControlUnreachable {
                message: format!("{host}: {message}"),
            },
        }
    }
}
