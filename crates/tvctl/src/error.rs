//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use tvctl_config::ConfigError;
use tvctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Not connected to the TV")]
    #[diagnostic(
        code(tvctl::not_connected),
        help("Check that the TV is on and reachable, then run: tvctl connect")
    )]
    NotConnected,

    #[error("Connection to the TV failed: {message}")]
    #[diagnostic(
        code(tvctl::connection_failed),
        help(
            "Check the TV's address with: tvctl status --offline\n\
             If the TV is off, try: tvctl power on"
        )
    )]
    ConnectionFailed { message: String },

    #[error("Could not reach the companion device: {message}")]
    #[diagnostic(
        code(tvctl::companion_unreachable),
        help("Check the companion definition with: tvctl companion show")
    )]
    CompanionUnreachable { message: String },

    // ── Pairing ──────────────────────────────────────────────────────
    #[error("Profile '{profile}' is not paired")]
    #[diagnostic(code(tvctl::not_paired), help("Run: tvctl pair {profile} <address>"))]
    NotPaired { profile: String },

    #[error("The TV rejected the stored pairing credential")]
    #[diagnostic(
        code(tvctl::credential_rejected),
        help("The TV forgot this client. Pair again with: tvctl pair <name> <address>")
    )]
    CredentialRejected,

    #[error("Pairing was rejected: {message}")]
    #[diagnostic(
        code(tvctl::pairing_rejected),
        help("Accept the prompt on the TV screen when pairing.")
    )]
    PairingRejected { message: String },

    // ── Timeouts ─────────────────────────────────────────────────────
    #[error("{operation} timed out after {seconds}s")]
    #[diagnostic(code(tvctl::timeout))]
    Timeout { operation: String, seconds: u64 },

    #[error("Pairing prompt was not answered within {seconds}s")]
    #[diagnostic(
        code(tvctl::pairing_timeout),
        help("Raise pairing_timeout_secs in settings.toml if you need more time.")
    )]
    PairingTimeout { seconds: u64 },

    #[error("The TV did not come up after {attempts} connection attempts")]
    #[diagnostic(
        code(tvctl::power_on_timeout),
        help(
            "Enable network wake on the TV (\"Turn on via Wi-Fi\" / \"Mobile TV On\"),\n\
             check the stored address with: tvctl mac show"
        )
    )]
    PowerOnTimeout { attempts: u32 },

    #[error("Power-on was cancelled")]
    #[diagnostic(code(tvctl::power_on_cancelled))]
    PowerOnCancelled,

    // ── Not found ────────────────────────────────────────────────────
    #[error("No active profile")]
    #[diagnostic(code(tvctl::no_profile), help("Pair with a TV first: tvctl pair <name> <address>"))]
    NoActiveProfile,

    #[error("Profile '{name}' not found")]
    #[diagnostic(code(tvctl::profile_not_found), help("Run: tvctl config profiles"))]
    ProfileNotFound { name: String },

    #[error("No hardware address stored for profile '{profile}'")]
    #[diagnostic(
        code(tvctl::no_hardware_address),
        help("While the TV is on, run: tvctl mac fetch\nOr store it with: tvctl mac set <mac>")
    )]
    NoHardwareAddress { profile: String },

    #[error("No companion device configured")]
    #[diagnostic(code(tvctl::no_companion), help("Configure one with: tvctl companion set --help"))]
    NoCompanionDevice,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tvctl::validation))]
    Validation { field: String, reason: String },

    #[error("Unknown action '{action}'")]
    #[diagnostic(code(tvctl::unknown_action), help("List the available actions with: tvctl action"))]
    UnknownAction { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration at {path} is corrupt: {message}")]
    #[diagnostic(
        code(tvctl::config_corrupt),
        help("Fix or remove the file; tvctl starts empty without it.")
    )]
    ConfigCorrupt { path: String, message: String },

    #[error("Failed to write configuration to {path}: {message}")]
    #[diagnostic(code(tvctl::config_write))]
    ConfigWrite { path: String, message: String },

    #[error("Invalid settings: {message}")]
    #[diagnostic(code(tvctl::settings), help("Check settings.toml and TVCTL_* variables."))]
    Settings { message: String },

    // ── Internal / IO ────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(tvctl::internal))]
    Internal(String),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(tvctl::output))]
    Output(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotConnected | Self::ConnectionFailed { .. } | Self::CompanionUnreachable { .. } => {
                exit_code::CONNECTION
            }
            Self::NotPaired { .. } | Self::CredentialRejected | Self::PairingRejected { .. } => {
                exit_code::AUTH
            }
            Self::Timeout { .. } | Self::PairingTimeout { .. } | Self::PowerOnTimeout { .. } => {
                exit_code::TIMEOUT
            }
            Self::NoActiveProfile
            | Self::ProfileNotFound { .. }
            | Self::NoHardwareAddress { .. }
            | Self::NoCompanionDevice => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::UnknownAction { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotConnected => CliError::NotConnected,

            CoreError::AlreadyConnecting => CliError::ConnectionFailed {
                message: err.to_string(),
            },

            CoreError::SendFailed { message } | CoreError::TransportError { message } => {
                CliError::ConnectionFailed { message }
            }

            CoreError::NotPaired { profile } => CliError::NotPaired { profile },

            CoreError::CredentialRejected => CliError::CredentialRejected,

            CoreError::PairingRejected { message } => CliError::PairingRejected { message },

            CoreError::PairingTimeout { timeout_secs } => CliError::PairingTimeout {
                seconds: timeout_secs,
            },

            CoreError::Timeout {
                operation,
                timeout_secs,
            } => CliError::Timeout {
                operation: operation.to_owned(),
                seconds: timeout_secs,
            },

            CoreError::PowerOnTimeout { attempts } => CliError::PowerOnTimeout { attempts },

            CoreError::PowerOnCancelled => CliError::PowerOnCancelled,

            CoreError::InvalidAddress { address, reason } => CliError::Validation {
                field: "address".into(),
                reason: format!("{address}: {reason}"),
            },

            CoreError::InvalidHardwareAddress { message } => CliError::Validation {
                field: "mac".into(),
                reason: message,
            },

            CoreError::InvalidCompanionDevice { reason } => CliError::Validation {
                field: "companion".into(),
                reason,
            },

            CoreError::NoHardwareAddress { profile } => CliError::NoHardwareAddress { profile },

            CoreError::HardwareAddressUnavailable { reason } => CliError::ConnectionFailed {
                message: format!("the TV did not report a hardware address: {reason}"),
            },

            CoreError::NoCompanionDevice => CliError::NoCompanionDevice,

            CoreError::BridgeUnreachable { message }
            | CoreError::RemoteControlUnreachable { message } => {
                CliError::CompanionUnreachable { message }
            }

            CoreError::ConfigCorrupt { path, message } => CliError::ConfigCorrupt { path, message },

            CoreError::ConfigWriteError { path, message } => CliError::ConfigWrite { path, message },

            CoreError::UnknownProfile { name } => CliError::ProfileNotFound { name },

            CoreError::NoActiveProfile => CliError::NoActiveProfile,

            CoreError::UnknownAction { action } => CliError::UnknownAction { action },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Figment(e) => CliError::Settings {
                message: e.to_string(),
            },
            other => CoreError::from(other).into(),
        }
    }
}
