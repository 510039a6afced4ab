//! Device session manager for LG webOS televisions.
//!
//! Sits between `tvctl-api` (sockets, frames, wake signals) and front
//! ends such as the `tvctl` CLI:
//!
//! - **[`SessionManager`]**: Facade for every user-facing operation:
//!   pairing ([`authenticate`](SessionManager::authenticate)), connecting,
//!   remote buttons, volume, power on/off, hardware-address discovery and
//!   companion-device wake. Owns the cancellable power-on retry loop.
//!
//! - **[`DeviceSession`]**: The connection state machine. Publishes
//!   [`SessionState`] on a `watch` channel and guarantees that any send
//!   failure leaves the session `Disconnected`.
//!
//! - **[`CommandDispatcher`]**: Serializes [`Command`]s through an `mpsc`
//!   channel onto the session and runs the keepalive task.
//!
//! - **[`ProfileRepository`]**: Persistence seam for [`Config`];
//!   `tvctl-config` provides the file-backed store.
//!
//! - **[`WakeService`]**: Wake-on-LAN, debug-bridge and remote-control
//!   wake signals with up-front input validation.

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod manager;
pub mod model;
pub mod repository;
pub mod session;
pub mod wake;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::catalog::Action;
pub use command::{Command, CommandResult};
pub use config::SessionConfig;
pub use dispatcher::CommandDispatcher;
pub use error::CoreError;
pub use manager::{SessionManager, SessionStatus};
pub use model::{
    CompanionDevice, Config, Credential, DeviceProfile, ShortcutBinding, default_shortcuts,
};
pub use repository::{InMemoryRepository, ProfileRepository};
pub use session::{DeviceSession, SessionState, SessionTarget};
pub use wake::WakeService;

pub use tvctl_api::HardwareAddress;
