// ── Command API ──
//
// Typed operations routed through the dispatcher's mpsc channel to the
// command processor task.

pub mod catalog;

use serde_json::Value;
use tokio::sync::oneshot;

use tvctl_api::HardwareAddress;

use crate::error::CoreError;

/// An operation executed against a connected TV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    VolumeUp,
    VolumeDown,
    SetMute { muted: bool },
    /// Remote button by name (`HOME`, `UP`, `ENTER`, ...).
    Button { name: String },
    /// `turnOff`, then close the session.
    PowerOff,
    /// Raw `connectionmanager/getinfo` payload.
    ConnectionInfo,
    /// Liveness probe plus pointer-input refresh.
    Keepalive,
    /// Hardware address of the interface the TV is using.
    DiscoverHardwareAddress,
}

/// Result of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Ok,
    Payload(Value),
    HardwareAddress(HardwareAddress),
}

/// Command plus its reply channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: oneshot::Sender<Result<CommandResult, CoreError>>,
}
