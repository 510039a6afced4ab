// ── Runtime session configuration ──
//
// Timing and retry tuning for the session manager. The binary builds
// this from its layered settings -- core never reads config files.

use std::net::IpAddr;
use std::time::Duration;

/// Tuning for a [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Socket open plus registration with a cached credential.
    pub connect_timeout: Duration,
    /// Wait for a command reply.
    pub command_timeout: Duration,
    /// Wait for the user to approve the on-screen pairing prompt.
    pub pairing_timeout: Duration,
    /// Connection attempts after a power-on wake.
    pub power_on_attempts: u32,
    /// Spacing between power-on connection attempts.
    pub power_on_interval: Duration,
    /// Keepalive period while connected. `None` disables the task.
    pub keepalive_interval: Option<Duration>,
    /// UDP port for Wake-on-LAN datagrams.
    pub wol_port: u16,
    /// Destination for the TV's magic packet. `None` means the limited
    /// broadcast address; set a subnet broadcast where that is filtered.
    pub wol_broadcast: Option<IpAddr>,
    /// Path or name of the `adb` executable.
    pub adb_program: String,
    /// HTTP timeout for the remote-control-protocol wake.
    pub remote_control_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(3),
            pairing_timeout: Duration::from_secs(60),
            power_on_attempts: 10,
            power_on_interval: Duration::from_secs(1),
            keepalive_interval: Some(Duration::from_secs(25)),
            wol_port: tvctl_api::wake::DEFAULT_WOL_PORT,
            wol_broadcast: None,
            adb_program: "adb".into(),
            remote_control_timeout: Duration::from_secs(5),
        }
    }
}
