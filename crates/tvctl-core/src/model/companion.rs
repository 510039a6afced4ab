// ── Companion device ──

use serde::{Deserialize, Serialize};

use tvctl_api::HardwareAddress;
use tvctl_api::wake::{DEFAULT_BRIDGE_PORT, parse_broadcast};

use crate::error::CoreError;

/// A streaming box woken alongside (or instead of) the TV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum CompanionDevice {
    /// Magic packet to `mac`, optionally directed at a subnet broadcast.
    #[serde(rename = "wol")]
    WakeOnLan {
        mac: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        broadcast_address: Option<String>,
    },

    /// `adb connect` followed by a wakeup keyevent.
    #[serde(rename = "bridge")]
    DebugBridge {
        ip: String,
        #[serde(default = "default_bridge_port")]
        port: u16,
    },

    /// HTTP `PowerOn` keypress.
    #[serde(rename = "rcp")]
    RemoteControlProtocol { ip: String },
}

fn default_bridge_port() -> u16 {
    DEFAULT_BRIDGE_PORT
}

impl CompanionDevice {
    /// Short label for display.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WakeOnLan { .. } => "wol",
            Self::DebugBridge { .. } => "bridge",
            Self::RemoteControlProtocol { .. } => "rcp",
        }
    }

    /// Reject unusable definitions before they are stored or used.
    pub fn validate(&self) -> Result<(), CoreError> {
        let invalid = |reason: String| CoreError::InvalidCompanionDevice { reason };

        match self {
            Self::WakeOnLan {
                mac,
                broadcast_address,
            } => {
                mac.parse::<HardwareAddress>()
                    .map_err(|e| invalid(e.to_string()))?;
                if let Some(broadcast) = broadcast_address {
                    parse_broadcast(broadcast).map_err(|e| invalid(e.to_string()))?;
                }
            }
            Self::DebugBridge { ip, port } => {
                if ip.trim().is_empty() {
                    return Err(invalid("bridge device needs an IP address".into()));
                }
                if *port == 0 {
                    return Err(invalid("bridge port must be non-zero".into()));
                }
            }
            Self::RemoteControlProtocol { ip } => {
                if ip.trim().is_empty() {
                    return Err(invalid("remote-control device needs an IP address".into()));
                }
            }
        }
        Ok(())
    }
}
