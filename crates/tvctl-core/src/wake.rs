// ── Wake service ──
//
// Stateless wake signals: magic packets for the TV, and the three
// companion-device mechanisms. Every input is validated before any
// socket or process is touched.

use std::net::IpAddr;
use std::time::Duration;

use tracing::info;

use tvctl_api::HardwareAddress;
use tvctl_api::wake::{DebugBridge, RemoteControl, WakeOnLan, parse_broadcast};

use crate::error::CoreError;
use crate::model::CompanionDevice;

#[derive(Debug, Clone)]
pub struct WakeService {
    wol: WakeOnLan,
    bridge: DebugBridge,
    remote: RemoteControl,
}

impl WakeService {
    pub fn new(
        wol_port: u16,
        adb_program: &str,
        remote_control_timeout: Duration,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            wol: WakeOnLan::new(wol_port),
            bridge: DebugBridge::new(adb_program),
            remote: RemoteControl::new(remote_control_timeout)?,
        })
    }

    /// Send a magic packet for `hardware_address` (exactly six bytes).
    ///
    /// Without `broadcast` the packet goes to `255.255.255.255`.
    pub async fn wake_by_hardware_address(
        &self,
        hardware_address: &[u8],
        broadcast: Option<&str>,
    ) -> Result<(), CoreError> {
        let address = HardwareAddress::from_bytes(hardware_address)?;
        let target = broadcast
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(parse_broadcast)
            .transpose()?;
        self.wake_hardware_address(&address, target).await
    }

    /// Send a magic packet for an already validated address.
    pub async fn wake_hardware_address(
        &self,
        address: &HardwareAddress,
        broadcast: Option<IpAddr>,
    ) -> Result<(), CoreError> {
        self.wol.wake(address, broadcast).await?;
        info!(%address, "wake-on-LAN sent");
        Ok(())
    }

    /// Wake a companion device with the mechanism its definition names.
    pub async fn wake_companion_device(&self, device: &CompanionDevice) -> Result<(), CoreError> {
        device.validate()?;

        match device {
            CompanionDevice::WakeOnLan {
                mac,
                broadcast_address,
            } => {
                let address: HardwareAddress = mac.parse()?;
                self.wake_by_hardware_address(&address.octets(), broadcast_address.as_deref())
                    .await?;
            }
            CompanionDevice::DebugBridge { ip, port } => {
                self.bridge.wake(ip, *port).await?;
                info!(ip = %ip, port, "companion woken over debug bridge");
            }
            CompanionDevice::RemoteControlProtocol { ip } => {
                self.remote.power_on(ip).await?;
                info!(ip = %ip, "companion woken over remote-control protocol");
            }
        }
        Ok(())
    }
}
