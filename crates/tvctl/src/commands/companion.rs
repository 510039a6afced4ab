//! Companion streaming device handlers.

use std::fmt::Write as _;

use serde::Serialize;

use tvctl_core::CompanionDevice;

use crate::cli::{CompanionArgs, CompanionCommand, CompanionKind, GlobalOpts, Toggle};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompanionView {
    companion_device: Option<CompanionDevice>,
    wake_companion_on_power_on: bool,
}

fn companion_detail(view: &CompanionView) -> String {
    let mut out = String::new();
    match &view.companion_device {
        None => out.push_str("Companion: none"),
        Some(CompanionDevice::WakeOnLan {
            mac,
            broadcast_address,
        }) => {
            let _ = write!(out, "Companion: Wake-on-LAN {mac}");
            if let Some(broadcast) = broadcast_address {
                let _ = write!(out, " via {broadcast}");
            }
        }
        Some(CompanionDevice::DebugBridge { ip, port }) => {
            let _ = write!(out, "Companion: debug bridge {ip}:{port}");
        }
        Some(CompanionDevice::RemoteControlProtocol { ip }) => {
            let _ = write!(out, "Companion: remote-control protocol {ip}");
        }
    }
    let _ = write!(
        out,
        "\nWake with TV: {}",
        if view.wake_companion_on_power_on { "on" } else { "off" }
    );
    out
}

impl From<CompanionKind> for CompanionDevice {
    fn from(kind: CompanionKind) -> Self {
        match kind {
            CompanionKind::Wol { mac, broadcast } => CompanionDevice::WakeOnLan {
                mac,
                broadcast_address: broadcast,
            },
            CompanionKind::Bridge { ip, port } => CompanionDevice::DebugBridge { ip, port },
            CompanionKind::Rcp { ip } => CompanionDevice::RemoteControlProtocol { ip },
        }
    }
}

pub async fn handle(
    ctx: &Context,
    args: CompanionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CompanionCommand::Show => {
            let config = ctx.manager.get_config();
            let view = CompanionView {
                companion_device: config.companion_device,
                wake_companion_on_power_on: config.wake_companion_on_power_on,
            };
            let out = output::render_single(&global.output, &view, companion_detail, |v| {
                v.companion_device
                    .as_ref()
                    .map_or("none", CompanionDevice::kind)
                    .to_owned()
            })?;
            output::print_output(&out, global.quiet);
        }
        CompanionCommand::Set(set) => {
            let device = CompanionDevice::from(set.kind);
            let kind = device.kind();
            ctx.manager.set_companion_device(Some(device))?;
            util::done(&format!("Companion device set ({kind})"), global);
        }
        CompanionCommand::Clear => {
            if !util::confirm("Remove the companion device?", global.yes)? {
                return Ok(());
            }
            ctx.manager.set_companion_device(None)?;
            ctx.manager.set_wake_companion_on_power_on(false)?;
            util::done("Companion device removed", global);
        }
        CompanionCommand::Wake => {
            ctx.manager.wake_companion_device().await?;
            util::done("Companion device woken", global);
        }
        CompanionCommand::AutoWake { state } => {
            let enabled = matches!(state, Toggle::On);
            ctx.manager.set_wake_companion_on_power_on(enabled)?;
            util::done(
                if enabled {
                    "Companion will wake with the TV"
                } else {
                    "Companion will no longer wake with the TV"
                },
                global,
            );
        }
    }
    Ok(())
}
