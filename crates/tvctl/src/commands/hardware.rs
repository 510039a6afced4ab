//! Hardware address and Wake-on-LAN handlers.

use tvctl_core::HardwareAddress;

use crate::cli::{GlobalOpts, MacArgs, MacCommand, WakeArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn mac(ctx: &Context, args: MacArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        MacCommand::Show => {
            let config = ctx.manager.get_config();
            let (name, profile) = config.active().ok_or(CliError::NoActiveProfile)?;
            let mac = profile
                .hardware_address
                .ok_or_else(|| CliError::NoHardwareAddress {
                    profile: name.to_owned(),
                })?;
            output::print_output(&mac.to_string(), global.quiet);
        }
        MacCommand::Fetch => {
            util::ensure_connected(ctx, global).await?;
            let mac = ctx.manager.fetch_hardware_address().await?;
            output::print_output(&mac.to_string(), global.quiet);
        }
        MacCommand::Set { mac } => {
            let mac = ctx.manager.set_hardware_address(&mac)?;
            util::done(&format!("Stored hardware address {mac}"), global);
        }
    }
    Ok(())
}

pub async fn wake(ctx: &Context, args: WakeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mac: HardwareAddress = args.mac.parse::<HardwareAddress>().map_err(|e| CliError::Validation {
        field: "mac".into(),
        reason: e.to_string(),
    })?;
    ctx.manager
        .wake_by_hardware_address(&mac.octets(), args.broadcast.as_deref())
        .await?;
    util::done(&format!("Magic packet sent to {mac}"), global);
    Ok(())
}
