//! Remote-control handlers: buttons, volume, mute, power, and actions.

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use tvctl_core::Action;

use crate::cli::{
    ActionArgs, ButtonArgs, GlobalOpts, PowerArgs, PowerCommand, VolumeArgs, VolumeDirection,
};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn button(ctx: &Context, args: ButtonArgs, global: &GlobalOpts) -> Result<(), CliError> {
    util::ensure_connected(ctx, global).await?;
    ctx.manager.send_button(&args.name).await?;
    Ok(())
}

pub async fn volume(ctx: &Context, args: VolumeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    util::ensure_connected(ctx, global).await?;
    match args.direction {
        VolumeDirection::Up => ctx.manager.volume_up().await?,
        VolumeDirection::Down => ctx.manager.volume_down().await?,
    }
    Ok(())
}

pub async fn mute(ctx: &Context, muted: bool, global: &GlobalOpts) -> Result<(), CliError> {
    util::ensure_connected(ctx, global).await?;
    ctx.manager.set_mute(muted).await?;
    util::done(if muted { "Muted" } else { "Unmuted" }, global);
    Ok(())
}

pub async fn power(ctx: &Context, args: PowerArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        PowerCommand::On => {
            output::track(ctx.manager.state(), global.quiet, ctx.manager.power_on()).await?;
            util::done("TV is on", global);
        }
        PowerCommand::Off => {
            if !util::confirm("Turn the TV off?", global.yes)? {
                return Ok(());
            }
            util::ensure_connected(ctx, global).await?;
            ctx.manager.power_off().await?;
            util::done("TV turned off", global);
        }
    }
    Ok(())
}

// ── Actions ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Tabled)]
struct ActionRow {
    #[tabled(rename = "Action")]
    id: &'static str,
    #[tabled(rename = "Shortcut")]
    shortcut: String,
}

/// Whether `action` talks to a live session (as opposed to waking).
pub fn needs_session(action: Action) -> bool {
    !matches!(action, Action::PowerOn | Action::WakeCompanion)
}

pub async fn action(ctx: &Context, args: ActionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let Some(id) = args.id else {
        return list_actions(ctx, global);
    };

    let action: Action = id.trim().parse().map_err(|_| CliError::UnknownAction {
        action: id.clone(),
    })?;
    if needs_session(action) {
        util::ensure_connected(ctx, global).await?;
    }
    output::track(ctx.manager.state(), global.quiet, ctx.manager.run_action(&id)).await?;
    Ok(())
}

fn list_actions(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let shortcuts = ctx.manager.get_config().shortcuts;
    let rows: Vec<ActionRow> = Action::iter()
        .map(|action| {
            let id: &'static str = action.into();
            ActionRow {
                id,
                shortcut: shortcuts
                    .get(id)
                    .map(|b| b.shortcut.clone())
                    .unwrap_or_default(),
            }
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &rows,
        Clone::clone,
        |r| r.id.to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
