//! Command dispatch: bridges CLI args -> session manager -> output formatting.

pub mod companion;
pub mod config_cmd;
pub mod control;
pub mod hardware;
pub mod repl;
pub mod session;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Pair(args) => session::pair(ctx, args, global).await,
        Command::Connect => session::connect(ctx, global).await,
        Command::Status(args) => session::status(ctx, args, global).await,
        Command::Button(args) => control::button(ctx, args, global).await,
        Command::Volume(args) => control::volume(ctx, args, global).await,
        Command::Mute => control::mute(ctx, true, global).await,
        Command::Unmute => control::mute(ctx, false, global).await,
        Command::Power(args) => control::power(ctx, args, global).await,
        Command::Mac(args) => hardware::mac(ctx, args, global).await,
        Command::Wake(args) => hardware::wake(ctx, args, global).await,
        Command::Companion(args) => companion::handle(ctx, args, global).await,
        Command::Action(args) => control::action(ctx, args, global).await,
        Command::Repl => repl::handle(ctx, global).await,
        // Config and Completions are handled before a session exists
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a TV session".into(),
        )),
    }
}
