//! Shared helpers for command handlers.

use crate::cli::GlobalOpts;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Connect to the active profile unless a session is already live.
pub async fn ensure_connected(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    if ctx.manager.get_status() {
        return Ok(());
    }
    output::track(ctx.manager.state(), global.quiet, ctx.manager.connect()).await?;
    Ok(())
}

/// Confirmation line on stderr, so stdout stays scriptable.
pub fn done(message: &str, global: &GlobalOpts) {
    if !global.quiet {
        eprintln!("{message}");
    }
}
