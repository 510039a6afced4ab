//! Pairing, connection, and status handlers.

use std::fmt::Write as _;

use serde::Serialize;
use tracing::debug;

use tvctl_core::SessionState;

use crate::cli::{GlobalOpts, PairArgs, StatusArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Status view ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct StatusView {
    profile: Option<String>,
    address: Option<String>,
    secure: Option<bool>,
    paired: bool,
    hardware_address: Option<String>,
    connected: bool,
    state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn status_view(ctx: &Context, error: Option<String>) -> (StatusView, SessionState) {
    let config = ctx.manager.get_config();
    let active = config.active();
    let state = ctx.manager.state().borrow().clone();

    let view = StatusView {
        profile: active.map(|(name, _)| name.to_owned()),
        address: active.map(|(_, p)| p.address.clone()),
        secure: active.map(|(_, p)| p.use_transport_security),
        paired: active.is_some_and(|(_, p)| p.is_paired()),
        hardware_address: active.and_then(|(_, p)| p.hardware_address.map(|m| m.to_string())),
        connected: ctx.manager.get_status(),
        state: state.to_string(),
        error,
    };
    (view, state)
}

fn status_detail(view: &StatusView, state: &SessionState, color: bool) -> String {
    let dash = || "-".to_owned();
    let mut out = String::new();
    let _ = writeln!(out, "Profile:  {}", view.profile.clone().unwrap_or_else(dash));
    let _ = writeln!(out, "Address:  {}", view.address.clone().unwrap_or_else(dash));
    if let Some(secure) = view.secure {
        let _ = writeln!(out, "Socket:   {}", if secure { "wss" } else { "ws" });
    }
    let _ = writeln!(out, "Paired:   {}", if view.paired { "yes" } else { "no" });
    let _ = writeln!(
        out,
        "MAC:      {}",
        view.hardware_address.clone().unwrap_or_else(dash)
    );
    let _ = write!(out, "State:    {}", output::paint_state(state, color));
    if let Some(error) = &view.error {
        let _ = write!(out, "\nError:    {error}");
    }
    out
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn pair(ctx: &Context, args: PairArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let secure = !args.no_tls;
    util::done(
        &format!(
            "Pairing with {} -- accept the prompt on the TV if one appears",
            args.address
        ),
        global,
    );

    output::track(
        ctx.manager.state(),
        global.quiet,
        ctx.manager.authenticate(&args.name, &args.address, secure),
    )
    .await?;

    let mac = ctx
        .manager
        .get_config()
        .profiles
        .get(args.name.trim())
        .and_then(|p| p.hardware_address);
    match mac {
        Some(mac) => util::done(&format!("Paired as '{}' (MAC {mac})", args.name), global),
        None => util::done(
            &format!(
                "Paired as '{}'. No MAC address learned; power-on needs one (tvctl mac set)",
                args.name
            ),
            global,
        ),
    }
    Ok(())
}

pub async fn connect(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    util::ensure_connected(ctx, global).await?;
    let status = ctx.manager.status().await;
    util::done(
        &format!(
            "Connected to '{}'",
            status.profile.as_deref().unwrap_or("?")
        ),
        global,
    );
    Ok(())
}

pub async fn status(ctx: &Context, args: StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let paired = ctx
        .manager
        .get_config()
        .active()
        .is_some_and(|(_, p)| p.is_paired());

    let mut error = None;
    if !args.offline && paired {
        if let Err(e) = util::ensure_connected(ctx, global).await {
            debug!(error = %e, "status probe failed");
            error = Some(e.to_string());
        }
    }

    let (view, state) = status_view(ctx, error);
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &view,
        |v| status_detail(v, &state, color),
        |v| v.connected.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
