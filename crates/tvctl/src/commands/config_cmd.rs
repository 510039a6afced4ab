//! Config subcommand handlers. None of these contact the TV.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use tvctl_config::Settings;
use tvctl_core::{Config, ProfileRepository};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

const MASK: &str = "****";

/// Config as JSON with pairing credentials masked.
fn redacted(cfg: &Config) -> Result<Value, CliError> {
    let mut value = serde_json::to_value(cfg).map_err(|e| CliError::Output(e.to_string()))?;
    if let Some(profiles) = value.get_mut("profiles").and_then(Value::as_object_mut) {
        for profile in profiles.values_mut() {
            if let Some(credential) = profile.get_mut("pairingCredential") {
                *credential = Value::String(MASK.into());
            }
        }
    }
    Ok(value)
}

/// Human-readable config, credentials masked.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "active_profile = {}",
        cfg.active_profile.as_deref().unwrap_or("-")
    );
    let _ = writeln!(
        out,
        "wake_companion_on_power_on = {}",
        cfg.wake_companion_on_power_on
    );
    match &cfg.companion_device {
        Some(device) => {
            let _ = writeln!(out, "companion_device = {}", device.kind());
        }
        None => {
            let _ = writeln!(out, "companion_device = none");
        }
    }

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "address = \"{}\"", p.address);
        let _ = writeln!(out, "use_transport_security = {}", p.use_transport_security);
        if p.is_paired() {
            let _ = writeln!(out, "pairing_credential = \"{MASK}\"");
        }
        if let Some(mac) = p.hardware_address {
            let _ = writeln!(out, "hardware_address = \"{mac}\"");
        }
    }

    out.trim_end().to_owned()
}

fn format_settings(settings: &Settings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "connect_timeout_secs = {}", settings.connect_timeout_secs);
    let _ = writeln!(out, "command_timeout_secs = {}", settings.command_timeout_secs);
    let _ = writeln!(out, "pairing_timeout_secs = {}", settings.pairing_timeout_secs);
    let _ = writeln!(out, "power_on_attempts = {}", settings.power_on_attempts);
    let _ = writeln!(out, "power_on_interval_ms = {}", settings.power_on_interval_ms);
    let _ = writeln!(
        out,
        "keepalive_interval_secs = {}",
        settings.keepalive_interval_secs
    );
    let _ = writeln!(
        out,
        "status_poll_interval_secs = {}",
        settings.status_poll_interval_secs
    );
    let _ = writeln!(out, "wol_port = {}", settings.wol_port);
    if let Some(broadcast) = settings.wol_broadcast {
        let _ = writeln!(out, "wol_broadcast = \"{broadcast}\"");
    }
    let _ = writeln!(out, "adb_program = \"{}\"", settings.adb_program);
    let _ = write!(
        out,
        "remote_control_timeout_secs = {}",
        settings.remote_control_timeout_secs
    );
    out
}

#[derive(Debug, Clone, Serialize, Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    active: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "TLS")]
    tls: bool,
    #[tabled(rename = "Paired")]
    paired: bool,
    #[tabled(rename = "MAC")]
    mac: String,
}

#[derive(Debug, Clone, Serialize, Tabled)]
struct ShortcutRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Shortcut")]
    shortcut: String,
    #[tabled(rename = "Global")]
    global: bool,
}

#[derive(Debug, Serialize)]
struct Paths {
    config: String,
    settings: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::open_store(global).snapshot();
            let value = redacted(&cfg)?;
            let out = output::render_single(
                &global.output,
                &value,
                |_| format_config_redacted(&cfg),
                |_| cfg.active_profile.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
        }

        ConfigCommand::Settings => {
            let settings = config::load_settings(global)?;
            let out =
                output::render_single(&global.output, &settings, format_settings, format_settings)?;
            output::print_output(&out, global.quiet);
        }

        ConfigCommand::Path => {
            let paths = Paths {
                config: config::config_path(global).display().to_string(),
                settings: config::settings_path(global).display().to_string(),
            };
            let out = output::render_single(
                &global.output,
                &paths,
                |p| format!("config   {}\nsettings {}", p.config, p.settings),
                |p| p.config.clone(),
            )?;
            output::print_output(&out, global.quiet);
        }

        ConfigCommand::Profiles => {
            let cfg = config::open_store(global).snapshot();
            let rows: Vec<ProfileRow> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileRow {
                    active: if cfg.active_profile.as_deref() == Some(name.as_str()) {
                        "*"
                    } else {
                        ""
                    },
                    name: name.clone(),
                    address: p.address.clone(),
                    tls: p.use_transport_security,
                    paired: p.is_paired(),
                    mac: p
                        .hardware_address
                        .map(|m| m.to_string())
                        .unwrap_or_default(),
                })
                .collect();
            let out = output::render_list(&global.output, &rows, Clone::clone, |r| r.name.clone())?;
            output::print_output(&out, global.quiet);
        }

        ConfigCommand::Use { name } => {
            config::open_store(global).set_active_profile(&name)?;
            if !global.quiet {
                eprintln!("Active profile set to '{name}'");
            }
        }

        ConfigCommand::Shortcuts => {
            let cfg = config::open_store(global).snapshot();
            let rows: Vec<ShortcutRow> = cfg
                .shortcuts
                .iter()
                .map(|(action, b)| ShortcutRow {
                    action: action.clone(),
                    shortcut: b.shortcut.clone(),
                    global: b.global,
                })
                .collect();
            let out =
                output::render_list(&global.output, &rows, Clone::clone, |r| r.action.clone())?;
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}
