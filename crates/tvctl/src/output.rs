//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::future::Future;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};
use tokio::sync::watch;

use tvctl_core::SessionState;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Session state label, green when connected and yellow while in flight.
pub fn paint_state(state: &SessionState, color: bool) -> String {
    let label = state.to_string();
    if !color {
        return label;
    }
    match state {
        SessionState::Connected => label.green().to_string(),
        SessionState::Disconnected => label.red().to_string(),
        SessionState::Connecting
        | SessionState::AwaitingPairingApproval
        | SessionState::Reconnecting { .. } => label.yellow().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views don't use
/// the `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Output(e.to_string()))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Output(e.to_string()))
}

// ── Progress ─────────────────────────────────────────────────────────

fn describe(state: &SessionState) -> String {
    match state {
        SessionState::Disconnected => "Disconnected".into(),
        SessionState::Connecting => "Connecting to the TV...".into(),
        SessionState::AwaitingPairingApproval => "Accept the pairing prompt on the TV".into(),
        SessionState::Connected => "Connected".into(),
        SessionState::Reconnecting { attempt } => {
            format!("Waiting for the TV to wake (attempt {attempt})")
        }
    }
}

/// Drive `work` to completion with a spinner on stderr that follows the
/// session state. No spinner when `quiet` or stderr is not a terminal.
pub async fn track<F: Future>(
    mut state: watch::Receiver<SessionState>,
    quiet: bool,
    work: F,
) -> F::Output {
    if quiet || !io::stderr().is_terminal() {
        return work.await;
    }

    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar.set_message(describe(&state.borrow_and_update()));

    tokio::pin!(work);
    let output = loop {
        tokio::select! {
            output = &mut work => break output,
            changed = state.changed() => {
                if changed.is_err() {
                    break work.await;
                }
                bar.set_message(describe(&state.borrow_and_update()));
            }
        }
    };
    bar.finish_and_clear();
    output
}
