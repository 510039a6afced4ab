//! Interactive session: one connection, actions read line by line.
//!
//! The session stays open between lines (keepalive runs in the
//! background). Connection status is printed every
//! `status_poll_interval_secs`. EOF, `quit`, or Ctrl-C shuts down.

use std::str::FromStr;

use strum::IntoEnumIterator;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use tvctl_core::Action;

use crate::cli::GlobalOpts;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::{control, util};

/// One parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Empty,
    Quit,
    Help,
    Status,
    Connect,
    Button(String),
    Action(Action),
    Unknown(String),
}

impl Line {
    fn parse(raw: &str) -> Self {
        let mut words = raw.split_whitespace();
        let Some(head) = words.next() else {
            return Self::Empty;
        };
        let unknown = || Self::Unknown(raw.trim().to_owned());
        match head.to_ascii_lowercase().as_str() {
            "quit" | "exit" => Self::Quit,
            "help" | "?" => Self::Help,
            "status" => Self::Status,
            "connect" => Self::Connect,
            "button" | "btn" => words
                .next()
                .map_or_else(unknown, |name| Self::Button(name.to_owned())),
            id => Action::from_str(id).map_or_else(|_| unknown(), Self::Action),
        }
    }
}

fn help_text() -> String {
    let actions: Vec<&'static str> = Action::iter().map(Into::into).collect();
    format!(
        "actions: {}\nother:   button <NAME>, status, connect, help, quit",
        actions.join(", ")
    )
}

fn status_line(ctx: &Context, global: &GlobalOpts) -> String {
    let state = ctx.manager.state().borrow().clone();
    let color = output::should_color(&global.color);
    format!("[status] {}", output::paint_state(&state, color))
}

/// Run one line. Errors are reported and the loop continues.
async fn run_line(ctx: &Context, line: Line, global: &GlobalOpts) -> Result<(), CliError> {
    match line {
        Line::Empty | Line::Quit => {}
        Line::Help => output::print_output(&help_text(), global.quiet),
        Line::Status => output::print_output(&status_line(ctx, global), global.quiet),
        Line::Connect => util::ensure_connected(ctx, global).await?,
        Line::Button(name) => {
            util::ensure_connected(ctx, global).await?;
            ctx.manager.send_button(&name).await?;
        }
        Line::Action(action) => {
            if control::needs_session(action) {
                util::ensure_connected(ctx, global).await?;
            }
            let id: &'static str = action.into();
            output::track(ctx.manager.state(), global.quiet, ctx.manager.run_action(id)).await?;
        }
        Line::Unknown(raw) => {
            return Err(CliError::UnknownAction { action: raw });
        }
    }
    Ok(())
}

pub async fn handle(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let paired = ctx
        .manager
        .get_config()
        .active()
        .is_some_and(|(_, p)| p.is_paired());
    if paired {
        if let Err(e) = util::ensure_connected(ctx, global).await {
            eprintln!("{:?}", miette::Report::new(e));
        }
    }
    if !global.quiet {
        eprintln!("{}\n{}", status_line(ctx, global), help_text());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut poll = tokio::time::interval(ctx.settings.status_poll_interval());
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    poll.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
            _ = poll.tick() => {
                output::print_output(&status_line(ctx, global), global.quiet);
            }
            next = lines.next_line() => {
                let Some(raw) = next? else { break };
                let line = Line::parse(&raw);
                if line == Line::Quit {
                    break;
                }
                // Ctrl-C also interrupts a running line, such as a power-on.
                let result = tokio::select! {
                    result = run_line(ctx, line, global) => result,
                    _ = tokio::signal::ctrl_c() => break,
                };
                if let Err(e) = result {
                    eprintln!("{:?}", miette::Report::new(e));
                }
            }
        }
    }

    if !global.quiet {
        eprintln!("Closing session");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions_and_builtins() {
        assert_eq!(Line::parse("  "), Line::Empty);
        assert_eq!(Line::parse("QUIT"), Line::Quit);
        assert_eq!(Line::parse("volume_up"), Line::Action(Action::VolumeUp));
        assert_eq!(Line::parse("wake_streaming_device"), Line::Action(Action::WakeCompanion));
        assert_eq!(Line::parse("button menu"), Line::Button("menu".into()));
        assert_eq!(Line::parse("button"), Line::Unknown("button".into()));
        assert_eq!(Line::parse("dance"), Line::Unknown("dance".into()));
    }
}
