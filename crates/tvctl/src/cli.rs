//! Clap derive structures for the `tvctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tvctl -- remote control for LG webOS televisions
#[derive(Debug, Parser)]
#[command(
    name = "tvctl",
    version,
    about = "Control LG webOS televisions from the command line",
    long_about = "Pair with a webOS TV once, then drive it from the terminal:\n\
        power, volume, remote buttons, Wake-on-LAN, and companion streaming devices.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device configuration file (profiles, credentials, companion)
    #[arg(long, env = "TVCTL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Runtime settings file (timeouts, retries, wake tuning)
    #[arg(long, env = "TVCTL_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TVCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pair with a TV and make it the active profile
    #[command(alias = "auth")]
    Pair(PairArgs),

    /// Connect to the active TV and report the session state
    Connect,

    /// Show the active profile and connection state
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Press a remote-control button (UP, DOWN, ENTER, HOME, ...)
    #[command(alias = "btn")]
    Button(ButtonArgs),

    /// Change the volume
    #[command(alias = "vol")]
    Volume(VolumeArgs),

    /// Mute the TV
    Mute,

    /// Unmute the TV
    Unmute,

    /// Turn the TV on or off
    Power(PowerArgs),

    /// Show, fetch, or set the TV's hardware (MAC) address
    Mac(MacArgs),

    /// Send a Wake-on-LAN packet to any hardware address
    Wake(WakeArgs),

    /// Manage the companion streaming device
    #[command(alias = "comp")]
    Companion(CompanionArgs),

    /// Run a named action, or list the catalog
    Action(ActionArgs),

    /// Keep a session open and run actions line by line
    Repl,

    /// Inspect CLI configuration and settings
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Pairing ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PairArgs {
    /// Profile name to store the pairing under
    pub name: String,

    /// TV host name or IP address, optionally with :port
    pub address: String,

    /// Use a plain ws:// socket instead of wss://
    #[arg(long)]
    pub no_tls: bool,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Only report stored state, do not contact the TV
    #[arg(long)]
    pub offline: bool,
}

// ── Remote control ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ButtonArgs {
    /// Button name, case-insensitive
    pub name: String,
}

#[derive(Debug, Args)]
pub struct VolumeArgs {
    #[command(subcommand)]
    pub direction: VolumeDirection,
}

#[derive(Debug, Subcommand)]
pub enum VolumeDirection {
    /// One step up
    Up,
    /// One step down
    Down,
}

#[derive(Debug, Args)]
pub struct PowerArgs {
    #[command(subcommand)]
    pub command: PowerCommand,
}

#[derive(Debug, Subcommand)]
pub enum PowerCommand {
    /// Wake the TV over the network and reconnect
    On,
    /// Turn the TV off
    Off,
}

// ── Hardware address ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MacArgs {
    #[command(subcommand)]
    pub command: MacCommand,
}

#[derive(Debug, Subcommand)]
pub enum MacCommand {
    /// Print the stored hardware address
    Show,
    /// Ask the TV for its hardware address and store it
    Fetch,
    /// Store a hardware address manually
    Set {
        /// Six octets; colons, dashes, spaces or bare hex
        mac: String,
    },
}

#[derive(Debug, Args)]
pub struct WakeArgs {
    /// Hardware address of the machine to wake
    pub mac: String,

    /// Broadcast address to send to (default 255.255.255.255)
    #[arg(long, short = 'b')]
    pub broadcast: Option<String>,
}

// ── Companion device ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompanionArgs {
    #[command(subcommand)]
    pub command: CompanionCommand,
}

#[derive(Debug, Subcommand)]
pub enum CompanionCommand {
    /// Show the configured companion device
    Show,
    /// Configure the companion device
    Set(CompanionSetArgs),
    /// Remove the companion device
    Clear,
    /// Wake the companion device now
    Wake,
    /// Wake the companion whenever the TV is powered on
    AutoWake {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Debug, Args)]
pub struct CompanionSetArgs {
    #[command(subcommand)]
    pub kind: CompanionKind,
}

#[derive(Debug, Subcommand)]
pub enum CompanionKind {
    /// Wake-on-LAN magic packet
    Wol {
        /// Hardware address of the device
        #[arg(long)]
        mac: String,
        /// Subnet broadcast address
        #[arg(long)]
        broadcast: Option<String>,
    },
    /// Android debug bridge wakeup keyevent
    Bridge {
        #[arg(long)]
        ip: String,
        #[arg(long, default_value_t = 5555)]
        port: u16,
    },
    /// Remote-control protocol PowerOn keypress (port 8060)
    Rcp {
        #[arg(long)]
        ip: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

// ── Actions ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ActionArgs {
    /// Action id (volume_up, home, power_off, ...); omit to list
    pub id: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the device configuration (credentials masked)
    Show,
    /// Print the effective runtime settings
    Settings,
    /// Print the configuration file paths
    Path,
    /// List stored profiles
    Profiles,
    /// Switch the active profile
    Use {
        /// Profile name
        name: String,
    },
    /// List shortcut bindings
    Shortcuts,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
