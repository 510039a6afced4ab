// ── Action catalog ──
//
// Stable action ids shared by shortcut bindings, the REPL, and
// `tvctl action`.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A user-facing action that maps onto one session manager operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Back,
    Home,
    VolumeUp,
    VolumeDown,
    Mute,
    Unmute,
    PowerOn,
    PowerOff,
    #[strum(to_string = "wake_companion", serialize = "wake_streaming_device")]
    WakeCompanion,
}

impl Action {
    /// Pointer-input button name for navigation actions.
    pub fn button(self) -> Option<&'static str> {
        match self {
            Self::Up => Some("UP"),
            Self::Down => Some("DOWN"),
            Self::Left => Some("LEFT"),
            Self::Right => Some("RIGHT"),
            Self::Enter => Some("ENTER"),
            Self::Back => Some("BACK"),
            Self::Home => Some("HOME"),
            Self::VolumeUp
            | Self::VolumeDown
            | Self::Mute
            | Self::Unmute
            | Self::PowerOn
            | Self::PowerOff
            | Self::WakeCompanion => None,
        }
    }
}
