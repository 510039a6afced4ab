//! Out-of-band wake signals.
//!
//! None of these need a live session: Wake-on-LAN is a broadcast UDP
//! datagram, the debug bridge is driven through the `adb` binary, and the
//! remote-control protocol is a single HTTP request. Every call is
//! stateless and safe to run concurrently.

pub mod bridge;
pub mod ecp;
pub mod magic;

pub use bridge::{DEFAULT_BRIDGE_PORT, DebugBridge};
pub use ecp::{ECP_PORT, RemoteControl};
pub use magic::{DEFAULT_WOL_PORT, MAGIC_PACKET_LEN, WakeOnLan, magic_packet, parse_broadcast};
