// Wake-on-LAN magic packets.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::Error;
use crate::hardware::{HardwareAddress, OCTETS};

/// Six sync bytes plus sixteen repetitions of the address.
pub const MAGIC_PACKET_LEN: usize = OCTETS + OCTETS * 16;

/// The discard port, where NICs conventionally listen for magic packets.
pub const DEFAULT_WOL_PORT: u16 = 9;

/// Build the 102-byte magic packet for `address`.
pub fn magic_packet(address: &HardwareAddress) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0xFF_u8; MAGIC_PACKET_LEN];
    let octets = address.octets();
    for chunk in packet[OCTETS..].chunks_exact_mut(OCTETS) {
        chunk.copy_from_slice(&octets);
    }
    packet
}

/// Parse a user-supplied broadcast address (`10.0.0.255`).
pub fn parse_broadcast(raw: &str) -> Result<IpAddr, Error> {
    raw.trim()
        .parse()
        .map_err(|e: std::net::AddrParseError| Error::InvalidAddress {
            address: raw.to_owned(),
            reason: e.to_string(),
        })
}

/// Sends magic packets as a single broadcast datagram.
#[derive(Debug, Clone, Copy)]
pub struct WakeOnLan {
    port: u16,
}

impl Default for WakeOnLan {
    fn default() -> Self {
        Self::new(DEFAULT_WOL_PORT)
    }
}

impl WakeOnLan {
    pub const fn new(port: u16) -> Self {
        Self { port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Transmit the magic packet for `address` to `broadcast`, or to the
    /// limited broadcast address `255.255.255.255` when none is given.
    ///
    /// Fire-and-forget: success only means the datagram left the host.
    pub async fn wake(
        &self,
        address: &HardwareAddress,
        broadcast: Option<IpAddr>,
    ) -> Result<(), Error> {
        let target = SocketAddr::new(
            broadcast.unwrap_or(IpAddr::V4(Ipv4Addr::BROADCAST)),
            self.port,
        );
        let bind: SocketAddr = match target {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(bind).await?;
        socket.set_broadcast(true)?;

        let packet = magic_packet(address);
        let sent = socket.send_to(&packet, target).await?;
        if sent != packet.len() {
            return Err(Error::Io(std::io::Error::other(format!(
                "short datagram: {sent} of {} bytes",
                packet.len()
            ))));
        }

        debug!(%address, %target, "magic packet sent");
        Ok(())
    }
}
