use thiserror::Error;

/// Top-level error type for the `tvctl-api` crate.
///
/// Covers every failure mode across the wire layer: the SSAP control
/// socket, the pointer input socket, and the out-of-band wake paths.
/// `tvctl-core` classifies these into the session error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// WebSocket handshake failed (refused, DNS failure, TLS alert, etc.)
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// TLS client configuration could not be built.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The device sent a close frame.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    /// The stream ended without a close frame.
    #[error("Connection closed by device")]
    ConnectionClosed,

    /// Reading from the socket failed.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Writing to the socket failed.
    #[error("Send failed: {0}")]
    Send(String),

    /// Local socket or process I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Addressing ──────────────────────────────────────────────────
    /// Host / port / broadcast address could not be parsed.
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Protocol ────────────────────────────────────────────────────
    /// Outbound frame could not be encoded.
    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    /// A reply was missing a field the protocol requires.
    #[error("Unexpected reply: {message}")]
    UnexpectedReply { message: String },

    /// The device answered a request with an error reply.
    #[error("Device error: {message}")]
    Device { message: String },

    /// The device refused a registration request.
    #[error("Registration rejected: {message}")]
    Rejected { message: String },

    // ── Wake ────────────────────────────────────────────────────────
    /// Hardware address is not exactly 6 octets.
    #[error("Invalid hardware address: {0}")]
    InvalidHardwareAddress(String),

    /// Debug-bridge command failed or the bridge is not installed.
    #[error("Debug bridge error: {message}")]
    Bridge { message: String },

    /// The remote-control-protocol endpoint could not be reached.
    #[error("Remote control endpoint {host} unreachable: {message}")]
    RemoteControl { host: String, message: String },
}

impl Error {
    /// Returns `true` if the error was raised while the socket was
    /// already established, i.e. the live connection is gone.
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            Self::WebSocketClosed { .. }
                | Self::ConnectionClosed
                | Self::ConnectionLost(_)
                | Self::Send(_)
        )
    }

    /// Returns `true` for failures to establish a socket in the first place.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            Self::WebSocketConnect(_)
                | Self::Tls(_)
                | Self::Io(_)
                | Self::InvalidAddress { .. }
                | Self::InvalidUrl(_)
        )
    }
}
