// Socket transport for the control and pointer-input channels.
//
// The session layer only sees the `DeviceTransport` / `DeviceLink` /
// `InputLink` traits, so tests can swap in a scripted device. The real
// implementation is tokio-tungstenite over plain TCP or rustls.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::message::{Inbound, Outbound, button_frame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── Traits ───────────────────────────────────────────────────────────

/// An open SSAP control socket.
#[async_trait]
pub trait DeviceLink: Send {
    /// Write one frame.
    async fn send(&mut self, message: &Outbound) -> Result<(), Error>;

    /// Read the next parseable frame. Pings and non-JSON text are skipped.
    async fn recv(&mut self) -> Result<Inbound, Error>;

    /// Best-effort close; errors are swallowed.
    async fn close(&mut self);
}

/// An open pointer-input socket.
#[async_trait]
pub trait InputLink: Send {
    async fn send_button(&mut self, name: &str) -> Result<(), Error>;

    async fn close(&mut self);
}

/// Factory for control and input sockets.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn open(&self, endpoint: &Endpoint) -> Result<Box<dyn DeviceLink>, Error>;

    /// Open the pointer-input socket at the URL returned by
    /// `getPointerInputSocket`.
    async fn open_input(&self, socket_url: &str) -> Result<Box<dyn InputLink>, Error>;
}

// ── Configuration ────────────────────────────────────────────────────

/// TLS verification mode for `wss://` sockets.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Verify against the bundled web PKI roots.
    System,
    /// Accept any certificate. TVs ship a self-signed certificate, so
    /// this is the only mode that works against real hardware.
    #[default]
    DangerAcceptInvalid,
}

/// Shared transport configuration.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    pub tls: TlsMode,
}

// ── WebSocketTransport ───────────────────────────────────────────────

/// tokio-tungstenite implementation of [`DeviceTransport`].
#[derive(Clone)]
pub struct WebSocketTransport {
    tls: Option<Arc<ClientConfig>>,
}

impl fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("accept_invalid_certs", &self.tls.is_some())
            .finish()
    }
}

impl WebSocketTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        let tls = match config.tls {
            TlsMode::System => None,
            TlsMode::DangerAcceptInvalid => Some(Arc::new(accept_any_certificate_config()?)),
        };
        Ok(Self { tls })
    }

    async fn connect(&self, url: &str) -> Result<WsStream, Error> {
        let connector = if url.starts_with("wss://") {
            self.tls
                .as_ref()
                .map(|config| Connector::Rustls(Arc::clone(config)))
        } else {
            None
        };

        debug!(%url, "opening websocket");
        let (stream, _response) =
            tokio_tungstenite::connect_async_tls_with_config(url, None, false, connector)
                .await
                .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
        Ok(stream)
    }
}

#[async_trait]
impl DeviceTransport for WebSocketTransport {
    async fn open(&self, endpoint: &Endpoint) -> Result<Box<dyn DeviceLink>, Error> {
        let url = endpoint.url()?;
        let stream = self.connect(url.as_str()).await?;
        Ok(Box::new(WebSocketLink { stream }))
    }

    async fn open_input(&self, socket_url: &str) -> Result<Box<dyn InputLink>, Error> {
        let stream = self.connect(socket_url).await?;
        Ok(Box::new(WebSocketInputLink { stream }))
    }
}

// ── Links ────────────────────────────────────────────────────────────

struct WebSocketLink {
    stream: WsStream,
}

#[async_trait]
impl DeviceLink for WebSocketLink {
    async fn send(&mut self, message: &Outbound) -> Result<(), Error> {
        let text = message.to_text()?;
        trace!(id = message.id(), "ssap frame out");
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| Error::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Result<Inbound, Error> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => match Inbound::parse(text.as_str()) {
                    Ok(frame) => {
                        trace!(kind = ?frame.kind, id = ?frame.id, "ssap frame in");
                        return Ok(frame);
                    }
                    Err(e) => debug!(error = %e, "skipping unparseable frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    return Err(match frame {
                        Some(cf) => Error::WebSocketClosed {
                            code: u16::from(cf.code),
                            reason: cf.reason.as_str().to_owned(),
                        },
                        None => Error::ConnectionClosed,
                    });
                }
                // Ping / Pong / Binary -- tungstenite answers pings itself
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(Error::ConnectionLost(e.to_string())),
                None => return Err(Error::ConnectionClosed),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}

struct WebSocketInputLink {
    stream: WsStream,
}

#[async_trait]
impl InputLink for WebSocketInputLink {
    async fn send_button(&mut self, name: &str) -> Result<(), Error> {
        self.stream
            .send(Message::text(button_frame(name)))
            .await
            .map_err(|e| Error::Send(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}

// ── TLS ──────────────────────────────────────────────────────────────

fn accept_any_certificate_config() -> Result<ClientConfig, Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = Arc::new(AcceptAnyCertificate(Arc::clone(&provider)));

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    Ok(config)
}

/// Skips chain and host-name validation but still checks handshake
/// signatures, so the session is encrypted to whoever holds the key.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builds_both_tls_modes() {
        let lenient = WebSocketTransport::new(&TransportConfig::default()).unwrap();
        assert!(lenient.tls.is_some());

        let strict = WebSocketTransport::new(&TransportConfig {
            tls: TlsMode::System,
        })
        .unwrap();
        assert!(strict.tls.is_none());
    }
}
