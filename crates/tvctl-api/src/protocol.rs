//! SSAP exchanges on top of a [`DeviceLink`].
//!
//! Registration is a multi-frame exchange (the TV may first announce an
//! on-screen prompt, then later send `registered`); requests are matched
//! to their reply by `id`, skipping any unrelated frames in between.
//! Timeouts are the caller's business.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::Error;
use crate::manifest::manifest;
use crate::message::{InboundKind, Outbound, RegisterPayload};
use crate::transport::DeviceLink;

/// Correlation id of the one registration frame per connection.
pub const REGISTER_ID: &str = "register_0";

/// Vendor operation identifiers.
pub mod uri {
    pub const VOLUME_UP: &str = "ssap://audio/volumeUp";
    pub const VOLUME_DOWN: &str = "ssap://audio/volumeDown";
    pub const SET_MUTE: &str = "ssap://audio/setMute";
    pub const TURN_OFF: &str = "ssap://system/turnOff";
    pub const CONNECTION_INFO: &str = "ssap://com.webos.service.connectionmanager/getinfo";
    pub const CONNECTION_STATUS: &str = "ssap://com.webos.service.connectionmanager/getStatus";
    pub const POINTER_INPUT_SOCKET: &str =
        "ssap://com.webos.service.networkinput/getPointerInputSocket";
}

// ── Registration ─────────────────────────────────────────────────────

/// Build the `register` frame, attaching `credential` when known.
pub fn register_message(credential: Option<&SecretString>) -> Outbound {
    Outbound::Register {
        id: REGISTER_ID.to_owned(),
        payload: RegisterPayload {
            force_pairing: false,
            pairing_type: "PROMPT".to_owned(),
            manifest: manifest(),
            client_key: credential.map(|c| c.expose_secret().to_owned()),
        },
    }
}

/// What the TV said in response to a `register` frame.
#[derive(Debug)]
pub enum RegistrationEvent {
    /// The TV is showing its approval prompt; `registered` may follow.
    Prompted,
    /// Registration accepted. Carries the issued credential when the
    /// reply includes one.
    Registered(Option<SecretString>),
}

/// Wait for the next registration-relevant frame.
///
/// An `error` frame is a refusal and maps to [`Error::Rejected`].
pub async fn next_registration_event(
    link: &mut dyn DeviceLink,
) -> Result<RegistrationEvent, Error> {
    loop {
        let frame = link.recv().await?;
        match frame.kind {
            InboundKind::Registered => {
                let key = frame.client_key().map(|k| SecretString::from(k.to_owned()));
                return Ok(RegistrationEvent::Registered(key));
            }
            InboundKind::Error => {
                return Err(Error::Rejected {
                    message: frame
                        .failure()
                        .unwrap_or_else(|| "registration refused".to_owned()),
                });
            }
            InboundKind::Response if frame.is_pairing_prompt() => {
                return Ok(RegistrationEvent::Prompted);
            }
            _ => debug!(kind = ?frame.kind, id = ?frame.id, "ignoring frame during registration"),
        }
    }
}

// ── Requests ─────────────────────────────────────────────────────────

/// Build a `request` frame. A missing payload is sent as `{}`.
pub fn request_message(id: &str, uri: &str, payload: Option<Value>) -> Outbound {
    Outbound::Request {
        id: id.to_owned(),
        uri: uri.to_owned(),
        payload: payload.unwrap_or_else(|| json!({})),
    }
}

/// Send a request and wait for the reply carrying the same `id`.
///
/// Returns the reply payload. Error frames and `returnValue: false`
/// replies become [`Error::Device`].
pub async fn request(
    link: &mut dyn DeviceLink,
    id: &str,
    uri: &str,
    payload: Option<Value>,
) -> Result<Value, Error> {
    link.send(&request_message(id, uri, payload)).await?;

    loop {
        let frame = link.recv().await?;
        if frame.id.as_deref() != Some(id) {
            debug!(expected = id, got = ?frame.id, "skipping uncorrelated frame");
            continue;
        }
        if let Some(message) = frame.failure() {
            return Err(Error::Device { message });
        }
        return Ok(frame.payload);
    }
}
