//! SSAP frame types.
//!
//! Outbound frames are either `register` (pairing / authentication) or
//! `request` (a command against an `ssap://` URI). Inbound frames are
//! parsed leniently: unknown `type` values map to [`InboundKind::Other`]
//! and every field except `type` is optional.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

// ── Outbound ─────────────────────────────────────────────────────────

/// A frame sent to the TV.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outbound {
    Register {
        id: String,
        payload: RegisterPayload,
    },
    Request {
        id: String,
        uri: String,
        payload: Value,
    },
}

impl Outbound {
    pub fn id(&self) -> &str {
        match self {
            Self::Register { id, .. } | Self::Request { id, .. } => id,
        }
    }

    /// Serialize to the JSON text carried in a WebSocket text frame.
    pub fn to_text(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Body of a `register` frame.
#[derive(Clone, Serialize)]
pub struct RegisterPayload {
    #[serde(rename = "forcePairing")]
    pub force_pairing: bool,

    #[serde(rename = "pairingType")]
    pub pairing_type: String,

    pub manifest: Value,

    /// Previously issued credential, if any.
    #[serde(rename = "client-key", skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
}

impl fmt::Debug for RegisterPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterPayload")
            .field("force_pairing", &self.force_pairing)
            .field("pairing_type", &self.pairing_type)
            .field("client_key", &self.client_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

// ── Inbound ──────────────────────────────────────────────────────────

/// The `type` discriminator of an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InboundKind {
    Registered,
    Response,
    Error,
    #[serde(other)]
    Other,
}

/// A frame received from the TV.
#[derive(Debug, Clone, Deserialize)]
pub struct Inbound {
    #[serde(rename = "type")]
    pub kind: InboundKind,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub payload: Value,

    /// Human-readable error text on `error` frames.
    #[serde(default)]
    pub error: Option<String>,
}

impl Inbound {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The credential carried by a `registered` frame.
    pub fn client_key(&self) -> Option<&str> {
        self.payload.get("client-key").and_then(Value::as_str)
    }

    /// The TV is showing its on-screen pairing prompt.
    pub fn is_pairing_prompt(&self) -> bool {
        self.kind == InboundKind::Response
            && self.payload.get("pairingType").and_then(Value::as_str) == Some("PROMPT")
    }

    /// Error text if this frame reports a failure: either an `error`
    /// frame or a response whose payload says `returnValue: false`.
    pub fn failure(&self) -> Option<String> {
        if self.kind == InboundKind::Error {
            return Some(
                self.error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_owned()),
            );
        }
        if self.payload.get("returnValue").and_then(Value::as_bool) == Some(false) {
            let text = self
                .payload
                .get("errorText")
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            return Some(text.to_owned());
        }
        None
    }
}

// ── Pointer input ────────────────────────────────────────────────────

/// Encode a button press for the pointer input socket. Button names are
/// upper-cased (`enter` → `ENTER`).
pub fn button_frame(name: &str) -> String {
    format!("type:button\nname:{}\n\n", name.trim().to_uppercase())
}
