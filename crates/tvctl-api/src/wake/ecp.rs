// Remote-control-protocol (ECP) wake.
//
// Streaming boxes speaking ECP accept `POST /keypress/PowerOn` on port
// 8060. The box insists on a `Host` header naming its own address.

use std::time::Duration;

use reqwest::header::HOST;
use tracing::debug;

use crate::error::Error;

/// ECP control port.
pub const ECP_PORT: u16 = 8060;

const POWER_ON_PATH: &str = "/keypress/PowerOn";

/// Minimal ECP client that only knows how to power a box on.
#[derive(Debug, Clone)]
pub struct RemoteControl {
    http: reqwest::Client,
}

impl RemoteControl {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tvctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::RemoteControl {
                host: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { http })
    }

    /// Send the power-on keypress to `host` (`192.168.1.40` or
    /// `192.168.1.40:8060`).
    pub async fn power_on(&self, host: &str) -> Result<(), Error> {
        let host = host.trim();
        let (bare_host, authority) = match split_port(host) {
            Some((bare, _)) => (bare, host.to_owned()),
            None => (host, format!("{host}:{ECP_PORT}")),
        };
        if bare_host.is_empty() {
            return Err(Error::InvalidAddress {
                address: host.to_owned(),
                reason: "empty host".into(),
            });
        }

        let unreachable_err = |e: reqwest::Error| Error::RemoteControl {
            host: authority.clone(),
            message: e.to_string(),
        };

        self.http
            .post(format!("http://{authority}{POWER_ON_PATH}"))
            .header(HOST, bare_host)
            .body(Vec::new())
            .send()
            .await
            .map_err(unreachable_err)?
            .error_for_status()
            .map_err(unreachable_err)?;

        debug!(%authority, "remote control power-on sent");
        Ok(())
    }
}

/// Split `host:port` when the suffix is a valid port number.
fn split_port(host: &str) -> Option<(&str, u16)> {
    let (bare, port) = host.rsplit_once(':')?;
    if bare.contains(':') {
        return None;
    }
    port.parse().ok().map(|p| (bare, p))
}
