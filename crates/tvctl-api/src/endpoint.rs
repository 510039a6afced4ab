// Control endpoint addressing.
//
// webOS exposes SSAP on ws://<host>:3000 and wss://<host>:3001. The
// configured address may override the port with a `:port` suffix.

use std::fmt;

use url::Url;

use crate::error::Error;

/// Plain-text SSAP port.
pub const PLAIN_PORT: u16 = 3000;

/// TLS SSAP port (self-signed certificate).
pub const SECURE_PORT: u16 = 3001;

/// Where the control socket lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    secure: bool,
}

impl Endpoint {
    /// Build an endpoint from a profile address (`192.168.1.20`,
    /// `tv.lan`, `192.168.1.20:3101`, `fe80::1`).
    pub fn new(address: &str, secure: bool) -> Result<Self, Error> {
        let address = address.trim();
        let invalid = |reason: &str| Error::InvalidAddress {
            address: address.to_owned(),
            reason: reason.to_owned(),
        };

        let parse_port = |raw: &str| raw.parse::<u16>().map_err(|_| invalid("bad port"));

        let (host, port) = if let Some(rest) = address.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| invalid("unclosed bracket"))?;
            match tail.strip_prefix(':') {
                Some(port) => (host, Some(parse_port(port)?)),
                None if tail.is_empty() => (host, None),
                None => return Err(invalid("bad port")),
            }
        } else {
            match address.rsplit_once(':') {
                Some((host, port)) if !host.contains(':') => (host, Some(parse_port(port)?)),
                _ => (address, None),
            }
        };

        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        if host.contains('/') || host.contains(char::is_whitespace) {
            return Err(invalid("not a host name"));
        }

        let default_port = if secure { SECURE_PORT } else { PLAIN_PORT };
        Ok(Self {
            host: host.to_owned(),
            port: port.unwrap_or(default_port),
            secure,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// The WebSocket URL for this endpoint.
    pub fn url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&self.to_string())?)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.secure { "wss" } else { "ws" };
        if self.host.contains(':') {
            write!(f, "{scheme}://[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{scheme}://{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_ports_follow_security() {
        let plain = Endpoint::new("192.168.1.20", false).unwrap();
        assert_eq!(plain.to_string(), "ws://192.168.1.20:3000");

        let secure = Endpoint::new("192.168.1.20", true).unwrap();
        assert_eq!(secure.to_string(), "wss://192.168.1.20:3001");
        assert_eq!(secure.url().unwrap().port(), Some(3001));
    }

    #[test]
    fn explicit_port_overrides_default() {
        let ep = Endpoint::new("127.0.0.1:40123", false).unwrap();
        assert_eq!(ep.host(), "127.0.0.1");
        assert_eq!(ep.port(), 40123);
        assert_eq!(ep.to_string(), "ws://127.0.0.1:40123");
    }

    #[test]
    fn ipv6_hosts_are_bracketed() {
        let ep = Endpoint::new("fe80::1", true).unwrap();
        assert_eq!(ep.to_string(), "wss://[fe80::1]:3001");

        let ep = Endpoint::new("[fe80::1]:3101", true).unwrap();
        assert_eq!(ep.host(), "fe80::1");
        assert_eq!(ep.port(), 3101);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Endpoint::new("", true).is_err());
        assert!(Endpoint::new("tv:abc", true).is_err());
        assert!(Endpoint::new("http://tv/", true).is_err());
    }
}
