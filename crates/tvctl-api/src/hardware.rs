// ── Hardware address ──
//
// 48-bit MAC address used for Wake-on-LAN. Parses the common textual
// spellings and always renders as upper-case, colon-separated octets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Number of octets in a hardware address.
pub const OCTETS: usize = 6;

/// A validated 6-octet hardware (MAC) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HardwareAddress([u8; OCTETS]);

impl HardwareAddress {
    pub const fn new(octets: [u8; OCTETS]) -> Self {
        Self(octets)
    }

    /// Build from a raw byte slice. Anything other than exactly six
    /// octets is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        <[u8; OCTETS]>::try_from(bytes).map(Self).map_err(|_| {
            Error::InvalidHardwareAddress(format!(
                "expected {OCTETS} octets, got {}",
                bytes.len()
            ))
        })
    }

    pub fn octets(&self) -> [u8; OCTETS] {
        self.0
    }
}

impl FromStr for HardwareAddress {
    type Err = Error;

    /// Accepts `AA:BB:CC:DD:EE:FF`, `aa-bb-cc-dd-ee-ff`,
    /// `AA BB CC DD EE FF` and bare `AABBCCDDEEFF`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidHardwareAddress(s.trim().to_owned());

        let digits: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | ' '))
            .collect();

        if digits.len() != OCTETS * 2 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut octets = [0_u8; OCTETS];
        for (slot, start) in octets.iter_mut().zip((0..digits.len()).step_by(2)) {
            *slot = u8::from_str_radix(&digits[start..start + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{octet:02X}")?;
        }
        Ok(())
    }
}

impl Serialize for HardwareAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HardwareAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const EXPECTED: [u8; 6] = [0xA8, 0x23, 0xFE, 0x01, 0x9B, 0xC4];

    #[test]
    fn parses_common_spellings() {
        for input in [
            "A8:23:FE:01:9B:C4",
            "a8-23-fe-01-9b-c4",
            "A8 23 FE 01 9B C4",
            "a823fe019bc4",
            "  a8:23:fe:01:9b:c4\n",
        ] {
            let parsed: HardwareAddress = input.parse().unwrap();
            assert_eq!(parsed.octets(), EXPECTED, "input {input:?}");
        }
    }

    #[test]
    fn renders_upper_case_with_colons() {
        let mac = HardwareAddress::new(EXPECTED);
        assert_eq!(mac.to_string(), "A8:23:FE:01:9B:C4");
    }

    #[test]
    fn rejects_wrong_length_and_non_hex() {
        for input in ["", "A8:23:FE:01:9B", "A8:23:FE:01:9B:C4:00", "G8:23:FE:01:9B:C4", "A8:23:FE:01:9B:C"] {
            assert!(
                matches!(input.parse::<HardwareAddress>(), Err(Error::InvalidHardwareAddress(_))),
                "input {input:?} should be rejected"
            );
        }
    }

    #[test]
    fn from_bytes_requires_six_octets() {
        assert!(HardwareAddress::from_bytes(&EXPECTED).is_ok());
        assert!(matches!(
            HardwareAddress::from_bytes(&EXPECTED[..5]),
            Err(Error::InvalidHardwareAddress(_))
        ));
        assert!(matches!(
            HardwareAddress::from_bytes(&[0; 7]),
            Err(Error::InvalidHardwareAddress(_))
        ));
    }

    #[test]
    fn serde_uses_normalized_string() {
        let mac: HardwareAddress = serde_json::from_str("\"a8-23-fe-01-9b-c4\"").unwrap();
        assert_eq!(serde_json::to_string(&mac).unwrap(), "\"A8:23:FE:01:9B:C4\"");
        assert!(serde_json::from_str::<HardwareAddress>("\"nope\"").is_err());
    }
}
