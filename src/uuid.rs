//! Bluetooth identifier parsing.
//!
//! Accepts the same shapes CoreBluetooth's `CBUUID(string:)` does: a 16-bit
//! or 32-bit assigned number written as 4 or 8 hex digits, or a full
//! hyphenated 128-bit UUID.

use ::uuid::Uuid;

use crate::{Error, Result};

/// `00000000-0000-1000-8000-00805F9B34FB`
pub const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5f9b_34fb;

const SHORT_MASK: u128 = 0xffff_ffff_0000_0000_0000_0000_0000_0000;

pub trait ShortUuid {
    fn from_u16(short: u16) -> Uuid;

    fn from_u32(short: u32) -> Uuid;

    /// Shortest form that round-trips through [`parse_identifier`].
    fn to_short_string(&self) -> String;
}

impl ShortUuid for Uuid {
    fn from_u16(short: u16) -> Uuid {
        Self::from_u32(short as u32)
    }

    fn from_u32(short: u32) -> Uuid {
        Uuid::from_u128(BLUETOOTH_BASE_UUID | ((short as u128) << 96))
    }

    fn to_short_string(&self) -> String {
        let value = self.as_u128();
        if value & !SHORT_MASK != BLUETOOTH_BASE_UUID {
            return self.hyphenated().to_string().to_uppercase();
        }
        let short = (value >> 96) as u32;
        if short <= u16::MAX as u32 {
            format!("{short:04X}")
        } else {
            format!("{short:08X}")
        }
    }
}

pub fn parse_identifier(input: &str) -> Result<Uuid> {
    let is_hex = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit());

    match input.len() {
        4 | 8 if is_hex(input) => {
            let short = u32::from_str_radix(input, 16)
                .map_err(|_| Error::InvalidIdentifier(input.to_string()))?;
            Ok(Uuid::from_u32(short))
        }
        36 => {
            let groups: Vec<&str> = input.split('-').collect();
            let shaped = groups.len() == 5
                && groups
                    .iter()
                    .zip([8, 4, 4, 4, 12])
                    .all(|(group, len)| group.len() == len && is_hex(group));
            if !shaped {
                return Err(Error::InvalidIdentifier(input.to_string()));
            }
            Uuid::parse_str(input).map_err(|_| Error::InvalidIdentifier(input.to_string()))
        }
        _ => Err(Error::InvalidIdentifier(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_uuid() {
        let uuid = parse_identifier("12345678-1234-5678-1234-56789abcdef0").unwrap();
        assert_eq!(uuid.as_u128(), 0x12345678_1234_5678_1234_56789abcdef0);
    }

    #[test]
    fn expands_short_identifiers() {
        let heart_rate = parse_identifier("180D").unwrap();
        assert_eq!(
            heart_rate.hyphenated().to_string(),
            "0000180d-0000-1000-8000-00805f9b34fb"
        );
        let long = parse_identifier("1234ABCD").unwrap();
        assert_eq!(
            long.hyphenated().to_string(),
            "1234abcd-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn short_string_picks_shortest_form() {
        assert_eq!(Uuid::from_u16(0x2902).to_short_string(), "2902");
        assert_eq!(Uuid::from_u32(0x1234_abcd).to_short_string(), "1234ABCD");
        let custom = parse_identifier("6e400001-b5a3-f393-e0a9-e50e24dcca9e").unwrap();
        assert_eq!(
            custom.to_short_string(),
            "6E400001-B5A3-F393-E0A9-E50E24DCCA9E"
        );
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in [
            "not-a-uuid",
            "",
            "18",
            "180G",
            "12345678123456781234567812345678",
            "{12345678-1234-5678-1234-56789abcdef0}",
            "12345678-1234-5678-12345-6789abcdef0",
        ] {
            assert_eq!(
                parse_identifier(bad),
                Err(Error::InvalidIdentifier(bad.to_string())),
                "{bad} should be rejected"
            );
        }
    }
}
