//! CEC logical and physical addresses.
//!
//! # Two kinds of address (for beginners)
//!
//! Every CEC device has two addresses:
//!
//! - A **logical address** (4 bits) describing its *role* on the bus: TV,
//!   recorder, tuner, playback device, audio system.  A device claims one at
//!   startup by polling the candidates for its role until one is free.
//!   Address 15 means "unregistered" as an initiator and "broadcast" as a
//!   destination.
//!
//! - A **physical address** (16 bits) describing its *position* in the HDMI
//!   tree, written as four nibbles `a.b.c.d`.  The TV is `0.0.0.0`; a device
//!   on its first HDMI input is `1.0.0.0`; a device behind an AV receiver on
//!   that input's second port is `1.2.0.0`.  The HDMI sink tells the source its
//!   physical address through EDID; until then the address is `f.f.f.f`
//!   ([`PhysicalAddress::CLEAR`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A 4-bit CEC logical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LogicalAddress {
    Tv = 0,
    RecordingDevice1 = 1,
    RecordingDevice2 = 2,
    Tuner1 = 3,
    PlaybackDevice1 = 4,
    AudioSystem = 5,
    Tuner2 = 6,
    Tuner3 = 7,
    PlaybackDevice2 = 8,
    RecordingDevice3 = 9,
    Tuner4 = 10,
    PlaybackDevice3 = 11,
    Reserved1 = 12,
    Reserved2 = 13,
    FreeUse = 14,
    /// Unregistered when used as initiator, broadcast when used as destination.
    Unregistered = 15,
}

impl LogicalAddress {
    /// Destination address that reaches every device on the bus.
    pub const BROADCAST: LogicalAddress = LogicalAddress::Unregistered;

    /// Builds an address from the low nibble of `value`.
    pub fn from_nibble(value: u8) -> Self {
        match value & 0x0F {
            0 => LogicalAddress::Tv,
            1 => LogicalAddress::RecordingDevice1,
            2 => LogicalAddress::RecordingDevice2,
            3 => LogicalAddress::Tuner1,
            4 => LogicalAddress::PlaybackDevice1,
            5 => LogicalAddress::AudioSystem,
            6 => LogicalAddress::Tuner2,
            7 => LogicalAddress::Tuner3,
            8 => LogicalAddress::PlaybackDevice2,
            9 => LogicalAddress::RecordingDevice3,
            10 => LogicalAddress::Tuner4,
            11 => LogicalAddress::PlaybackDevice3,
            12 => LogicalAddress::Reserved1,
            13 => LogicalAddress::Reserved2,
            14 => LogicalAddress::FreeUse,
            _ => LogicalAddress::Unregistered,
        }
    }

    /// Returns `true` for address 15.
    pub fn is_unregistered(self) -> bool {
        self == LogicalAddress::Unregistered
    }
}

impl fmt::Display for LogicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", *self as u8)
    }
}

/// A 16-bit HDMI physical address.
///
/// Serialized in its dotted form (`"1.0.0.0"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhysicalAddress(pub u16);

impl PhysicalAddress {
    /// Sentinel meaning "no address assigned yet" (`f.f.f.f`).
    pub const CLEAR: PhysicalAddress = PhysicalAddress(0xFFFF);

    /// Reads an address from two big-endian bytes, as carried in operands.
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        PhysicalAddress(u16::from_be_bytes(bytes))
    }

    /// Returns the two big-endian bytes used in operands.
    pub fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Returns `true` if this is the [`PhysicalAddress::CLEAR`] sentinel.
    pub fn is_clear(self) -> bool {
        self == Self::CLEAR
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:x}.{:x}.{:x}.{:x}",
            (v >> 12) & 0xF,
            (v >> 8) & 0xF,
            (v >> 4) & 0xF,
            v & 0xF
        )
    }
}

/// Error returned when parsing a dotted physical address fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid physical address {0:?}: expected four hex nibbles like 1.0.0.0")]
pub struct ParsePhysicalAddressError(pub String);

impl FromStr for PhysicalAddress {
    type Err = ParsePhysicalAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePhysicalAddressError(s.to_string());
        let mut value = 0u16;
        let mut count = 0;
        for part in s.trim().split('.') {
            let nibble = u16::from_str_radix(part, 16).map_err(|_| err())?;
            if nibble > 0xF || part.len() != 1 {
                return Err(err());
            }
            value = (value << 4) | nibble;
            count += 1;
        }
        if count != 4 {
            return Err(err());
        }
        Ok(PhysicalAddress(value))
    }
}

impl TryFrom<String> for PhysicalAddress {
    type Error = ParsePhysicalAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PhysicalAddress> for String {
    fn from(address: PhysicalAddress) -> Self {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_nibble_ignores_high_bits() {
        assert_eq!(LogicalAddress::from_nibble(0x04), LogicalAddress::PlaybackDevice1);
        assert_eq!(LogicalAddress::from_nibble(0xF4), LogicalAddress::PlaybackDevice1);
        assert_eq!(LogicalAddress::from_nibble(0x0F), LogicalAddress::Unregistered);
    }

    #[test]
    fn test_from_nibble_round_trips_every_address() {
        for n in 0u8..16 {
            assert_eq!(LogicalAddress::from_nibble(n) as u8, n);
        }
    }

    #[test]
    fn test_broadcast_is_address_fifteen() {
        assert_eq!(LogicalAddress::BROADCAST as u8, 15);
        assert!(LogicalAddress::BROADCAST.is_unregistered());
    }

    #[test]
    fn test_physical_address_display_is_dotted_nibbles() {
        assert_eq!(PhysicalAddress(0x1000).to_string(), "1.0.0.0");
        assert_eq!(PhysicalAddress(0x12AB).to_string(), "1.2.a.b");
        assert_eq!(PhysicalAddress::CLEAR.to_string(), "f.f.f.f");
    }

    #[test]
    fn test_physical_address_parse_valid() {
        assert_eq!("1.0.0.0".parse(), Ok(PhysicalAddress(0x1000)));
        assert_eq!("2.1.0.0".parse(), Ok(PhysicalAddress(0x2100)));
        assert_eq!("f.f.f.f".parse(), Ok(PhysicalAddress::CLEAR));
    }

    #[test]
    fn test_physical_address_parse_rejects_malformed() {
        assert!("1.0.0".parse::<PhysicalAddress>().is_err());
        assert!("1.0.0.0.0".parse::<PhysicalAddress>().is_err());
        assert!("10.0.0.0".parse::<PhysicalAddress>().is_err());
        assert!("g.0.0.0".parse::<PhysicalAddress>().is_err());
    }

    #[test]
    fn test_physical_address_be_bytes() {
        let addr = PhysicalAddress::from_be_bytes([0x21, 0x00]);
        assert_eq!(addr, PhysicalAddress(0x2100));
        assert_eq!(addr.to_be_bytes(), [0x21, 0x00]);
    }
}
