//! 24-bit IEEE OUI vendor identifiers as exchanged by `DeviceVendorId`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A CEC vendor identifier.
///
/// Values above 24 bits never appear on the wire; [`VendorId::is_valid_reading`]
/// rejects them when they come back from a bus query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(pub u32);

impl VendorId {
    /// Reported by the bus service while the vendor is not known.
    pub const UNKNOWN: VendorId = VendorId(0x000000);
    /// Reported by the bus service when no device answers at the address.
    pub const NO_DEVICE: VendorId = VendorId(0xFFFFFF);

    pub const LG: VendorId = VendorId(0x00E091);
    /// Some LG firmware reports this instead of [`VendorId::LG`].
    pub const LG_QUIRK: VendorId = VendorId(0x00FFFF);
    pub const BROADCOM: VendorId = VendorId(0x18C086);

    /// Returns `true` for LG and its quirk alias.
    pub fn is_lg_family(self) -> bool {
        self == Self::LG || self == Self::LG_QUIRK
    }

    /// Whether a probe reading can take part in the consensus vote.
    ///
    /// Anything above zero and within 24 bits counts.
    pub fn is_valid_reading(self) -> bool {
        self != Self::UNKNOWN && self.0 <= Self::NO_DEVICE.0
    }

    /// The three big-endian bytes carried after the `DeviceVendorId` opcode.
    pub fn to_be_bytes(self) -> [u8; 3] {
        [
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        ]
    }

    /// Reads a vendor identifier from three big-endian bytes.
    pub fn from_be_bytes(bytes: [u8; 3]) -> Self {
        VendorId(((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32)
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06x}", self.0)
    }
}
