//! The negotiated identity of this device on the bus.

use crate::protocol::address::{LogicalAddress, PhysicalAddress};
use crate::protocol::vendor::VendorId;

/// Everything the dispatcher needs to know about this device.
///
/// Built once when negotiation finishes and never mutated afterwards; the
/// dispatcher only ever sees it through a shared reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    physical_address: PhysicalAddress,
    logical_address: LogicalAddress,
    own_vendor_id: VendorId,
    tv_vendor_id: VendorId,
    osd_name: String,
}

impl DeviceIdentity {
    /// Creates the identity, choosing this device's own vendor from the TV's.
    ///
    /// An LG TV only speaks its SimpLink sub-protocol to devices announcing
    /// LG as their vendor, so the bridge mirrors LG (quirk alias included)
    /// and falls back to [`VendorId::BROADCOM`] for every other TV.
    pub fn new(
        physical_address: PhysicalAddress,
        logical_address: LogicalAddress,
        tv_vendor_id: VendorId,
        osd_name: impl Into<String>,
    ) -> Self {
        Self {
            physical_address,
            logical_address,
            own_vendor_id: Self::own_vendor_for(tv_vendor_id),
            tv_vendor_id,
            osd_name: osd_name.into(),
        }
    }

    /// The vendor this device announces when paired with a TV of `tv_vendor_id`.
    pub fn own_vendor_for(tv_vendor_id: VendorId) -> VendorId {
        if tv_vendor_id.is_lg_family() {
            VendorId::LG
        } else {
            VendorId::BROADCOM
        }
    }

    pub fn physical_address(&self) -> PhysicalAddress {
        self.physical_address
    }

    pub fn logical_address(&self) -> LogicalAddress {
        self.logical_address
    }

    pub fn own_vendor_id(&self) -> VendorId {
        self.own_vendor_id
    }

    pub fn tv_vendor_id(&self) -> VendorId {
        self.tv_vendor_id
    }

    /// Name shown by the TV in its source list.
    pub fn osd_name(&self) -> &str {
        &self.osd_name
    }

    /// Whether negotiation must broadcast `DeviceVendorId` after adopting the
    /// vendor.  Only the LG sub-protocol expects the announcement.
    pub fn announces_vendor(&self) -> bool {
        self.own_vendor_id == VendorId::LG
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(tv: VendorId) -> DeviceIdentity {
        DeviceIdentity::new(
            PhysicalAddress(0x1000),
            LogicalAddress::PlaybackDevice1,
            tv,
            "XBMC",
        )
    }

    #[test]
    fn test_lg_tv_selects_lg_vendor() {
        let id = identity(VendorId::LG);
        assert_eq!(id.own_vendor_id(), VendorId::LG);
        assert!(id.announces_vendor());
    }

    #[test]
    fn test_lg_quirk_tv_selects_canonical_lg_vendor() {
        let id = identity(VendorId::LG_QUIRK);
        assert_eq!(id.own_vendor_id(), VendorId::LG);
        assert_eq!(id.tv_vendor_id(), VendorId::LG_QUIRK);
    }

    #[test]
    fn test_other_tv_selects_default_vendor_without_announcement() {
        let id = identity(VendorId(0x00903E));
        assert_eq!(id.own_vendor_id(), VendorId::BROADCOM);
        assert!(!id.announces_vendor());
    }

    #[test]
    fn test_accessors_return_constructor_values() {
        let id = identity(VendorId::LG);
        assert_eq!(id.physical_address(), PhysicalAddress(0x1000));
        assert_eq!(id.logical_address(), LogicalAddress::PlaybackDevice1);
        assert_eq!(id.osd_name(), "XBMC");
    }
}
