//! `<Vendor Command>` handling.
//!
//! Vendor commands carry a manufacturer-defined sub-protocol in their
//! operands.  Only LG's SimpLink dialect is understood, and only when this
//! device announced itself as LG during negotiation; the TV never sends it
//! otherwise.

use tracing::{info, warn};

use crate::domain::dispatch::{BusCommand, Outbound};
use crate::domain::identity::DeviceIdentity;
use crate::protocol::codec::BusMessage;
use crate::protocol::opcodes::CecOpcode;

/// SimpLink sub-commands (first operand of `<Vendor Command>`).
pub mod simplink {
    /// Unidentified handshake step; the TV expects a fixed acknowledgement.
    pub const UNKNOWN_01: u8 = 0x01;
    /// Acknowledgement payload for [`UNKNOWN_01`].
    pub const UNKNOWN_02: u8 = 0x02;
    pub const POWER_ON: u8 = 0x03;
    /// The TV wants this device to become the displayed source.
    pub const CONNECT_REQUEST: u8 = 0x04;
    pub const SET_DEVICE_MODE: u8 = 0x05;
    pub const REQUEST_POWER_STATUS: u8 = 0xA0;
}

/// Handles one `<Vendor Command>`, appending any replies to `out`.
pub fn handle(msg: &BusMessage, identity: &DeviceIdentity, out: &mut Vec<Outbound>) {
    if identity.own_vendor_id().is_lg_family() {
        handle_simplink(msg, identity, out);
    } else {
        warn!(tv_vendor = %identity.tv_vendor_id(), "unhandled vendor command: {msg}");
    }
}

fn handle_simplink(msg: &BusMessage, identity: &DeviceIdentity, out: &mut Vec<Outbound>) {
    let vendor_command = CecOpcode::VendorCommand as u8;

    match msg.operand1() {
        simplink::UNKNOWN_01 => {
            out.push(Outbound::raw(
                msg.initiator,
                &[vendor_command, simplink::UNKNOWN_02, simplink::SET_DEVICE_MODE],
                true,
            ));
        }
        simplink::POWER_ON => info!("SimpLink power on not implemented"),
        simplink::CONNECT_REQUEST => {
            // The TV only accepts the source signalling once the device mode
            // is set, so the mode reply goes first.
            info!("SimpLink connect request from {}", msg.initiator);
            out.extend([
                Outbound::raw(
                    msg.initiator,
                    &[vendor_command, simplink::SET_DEVICE_MODE, simplink::CONNECT_REQUEST],
                    true,
                ),
                Outbound::Bus(BusCommand::ImageViewOn {
                    destination: msg.initiator,
                    is_reply: true,
                }),
                Outbound::Bus(BusCommand::ActiveSource {
                    physical_address: identity.physical_address(),
                    is_reply: false,
                }),
                Outbound::menu_activated(msg.initiator),
                Outbound::Bus(BusCommand::SetOsdName(identity.osd_name().to_string())),
            ]);
        }
        simplink::REQUEST_POWER_STATUS => info!("SimpLink power status request not implemented"),
        other => warn!("unhandled SimpLink command 0x{other:02x}: {msg}"),
    }
}
