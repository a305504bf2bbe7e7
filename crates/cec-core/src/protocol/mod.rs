//! Protocol module containing CEC constants, addressing, the notification
//! codec, and the event-server packet codec.

pub mod address;
pub mod codec;
pub mod eventserver;
pub mod opcodes;
pub mod vendor;

pub use address::{LogicalAddress, PhysicalAddress};
pub use codec::{decode_notification, encode_notification, BusMessage, DecodeError, NotifyReason};
pub use opcodes::CecOpcode;
pub use vendor::VendorId;
