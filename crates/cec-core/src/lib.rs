//! # cec-core
//!
//! Shared library for the CEC bridge containing the CEC notification decoder,
//! opcode dispatcher, vendor sub-protocol handling, the consensus window used
//! to discover the TV vendor, the remote key table, and the media-center
//! event-server packet codec.
//!
//! It has zero dependencies on OS APIs, sockets, or the CEC bus service.
//! Everything here is a pure transform that can be unit-tested in isolation.
//!
//! # Architecture overview (for beginners)
//!
//! HDMI-CEC (Consumer Electronics Control) is a slow, single-wire command bus
//! that rides along the HDMI cable.  When you press "Play" on the TV remote,
//! the TV sends a small CEC frame to the device currently showing its picture.
//! The bridge receives those frames and turns them into button presses for a
//! media-center application that listens on its event-server UDP port.
//!
//! This crate (`cec-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How CEC frames and event-server packets look as bytes:
//!   opcode and operand constants, logical/physical addresses, vendor IDs,
//!   the decoder for raw bus notifications, and the event-server codec.
//!
//! - **`domain`** – Pure decision logic.  Given a decoded message and the
//!   negotiated [`DeviceIdentity`], [`dispatch`] returns the ordered list of
//!   replies to put on the bus and events to send to the media center.
//!
//! - **`keymap`** – The table translating CEC remote key codes into the
//!   media center's named buttons.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `cec_core::BusMessage` instead of `cec_core::protocol::codec::BusMessage`.
pub use domain::consensus::{ConsensusWindow, Observation};
pub use domain::dispatch::{dispatch, AppEvent, BusCommand, Outbound};
pub use domain::identity::DeviceIdentity;
pub use keymap::lookup_button;
pub use protocol::address::{LogicalAddress, PhysicalAddress};
pub use protocol::codec::{decode_notification, BusMessage, DecodeError, NotifyReason};
pub use protocol::opcodes::CecOpcode;
pub use protocol::vendor::VendorId;
