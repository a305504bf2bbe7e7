//! Domain logic for the CEC bridge.
//!
//! This module contains pure decision logic with no infrastructure
//! dependencies.  Nothing here touches the bus or the network: functions take
//! decoded messages and return *descriptions* of what should be sent, and the
//! application layer carries those out.
//!
//! # Why return actions instead of sending them? (for beginners)
//!
//! A CEC handler such as "the TV asked us to become the active source" must
//! emit several frames in a strict order.  If the handler called the bus
//! directly, every test would need a fake bus that records calls.  By
//! returning an ordered `Vec<Outbound>` the handler stays a plain function:
//! tests compare vectors, and the order the caller must respect is explicit
//! in the data.

/// Consensus window used while discovering the TV vendor.
pub mod consensus;

/// Opcode dispatcher: decoded message in, ordered actions out.
pub mod dispatch;

/// The negotiated identity of this device on the bus.
pub mod identity;

/// Vendor-specific `VendorCommand` sub-protocols.
pub mod vendor_command;
