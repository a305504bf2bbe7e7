//! Traits for the two external collaborators of the bridge.
//!
//! The use cases in this layer talk to the CEC bus and to the media center
//! only through these traits.  `main.rs` injects the concrete adapters; tests
//! inject recording doubles or `mockall` mocks.

use async_trait::async_trait;
use cec_core::protocol::eventserver::{EventServerError, IconType};
use cec_core::protocol::opcodes::MenuState;
use cec_core::{CecOpcode, LogicalAddress, PhysicalAddress, VendorId};
use thiserror::Error;

/// Failure reported by the CEC bus service.
#[derive(Debug, Error)]
pub enum BusError {
    /// The service could not be reached at all.
    #[error("bus service unavailable: {0}")]
    Unavailable(String),

    /// The service rejected a request with a nonzero status.
    #[error("{operation} failed with status {status}")]
    Failed { operation: &'static str, status: i32 },
}

/// Failure while talking to the media-center event server.
#[derive(Debug, Error)]
pub enum EventSinkError {
    #[error("event server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode event packet: {0}")]
    Encode(#[from] EventServerError),
}

/// The CEC bus service: address management, vendor identity and frame
/// transmission.
///
/// Every method maps to one request of the underlying service.  `is_reply`
/// marks a frame as the answer to the message currently being handled.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CecService: Send + Sync {
    /// Asks the service to forward frames carrying `opcode` to the bridge.
    async fn register_opcode(&self, opcode: CecOpcode) -> Result<(), BusError>;

    async fn physical_address(&self) -> Result<PhysicalAddress, BusError>;

    async fn logical_address(&self) -> Result<LogicalAddress, BusError>;

    /// Starts logical address allocation; completion is observed through
    /// [`CecService::logical_address`].
    async fn allocate_logical_address(&self) -> Result<(), BusError>;

    /// Queries the vendor id last reported by the device at `address`.
    async fn vendor_id(&self, address: LogicalAddress) -> Result<VendorId, BusError>;

    /// Sets the vendor id the service reports for this device.
    async fn set_vendor_id(&self, vendor: VendorId) -> Result<(), BusError>;

    async fn set_osd_name(&self, name: &str) -> Result<(), BusError>;

    /// Sends a raw frame whose first byte is the opcode.
    async fn send_message(
        &self,
        destination: LogicalAddress,
        payload: &[u8],
        is_reply: bool,
    ) -> Result<(), BusError>;

    async fn send_active_source(
        &self,
        physical_address: PhysicalAddress,
        is_reply: bool,
    ) -> Result<(), BusError>;

    async fn send_image_view_on(
        &self,
        destination: LogicalAddress,
        is_reply: bool,
    ) -> Result<(), BusError>;

    async fn send_menu_status(
        &self,
        destination: LogicalAddress,
        state: MenuState,
        is_reply: bool,
    ) -> Result<(), BusError>;
}

/// The media center's remote-event interface.
#[async_trait]
pub trait RemoteEventSink: Send + Sync {
    /// Presses `button` on the bridge's virtual remote.
    async fn send_button(&self, button: &str) -> Result<(), EventSinkError>;

    /// Keeps the client registered and wakes the media center's screensaver.
    async fn send_keep_alive(&self) -> Result<(), EventSinkError>;

    /// Registers the bridge with the media center under `application_name`.
    async fn send_hello(&self, application_name: &str, icon: IconType) -> Result<(), EventSinkError>;

    /// Unregisters the bridge.
    async fn send_bye(&self) -> Result<(), EventSinkError>;
}
