//! In-process CEC bus service for running the bridge without HDMI hardware.
//!
//! Address and vendor queries are answered from configuration, outbound
//! frames are written to the log, and inbound frames are typed on stdin in
//! the hex notation bus monitors print:
//!
//! ```text
//! 04:44:01      TV -> playback 1, UserControlPressed "up"
//! 0f:86:10:00   TV -> broadcast, SetStreamPath 1.0.0.0
//! ```
//!
//! Each line is packed into the same five-word notification a hardware
//! service delivers, so the bridge exercises its real decode path.

use std::sync::Mutex;

use async_trait::async_trait;
use cec_core::protocol::codec::{encode_notification, MAX_PAYLOAD_LEN};
use cec_core::protocol::opcodes::MenuState;
use cec_core::{BusMessage, CecOpcode, LogicalAddress, PhysicalAddress, VendorId};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::ports::{BusError, CecService};

/// Error returned when a typed frame cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameParseError {
    #[error("empty frame")]
    Empty,

    #[error("{0:?} is not a hex byte")]
    BadByte(String),

    #[error("frame carries {0} payload bytes, more than one CEC frame holds")]
    TooLong(usize),
}

/// Parses one `cec-client` style frame such as `04:44:01`.
///
/// The first byte is the header block (initiator in the high nibble, follower
/// in the low nibble); the rest is the payload, opcode first.
///
/// # Errors
///
/// Returns a [`FrameParseError`] for empty lines, non-hex bytes, and frames
/// longer than a CEC frame.
pub fn parse_frame(line: &str) -> Result<BusMessage, FrameParseError> {
    let mut bytes = Vec::new();
    for part in line.trim().split(':') {
        if part.is_empty() || part.len() > 2 {
            return Err(if line.trim().is_empty() {
                FrameParseError::Empty
            } else {
                FrameParseError::BadByte(part.to_string())
            });
        }
        let byte = u8::from_str_radix(part, 16).map_err(|_| FrameParseError::BadByte(part.to_string()))?;
        bytes.push(byte);
    }

    let (&header, payload) = bytes.split_first().ok_or(FrameParseError::Empty)?;
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(FrameParseError::TooLong(payload.len()));
    }
    BusMessage::received(
        LogicalAddress::from_nibble(header >> 4),
        LogicalAddress::from_nibble(header),
        payload,
    )
    .map_err(|_| FrameParseError::TooLong(payload.len()))
}

/// Reads frames from `reader` line by line and delivers them as raw
/// notifications on `tx`.
///
/// Blank lines and lines starting with `#` are skipped; unparsable lines are
/// logged and skipped.  Returns at end of input or when the receiver is gone.
pub async fn pump_frames<R>(reader: R, tx: mpsc::Sender<[u32; 5]>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("frame input closed");
                return;
            }
            Err(e) => {
                warn!("reading frame input failed: {e}");
                return;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_frame(trimmed) {
            Ok(msg) => {
                if tx.send(encode_notification(&msg)).await.is_err() {
                    return;
                }
            }
            Err(e) => warn!("ignoring frame {trimmed:?}: {e}"),
        }
    }
}

/// A [`CecService`] that answers from configuration and logs what it sends.
pub struct SimulatedBus {
    physical_address: PhysicalAddress,
    logical_address: LogicalAddress,
    tv_vendor_id: VendorId,
    own_vendor_id: Mutex<VendorId>,
    osd_name: Mutex<String>,
}

impl SimulatedBus {
    pub fn new(
        physical_address: PhysicalAddress,
        logical_address: LogicalAddress,
        tv_vendor_id: VendorId,
    ) -> Self {
        Self {
            physical_address,
            logical_address,
            tv_vendor_id,
            own_vendor_id: Mutex::new(VendorId::UNKNOWN),
            osd_name: Mutex::new(String::new()),
        }
    }

    /// Vendor id last set through [`CecService::set_vendor_id`].
    pub fn own_vendor_id(&self) -> VendorId {
        self.own_vendor_id.lock().map(|v| *v).unwrap_or(VendorId::UNKNOWN)
    }

    /// OSD name last set through [`CecService::set_osd_name`].
    pub fn osd_name(&self) -> String {
        self.osd_name.lock().map(|n| n.clone()).unwrap_or_default()
    }

    fn transmit(&self, destination: LogicalAddress, payload: &[u8], is_reply: bool) {
        let mut frame = format!("{:x}{:x}", self.logical_address as u8, destination as u8);
        for b in payload {
            frame.push_str(&format!(":{b:02x}"));
        }
        info!(is_reply, "TX {frame}");
    }
}

#[async_trait]
impl CecService for SimulatedBus {
    async fn register_opcode(&self, opcode: CecOpcode) -> Result<(), BusError> {
        debug!(?opcode, "registered opcode");
        Ok(())
    }

    async fn physical_address(&self) -> Result<PhysicalAddress, BusError> {
        Ok(self.physical_address)
    }

    async fn logical_address(&self) -> Result<LogicalAddress, BusError> {
        Ok(self.logical_address)
    }

    async fn allocate_logical_address(&self) -> Result<(), BusError> {
        Ok(())
    }

    async fn vendor_id(&self, address: LogicalAddress) -> Result<VendorId, BusError> {
        Ok(if address == LogicalAddress::Tv {
            self.tv_vendor_id
        } else {
            VendorId::NO_DEVICE
        })
    }

    async fn set_vendor_id(&self, vendor: VendorId) -> Result<(), BusError> {
        let mut own = self
            .own_vendor_id
            .lock()
            .map_err(|_| BusError::Unavailable("vendor state poisoned".to_string()))?;
        *own = vendor;
        info!(%vendor, "vendor id set");
        Ok(())
    }

    async fn set_osd_name(&self, name: &str) -> Result<(), BusError> {
        let mut osd = self
            .osd_name
            .lock()
            .map_err(|_| BusError::Unavailable("OSD state poisoned".to_string()))?;
        *osd = name.to_string();
        info!(name, "OSD name set");
        Ok(())
    }

    async fn send_message(
        &self,
        destination: LogicalAddress,
        payload: &[u8],
        is_reply: bool,
    ) -> Result<(), BusError> {
        self.transmit(destination, payload, is_reply);
        Ok(())
    }

    async fn send_active_source(
        &self,
        physical_address: PhysicalAddress,
        is_reply: bool,
    ) -> Result<(), BusError> {
        let [hi, lo] = physical_address.to_be_bytes();
        self.transmit(
            LogicalAddress::BROADCAST,
            &[CecOpcode::ActiveSource as u8, hi, lo],
            is_reply,
        );
        Ok(())
    }

    async fn send_image_view_on(
        &self,
        destination: LogicalAddress,
        is_reply: bool,
    ) -> Result<(), BusError> {
        self.transmit(destination, &[CecOpcode::ImageViewOn as u8], is_reply);
        Ok(())
    }

    async fn send_menu_status(
        &self,
        destination: LogicalAddress,
        state: MenuState,
        is_reply: bool,
    ) -> Result<(), BusError> {
        self.transmit(destination, &[CecOpcode::MenuStatus as u8, state as u8], is_reply);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
