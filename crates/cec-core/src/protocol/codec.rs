//! Decoder for raw CEC bus notifications.
//!
//! The bus service reports every received frame and every completed
//! transmission through a callback carrying five 32-bit words:
//!
//! ```text
//! word 0: [rc:8][length:8][reason:16]        length counts the header block
//! word 1: [p2:8][p1:8][p0:8][init:4][foll:4]
//! word 2: [p6:8][p5:8][p4:8][p3:8]
//! word 3: [p10:8][p9:8][p8:8][p7:8]
//! word 4: [p14:8][p13:8][p12:8][p11:8]
//! ```
//!
//! Payload bytes are packed little-endian, so `p0` (the opcode) sits just
//! above the header block in word 1.  A frame carries at most 15 payload
//! bytes after its header block.

use std::fmt;

use thiserror::Error;

use crate::protocol::address::LogicalAddress;

/// Capacity of [`BusMessage::payload`].
pub const PAYLOAD_CAPACITY: usize = 16;

/// Largest payload a single CEC frame can carry (16 blocks minus the header).
pub const MAX_PAYLOAD_LEN: usize = 15;

const REASON_MASK: u32 = 0x0000_FFFF;
const LENGTH_SHIFT: u32 = 16;
const RC_SHIFT: u32 = 24;

/// Raw reason bits reported by the bus service.
pub mod reason_bits {
    pub const TX: u16 = 1 << 0;
    pub const RX: u16 = 1 << 1;
    pub const BUTTON_PRESSED: u16 = 1 << 2;
    pub const BUTTON_RELEASE: u16 = 1 << 3;
    pub const REMOTE_PRESSED: u16 = 1 << 4;
    pub const REMOTE_RELEASE: u16 = 1 << 5;
    pub const LOGICAL_ADDR: u16 = 1 << 6;
    pub const TOPOLOGY: u16 = 1 << 7;
    pub const LOGICAL_ADDR_LOST: u16 = 1 << 15;
}

/// Errors produced while decoding a raw notification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The notification reports an address or topology change, not a frame.
    #[error("notification reason 0x{0:04x} carries no message")]
    NotAMessage(u16),

    /// The length field claims more payload than a CEC frame can hold.
    #[error("payload length {length} exceeds the {max}-byte frame limit")]
    LengthOverflow { length: usize, max: usize },
}

/// Why the bus callback fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyReason {
    /// Outcome of a frame this device sent earlier.
    TransmitResult,
    /// A frame addressed to this device (or broadcast) arrived.
    Receive,
    /// Any other notification that still carries a frame, e.g. button events
    /// the bus service pre-digests.
    Other(u16),
}

impl NotifyReason {
    fn from_bits(bits: u16) -> Self {
        match bits {
            reason_bits::TX => NotifyReason::TransmitResult,
            reason_bits::RX => NotifyReason::Receive,
            other => NotifyReason::Other(other),
        }
    }

    /// The raw reason bits.
    pub fn bits(self) -> u16 {
        match self {
            NotifyReason::TransmitResult => reason_bits::TX,
            NotifyReason::Receive => reason_bits::RX,
            NotifyReason::Other(bits) => bits,
        }
    }
}

/// One decoded bus notification.
///
/// `payload[0]` is the opcode when `length >= 1`; bytes past `length` are zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub reason: NotifyReason,
    /// Nonzero when a transmission this device started failed.
    pub return_code: u8,
    /// Number of meaningful bytes in `payload`; never above [`MAX_PAYLOAD_LEN`].
    pub length: usize,
    pub initiator: LogicalAddress,
    pub follower: LogicalAddress,
    pub payload: [u8; PAYLOAD_CAPACITY],
}

impl BusMessage {
    /// Builds a received message from its parts, as a frame on the wire would arrive.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::LengthOverflow`] when `payload` exceeds one frame.
    pub fn received(
        initiator: LogicalAddress,
        follower: LogicalAddress,
        payload: &[u8],
    ) -> Result<Self, DecodeError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(DecodeError::LengthOverflow {
                length: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }
        let mut buf = [0u8; PAYLOAD_CAPACITY];
        buf[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            reason: NotifyReason::Receive,
            return_code: 0,
            length: payload.len(),
            initiator,
            follower,
            payload: buf,
        })
    }

    /// The opcode byte, or `None` for a header-only (polling) frame.
    pub fn opcode_byte(&self) -> Option<u8> {
        (self.length >= 1).then_some(self.payload[0])
    }

    pub fn operand1(&self) -> u8 {
        self.payload[1]
    }

    pub fn operand2(&self) -> u8 {
        self.payload[2]
    }

    /// The meaningful payload bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.payload[..self.length]
    }
}

impl fmt::Display for BusMessage {
    /// Renders the message the way bus monitors print frames: header block
    /// first, then each payload byte, colon separated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reason=0x{:04x} rc=0x{:02x} len={} {:x}{:x}",
            self.reason.bits(),
            self.return_code,
            self.length,
            self.initiator as u8,
            self.follower as u8
        )?;
        for b in self.bytes() {
            write!(f, ":{b:02x}")?;
        }
        Ok(())
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes the five callback words into a [`BusMessage`].
///
/// # Errors
///
/// Returns [`DecodeError::NotAMessage`] for logical-address and topology
/// notifications, and [`DecodeError::LengthOverflow`] if the length field is
/// larger than a CEC frame.
///
/// # Examples
///
/// ```rust
/// use cec_core::protocol::codec::{decode_notification, NotifyReason};
/// use cec_core::LogicalAddress;
///
/// // TV (0) -> playback 1 (4): UserControlPressed (0x44), "select" (0x00)
/// let words = [0x0003_0002, 0x0000_4404, 0, 0, 0];
/// let msg = decode_notification(words).unwrap();
/// assert_eq!(msg.reason, NotifyReason::Receive);
/// assert_eq!(msg.initiator, LogicalAddress::Tv);
/// assert_eq!(msg.opcode_byte(), Some(0x44));
/// ```
pub fn decode_notification(words: [u32; 5]) -> Result<BusMessage, DecodeError> {
    let reason_raw = (words[0] & REASON_MASK) as u16;
    let return_code = (words[0] >> RC_SHIFT) as u8;
    let frame_len = ((words[0] >> LENGTH_SHIFT) & 0xFF) as usize;

    if reason_raw == reason_bits::LOGICAL_ADDR || reason_raw == reason_bits::TOPOLOGY {
        return Err(DecodeError::NotAMessage(reason_raw));
    }

    // The length field includes the header block.
    let length = frame_len.saturating_sub(1);
    if length > MAX_PAYLOAD_LEN {
        return Err(DecodeError::LengthOverflow {
            length,
            max: MAX_PAYLOAD_LEN,
        });
    }

    let mut payload = [0u8; PAYLOAD_CAPACITY];
    if length > 0 {
        let mut packed = [0u8; MAX_PAYLOAD_LEN];
        packed[..3].copy_from_slice(&(words[1] >> 8).to_le_bytes()[..3]);
        packed[3..7].copy_from_slice(&words[2].to_le_bytes());
        packed[7..11].copy_from_slice(&words[3].to_le_bytes());
        packed[11..15].copy_from_slice(&words[4].to_le_bytes());
        payload[..length].copy_from_slice(&packed[..length]);
    }

    Ok(BusMessage {
        reason: NotifyReason::from_bits(reason_raw),
        return_code,
        length,
        initiator: LogicalAddress::from_nibble((words[1] >> 4) as u8),
        follower: LogicalAddress::from_nibble(words[1] as u8),
        payload,
    })
}

/// Packs a [`BusMessage`] into the five callback words.
///
/// Inverse of [`decode_notification`]; used by bus services that synthesise
/// notifications (simulators, replay tools).
pub fn encode_notification(msg: &BusMessage) -> [u32; 5] {
    let length = msg.length.min(MAX_PAYLOAD_LEN);
    let mut packed = [0u8; MAX_PAYLOAD_LEN];
    packed[..length].copy_from_slice(&msg.payload[..length]);

    let header = ((msg.initiator as u32) << 4) | msg.follower as u32;
    let word = |i: usize| u32::from_le_bytes([packed[i], packed[i + 1], packed[i + 2], packed[i + 3]]);

    [
        ((msg.return_code as u32) << RC_SHIFT)
            | (((length + 1) as u32) << LENGTH_SHIFT)
            | msg.reason.bits() as u32,
        header | ((packed[0] as u32) << 8) | ((packed[1] as u32) << 16) | ((packed[2] as u32) << 24),
        word(3),
        word(7),
        word(11),
    ]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
