//! Binary codec for the media-center event-server protocol (version 2.0).
//!
//! Wire format:
//! ```text
//! [sig:4 "XBMC"][major:1][minor:1][type:2][seq:4][max_seq:4][payload_len:2][token:4][reserved:10][payload:N]
//! ```
//! Total header size: 32 bytes.  All multi-byte integers are big-endian.
//!
//! Every packet the bridge sends fits in a single datagram, so `seq` and
//! `max_seq` are always 1.
//!
//! # Button packets (for beginners)
//!
//! A BUTTON packet can identify the button two ways: by a numeric code, or by
//! a *name* looked up in a named keymap section (the "device map").  The bridge
//! pretends to be a classic "R1" remote and sends names such as `"select"` or
//! `"play"`; the media center's keymap for that remote decides what each name
//! does.  The keep-alive is the one exception: it sends a bare numeric code
//! from the ASCII key range, which the media center accepts but ignores.

use thiserror::Error;

/// Size of the fixed packet header in bytes.
pub const HEADER_SIZE: usize = 32;

/// Largest payload a single packet may carry.
pub const MAX_PAYLOAD_SIZE: usize = 1024;

const SIGNATURE: &[u8; 4] = b"XBMC";
const MAJOR_VERSION: u8 = 2;
const MINOR_VERSION: u8 = 0;

/// Button code used as a keep-alive: the first key of the ASCII key range.
pub const KEY_ASCII: u16 = 0xF100;

/// Errors from the event-server codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventServerError {
    /// The encoded payload would not fit in one packet.
    #[error("payload of {0} bytes exceeds the 1024-byte packet limit")]
    PayloadTooLarge(usize),

    /// A string field contains an interior NUL and cannot be terminated.
    #[error("string field {0:?} contains a NUL byte")]
    InteriorNul(String),

    /// The byte slice is shorter than a header or its declared payload.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The header does not start with the protocol signature.
    #[error("bad signature")]
    BadSignature,

    /// The packet type is not one this codec understands.
    #[error("unknown packet type: 0x{0:04X}")]
    UnknownPacketType(u16),
}

/// Packet type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum PacketType {
    Helo = 0x01,
    Bye = 0x02,
    Button = 0x03,
    Ping = 0x05,
}

impl TryFrom<u16> for PacketType {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, ()> {
        match value {
            0x01 => Ok(PacketType::Helo),
            0x02 => Ok(PacketType::Bye),
            0x03 => Ok(PacketType::Button),
            0x05 => Ok(PacketType::Ping),
            _ => Err(()),
        }
    }
}

/// BUTTON packet flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonFlags(pub u16);

impl ButtonFlags {
    pub const USE_NAME: u16 = 0x01;
    pub const DOWN: u16 = 0x02;
    pub const UP: u16 = 0x04;
    pub const USE_AMOUNT: u16 = 0x08;
    pub const QUEUE: u16 = 0x10;
    pub const NO_REPEAT: u16 = 0x20;
    pub const VKEY: u16 = 0x40;

    /// Flags for a one-shot named remote button.
    pub fn named_no_repeat() -> Self {
        ButtonFlags(Self::USE_NAME | Self::NO_REPEAT)
    }

    pub fn contains(self, bit: u16) -> bool {
        self.0 & bit == bit
    }
}

/// Icon attached to a HELO packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IconType {
    None = 0x00,
    Jpeg = 0x01,
    Png = 0x02,
    Gif = 0x03,
}

/// One event-server packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Registers the client under a display name.
    Helo { device_name: String, icon: IconType },
    /// Unregisters the client.
    Bye,
    /// A button press.  `code` is ignored when `flags` carry `USE_NAME`.
    Button {
        code: u16,
        flags: ButtonFlags,
        amount: u16,
        device_map: String,
        button: String,
    },
    /// Keeps the registration alive between button presses.
    Ping,
}

impl Packet {
    /// A named button press from the given virtual remote.
    pub fn named_button(button: &str, device_map: &str, flags: ButtonFlags) -> Self {
        Packet::Button {
            code: 0,
            flags: ButtonFlags(flags.0 | ButtonFlags::USE_NAME),
            amount: 0,
            device_map: device_map.to_string(),
            button: button.to_string(),
        }
    }

    /// The ASCII-range keep-alive press.
    pub fn keep_alive() -> Self {
        Packet::Button {
            code: KEY_ASCII,
            flags: ButtonFlags(ButtonFlags::NO_REPEAT),
            amount: 0,
            device_map: String::new(),
            button: String::new(),
        }
    }

    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Helo { .. } => PacketType::Helo,
            Packet::Bye => PacketType::Bye,
            Packet::Button { .. } => PacketType::Button,
            Packet::Ping => PacketType::Ping,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `packet` for the client identified by `token`.
///
/// # Errors
///
/// Returns [`EventServerError`] if a string contains NUL or the payload is
/// larger than one packet.
pub fn encode_packet(packet: &Packet, token: u32) -> Result<Vec<u8>, EventServerError> {
    let payload = encode_payload(packet)?;
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(EventServerError::PayloadTooLarge(payload.len()));
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(SIGNATURE);
    buf.push(MAJOR_VERSION);
    buf.push(MINOR_VERSION);
    buf.extend_from_slice(&(packet.packet_type() as u16).to_be_bytes());
    buf.extend_from_slice(&1u32.to_be_bytes()); // seq
    buf.extend_from_slice(&1u32.to_be_bytes()); // max seq
    buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buf.extend_from_slice(&token.to_be_bytes());
    buf.extend_from_slice(&[0u8; 10]); // reserved
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decodes one packet, returning it with the client token.
///
/// The bridge only sends packets; decoding exists for tests and diagnostics.
///
/// # Errors
///
/// Returns [`EventServerError`] when the bytes are truncated or malformed.
pub fn decode_packet(bytes: &[u8]) -> Result<(Packet, u32), EventServerError> {
    require_len(bytes, HEADER_SIZE)?;
    if &bytes[..4] != SIGNATURE {
        return Err(EventServerError::BadSignature);
    }
    let type_raw = u16::from_be_bytes([bytes[6], bytes[7]]);
    let packet_type =
        PacketType::try_from(type_raw).map_err(|_| EventServerError::UnknownPacketType(type_raw))?;
    let payload_len = u16::from_be_bytes([bytes[16], bytes[17]]) as usize;
    let token = u32::from_be_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]);
    require_len(bytes, HEADER_SIZE + payload_len)?;
    let p = &bytes[HEADER_SIZE..HEADER_SIZE + payload_len];

    let packet = match packet_type {
        PacketType::Helo => {
            let (device_name, next) = read_c_string(p, 0)?;
            require_len(p, next + 1)?;
            let icon = match p[next] {
                0x01 => IconType::Jpeg,
                0x02 => IconType::Png,
                0x03 => IconType::Gif,
                _ => IconType::None,
            };
            Packet::Helo { device_name, icon }
        }
        PacketType::Bye => Packet::Bye,
        PacketType::Ping => Packet::Ping,
        PacketType::Button => {
            require_len(p, 6)?;
            let code = u16::from_be_bytes([p[0], p[1]]);
            let flags = ButtonFlags(u16::from_be_bytes([p[2], p[3]]));
            let amount = u16::from_be_bytes([p[4], p[5]]);
            let (device_map, next) = read_c_string(p, 6)?;
            let (button, _) = read_c_string(p, next)?;
            Packet::Button {
                code,
                flags,
                amount,
                device_map,
                button,
            }
        }
    };
    Ok((packet, token))
}

// ── Payload encoding ──────────────────────────────────────────────────────────

fn encode_payload(packet: &Packet) -> Result<Vec<u8>, EventServerError> {
    let mut buf = Vec::new();
    match packet {
        Packet::Helo { device_name, icon } => {
            write_c_string(&mut buf, device_name)?;
            buf.push(*icon as u8);
            buf.extend_from_slice(&0u16.to_be_bytes()); // port
            buf.extend_from_slice(&0u32.to_be_bytes()); // reserved
            buf.extend_from_slice(&0u32.to_be_bytes()); // reserved
        }
        Packet::Bye | Packet::Ping => {}
        Packet::Button {
            code,
            flags,
            amount,
            device_map,
            button,
        } => {
            let mut bits = flags.0;
            if bits & (ButtonFlags::DOWN | ButtonFlags::UP) == 0 {
                bits |= ButtonFlags::DOWN;
            }
            if *amount > 0 {
                bits |= ButtonFlags::USE_AMOUNT;
            }
            buf.extend_from_slice(&code.to_be_bytes());
            buf.extend_from_slice(&bits.to_be_bytes());
            buf.extend_from_slice(&amount.to_be_bytes());
            write_c_string(&mut buf, device_map)?;
            write_c_string(&mut buf, button)?;
        }
    }
    Ok(buf)
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn write_c_string(buf: &mut Vec<u8>, s: &str) -> Result<(), EventServerError> {
    if s.as_bytes().contains(&0) {
        return Err(EventServerError::InteriorNul(s.to_string()));
    }
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    Ok(())
}

/// Reads a NUL-terminated string starting at `offset`.
/// Returns the string and the offset just past the terminator.
fn read_c_string(buf: &[u8], offset: usize) -> Result<(String, usize), EventServerError> {
    require_len(buf, offset + 1)?;
    let end = buf[offset..]
        .iter()
        .position(|&b| b == 0)
        .map(|i| offset + i)
        .ok_or(EventServerError::InsufficientData {
            needed: buf.len() + 1,
            available: buf.len(),
        })?;
    let s = String::from_utf8_lossy(&buf[offset..end]).into_owned();
    Ok((s, end + 1))
}

fn require_len(buf: &[u8], needed: usize) -> Result<(), EventServerError> {
    if buf.len() < needed {
        Err(EventServerError::InsufficientData {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        // Arrange
        let bytes = encode_packet(&Packet::Ping, 0xDEAD_BEEF).unwrap();

        // Assert
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[..4], b"XBMC");
        assert_eq!(bytes[4], 2);
        assert_eq!(bytes[5], 0);
        assert_eq!(&bytes[6..8], &[0x00, 0x05]);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 1]);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 1]);
        assert_eq!(&bytes[16..18], &[0, 0]);
        assert_eq!(&bytes[18..22], &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(bytes[22..32].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_named_button_payload() {
        // Arrange
        let packet = Packet::named_button("select", "R1", ButtonFlags::named_no_repeat());

        // Act
        let bytes = encode_packet(&packet, 7).unwrap();
        let p = &bytes[HEADER_SIZE..];

        // Assert – code 0, flags USE_NAME|NO_REPEAT|DOWN, amount 0, "R1\0select\0"
        assert_eq!(&p[0..2], &[0x00, 0x00]);
        assert_eq!(u16::from_be_bytes([p[2], p[3]]), 0x01 | 0x20 | 0x02);
        assert_eq!(&p[4..6], &[0x00, 0x00]);
        assert_eq!(&p[6..], b"R1\0select\0");
        assert_eq!(u16::from_be_bytes([bytes[16], bytes[17]]) as usize, p.len());
    }

    #[test]
    fn test_keep_alive_is_coded_ascii_press() {
        let bytes = encode_packet(&Packet::keep_alive(), 1).unwrap();
        let p = &bytes[HEADER_SIZE..];

        assert_eq!(u16::from_be_bytes([p[0], p[1]]), KEY_ASCII);
        let flags = ButtonFlags(u16::from_be_bytes([p[2], p[3]]));
        assert!(flags.contains(ButtonFlags::NO_REPEAT));
        assert!(flags.contains(ButtonFlags::DOWN));
        assert!(!flags.contains(ButtonFlags::USE_NAME));
        assert_eq!(&p[6..], b"\0\0");
    }

    #[test]
    fn test_explicit_up_flag_suppresses_implicit_down() {
        let packet = Packet::Button {
            code: 0,
            flags: ButtonFlags(ButtonFlags::USE_NAME | ButtonFlags::UP),
            amount: 0,
            device_map: "R1".into(),
            button: "left".into(),
        };

        let (decoded, _) = decode_packet(&encode_packet(&packet, 0).unwrap()).unwrap();

        match decoded {
            Packet::Button { flags, .. } => {
                assert!(flags.contains(ButtonFlags::UP));
                assert!(!flags.contains(ButtonFlags::DOWN));
            }
            other => panic!("unexpected packet {other:?}"),
        }
    }

    #[test]
    fn test_helo_payload() {
        let packet = Packet::Helo {
            device_name: "rpi-cecd".into(),
            icon: IconType::None,
        };

        let bytes = encode_packet(&packet, 0).unwrap();

        assert_eq!(&bytes[6..8], &[0x00, 0x01]);
        let p = &bytes[HEADER_SIZE..];
        assert_eq!(&p[..9], b"rpi-cecd\0");
        assert_eq!(p[9], IconType::None as u8);
        assert_eq!(p.len(), 9 + 1 + 2 + 4 + 4);
    }

    #[test]
    fn test_decode_recovers_token_and_button_names() {
        let packet = Packet::named_button("play", "R1", ButtonFlags::named_no_repeat());

        let (decoded, token) = decode_packet(&encode_packet(&packet, 0x1234).unwrap()).unwrap();

        assert_eq!(token, 0x1234);
        match decoded {
            Packet::Button { device_map, button, .. } => {
                assert_eq!(device_map, "R1");
                assert_eq!(button, "play");
            }
            other => panic!("unexpected packet {other:?}"),
        }
    }

    #[test]
    fn test_encode_rejects_interior_nul() {
        let packet = Packet::named_button("pl\0ay", "R1", ButtonFlags::default());
        assert!(matches!(
            encode_packet(&packet, 0),
            Err(EventServerError::InteriorNul(_))
        ));
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let packet = Packet::Helo {
            device_name: "x".repeat(MAX_PAYLOAD_SIZE),
            icon: IconType::None,
        };
        assert!(matches!(
            encode_packet(&packet, 0),
            Err(EventServerError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_header() {
        assert_eq!(
            decode_packet(&[0u8; 10]),
            Err(EventServerError::InsufficientData { needed: HEADER_SIZE, available: 10 })
        );
    }

    #[test]
    fn test_decode_rejects_bad_signature() {
        let mut bytes = encode_packet(&Packet::Bye, 0).unwrap();
        bytes[0] = b'Y';
        assert_eq!(decode_packet(&bytes), Err(EventServerError::BadSignature));
    }
}
