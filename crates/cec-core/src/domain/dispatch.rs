//! Opcode dispatcher.
//!
//! [`dispatch`] looks at one decoded [`BusMessage`] and decides what the
//! bridge does about it.  It never performs I/O: the result is an ordered list
//! of [`Outbound`] actions which the caller executes front to back.  A message
//! the bridge does not understand produces an empty list and a log line, never
//! an error.

use tracing::{debug, error, info, warn};

use crate::domain::identity::DeviceIdentity;
use crate::domain::vendor_command;
use crate::keymap::lookup_button;
use crate::protocol::address::{LogicalAddress, PhysicalAddress};
use crate::protocol::codec::{BusMessage, NotifyReason};
use crate::protocol::opcodes::{deck_control, menu_request, play_mode, power_status, CecOpcode, MenuState};

/// Longest raw frame payload the dispatcher ever builds.
pub const MAX_REPLY_LEN: usize = 8;

// ── Outbound actions ──────────────────────────────────────────────────────────

/// Payload of a raw bus reply, opcode first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyBytes {
    buf: [u8; MAX_REPLY_LEN],
    len: usize,
}

impl ReplyBytes {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() <= MAX_REPLY_LEN);
        let len = bytes.len().min(MAX_REPLY_LEN);
        let mut buf = [0u8; MAX_REPLY_LEN];
        buf[..len].copy_from_slice(&bytes[..len]);
        Self { buf, len }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl AsRef<[u8]> for ReplyBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// One frame (or bus-service setting) the bridge must put on the bus.
///
/// `is_reply` tells the bus service the frame answers the message being
/// handled rather than starting a new exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusCommand {
    /// A raw frame to `destination`.
    Message {
        destination: LogicalAddress,
        payload: ReplyBytes,
        is_reply: bool,
    },
    /// `<Active Source>` broadcast for `physical_address`.
    ActiveSource {
        physical_address: PhysicalAddress,
        is_reply: bool,
    },
    /// `<Image View On>` to `destination`.
    ImageViewOn { destination: LogicalAddress, is_reply: bool },
    /// `<Menu Status>` to `destination`.
    MenuStatus {
        destination: LogicalAddress,
        state: MenuState,
        is_reply: bool,
    },
    /// Update the on-screen display name the bus service reports for us.
    SetOsdName(String),
}

/// One message for the media-center event client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Press of a named button on the bridge's virtual remote.
    Button(&'static str),
    /// Keep-alive that also wakes the media center's screensaver.
    KeepAlive,
}

/// An action produced by [`dispatch`], in the order it must happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Bus(BusCommand),
    App(AppEvent),
}

impl Outbound {
    pub(crate) fn raw(destination: LogicalAddress, bytes: &[u8], is_reply: bool) -> Self {
        Outbound::Bus(BusCommand::Message {
            destination,
            payload: ReplyBytes::new(bytes),
            is_reply,
        })
    }

    pub(crate) fn menu_activated(destination: LogicalAddress) -> Self {
        Outbound::Bus(BusCommand::MenuStatus {
            destination,
            state: MenuState::Activated,
            is_reply: true,
        })
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decides how to react to one bus notification.
///
/// # Examples
///
/// ```rust
/// use cec_core::{dispatch, AppEvent, BusMessage, DeviceIdentity, LogicalAddress, Outbound, PhysicalAddress, VendorId};
///
/// let identity = DeviceIdentity::new(PhysicalAddress(0x1000), LogicalAddress::PlaybackDevice1, VendorId::LG, "XBMC");
/// // TV presses "select" (0x00) on its remote.
/// let msg = BusMessage::received(LogicalAddress::Tv, LogicalAddress::PlaybackDevice1, &[0x44, 0x00]).unwrap();
///
/// assert_eq!(dispatch(&msg, &identity), vec![Outbound::App(AppEvent::Button("select"))]);
/// ```
pub fn dispatch(msg: &BusMessage, identity: &DeviceIdentity) -> Vec<Outbound> {
    let mut out = Vec::new();

    if msg.reason == NotifyReason::TransmitResult {
        if msg.return_code != 0 {
            error!(rc = msg.return_code, "transmission failed: {msg}");
        }
        return out;
    }

    debug!("received {msg}");

    let opcode = msg.opcode_byte().map(CecOpcode::try_from);
    match opcode {
        Some(Ok(CecOpcode::UserControlPressed)) => on_user_control_pressed(msg, &mut out),
        Some(Ok(CecOpcode::UserControlReleased)) => {}
        Some(Ok(CecOpcode::MenuRequest)) => on_menu_request(msg, &mut out),
        Some(Ok(CecOpcode::Play)) => on_play(msg, &mut out),
        Some(Ok(CecOpcode::DeckControl)) => on_deck_control(msg, &mut out),
        Some(Ok(CecOpcode::VendorCommand)) => vendor_command::handle(msg, identity, &mut out),
        Some(Ok(CecOpcode::VendorRemoteButtonDown)) => {
            info!(tv_vendor = %identity.tv_vendor_id(), "vendor remote button down: {msg}");
        }
        Some(Ok(CecOpcode::GiveDeviceVendorId)) => {
            let [hi, mid, lo] = identity.own_vendor_id().to_be_bytes();
            out.push(Outbound::raw(
                msg.initiator,
                &[CecOpcode::DeviceVendorId as u8, hi, mid, lo],
                true,
            ));
        }
        Some(Ok(CecOpcode::GiveDevicePowerStatus)) => {
            out.push(Outbound::raw(
                msg.initiator,
                &[CecOpcode::ReportPowerStatus as u8, power_status::ON],
                true,
            ));
        }
        Some(Ok(CecOpcode::SetStreamPath)) => on_set_stream_path(msg, identity, &mut out),
        Some(Ok(CecOpcode::VendorCommandWithId)) => {
            info!("vendor command with id: {msg}");
        }
        _ => debug!("unknown opcode: {msg}"),
    }

    out
}

// ── Handlers ──────────────────────────────────────────────────────────────────

fn on_user_control_pressed(msg: &BusMessage, out: &mut Vec<Outbound>) {
    let code = msg.operand1();
    match lookup_button(code) {
        Some(button) => {
            debug!(code, button, "key pressed");
            out.push(Outbound::App(AppEvent::Button(button)));
        }
        None => warn!("unbound keycode 0x{code:02x}"),
    }
}

fn on_menu_request(msg: &BusMessage, out: &mut Vec<Outbound>) {
    match msg.operand1() {
        menu_request::QUERY => out.push(Outbound::menu_activated(msg.initiator)),
        // CEC expects <Feature Abort> for the remaining request types; none
        // is sent yet.
        other => warn!("unknown menu request operand 0x{other:02x}: {msg}"),
    }
}

fn on_play(msg: &BusMessage, out: &mut Vec<Outbound>) {
    match msg.operand1() {
        play_mode::PLAY_FORWARD => out.push(Outbound::App(AppEvent::Button("play"))),
        play_mode::PLAY_STILL => out.push(Outbound::App(AppEvent::Button("pause"))),
        other => warn!("play mode 0x{other:02x} not implemented"),
    }
}

fn on_deck_control(msg: &BusMessage, out: &mut Vec<Outbound>) {
    match msg.operand1() {
        deck_control::STOP => out.push(Outbound::App(AppEvent::Button("stop"))),
        other => warn!("deck control mode 0x{other:02x} not implemented"),
    }
}

fn on_set_stream_path(msg: &BusMessage, identity: &DeviceIdentity, out: &mut Vec<Outbound>) {
    let requested = PhysicalAddress::from_be_bytes([msg.operand1(), msg.operand2()]);
    if requested != identity.physical_address() {
        debug!(%requested, "stream path points at another input");
        return;
    }

    info!(%requested, "TV selected this input");
    out.extend([
        Outbound::Bus(BusCommand::ActiveSource {
            physical_address: identity.physical_address(),
            is_reply: false,
        }),
        Outbound::Bus(BusCommand::ImageViewOn {
            destination: msg.initiator,
            is_reply: false,
        }),
        Outbound::menu_activated(msg.initiator),
        Outbound::App(AppEvent::KeepAlive),
    ]);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
