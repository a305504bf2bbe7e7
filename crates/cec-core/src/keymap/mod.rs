//! Translation table from CEC `<UI Command>` key codes to the media center's
//! named remote buttons.
//!
//! The names are those of the media center's "R1" remote device map, so the
//! stock keymap for that remote decides what each press does.  Keys without a
//! sensible counterpart are left unbound; [`lookup_button`] returns `None` for
//! them and the dispatcher logs the code.

use crate::protocol::opcodes::user_control as uc;

/// One entry of the key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    /// CEC `<UI Command>` code.
    pub code: u8,
    /// Button name in the remote's device map.
    pub button: &'static str,
}

const fn bind(code: u8, button: &'static str) -> KeyBinding {
    KeyBinding { code, button }
}

/// Every bound key.  Codes are unique.
pub static KEY_BINDINGS: &[KeyBinding] = &[
    // Navigation
    bind(uc::SELECT, "select"),
    bind(uc::UP, "up"),
    bind(uc::DOWN, "down"),
    bind(uc::LEFT, "left"),
    bind(uc::RIGHT, "right"),
    bind(uc::ROOT_MENU, "menu"),
    bind(uc::SETUP_MENU, "menu"),
    bind(uc::CONTENTS_MENU, "title"),
    bind(uc::FAVORITE_MENU, "menu"),
    bind(uc::EXIT, "back"),
    // Digits
    bind(uc::NUMBER_0, "zero"),
    bind(uc::NUMBER_1, "one"),
    bind(uc::NUMBER_2, "two"),
    bind(uc::NUMBER_3, "three"),
    bind(uc::NUMBER_4, "four"),
    bind(uc::NUMBER_5, "five"),
    bind(uc::NUMBER_6, "six"),
    bind(uc::NUMBER_7, "seven"),
    bind(uc::NUMBER_8, "eight"),
    bind(uc::NUMBER_9, "nine"),
    bind(uc::DOT, "dot"),
    bind(uc::ENTER, "enter"),
    bind(uc::CLEAR, "back"),
    // Channel and information
    bind(uc::CHANNEL_UP, "channelplus"),
    bind(uc::CHANNEL_DOWN, "channelminus"),
    bind(uc::PREVIOUS_CHANNEL, "back"),
    bind(uc::SOUND_SELECT, "language"),
    bind(uc::DISPLAY_INFORMATION, "info"),
    bind(uc::HELP, "info"),
    bind(uc::PAGE_UP, "pageplus"),
    bind(uc::PAGE_DOWN, "pageminus"),
    // Volume
    bind(uc::VOLUME_UP, "volumeplus"),
    bind(uc::VOLUME_DOWN, "volumeminus"),
    bind(uc::MUTE, "mute"),
    // Transport
    bind(uc::PLAY, "play"),
    bind(uc::STOP, "stop"),
    bind(uc::PAUSE, "pause"),
    bind(uc::RECORD, "record"),
    bind(uc::REWIND, "reverse"),
    bind(uc::FAST_FORWARD, "forward"),
    bind(uc::EJECT, "eject"),
    bind(uc::FORWARD, "skipplus"),
    bind(uc::BACKWARD, "skipminus"),
    bind(uc::PLAY_FUNCTION, "play"),
    bind(uc::PAUSE_PLAY_FUNCTION, "pause"),
    bind(uc::STOP_FUNCTION, "stop"),
    // Extras
    bind(uc::ANGLE, "display"),
    bind(uc::SUB_PICTURE, "subtitle"),
    bind(uc::ELECTRONIC_PROGRAM_GUIDE, "guide"),
    bind(uc::F1_BLUE, "blue"),
    bind(uc::F2_RED, "red"),
    bind(uc::F3_GREEN, "green"),
    bind(uc::F4_YELLOW, "yellow"),
    bind(uc::DATA, "teletext"),
];

/// Returns the button name bound to `code`, or `None` if the key is unbound.
///
/// # Examples
///
/// ```rust
/// use cec_core::keymap::lookup_button;
///
/// assert_eq!(lookup_button(0x00), Some("select"));
/// assert_eq!(lookup_button(0x40), None); // power is left to the TV
/// ```
pub fn lookup_button(code: u8) -> Option<&'static str> {
    KEY_BINDINGS
        .iter()
        .find(|binding| binding.code == code)
        .map(|binding| binding.button)
}
