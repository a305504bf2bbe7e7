//! CEC opcodes and operand values (HDMI 1.4 Supplement 1, CEC 15/16).
//!
//! Only the subset the bridge reads or writes is listed.  Unknown opcodes are
//! not an error: [`CecOpcode::try_from`] fails and the dispatcher logs them.

/// CEC opcode, carried in the first payload byte of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CecOpcode {
    FeatureAbort = 0x00,
    ImageViewOn = 0x04,
    TextViewOn = 0x0D,
    Standby = 0x36,
    Play = 0x41,
    DeckControl = 0x42,
    UserControlPressed = 0x44,
    UserControlReleased = 0x45,
    GiveOsdName = 0x46,
    SetOsdName = 0x47,
    ActiveSource = 0x82,
    GivePhysicalAddress = 0x83,
    ReportPhysicalAddress = 0x84,
    RequestActiveSource = 0x85,
    SetStreamPath = 0x86,
    DeviceVendorId = 0x87,
    VendorCommand = 0x89,
    VendorRemoteButtonDown = 0x8A,
    VendorRemoteButtonUp = 0x8B,
    GiveDeviceVendorId = 0x8C,
    MenuRequest = 0x8D,
    MenuStatus = 0x8E,
    GiveDevicePowerStatus = 0x8F,
    ReportPowerStatus = 0x90,
    GetMenuLanguage = 0x91,
    InactiveSource = 0x9D,
    CecVersion = 0x9E,
    GetCecVersion = 0x9F,
    VendorCommandWithId = 0xA0,
    Abort = 0xFF,
}

impl TryFrom<u8> for CecOpcode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x00 => Ok(CecOpcode::FeatureAbort),
            0x04 => Ok(CecOpcode::ImageViewOn),
            0x0D => Ok(CecOpcode::TextViewOn),
            0x36 => Ok(CecOpcode::Standby),
            0x41 => Ok(CecOpcode::Play),
            0x42 => Ok(CecOpcode::DeckControl),
            0x44 => Ok(CecOpcode::UserControlPressed),
            0x45 => Ok(CecOpcode::UserControlReleased),
            0x46 => Ok(CecOpcode::GiveOsdName),
            0x47 => Ok(CecOpcode::SetOsdName),
            0x82 => Ok(CecOpcode::ActiveSource),
            0x83 => Ok(CecOpcode::GivePhysicalAddress),
            0x84 => Ok(CecOpcode::ReportPhysicalAddress),
            0x85 => Ok(CecOpcode::RequestActiveSource),
            0x86 => Ok(CecOpcode::SetStreamPath),
            0x87 => Ok(CecOpcode::DeviceVendorId),
            0x89 => Ok(CecOpcode::VendorCommand),
            0x8A => Ok(CecOpcode::VendorRemoteButtonDown),
            0x8B => Ok(CecOpcode::VendorRemoteButtonUp),
            0x8C => Ok(CecOpcode::GiveDeviceVendorId),
            0x8D => Ok(CecOpcode::MenuRequest),
            0x8E => Ok(CecOpcode::MenuStatus),
            0x8F => Ok(CecOpcode::GiveDevicePowerStatus),
            0x90 => Ok(CecOpcode::ReportPowerStatus),
            0x91 => Ok(CecOpcode::GetMenuLanguage),
            0x9D => Ok(CecOpcode::InactiveSource),
            0x9E => Ok(CecOpcode::CecVersion),
            0x9F => Ok(CecOpcode::GetCecVersion),
            0xA0 => Ok(CecOpcode::VendorCommandWithId),
            0xFF => Ok(CecOpcode::Abort),
            _ => Err(()),
        }
    }
}

/// Opcodes the bridge asks the bus service to forward to it.
///
/// User control pressed/released are always delivered, so they are absent.
pub const REGISTERED_OPCODES: &[CecOpcode] = &[
    CecOpcode::MenuRequest,
    CecOpcode::Play,
    CecOpcode::DeckControl,
    CecOpcode::GiveDeviceVendorId,
    CecOpcode::VendorCommand,
    CecOpcode::GiveDevicePowerStatus,
    CecOpcode::VendorRemoteButtonDown,
    CecOpcode::SetStreamPath,
    CecOpcode::VendorCommandWithId,
];

/// `<Menu Request Type>` operand of `MenuRequest`.
pub mod menu_request {
    pub const ACTIVATE: u8 = 0x00;
    pub const DEACTIVATE: u8 = 0x01;
    pub const QUERY: u8 = 0x02;
}

/// `<Menu State>` operand of `MenuStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MenuState {
    Activated = 0x00,
    Deactivated = 0x01,
}

/// `<Play Mode>` operand of `Play`.
pub mod play_mode {
    pub const PLAY_REVERSE: u8 = 0x20;
    pub const PLAY_FORWARD: u8 = 0x24;
    pub const PLAY_STILL: u8 = 0x25;
}

/// `<Deck Control Mode>` operand of `DeckControl`.
pub mod deck_control {
    pub const SKIP_FORWARD: u8 = 0x01;
    pub const SKIP_REVERSE: u8 = 0x02;
    pub const STOP: u8 = 0x03;
    pub const EJECT: u8 = 0x04;
}

/// `<Power Status>` operand of `ReportPowerStatus`.
pub mod power_status {
    pub const ON: u8 = 0x00;
    pub const STANDBY: u8 = 0x01;
}

/// `<Device Type>` operand.
pub mod device_type {
    pub const TV: u8 = 0x00;
    pub const RECORDING_DEVICE: u8 = 0x01;
    pub const TUNER: u8 = 0x03;
    pub const PLAYBACK: u8 = 0x04;
    pub const AUDIO_SYSTEM: u8 = 0x05;
}

/// `<UI Command>` operand of `UserControlPressed`.
pub mod user_control {
    pub const SELECT: u8 = 0x00;
    pub const UP: u8 = 0x01;
    pub const DOWN: u8 = 0x02;
    pub const LEFT: u8 = 0x03;
    pub const RIGHT: u8 = 0x04;
    pub const RIGHT_UP: u8 = 0x05;
    pub const RIGHT_DOWN: u8 = 0x06;
    pub const LEFT_UP: u8 = 0x07;
    pub const LEFT_DOWN: u8 = 0x08;
    pub const ROOT_MENU: u8 = 0x09;
    pub const SETUP_MENU: u8 = 0x0A;
    pub const CONTENTS_MENU: u8 = 0x0B;
    pub const FAVORITE_MENU: u8 = 0x0C;
    pub const EXIT: u8 = 0x0D;
    pub const NUMBER_0: u8 = 0x20;
    pub const NUMBER_1: u8 = 0x21;
    pub const NUMBER_2: u8 = 0x22;
    pub const NUMBER_3: u8 = 0x23;
    pub const NUMBER_4: u8 = 0x24;
    pub const NUMBER_5: u8 = 0x25;
    pub const NUMBER_6: u8 = 0x26;
    pub const NUMBER_7: u8 = 0x27;
    pub const NUMBER_8: u8 = 0x28;
    pub const NUMBER_9: u8 = 0x29;
    pub const DOT: u8 = 0x2A;
    pub const ENTER: u8 = 0x2B;
    pub const CLEAR: u8 = 0x2C;
    pub const CHANNEL_UP: u8 = 0x30;
    pub const CHANNEL_DOWN: u8 = 0x31;
    pub const PREVIOUS_CHANNEL: u8 = 0x32;
    pub const SOUND_SELECT: u8 = 0x33;
    pub const INPUT_SELECT: u8 = 0x34;
    pub const DISPLAY_INFORMATION: u8 = 0x35;
    pub const HELP: u8 = 0x36;
    pub const PAGE_UP: u8 = 0x37;
    pub const PAGE_DOWN: u8 = 0x38;
    pub const POWER: u8 = 0x40;
    pub const VOLUME_UP: u8 = 0x41;
    pub const VOLUME_DOWN: u8 = 0x42;
    pub const MUTE: u8 = 0x43;
    pub const PLAY: u8 = 0x44;
    pub const STOP: u8 = 0x45;
    pub const PAUSE: u8 = 0x46;
    pub const RECORD: u8 = 0x47;
    pub const REWIND: u8 = 0x48;
    pub const FAST_FORWARD: u8 = 0x49;
    pub const EJECT: u8 = 0x4A;
    pub const FORWARD: u8 = 0x4B;
    pub const BACKWARD: u8 = 0x4C;
    pub const ANGLE: u8 = 0x50;
    pub const SUB_PICTURE: u8 = 0x51;
    pub const ELECTRONIC_PROGRAM_GUIDE: u8 = 0x53;
    pub const PLAY_FUNCTION: u8 = 0x60;
    pub const PAUSE_PLAY_FUNCTION: u8 = 0x61;
    pub const STOP_FUNCTION: u8 = 0x64;
    pub const F1_BLUE: u8 = 0x71;
    pub const F2_RED: u8 = 0x72;
    pub const F3_GREEN: u8 = 0x73;
    pub const F4_YELLOW: u8 = 0x74;
    pub const DATA: u8 = 0x76;
}
