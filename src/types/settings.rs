//! Device and session configuration types.
//!
//! These types model the values exchanged through the generic property
//! get/set round trip: bit-packed flag sets, small enumerations and the
//! version/symbology structures.

use std::fmt;

use crate::error::{Error, Result};

/// Notification subscription flags, packed into a 32-bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Notifications {
    /// Notify on scan button press.
    pub scan_button_press: bool,
    /// Notify on scan button release.
    pub scan_button_release: bool,
    /// Notify on power button press.
    pub power_button_press: bool,
    /// Notify on power button release.
    pub power_button_release: bool,
    /// Notify on power state change.
    pub power_state: bool,
    /// Notify on battery level change.
    pub battery_level: bool,
}

impl Notifications {
    const SCAN_BUTTON_PRESS: u32 = 0x01;
    const SCAN_BUTTON_RELEASE: u32 = 0x02;
    const POWER_BUTTON_PRESS: u32 = 0x04;
    const POWER_BUTTON_RELEASE: u32 = 0x08;
    const POWER_STATE: u32 = 0x10;
    const BATTERY_LEVEL: u32 = 0x20;

    /// Decodes the notification bitmask.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            scan_button_press: bits & Self::SCAN_BUTTON_PRESS != 0,
            scan_button_release: bits & Self::SCAN_BUTTON_RELEASE != 0,
            power_button_press: bits & Self::POWER_BUTTON_PRESS != 0,
            power_button_release: bits & Self::POWER_BUTTON_RELEASE != 0,
            power_state: bits & Self::POWER_STATE != 0,
            battery_level: bits & Self::BATTERY_LEVEL != 0,
        }
    }

    /// Encodes to the notification bitmask.
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        let mut bits = 0;
        if self.scan_button_press {
            bits |= Self::SCAN_BUTTON_PRESS;
        }
        if self.scan_button_release {
            bits |= Self::SCAN_BUTTON_RELEASE;
        }
        if self.power_button_press {
            bits |= Self::POWER_BUTTON_PRESS;
        }
        if self.power_button_release {
            bits |= Self::POWER_BUTTON_RELEASE;
        }
        if self.power_state {
            bits |= Self::POWER_STATE;
        }
        if self.battery_level {
            bits |= Self::BATTERY_LEVEL;
        }
        bits
    }
}

/// Local feedback actions a device performs when a decode completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeAction {
    /// Emit a beep.
    pub beep: bool,
    /// Flash the LED.
    pub flash: bool,
    /// Vibrate.
    pub rumble: bool,
}

impl DecodeAction {
    const BEEP: u8 = 0x01;
    const FLASH: u8 = 0x02;
    const RUMBLE: u8 = 0x04;

    /// No local feedback.
    pub const NONE: Self = Self {
        beep: false,
        flash: false,
        rumble: false,
    };

    /// Decodes the decode-action bitmask.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            beep: bits & Self::BEEP != 0,
            flash: bits & Self::FLASH != 0,
            rumble: bits & Self::RUMBLE != 0,
        }
    }

    /// Encodes to the decode-action bitmask.
    #[must_use]
    pub const fn to_bits(self) -> u8 {
        let mut bits = 0;
        if self.beep {
            bits |= Self::BEEP;
        }
        if self.flash {
            bits |= Self::FLASH;
        }
        if self.rumble {
            bits |= Self::RUMBLE;
        }
        bits
    }
}

/// Stand behavior configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandConfig {
    /// Always behave as a handheld scanner.
    MobileMode,
    /// Always behave as a presentation scanner.
    StandMode,
    /// Switch based on stand detection.
    DetectMode,
    /// Let the device decide.
    AutoMode,
}

impl StandConfig {
    /// Parses a stand configuration code.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::MobileMode),
            1 => Some(Self::StandMode),
            2 => Some(Self::DetectMode),
            3 => Some(Self::AutoMode),
            _ => None,
        }
    }

    /// Returns the configuration code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::MobileMode => 0,
            Self::StandMode => 1,
            Self::DetectMode => 2,
            Self::AutoMode => 3,
        }
    }
}

/// Trigger control actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    /// Start a scan as if the trigger was pulled.
    Start,
    /// Stop the current scan.
    Stop,
    /// Enable the physical trigger.
    Enable,
    /// Disable the physical trigger.
    Disable,
}

impl TriggerAction {
    /// Returns the action code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Start => 1,
            Self::Stop => 2,
            Self::Enable => 3,
            Self::Disable => 4,
        }
    }
}

/// Who confirms decoded data before the device releases the next scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataConfirmationMode {
    /// No confirmation; the device releases data immediately.
    Off,
    /// The device confirms locally.
    Device,
    /// The companion service confirms.
    Companion,
    /// The application confirms explicitly.
    App,
}

impl DataConfirmationMode {
    /// Parses a confirmation mode code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            1 => Some(Self::Device),
            2 => Some(Self::Companion),
            3 => Some(Self::App),
            _ => None,
        }
    }

    /// Returns the mode code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Device => 1,
            Self::Companion => 2,
            Self::App => 3,
        }
    }
}

/// LED feedback for a data confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationLed {
    /// No LED feedback.
    #[default]
    None,
    /// Green (good read).
    Green,
    /// Red (bad read).
    Red,
}

/// Beep feedback for a data confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationBeep {
    /// No beep.
    #[default]
    None,
    /// Good-read beep.
    Good,
    /// Bad-read beep.
    Bad,
}

/// Rumble feedback for a data confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationRumble {
    /// No rumble.
    #[default]
    None,
    /// Good-read rumble.
    Good,
    /// Bad-read rumble.
    Bad,
}

/// Feedback actions performed when a scan is confirmed.
///
/// Packed as three 2-bit fields of a 32-bit value: led in bits 0-1,
/// beep in bits 2-3, rumble in bits 4-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataConfirmationAction {
    /// LED feedback.
    pub led: ConfirmationLed,
    /// Beep feedback.
    pub beep: ConfirmationBeep,
    /// Rumble feedback.
    pub rumble: ConfirmationRumble,
}

impl DataConfirmationAction {
    /// Decodes the packed confirmation action.
    pub fn from_bits(bits: u32) -> Result<Self> {
        let led = match bits & 0x03 {
            0 => ConfirmationLed::None,
            1 => ConfirmationLed::Green,
            2 => ConfirmationLed::Red,
            _ => return Err(Error::protocol("unrecognized confirmation LED field")),
        };
        let beep = match (bits >> 2) & 0x03 {
            0 => ConfirmationBeep::None,
            1 => ConfirmationBeep::Good,
            2 => ConfirmationBeep::Bad,
            _ => return Err(Error::protocol("unrecognized confirmation beep field")),
        };
        let rumble = match (bits >> 4) & 0x03 {
            0 => ConfirmationRumble::None,
            1 => ConfirmationRumble::Good,
            2 => ConfirmationRumble::Bad,
            _ => return Err(Error::protocol("unrecognized confirmation rumble field")),
        };
        Ok(Self { led, beep, rumble })
    }

    /// Encodes to the packed confirmation action.
    #[must_use]
    pub const fn to_bits(self) -> u32 {
        let led = match self.led {
            ConfirmationLed::None => 0,
            ConfirmationLed::Green => 1,
            ConfirmationLed::Red => 2,
        };
        let beep = match self.beep {
            ConfirmationBeep::None => 0,
            ConfirmationBeep::Good => 1,
            ConfirmationBeep::Bad => 2,
        };
        let rumble = match self.rumble {
            ConfirmationRumble::None => 0,
            ConfirmationRumble::Good => 1,
            ConfirmationRumble::Bad => 2,
        };
        led | (beep << 2) | (rumble << 4)
    }
}

/// Barcode symbology identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbologyId {
    /// Aztec 2D code.
    Aztec,
    /// Codabar.
    Codabar,
    /// Code 39.
    Code39,
    /// Code 93.
    Code93,
    /// Code 128.
    Code128,
    /// Data Matrix 2D code.
    DataMatrix,
    /// EAN-8.
    Ean8,
    /// EAN-13.
    Ean13,
    /// Interleaved 2 of 5.
    Interleaved2of5,
    /// PDF417.
    Pdf417,
    /// QR Code.
    QrCode,
    /// UPC-A.
    UpcA,
    /// UPC-E.
    UpcE,
    /// Symbology code not known to this library.
    Unknown(u16),
}

impl SymbologyId {
    /// Parses a symbology code.
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        match code {
            1 => Self::Aztec,
            2 => Self::Codabar,
            3 => Self::Code39,
            4 => Self::Code93,
            5 => Self::Code128,
            6 => Self::DataMatrix,
            7 => Self::Ean8,
            8 => Self::Ean13,
            9 => Self::Interleaved2of5,
            10 => Self::Pdf417,
            11 => Self::QrCode,
            12 => Self::UpcA,
            13 => Self::UpcE,
            other => Self::Unknown(other),
        }
    }

    /// Returns the symbology code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Aztec => 1,
            Self::Codabar => 2,
            Self::Code39 => 3,
            Self::Code93 => 4,
            Self::Code128 => 5,
            Self::DataMatrix => 6,
            Self::Ean8 => 7,
            Self::Ean13 => 8,
            Self::Interleaved2of5 => 9,
            Self::Pdf417 => 10,
            Self::QrCode => 11,
            Self::UpcA => 12,
            Self::UpcE => 13,
            Self::Unknown(other) => other,
        }
    }

    /// Returns the symbology name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Aztec => "Aztec",
            Self::Codabar => "Codabar",
            Self::Code39 => "Code 39",
            Self::Code93 => "Code 93",
            Self::Code128 => "Code 128",
            Self::DataMatrix => "Data Matrix",
            Self::Ean8 => "EAN-8",
            Self::Ean13 => "EAN-13",
            Self::Interleaved2of5 => "Interleaved 2 of 5",
            Self::Pdf417 => "PDF417",
            Self::QrCode => "QR Code",
            Self::UpcA => "UPC-A",
            Self::UpcE => "UPC-E",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for SymbologyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Enablement state of a symbology on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbologyStatus {
    /// The device does not support this symbology.
    NotSupported,
    /// Decoding enabled.
    Enabled,
    /// Decoding disabled.
    Disabled,
}

impl SymbologyStatus {
    /// Decodes a raw symbology status code.
    ///
    /// The three known codes map exhaustively; anything else is a protocol
    /// error rather than a default to some known case.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::NotSupported),
            1 => Ok(Self::Enabled),
            2 => Ok(Self::Disabled),
            other => Err(Error::protocol(format!(
                "unrecognized symbology status code {other}"
            ))),
        }
    }

    /// Returns the status code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::NotSupported => 0,
            Self::Enabled => 1,
            Self::Disabled => 2,
        }
    }
}

/// A symbology together with its enablement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbology {
    /// Which symbology.
    pub id: SymbologyId,
    /// Its state on the device.
    pub status: SymbologyStatus,
}

/// Version information for the session layer or a device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionInfo {
    /// Major version.
    pub major: u32,
    /// Middle version.
    pub middle: u32,
    /// Minor version.
    pub minor: u32,
    /// Build number.
    pub build: u32,
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.middle, self.minor, self.build
        )
    }
}
