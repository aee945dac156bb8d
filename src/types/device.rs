//! Device identity and runtime state types.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use bytes::Bytes;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::settings::SymbologyId;

/// Stable opaque identifier assigned to a device at discovery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Wraps an existing GUID.
    #[must_use]
    pub const fn new(guid: Uuid) -> Self {
        Self(guid)
    }

    /// The all-zero identifier.
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying GUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Device-type classifier reported in the arrival descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// Handheld scanner.
    Handheld,
    /// Scanner with a charging/presentation stand.
    Stand,
    /// NFC reader/writer.
    Nfc,
    /// Classifier code not known to this library.
    Unknown(u8),
}

impl DeviceType {
    /// Parses a device-type classifier code.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Handheld,
            2 => Self::Stand,
            3 => Self::Nfc,
            other => Self::Unknown(other),
        }
    }

    /// Returns the classifier code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Handheld => 1,
            Self::Stand => 2,
            Self::Nfc => 3,
            Self::Unknown(other) => other,
        }
    }
}

/// Opaque exclusivity token naming the current owner of a device.
///
/// The all-zero GUID string denotes "no ownership".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipToken(String);

/// The distinguished "no owner" token value.
const NO_OWNER: &str = "00000000-0000-0000-0000-000000000000";

impl OwnershipToken {
    /// Wraps a token string from the transport.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The distinguished "no owner" token.
    #[must_use]
    pub fn none() -> Self {
        Self(NO_OWNER.to_owned())
    }

    /// Returns true if this is the "no owner" token.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.0 == NO_OWNER
    }

    /// Returns the token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnershipToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptor carried by a raw device-arrival event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Stable device identifier.
    pub id: DeviceId,
    /// Display name.
    pub name: String,
    /// Device-type classifier.
    pub kind: DeviceType,
}

#[derive(Debug)]
struct DeviceState {
    open: bool,
    owned: bool,
    token: OwnershipToken,
}

/// A known device, owned by the registry while present.
///
/// Handles given to the application reference this entry; they never copy it.
/// Ownership is initialized to true at arrival and tracked through ownership
/// events.
#[derive(Debug)]
pub struct Device {
    id: DeviceId,
    name: String,
    kind: DeviceType,
    state: RwLock<DeviceState>,
}

impl Device {
    /// Builds a device from its arrival descriptor.
    ///
    /// The device starts open and owned, with no ownership token yet.
    #[must_use]
    pub fn new(descriptor: DeviceDescriptor) -> Self {
        Self {
            id: descriptor.id,
            name: descriptor.name,
            kind: descriptor.kind,
            state: RwLock::new(DeviceState {
                open: true,
                owned: true,
                token: OwnershipToken::none(),
            }),
        }
    }

    /// Returns the stable device identifier.
    #[must_use]
    pub const fn id(&self) -> DeviceId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the device-type classifier.
    #[must_use]
    pub const fn kind(&self) -> DeviceType {
        self.kind
    }

    /// Returns true if the device is open at the transport level.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.read().open
    }

    /// Returns true if this client currently owns the device.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.read().owned
    }

    /// Returns the current ownership token.
    #[must_use]
    pub fn ownership_token(&self) -> OwnershipToken {
        self.read().token.clone()
    }

    pub(crate) fn set_open(&self, open: bool) {
        self.write().open = open;
    }

    pub(crate) fn set_ownership(&self, owned: bool, token: OwnershipToken) {
        let mut state = self.write();
        state.owned = owned;
        state.token = token;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, DeviceState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, DeviceState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Power source reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Power source not known.
    Unknown,
    /// Running on battery.
    OnBattery,
    /// Docked on a powered cradle.
    OnCradle,
    /// Connected to AC power.
    OnAc,
}

impl PowerState {
    /// Parses a power-state code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::OnBattery),
            2 => Some(Self::OnCradle),
            4 => Some(Self::OnAc),
            _ => None,
        }
    }

    /// Returns the power-state code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::OnBattery => 1,
            Self::OnCradle => 2,
            Self::OnAc => 4,
        }
    }

    /// Returns the enumeration name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::OnBattery => "on battery",
            Self::OnCradle => "on cradle",
            Self::OnAc => "on AC",
        }
    }

    /// Decodes the bit-packed payload of a power-state event.
    pub fn from_raw(raw: i64) -> Result<Self> {
        Self::from_code((raw & 0xFF) as u8)
            .ok_or_else(|| Error::protocol(format!("unrecognized power state code {raw}")))
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Battery range decomposition: minimum, maximum and current level.
///
/// Packed as three byte fields of a 32-bit value: min in bits 0-7,
/// max in bits 8-15, current in bits 16-23.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatteryState {
    /// Lowest reportable level.
    pub min: u8,
    /// Highest reportable level.
    pub max: u8,
    /// Current level within `min..=max`.
    pub current: u8,
}

impl BatteryState {
    /// Decodes the bit-packed battery payload.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        let bits = raw as u32;
        Self {
            min: (bits & 0xFF) as u8,
            max: ((bits >> 8) & 0xFF) as u8,
            current: ((bits >> 16) & 0xFF) as u8,
        }
    }

    /// Encodes back to the bit-packed form.
    #[must_use]
    pub const fn to_raw(self) -> u32 {
        (self.min as u32) | ((self.max as u32) << 8) | ((self.current as u32) << 16)
    }

    /// Current level as a percentage of the min..max range.
    ///
    /// Returns 0 when the range is empty or the current level sits below it.
    #[must_use]
    pub fn percentage(self) -> u8 {
        if self.max <= self.min || self.current <= self.min {
            return 0;
        }
        let span = u32::from(self.max - self.min);
        let filled = u32::from(self.current.min(self.max) - self.min);
        (filled * 100 / span) as u8
    }
}

impl fmt::Display for BatteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}

/// Snapshot of the device button states, decoded from a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonsState {
    bits: u8,
}

impl ButtonsState {
    const LEFT: u8 = 0x01;
    const RIGHT: u8 = 0x02;
    const MIDDLE: u8 = 0x04;
    const POWER: u8 = 0x08;

    /// Decodes the bit-packed buttons payload.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self {
            bits: (raw & 0xFF) as u8,
        }
    }

    /// Returns the raw bitmask.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.bits
    }

    /// True if the left button is pressed.
    #[must_use]
    pub const fn left_pressed(self) -> bool {
        self.bits & Self::LEFT != 0
    }

    /// True if the right button is pressed.
    #[must_use]
    pub const fn right_pressed(self) -> bool {
        self.bits & Self::RIGHT != 0
    }

    /// True if the middle button is pressed.
    #[must_use]
    pub const fn middle_pressed(self) -> bool {
        self.bits & Self::MIDDLE != 0
    }

    /// True if the power button is pressed.
    #[must_use]
    pub const fn power_pressed(self) -> bool {
        self.bits & Self::POWER != 0
    }
}

/// Decoded scan data republished with a [`DecodedData`] domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedData {
    /// Symbology the data was decoded from.
    pub symbology: SymbologyId,
    /// Decoded payload bytes.
    pub data: Bytes,
}

impl DecodedData {
    /// Decoded payload as lossy UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Decoded payload as lowercase hex.
    #[must_use]
    pub fn data_hex(&self) -> String {
        hex::encode(&self.data)
    }
}

/// Formats a Bluetooth address as colon-joined uppercase hex octets.
pub fn format_bluetooth_address(octets: &[u8]) -> Result<String> {
    if octets.len() != 6 {
        return Err(Error::protocol(format!(
            "bluetooth address must be 6 octets, got {}",
            octets.len()
        )));
    }
    Ok(octets
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_percentage() {
        let full_range = BatteryState {
            min: 0,
            max: 100,
            current: 58,
        };
        assert_eq!(full_range.percentage(), 58);
        assert_eq!(full_range.to_string(), "58%");

        let wide_range = BatteryState {
            min: 0,
            max: 200,
            current: 100,
        };
        assert_eq!(wide_range.percentage(), 50);
        assert_eq!(wide_range.to_string(), "50%");
    }

    #[test]
    fn test_battery_degenerate_range() {
        let empty = BatteryState {
            min: 50,
            max: 50,
            current: 50,
        };
        assert_eq!(empty.percentage(), 0);

        let below = BatteryState {
            min: 20,
            max: 100,
            current: 10,
        };
        assert_eq!(below.percentage(), 0);
    }

    #[test]
    fn test_battery_raw_round_trip() {
        let battery = BatteryState {
            min: 0,
            max: 200,
            current: 100,
        };
        assert_eq!(BatteryState::from_raw(i64::from(battery.to_raw())), battery);
    }

    #[test]
    fn test_buttons_bitmask() {
        let buttons = ButtonsState::from_raw(0x09);
        assert!(buttons.left_pressed());
        assert!(buttons.power_pressed());
        assert!(!buttons.right_pressed());
        assert!(!buttons.middle_pressed());
    }

    #[test]
    fn test_power_state_codes() {
        assert_eq!(PowerState::from_raw(1).unwrap(), PowerState::OnBattery);
        assert_eq!(PowerState::from_raw(4).unwrap(), PowerState::OnAc);
        assert!(PowerState::from_raw(3).is_err());
        assert_eq!(PowerState::OnCradle.name(), "on cradle");
    }

    #[test]
    fn test_ownership_token() {
        assert!(OwnershipToken::none().is_none());
        let token = OwnershipToken::new("3f2504e0-4f89-11d3-9a0c-0305e82c3301");
        assert!(!token.is_none());
    }

    #[test]
    fn test_bluetooth_address_formatting() {
        let formatted = format_bluetooth_address(&[0x00, 0x1B, 0xDC, 0x0F, 0xA3, 0x7E]).unwrap();
        assert_eq!(formatted, "00:1B:DC:0F:A3:7E");
        assert!(format_bluetooth_address(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_device_state_transitions() {
        let device = Device::new(DeviceDescriptor {
            id: DeviceId::random(),
            name: "S740".into(),
            kind: DeviceType::Handheld,
        });
        assert!(device.is_open());
        assert!(device.is_owned());
        assert!(device.ownership_token().is_none());

        let token = OwnershipToken::new("3f2504e0-4f89-11d3-9a0c-0305e82c3301");
        device.set_ownership(true, token.clone());
        assert_eq!(device.ownership_token(), token);

        device.set_ownership(false, OwnershipToken::none());
        assert!(!device.is_owned());
        assert!(device.ownership_token().is_none());
    }
}
