//! Tagged-property protocol model.
//!
//! Every session- or device-scoped configuration operation is expressed as a
//! [`Property`] request carrying an identifier from the [`PropertyId`] catalog
//! and a [`PropertyValue`] of the tag that identifier requires. A value under
//! the wrong tag is a checked error, never a silently zeroed field.

use std::fmt;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::types::{Symbology, VersionInfo};

/// Catalog of property identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PropertyId {
    // Session-scoped properties
    /// Session layer version (get).
    Version,
    /// Graceful-shutdown handshake (set).
    Abort,
    /// Data confirmation mode (get/set).
    DataConfirmationMode,
    /// Data confirmation feedback action (get/set).
    DataConfirmationAction,

    // Device-scoped properties
    /// Device display name (get/set).
    FriendlyName,
    /// Data prefix prepended to decoded data (get/set).
    Prefix,
    /// Data suffix appended to decoded data (get/set).
    Suffix,
    /// Notification subscription mask (get/set).
    Notifications,
    /// Battery range decomposition (get).
    Battery,
    /// Power source state (get).
    PowerState,
    /// Bluetooth address octets (get).
    BluetoothAddress,
    /// Stand behavior configuration (get/set).
    StandConfig,
    /// Local decode feedback flags (get/set).
    DecodeAction,
    /// Per-symbology enablement (get/set).
    Symbology,
    /// Trigger control (set).
    Trigger,
    /// Device firmware version (get).
    FirmwareVersion,
    /// Vendor-specific command round trip (get).
    VendorCommand,
}

impl PropertyId {
    /// The value tag this identifier's semantics require.
    ///
    /// Responses and set-requests must carry a value under this tag;
    /// get-requests may carry [`ValueTag::None`] or a request argument
    /// (symbology selector, vendor command payload).
    #[must_use]
    pub const fn value_tag(self) -> ValueTag {
        match self {
            Self::Version | Self::FirmwareVersion => ValueTag::Version,
            Self::Abort => ValueTag::None,
            Self::DataConfirmationMode | Self::PowerState | Self::DecodeAction | Self::Trigger => {
                ValueTag::Byte
            }
            Self::DataConfirmationAction
            | Self::Notifications
            | Self::Battery
            | Self::StandConfig => ValueTag::UnsignedLong,
            Self::FriendlyName | Self::Prefix | Self::Suffix => ValueTag::String,
            Self::BluetoothAddress | Self::VendorCommand => ValueTag::ByteArray,
            Self::Symbology => ValueTag::Symbology,
        }
    }
}

/// Value tag of a [`PropertyValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTag {
    /// No value.
    None,
    /// Single byte.
    Byte,
    /// Unsigned 32-bit integer.
    UnsignedLong,
    /// UTF-8 string.
    String,
    /// Opaque byte array.
    ByteArray,
    /// Version structure.
    Version,
    /// Symbology structure.
    Symbology,
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Byte => "byte",
            Self::UnsignedLong => "unsigned long",
            Self::String => "string",
            Self::ByteArray => "byte array",
            Self::Version => "version",
            Self::Symbology => "symbology",
        };
        f.write_str(name)
    }
}

/// Tagged union of property values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// No value.
    None,
    /// Single byte.
    Byte(u8),
    /// Unsigned 32-bit integer.
    UnsignedLong(u32),
    /// UTF-8 string.
    String(String),
    /// Opaque byte array.
    ByteArray(Bytes),
    /// Version structure.
    Version(VersionInfo),
    /// Symbology structure.
    Symbology(Symbology),
}

impl PropertyValue {
    /// Returns the tag of this value.
    #[must_use]
    pub const fn tag(&self) -> ValueTag {
        match self {
            Self::None => ValueTag::None,
            Self::Byte(_) => ValueTag::Byte,
            Self::UnsignedLong(_) => ValueTag::UnsignedLong,
            Self::String(_) => ValueTag::String,
            Self::ByteArray(_) => ValueTag::ByteArray,
            Self::Version(_) => ValueTag::Version,
            Self::Symbology(_) => ValueTag::Symbology,
        }
    }

    /// Checks that this value carries the expected tag.
    pub fn expect_tag(&self, expected: ValueTag) -> Result<()> {
        if self.tag() == expected {
            Ok(())
        } else {
            Err(Error::InvalidOperation {
                expected,
                got: self.tag(),
            })
        }
    }

    /// Extracts the byte value.
    pub fn as_byte(&self) -> Result<u8> {
        match self {
            Self::Byte(byte) => Ok(*byte),
            other => Err(tag_mismatch(ValueTag::Byte, other)),
        }
    }

    /// Extracts the unsigned-long value.
    pub fn as_unsigned_long(&self) -> Result<u32> {
        match self {
            Self::UnsignedLong(value) => Ok(*value),
            other => Err(tag_mismatch(ValueTag::UnsignedLong, other)),
        }
    }

    /// Extracts the string value.
    pub fn into_string(self) -> Result<String> {
        match self {
            Self::String(text) => Ok(text),
            other => Err(tag_mismatch(ValueTag::String, &other)),
        }
    }

    /// Extracts the byte-array value.
    pub fn into_byte_array(self) -> Result<Bytes> {
        match self {
            Self::ByteArray(bytes) => Ok(bytes),
            other => Err(tag_mismatch(ValueTag::ByteArray, &other)),
        }
    }

    /// Extracts the version structure.
    pub fn into_version(self) -> Result<VersionInfo> {
        match self {
            Self::Version(version) => Ok(version),
            other => Err(tag_mismatch(ValueTag::Version, &other)),
        }
    }

    /// Extracts the symbology structure.
    pub fn into_symbology(self) -> Result<Symbology> {
        match self {
            Self::Symbology(symbology) => Ok(symbology),
            other => Err(tag_mismatch(ValueTag::Symbology, &other)),
        }
    }
}

fn tag_mismatch(expected: ValueTag, got: &PropertyValue) -> Error {
    Error::InvalidOperation {
        expected,
        got: got.tag(),
    }
}

/// A property request or response: identifier plus tagged value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property identifier.
    pub id: PropertyId,
    /// Tagged value; [`PropertyValue::None`] for a plain get-request.
    pub value: PropertyValue,
}

impl Property {
    /// Builds a get-request carrying no argument.
    #[must_use]
    pub const fn get(id: PropertyId) -> Self {
        Self {
            id,
            value: PropertyValue::None,
        }
    }

    /// Builds a get-request carrying an argument (symbology selector,
    /// vendor command payload).
    #[must_use]
    pub const fn get_with(id: PropertyId, value: PropertyValue) -> Self {
        Self { id, value }
    }

    /// Builds a set-request, checking the value tag against the identifier.
    pub fn set(id: PropertyId, value: PropertyValue) -> Result<Self> {
        value.expect_tag(id.value_tag())?;
        Ok(Self { id, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SymbologyId, SymbologyStatus};

    #[test]
    fn test_value_tags() {
        assert_eq!(PropertyValue::None.tag(), ValueTag::None);
        assert_eq!(PropertyValue::Byte(3).tag(), ValueTag::Byte);
        assert_eq!(
            PropertyValue::String("scanner".into()).tag(),
            ValueTag::String
        );
        assert_eq!(
            PropertyValue::Symbology(Symbology {
                id: SymbologyId::QrCode,
                status: SymbologyStatus::Enabled,
            })
            .tag(),
            ValueTag::Symbology
        );
    }

    #[test]
    fn test_accessor_tag_mismatch() {
        let value = PropertyValue::UnsignedLong(7);
        assert_eq!(value.as_unsigned_long().unwrap(), 7);
        let err = value.as_byte().unwrap_err();
        assert_eq!(
            err,
            Error::InvalidOperation {
                expected: ValueTag::Byte,
                got: ValueTag::UnsignedLong,
            }
        );
    }

    #[test]
    fn test_set_request_tag_check() {
        assert!(Property::set(PropertyId::FriendlyName, PropertyValue::String("S740".into())).is_ok());
        let err =
            Property::set(PropertyId::FriendlyName, PropertyValue::Byte(1)).unwrap_err();
        assert_eq!(err.code(), crate::error::CODE_INVALID_OPERATION);
    }

    #[test]
    fn test_catalog_tags() {
        assert_eq!(PropertyId::Version.value_tag(), ValueTag::Version);
        assert_eq!(PropertyId::Abort.value_tag(), ValueTag::None);
        assert_eq!(PropertyId::Notifications.value_tag(), ValueTag::UnsignedLong);
        assert_eq!(PropertyId::VendorCommand.value_tag(), ValueTag::ByteArray);
    }
}
