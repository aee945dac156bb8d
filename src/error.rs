//! Error types for the scanlink library.

use thiserror::Error;

use crate::protocol::ValueTag;
use crate::types::DeviceId;

/// Result code for the "transport unavailable" failure class.
pub const CODE_TRANSPORT_UNAVAILABLE: i32 = -1;
/// Result code for the "not supported" failure class.
pub const CODE_NOT_SUPPORTED: i32 = -2;
/// Result code for the "invalid operation" failure class.
pub const CODE_INVALID_OPERATION: i32 = -3;
/// Result code for the "device not present" failure class.
pub const CODE_DEVICE_NOT_PRESENT: i32 = -4;
/// Result code for the "protocol error" failure class.
pub const CODE_PROTOCOL_ERROR: i32 = -5;
/// Result code for operations attempted on a closed session.
pub const CODE_NOT_OPEN: i32 = -6;
/// Result code for a lost event stream.
pub const CODE_CHANNEL_CLOSED: i32 = -7;

/// The main error type for scanlink operations.
///
/// Every variant maps to a distinct negative result code via [`Error::code`];
/// any non-negative code means success. Failures surfaced by the transport
/// are carried verbatim, never remapped to a different failure class.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The companion service is not reachable or refused the identity.
    #[error("companion service unavailable")]
    TransportUnavailable,

    /// The property or operation is not implemented by this device.
    #[error("not supported by this device")]
    NotSupported,

    /// A property value carried the wrong tag for its identifier.
    #[error("property value tag mismatch: expected {expected}, got {got}")]
    InvalidOperation {
        /// Tag the identifier requires.
        expected: ValueTag,
        /// Tag actually carried.
        got: ValueTag,
    },

    /// The target device has been removed from the registry.
    #[error("device {0} is no longer present")]
    DeviceNotPresent(DeviceId),

    /// Malformed or unrecognized payload from the transport.
    #[error("protocol error: {message}")]
    Protocol {
        /// What was malformed.
        message: String,
    },

    /// The session is not open.
    #[error("session is not open")]
    NotOpen,

    /// The raw event stream was closed or already claimed.
    #[error("event stream closed")]
    ChannelClosed,

    /// Any other negative code surfaced by the transport.
    #[error("transport error {code}")]
    Unspecified {
        /// Carried result code.
        code: i32,
    },
}

impl Error {
    /// Returns the negative result code for this error.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::TransportUnavailable => CODE_TRANSPORT_UNAVAILABLE,
            Self::NotSupported => CODE_NOT_SUPPORTED,
            Self::InvalidOperation { .. } => CODE_INVALID_OPERATION,
            Self::DeviceNotPresent(_) => CODE_DEVICE_NOT_PRESENT,
            Self::Protocol { .. } => CODE_PROTOCOL_ERROR,
            Self::NotOpen => CODE_NOT_OPEN,
            Self::ChannelClosed => CODE_CHANNEL_CLOSED,
            Self::Unspecified { code } => *code,
        }
    }

    /// Maps a transport result code back to an error.
    ///
    /// Returns `None` for non-negative codes (success). The payload-carrying
    /// failure classes (tag mismatch, missing device, protocol error) cannot
    /// be rebuilt from a bare code; their codes, like any unrecognized
    /// negative code, come back as [`Error::Unspecified`] carrying the code
    /// verbatim so it is never silently dropped.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        if code >= 0 {
            return None;
        }
        Some(match code {
            CODE_TRANSPORT_UNAVAILABLE => Self::TransportUnavailable,
            CODE_NOT_SUPPORTED => Self::NotSupported,
            CODE_NOT_OPEN => Self::NotOpen,
            CODE_CHANNEL_CLOSED => Self::ChannelClosed,
            _ => Self::Unspecified { code },
        })
    }

    /// Builds a protocol error with the given message.
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

/// Result type alias for scanlink operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_negative_and_distinct() {
        let errors = [
            Error::TransportUnavailable,
            Error::NotSupported,
            Error::InvalidOperation {
                expected: ValueTag::Byte,
                got: ValueTag::String,
            },
            Error::DeviceNotPresent(DeviceId::nil()),
            Error::protocol("bad payload"),
            Error::NotOpen,
            Error::ChannelClosed,
        ];
        let codes: Vec<i32> = errors.iter().map(Error::code).collect();
        assert!(codes.iter().all(|c| *c < 0));
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_from_code_round_trip() {
        assert_eq!(Error::from_code(0), None);
        assert_eq!(Error::from_code(42), None);
        assert_eq!(
            Error::from_code(CODE_TRANSPORT_UNAVAILABLE),
            Some(Error::TransportUnavailable)
        );
        assert_eq!(Error::from_code(-99), Some(Error::Unspecified { code: -99 }));
    }

    #[test]
    fn test_from_code_keeps_payload_carrying_codes() {
        // These classes carry context a bare code cannot restore; the code
        // itself still survives the round trip.
        for code in [
            CODE_INVALID_OPERATION,
            CODE_DEVICE_NOT_PRESENT,
            CODE_PROTOCOL_ERROR,
        ] {
            let error = Error::from_code(code).unwrap();
            assert_eq!(error, Error::Unspecified { code });
            assert_eq!(error.code(), code);
        }
    }
}
