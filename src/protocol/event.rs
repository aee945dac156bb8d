//! Raw transport events.
//!
//! The transport delivers a single serialized stream of these events to the
//! session's intake task, which performs the implied registry transitions and
//! republishes them as typed [`DomainEvent`](crate::event::DomainEvent)s.

use crate::types::{DecodedData, DeviceDescriptor, DeviceId, OwnershipToken};

/// A raw, unclassified notification from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// A device appeared; carries its descriptor.
    DeviceArrival(DeviceDescriptor),
    /// A device departed.
    DeviceRemoval(DeviceId),
    /// Device ownership changed; the "no owner" token means ownership lost.
    OwnershipChange {
        /// Affected device.
        id: DeviceId,
        /// New ownership token.
        token: OwnershipToken,
    },
    /// Decoded scan data from a device.
    DecodedData {
        /// Source device.
        id: DeviceId,
        /// Decoded payload.
        data: DecodedData,
    },
    /// Bit-packed power state payload.
    PowerState {
        /// Source device.
        id: DeviceId,
        /// Raw signed 64-bit payload.
        raw: i64,
    },
    /// Bit-packed battery range payload.
    BatteryLevel {
        /// Source device.
        id: DeviceId,
        /// Raw signed 64-bit payload.
        raw: i64,
    },
    /// Bit-packed button state payload.
    ButtonsState {
        /// Source device.
        id: DeviceId,
        /// Raw signed 64-bit payload.
        raw: i64,
    },
    /// Error reported by the transport.
    Error {
        /// Negative result code.
        code: i32,
        /// Descriptive message.
        message: String,
    },
    /// The transport's internal listener is active.
    ListenerStarted,
    /// The connection is terminating; a negative result means it broke
    /// unexpectedly, a non-negative one answers a graceful abort.
    Terminate {
        /// Final result code.
        result: i32,
    },
}
