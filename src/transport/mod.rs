//! Transport boundary to the companion service.
//!
//! The transport performs the actual discovery, wire encoding and
//! request/response correlation; this crate only depends on the trait below.
//! Raw events are delivered through a single subscribe-once stream.

#[cfg(test)]
pub mod mock;

use futures::future::BoxFuture;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::protocol::{Property, RawEvent};
use crate::types::DeviceId;

/// Application identity triple passed when opening a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    /// Application identifier.
    pub application_id: String,
    /// Developer identifier.
    pub developer_id: String,
    /// Application key issued for the identifier pair.
    pub application_key: String,
}

impl AppIdentity {
    /// Builds an identity triple.
    #[must_use]
    pub fn new(
        application_id: impl Into<String>,
        developer_id: impl Into<String>,
        application_key: impl Into<String>,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            developer_id: developer_id.into(),
            application_key: application_key.into(),
        }
    }
}

/// Scope of a property exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyTarget {
    /// Session-scoped property.
    Session,
    /// Property of a specific device.
    Device(DeviceId),
}

/// Trait for transport implementations.
///
/// All methods take `&self`: property exchanges are independent asynchronous
/// operations and several may be outstanding concurrently. No timeout is
/// imposed at this layer; a non-responding transport leaves a call pending.
pub trait Transport: Send + Sync {
    /// Opens the session with the companion service.
    fn open_session(&self, identity: AppIdentity) -> BoxFuture<'_, Result<()>>;

    /// Closes the session.
    fn close_session(&self) -> BoxFuture<'_, Result<()>>;

    /// Opens a device, acquiring ownership.
    fn open_device(&self, id: DeviceId) -> BoxFuture<'_, Result<()>>;

    /// Closes a device, releasing ownership.
    fn close_device(&self, id: DeviceId) -> BoxFuture<'_, Result<()>>;

    /// Performs a single property read exchange.
    fn get_property(
        &self,
        target: PropertyTarget,
        request: Property,
    ) -> BoxFuture<'_, Result<Property>>;

    /// Performs a single property write exchange.
    fn set_property(
        &self,
        target: PropertyTarget,
        request: Property,
    ) -> BoxFuture<'_, Result<()>>;

    /// Claims the raw event stream.
    ///
    /// The stream can be claimed once per established connection; subsequent
    /// calls return `None` until the transport reconnects.
    fn take_events(&self) -> Option<mpsc::Receiver<RawEvent>>;
}
