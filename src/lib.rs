//! # scanlink
//!
//! A Rust client session layer for barcode scanner companion services.
//!
//! This library sits between an application and the event-and-property
//! transport of a peripheral-management service. It maintains a consistent,
//! thread-safe view of the devices present right now, republishes raw
//! transport notifications as typed domain events, and maps generic tagged
//! property round trips into typed read/write operations.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Thread-safe device registry with snapshot semantics
//! - Event-driven architecture with catch-up replay for late subscribers
//! - Ordered FIFO redelivery queue for caller-chosen execution contexts
//! - Tagged property protocol with checked value tags
//!
//! ## Quick Start
//!
//! ```no_run
//! use scanlink::{AppIdentity, EventFilter, Session, Transport};
//!
//! async fn run(transport: impl Transport + 'static) -> Result<(), scanlink::Error> {
//!     let mut session = Session::new(transport);
//!     session
//!         .open(AppIdentity::new("com.example.inventory", "example", "app-key"))
//!         .await?;
//!
//!     let mut events = session.subscribe(EventFilter::all());
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`protocol`] - Tagged-property model and raw transport events
//! - [`types`] - Data structures (devices, settings, decoded data)
//! - [`transport`] - The transport trait boundary
//! - [`registry`] - Thread-safe device registry
//! - [`event`] - Domain events, subscriptions and the redelivery queue
//! - [`properties`] - The generic property Get/Set primitive
//! - [`session`] - High-level [`Session`] lifecycle and event intake
//! - [`device`] - Per-device [`DeviceHandle`] proxy

pub mod device;
pub mod error;
pub mod event;
pub mod properties;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use device::DeviceHandle;
pub use error::{Error, Result};
pub use event::{DispatchGuard, DomainEvent, EventDispatcher, EventFilter, EventKind, Subscription};
pub use properties::PropertyClient;
pub use protocol::{Property, PropertyId, PropertyValue, RawEvent, ValueTag};
pub use registry::DeviceRegistry;
pub use session::Session;
pub use transport::{AppIdentity, PropertyTarget, Transport};
pub use types::{
    BatteryState, ButtonsState, DataConfirmationAction, DataConfirmationMode, DecodeAction,
    DecodedData, Device, DeviceDescriptor, DeviceId, DeviceType, Notifications, OwnershipToken,
    PowerState, StandConfig, Symbology, SymbologyId, SymbologyStatus, TriggerAction, VersionInfo,
};
