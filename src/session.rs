//! Session lifecycle and raw event intake.
//!
//! A [`Session`] owns the device registry and the event dispatcher, turns the
//! transport's raw event stream into domain events, and exposes the
//! session-scoped property operations.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::device::DeviceHandle;
use crate::error::{Error, Result};
use crate::event::{DomainEvent, EventDispatcher, EventFilter, EventKind, Subscription};
use crate::properties::PropertyClient;
use crate::protocol::{PropertyId, PropertyValue, RawEvent};
use crate::registry::DeviceRegistry;
use crate::transport::{AppIdentity, PropertyTarget, Transport};
use crate::types::{
    BatteryState, ButtonsState, DataConfirmationAction, DataConfirmationMode, Device, DeviceId,
    PowerState, VersionInfo,
};

/// Broadcast capacity for domain events.
const EVENT_CAPACITY: usize = 256;

/// Connection state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Closed,
    Open,
}

/// Client session with the companion service.
///
/// Exactly one session is active per transport. Closing is idempotent;
/// dropping the session aborts the intake task.
pub struct Session<T> {
    transport: Arc<T>,
    props: PropertyClient<T>,
    registry: Arc<DeviceRegistry>,
    dispatcher: EventDispatcher,
    state: ConnectionState,
    intake_task: Option<JoinHandle<()>>,
}

impl<T: Transport + 'static> Session<T> {
    /// Creates a session over the given transport (not yet open).
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    /// Creates a session over a shared transport handle.
    #[must_use]
    pub fn from_arc(transport: Arc<T>) -> Self {
        let props = PropertyClient::new(Arc::clone(&transport));
        Self {
            transport,
            props,
            registry: Arc::new(DeviceRegistry::new()),
            dispatcher: EventDispatcher::new(EVENT_CAPACITY),
            state: ConnectionState::Closed,
            intake_task: None,
        }
    }

    /// Opens the session, passing the application identity triple.
    ///
    /// On failure the session stays closed, holds no transport handle and is
    /// safe to open again.
    pub async fn open(&mut self, identity: AppIdentity) -> Result<()> {
        if self.state == ConnectionState::Open {
            return Ok(());
        }

        self.transport.open_session(identity).await?;

        let Some(raw_events) = self.transport.take_events() else {
            // Roll the connection back rather than run without events.
            let _ = self.transport.close_session().await;
            return Err(Error::ChannelClosed);
        };

        self.intake_task = Some(self.spawn_intake(raw_events));
        self.state = ConnectionState::Open;
        tracing::info!("session opened");
        Ok(())
    }

    /// Closes the session. Calling it while already closed returns success
    /// without side effects.
    pub async fn close(&mut self) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }

        if let Some(task) = self.intake_task.take() {
            task.abort();
        }
        self.registry.clear();
        self.state = ConnectionState::Closed;
        tracing::info!("session closed");
        self.transport.close_session().await
    }

    /// Returns true if the session is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Returns handles for the devices present right now, in registry order.
    ///
    /// The returned sequence is an immutable snapshot; arrivals and removals
    /// after this call do not affect it.
    #[must_use]
    pub fn devices(&self) -> Vec<DeviceHandle<T>> {
        self.registry
            .snapshot()
            .into_iter()
            .map(|device| self.handle_for(device))
            .collect()
    }

    /// Returns a handle for the device with the given identifier, if present.
    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<DeviceHandle<T>> {
        self.registry.find(id).map(|device| self.handle_for(device))
    }

    /// Subscribes to domain events.
    ///
    /// If the filter accepts arrivals or ownership changes, the subscription
    /// is seeded with catch-up events for every already-known device (in
    /// registry order), so a late subscriber is not blind to devices that
    /// arrived before it subscribed. The registry snapshot is taken under the
    /// dispatch lock, so a device racing through intake at subscription time
    /// is seen exactly once: in the backlog or live, never both or neither.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let replay = filter.clone();
        self.dispatcher.subscribe_with_replay(filter, || {
            let mut backlog = VecDeque::new();
            if replay.accepts(EventKind::DeviceArrival) {
                for device in self.registry.snapshot() {
                    backlog.push_back(DomainEvent::DeviceArrival(device));
                }
            }
            if replay.accepts(EventKind::OwnershipChange) {
                for device in self.registry.snapshot() {
                    let owned = device.is_owned();
                    let token = device.ownership_token();
                    backlog.push_back(DomainEvent::OwnershipChange {
                        device,
                        owned,
                        token,
                    });
                }
            }
            backlog
        })
    }

    /// Installs the ordered redelivery queue.
    ///
    /// Every subsequent domain event is pushed to the returned receiver in
    /// strict arrival order; consume it on whatever execution context suits
    /// the application (UI thread, dedicated task, ...).
    #[must_use]
    pub fn redirect_events(&self) -> mpsc::UnboundedReceiver<DomainEvent> {
        self.dispatcher.redirect()
    }

    // ==================== Session-Scoped Properties ====================

    /// Queries the session layer version.
    pub async fn version(&self) -> Result<VersionInfo> {
        self.ensure_open()?;
        self.props
            .get(PropertyTarget::Session, PropertyId::Version)
            .await?
            .into_version()
    }

    /// Signals intent to stop.
    ///
    /// The transport answers with a [`DomainEvent::Terminate`] carrying a
    /// success result once it is safe to [`close`](Self::close).
    pub async fn abort(&self) -> Result<()> {
        self.ensure_open()?;
        self.props
            .set(PropertyTarget::Session, PropertyId::Abort, PropertyValue::None)
            .await
    }

    /// Reads the data confirmation mode.
    pub async fn data_confirmation_mode(&self) -> Result<DataConfirmationMode> {
        self.ensure_open()?;
        let code = self
            .props
            .get(PropertyTarget::Session, PropertyId::DataConfirmationMode)
            .await?
            .as_byte()?;
        DataConfirmationMode::from_code(code)
            .ok_or_else(|| Error::protocol(format!("unrecognized confirmation mode {code}")))
    }

    /// Writes the data confirmation mode.
    pub async fn set_data_confirmation_mode(&self, mode: DataConfirmationMode) -> Result<()> {
        self.ensure_open()?;
        self.props
            .set(
                PropertyTarget::Session,
                PropertyId::DataConfirmationMode,
                PropertyValue::Byte(mode.code()),
            )
            .await
    }

    /// Reads the data confirmation feedback action.
    pub async fn data_confirmation_action(&self) -> Result<DataConfirmationAction> {
        self.ensure_open()?;
        let bits = self
            .props
            .get(PropertyTarget::Session, PropertyId::DataConfirmationAction)
            .await?
            .as_unsigned_long()?;
        DataConfirmationAction::from_bits(bits)
    }

    /// Writes the data confirmation feedback action.
    pub async fn set_data_confirmation_action(
        &self,
        action: DataConfirmationAction,
    ) -> Result<()> {
        self.ensure_open()?;
        self.props
            .set(
                PropertyTarget::Session,
                PropertyId::DataConfirmationAction,
                PropertyValue::UnsignedLong(action.to_bits()),
            )
            .await
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == ConnectionState::Open {
            Ok(())
        } else {
            Err(Error::NotOpen)
        }
    }

    fn handle_for(&self, device: Arc<Device>) -> DeviceHandle<T> {
        DeviceHandle::new(device, Arc::clone(&self.registry), self.props.clone())
    }

    fn spawn_intake(&self, mut raw_events: mpsc::Receiver<RawEvent>) -> JoinHandle<()> {
        let registry = Arc::clone(&self.registry);
        let dispatcher = self.dispatcher.clone();
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            while let Some(event) = raw_events.recv().await {
                process_raw_event(event, &registry, &dispatcher, transport.as_ref()).await;
            }
            tracing::debug!("raw event stream ended");
        })
    }
}

impl<T> Drop for Session<T> {
    fn drop(&mut self) {
        if let Some(task) = self.intake_task.take() {
            task.abort();
        }
    }
}

/// Applies one raw event: performs the registry transition it implies and
/// republishes it as a domain event.
///
/// Malformed events never crash the intake task; they are dropped with a
/// diagnostic, or reported as a decoding error where the payload carried an
/// unrecognized property shape.
async fn process_raw_event<T: Transport>(
    event: RawEvent,
    registry: &DeviceRegistry,
    dispatcher: &EventDispatcher,
    transport: &T,
) {
    tracing::trace!(?event, "raw event");
    match event {
        RawEvent::DeviceArrival(descriptor) => {
            let id = descriptor.id;
            if registry.contains(id) {
                tracing::warn!(device = %id, "duplicate arrival");
                let _ = transport.close_device(id).await;
                dispatch_error(
                    dispatcher,
                    &Error::protocol(format!("duplicate arrival for device {id}")),
                );
                return;
            }
            // A device that fails to open never enters the registry.
            if let Err(error) = transport.open_device(id).await {
                tracing::warn!(device = %id, %error, "failed to open arriving device");
                dispatch_error(dispatcher, &error);
                return;
            }
            let device = Arc::new(Device::new(descriptor));
            // Insert and announce under the dispatch lock, so a replay
            // subscription racing this arrival sees the device exactly once.
            let scope = dispatcher.lock();
            match registry.insert(Arc::clone(&device)) {
                Ok(()) => scope.dispatch(DomainEvent::DeviceArrival(device)),
                Err(error) => scope.dispatch(DomainEvent::Error {
                    code: error.code(),
                    message: error.to_string(),
                }),
            }
        }
        RawEvent::DeviceRemoval(id) => {
            // Remove and announce under the dispatch lock, then release the
            // transport-level claim. Concurrent lookups never see a removed
            // device.
            {
                let scope = dispatcher.lock();
                let Some(device) = registry.remove(id) else {
                    tracing::debug!(device = %id, "removal for unknown device");
                    return;
                };
                device.set_open(false);
                scope.dispatch(DomainEvent::DeviceRemoval(device));
            }
            if let Err(error) = transport.close_device(id).await {
                tracing::warn!(device = %id, %error, "failed to close removed device");
                dispatch_error(dispatcher, &error);
            }
        }
        RawEvent::OwnershipChange { id, token } => {
            let scope = dispatcher.lock();
            let Some(device) = registry.find(id) else {
                tracing::debug!(device = %id, "ownership change for unknown device");
                return;
            };
            let owned = !token.is_none();
            device.set_ownership(owned, token.clone());
            scope.dispatch(DomainEvent::OwnershipChange {
                device,
                owned,
                token,
            });
        }
        RawEvent::DecodedData { id, data } => {
            let Some(device) = registry.find(id) else {
                tracing::debug!(device = %id, "decoded data for unknown device");
                return;
            };
            dispatcher.dispatch(DomainEvent::DecodedData { device, data });
        }
        RawEvent::PowerState { id, raw } => {
            let Some(device) = registry.find(id) else {
                tracing::debug!(device = %id, "power state for unknown device");
                return;
            };
            match PowerState::from_raw(raw) {
                Ok(state) => dispatcher.dispatch(DomainEvent::PowerState { device, state }),
                Err(error) => {
                    tracing::warn!(device = %id, %error, "dropping malformed power state");
                }
            }
        }
        RawEvent::BatteryLevel { id, raw } => {
            let Some(device) = registry.find(id) else {
                tracing::debug!(device = %id, "battery level for unknown device");
                return;
            };
            let battery = BatteryState::from_raw(raw);
            dispatcher.dispatch(DomainEvent::BatteryLevel { device, battery });
        }
        RawEvent::ButtonsState { id, raw } => {
            let Some(device) = registry.find(id) else {
                tracing::debug!(device = %id, "buttons state for unknown device");
                return;
            };
            let buttons = ButtonsState::from_raw(raw);
            dispatcher.dispatch(DomainEvent::ButtonsState { device, buttons });
        }
        RawEvent::Error { code, message } => {
            dispatcher.dispatch(DomainEvent::Error { code, message });
        }
        RawEvent::ListenerStarted => dispatcher.dispatch(DomainEvent::ListenerStarted),
        RawEvent::Terminate { result } => {
            // Does not close the session itself; the application decides.
            dispatcher.dispatch(DomainEvent::Terminate { result });
        }
    }
}

fn dispatch_error(dispatcher: &EventDispatcher, error: &Error) {
    dispatcher.dispatch(DomainEvent::Error {
        code: error.code(),
        message: error.to_string(),
    });
}
