//! Scripted in-memory transport used by unit tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::protocol::{Property, PropertyId, PropertyValue, RawEvent};
use crate::transport::{AppIdentity, PropertyTarget, Transport};
use crate::types::DeviceId;

/// Capacity of the raw event channel handed to tests.
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct Inner {
    open_session_failure: Option<Error>,
    open_device_failures: HashMap<DeviceId, Error>,
    close_device_failures: HashMap<DeviceId, Error>,
    get_responses: HashMap<PropertyId, Result<PropertyValue>>,
    set_failures: HashMap<PropertyId, Error>,
    get_calls: Vec<(PropertyTarget, PropertyId)>,
    set_calls: Vec<(PropertyTarget, Property)>,
    opened_devices: Vec<DeviceId>,
    closed_devices: Vec<DeviceId>,
    open_session_calls: usize,
    close_session_calls: usize,
    events: Option<mpsc::Receiver<RawEvent>>,
}

/// A transport whose responses are scripted by the test.
///
/// Raw events are injected through the sender returned by [`MockTransport::new`]
/// or [`MockTransport::arm_events`].
#[derive(Default)]
pub struct MockTransport {
    inner: Mutex<Inner>,
}

impl MockTransport {
    /// Creates a mock with an armed raw event stream.
    #[must_use]
    pub fn new() -> (Self, mpsc::Sender<RawEvent>) {
        let mock = Self::default();
        let sender = mock.arm_events();
        (mock, sender)
    }

    /// Arms a fresh raw event stream, replacing any unclaimed one.
    pub fn arm_events(&self) -> mpsc::Sender<RawEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.lock().events = Some(rx);
        tx
    }

    /// Makes the next `open_session` call fail with the given error.
    pub fn fail_next_open_session(&self, error: Error) {
        self.lock().open_session_failure = Some(error);
    }

    /// Scripts a successful get response for a property.
    pub fn script_get(&self, id: PropertyId, value: PropertyValue) {
        self.lock().get_responses.insert(id, Ok(value));
    }

    /// Scripts a failing get response for a property.
    pub fn fail_get(&self, id: PropertyId, error: Error) {
        self.lock().get_responses.insert(id, Err(error));
    }

    /// Scripts a failing set response for a property.
    pub fn fail_set(&self, id: PropertyId, error: Error) {
        self.lock().set_failures.insert(id, error);
    }

    /// Makes every `open_device` call for `id` fail with the given error.
    pub fn fail_open_device(&self, id: DeviceId, error: Error) {
        self.lock().open_device_failures.insert(id, error);
    }

    /// Makes every `close_device` call for `id` fail with the given error.
    pub fn fail_close_device(&self, id: DeviceId, error: Error) {
        self.lock().close_device_failures.insert(id, error);
    }

    /// Number of property exchanges attempted so far.
    pub fn property_call_count(&self) -> usize {
        let inner = self.lock();
        inner.get_calls.len() + inner.set_calls.len()
    }

    /// Set-requests received so far.
    pub fn set_calls(&self) -> Vec<(PropertyTarget, Property)> {
        self.lock().set_calls.clone()
    }

    /// Devices opened so far.
    pub fn opened_devices(&self) -> Vec<DeviceId> {
        self.lock().opened_devices.clone()
    }

    /// Devices closed so far.
    pub fn closed_devices(&self) -> Vec<DeviceId> {
        self.lock().closed_devices.clone()
    }

    /// Number of `open_session` calls so far.
    pub fn open_session_calls(&self) -> usize {
        self.lock().open_session_calls
    }

    /// Number of `close_session` calls so far.
    pub fn close_session_calls(&self) -> usize {
        self.lock().close_session_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MockTransport {
    fn open_session(&self, _identity: AppIdentity) -> BoxFuture<'_, Result<()>> {
        let result = {
            let mut inner = self.lock();
            inner.open_session_calls += 1;
            match inner.open_session_failure.take() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        };
        Box::pin(async move { result })
    }

    fn close_session(&self) -> BoxFuture<'_, Result<()>> {
        self.lock().close_session_calls += 1;
        Box::pin(async { Ok(()) })
    }

    fn open_device(&self, id: DeviceId) -> BoxFuture<'_, Result<()>> {
        let result = {
            let mut inner = self.lock();
            match inner.open_device_failures.get(&id) {
                Some(error) => Err(error.clone()),
                None => {
                    inner.opened_devices.push(id);
                    Ok(())
                }
            }
        };
        Box::pin(async move { result })
    }

    fn close_device(&self, id: DeviceId) -> BoxFuture<'_, Result<()>> {
        let result = {
            let mut inner = self.lock();
            match inner.close_device_failures.get(&id) {
                Some(error) => Err(error.clone()),
                None => {
                    inner.closed_devices.push(id);
                    Ok(())
                }
            }
        };
        Box::pin(async move { result })
    }

    fn get_property(
        &self,
        target: PropertyTarget,
        request: Property,
    ) -> BoxFuture<'_, Result<Property>> {
        let result = {
            let mut inner = self.lock();
            inner.get_calls.push((target, request.id));
            match inner.get_responses.get(&request.id) {
                Some(Ok(value)) => Ok(Property {
                    id: request.id,
                    value: value.clone(),
                }),
                Some(Err(error)) => Err(error.clone()),
                None => Err(Error::NotSupported),
            }
        };
        Box::pin(async move { result })
    }

    fn set_property(
        &self,
        target: PropertyTarget,
        request: Property,
    ) -> BoxFuture<'_, Result<()>> {
        let result = {
            let mut inner = self.lock();
            let outcome = match inner.set_failures.get(&request.id) {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            };
            inner.set_calls.push((target, request));
            outcome
        };
        Box::pin(async move { result })
    }

    fn take_events(&self) -> Option<mpsc::Receiver<RawEvent>> {
        self.lock().events.take()
    }
}
