//! Domain event system.
//!
//! The session's intake task republishes raw transport notifications as typed
//! [`DomainEvent`]s through the dispatcher. Applications consume them either
//! through broadcast [`Subscription`]s (optionally filtered by kind, with
//! catch-up replay for late subscribers) or through a single ordered redirect
//! queue processed on an execution context of their choosing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, mpsc};

use crate::types::{
    BatteryState, ButtonsState, DecodedData, Device, OwnershipToken, PowerState,
};

/// Typed notification republished to the application.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A device was opened and registered.
    DeviceArrival(Arc<Device>),
    /// A device was deregistered.
    DeviceRemoval(Arc<Device>),
    /// Device ownership changed.
    OwnershipChange {
        /// Affected device.
        device: Arc<Device>,
        /// Whether this client now owns the device.
        owned: bool,
        /// Current ownership token.
        token: OwnershipToken,
    },
    /// Decoded scan data.
    DecodedData {
        /// Source device.
        device: Arc<Device>,
        /// Decoded payload.
        data: DecodedData,
    },
    /// Power source changed.
    PowerState {
        /// Source device.
        device: Arc<Device>,
        /// New power state.
        state: PowerState,
    },
    /// Battery level changed.
    BatteryLevel {
        /// Source device.
        device: Arc<Device>,
        /// Battery range decomposition.
        battery: BatteryState,
    },
    /// Button states changed.
    ButtonsState {
        /// Source device.
        device: Arc<Device>,
        /// Decoded button states.
        buttons: ButtonsState,
    },
    /// An error surfaced asynchronously.
    Error {
        /// Negative result code.
        code: i32,
        /// Descriptive message.
        message: String,
    },
    /// The transport's internal listener is active.
    ListenerStarted,
    /// The connection is terminating. A negative result means it broke
    /// unexpectedly; close the session and open it again to recover.
    Terminate {
        /// Final result code.
        result: i32,
    },
}

impl DomainEvent {
    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::DeviceArrival(_) => EventKind::DeviceArrival,
            Self::DeviceRemoval(_) => EventKind::DeviceRemoval,
            Self::OwnershipChange { .. } => EventKind::OwnershipChange,
            Self::DecodedData { .. } => EventKind::DecodedData,
            Self::PowerState { .. } => EventKind::PowerState,
            Self::BatteryLevel { .. } => EventKind::BatteryLevel,
            Self::ButtonsState { .. } => EventKind::ButtonsState,
            Self::Error { .. } => EventKind::Error,
            Self::ListenerStarted => EventKind::ListenerStarted,
            Self::Terminate { .. } => EventKind::Terminate,
        }
    }
}

/// Discriminant of a [`DomainEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Device arrival.
    DeviceArrival,
    /// Device removal.
    DeviceRemoval,
    /// Ownership change.
    OwnershipChange,
    /// Decoded data.
    DecodedData,
    /// Power state change.
    PowerState,
    /// Battery level change.
    BatteryLevel,
    /// Button state change.
    ButtonsState,
    /// Asynchronous error.
    Error,
    /// Listener started.
    ListenerStarted,
    /// Termination.
    Terminate,
}

/// Subscription filter over event kinds.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    kinds: Option<Vec<EventKind>>,
}

impl EventFilter {
    /// Accepts every event kind.
    #[must_use]
    pub const fn all() -> Self {
        Self { kinds: None }
    }

    /// Accepts only the given kinds.
    #[must_use]
    pub const fn kinds(kinds: Vec<EventKind>) -> Self {
        Self { kinds: Some(kinds) }
    }

    /// Checks whether an event kind passes this filter.
    #[must_use]
    pub fn accepts(&self, kind: EventKind) -> bool {
        self.kinds
            .as_ref()
            .is_none_or(|kinds| kinds.contains(&kind))
    }

    /// Checks whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &DomainEvent) -> bool {
        self.accepts(event.kind())
    }
}

/// A subscription to domain events.
///
/// Events replayed at subscription time (catch-up for already-known devices)
/// are delivered first, in registry order, followed by live events in their
/// arrival order.
pub struct Subscription {
    backlog: VecDeque<DomainEvent>,
    receiver: broadcast::Receiver<DomainEvent>,
    filter: EventFilter,
}

impl Subscription {
    /// Receives the next matching event.
    ///
    /// Returns `None` once the dispatcher is gone. A lagged broadcast slot
    /// skips the missed events and keeps receiving.
    pub async fn recv(&mut self) -> Option<DomainEvent> {
        if let Some(event) = self.backlog.pop_front() {
            return Some(event);
        }
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "subscription lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

struct Redirect {
    sender: Mutex<Option<mpsc::UnboundedSender<DomainEvent>>>,
}

struct EventDispatcherInner {
    sender: broadcast::Sender<DomainEvent>,
    redirect: Redirect,
    // Serializes dispatch scopes against replay subscriptions: a state
    // mutation and the events announcing it are either fully visible to a
    // new subscription's backlog builder or fully delivered live.
    sync: Mutex<()>,
}

impl EventDispatcherInner {
    fn send(&self, event: DomainEvent) {
        {
            let mut redirect = self
                .redirect
                .sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(sender) = redirect.as_ref() {
                // Receiver dropped means the caller stopped consuming.
                if sender.send(event.clone()).is_err() {
                    *redirect = None;
                }
            }
        }
        // No broadcast receivers is fine.
        let _ = self.sender.send(event);
    }
}

/// Exclusive dispatch scope covering a state mutation and its events.
///
/// While the guard lives, no replay subscription can be created: a
/// subscription created afterwards sees the mutation through its catch-up
/// backlog and never re-receives the scoped events live.
pub struct DispatchGuard<'a> {
    inner: &'a EventDispatcherInner,
    _sync: MutexGuard<'a, ()>,
}

impl DispatchGuard<'_> {
    /// Dispatches an event within this scope.
    pub fn dispatch(&self, event: DomainEvent) {
        self.inner.send(event);
    }
}

/// Dispatches domain events to subscribers.
#[derive(Clone)]
pub struct EventDispatcher {
    inner: Arc<EventDispatcherInner>,
}

impl EventDispatcher {
    /// Creates a new dispatcher with the given broadcast capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(EventDispatcherInner {
                sender,
                redirect: Redirect {
                    sender: Mutex::new(None),
                },
                sync: Mutex::new(()),
            }),
        }
    }

    /// Opens a dispatch scope.
    ///
    /// The guard is a plain mutex guard; it must not be held across an
    /// await point.
    #[must_use]
    pub fn lock(&self) -> DispatchGuard<'_> {
        DispatchGuard {
            inner: &self.inner,
            _sync: self
                .inner
                .sync
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Dispatches a single event to all subscribers and the redirect queue.
    pub fn dispatch(&self, event: DomainEvent) {
        self.lock().dispatch(event);
    }

    /// Subscribes with a filter and a catch-up backlog.
    ///
    /// The backlog builder and the creation of the live receiver run under
    /// the dispatch lock: a scoped dispatch that completed before this call
    /// is visible to the builder and never delivered live, one that starts
    /// after it is delivered live and never seen by the builder. The backlog
    /// is drained before any live event, so replayed state is seen exactly
    /// once.
    #[must_use]
    pub fn subscribe_with_replay<F>(&self, filter: EventFilter, build_backlog: F) -> Subscription
    where
        F: FnOnce() -> VecDeque<DomainEvent>,
    {
        let _sync = self
            .inner
            .sync
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Subscription {
            backlog: build_backlog(),
            receiver: self.inner.sender.subscribe(),
            filter,
        }
    }

    /// Subscribes with a filter and no replay.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.subscribe_with_replay(filter, VecDeque::new)
    }

    /// Installs the ordered redirect queue, replacing any previous one.
    ///
    /// Every subsequent event is pushed to the returned receiver in strict
    /// arrival order; the consumer processes them on whatever execution
    /// context it likes without any reordering hazard.
    #[must_use]
    pub fn redirect(&self) -> mpsc::UnboundedReceiver<DomainEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self
            .inner
            .redirect
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn error_event(code: i32) -> DomainEvent {
        DomainEvent::Error {
            code,
            message: format!("error {code}"),
        }
    }

    #[tokio::test]
    async fn test_event_dispatch() {
        let dispatcher = EventDispatcher::new(16);
        let mut sub = dispatcher.subscribe(EventFilter::all());

        dispatcher.dispatch(DomainEvent::ListenerStarted);

        let event = tokio::time::timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap();
        assert!(matches!(event, Some(DomainEvent::ListenerStarted)));
    }

    #[tokio::test]
    async fn test_filter_skips_other_kinds() {
        let dispatcher = EventDispatcher::new(16);
        let mut sub = dispatcher.subscribe(EventFilter::kinds(vec![EventKind::Terminate]));

        dispatcher.dispatch(DomainEvent::ListenerStarted);
        dispatcher.dispatch(error_event(-5));
        dispatcher.dispatch(DomainEvent::Terminate { result: 0 });

        let event = tokio::time::timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap();
        assert!(matches!(event, Some(DomainEvent::Terminate { result: 0 })));
    }

    #[tokio::test]
    async fn test_backlog_drains_before_live_events() {
        let dispatcher = EventDispatcher::new(16);
        let backlog: VecDeque<DomainEvent> =
            [error_event(-1), error_event(-2)].into_iter().collect();
        let mut sub = dispatcher.subscribe_with_replay(EventFilter::all(), move || backlog);

        dispatcher.dispatch(error_event(-3));

        for expected in [-1, -2, -3] {
            let event = tokio::time::timeout(Duration::from_millis(100), sub.recv())
                .await
                .unwrap()
                .unwrap();
            match event {
                DomainEvent::Error { code, .. } => assert_eq!(code, expected),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_subscription_waits_for_open_dispatch_scope() {
        let dispatcher = EventDispatcher::new(16);
        let scope = dispatcher.lock();

        let cloned = dispatcher.clone();
        let subscriber = std::thread::spawn(move || {
            cloned.subscribe_with_replay(EventFilter::all(), || {
                // Runs only once the scope is released, so the state the
                // scoped dispatch announced is already visible here.
                [error_event(-1)].into_iter().collect()
            })
        });

        // The subscriber is blocked on the scope; dispatch inside it.
        std::thread::sleep(Duration::from_millis(20));
        scope.dispatch(error_event(-1));
        drop(scope);

        let mut sub = subscriber.join().unwrap();
        match sub.recv().await {
            Some(DomainEvent::Error { code, .. }) => assert_eq!(code, -1),
            other => panic!("unexpected event {other:?}"),
        }
        // The scoped dispatch completed before the live receiver existed;
        // the backlog copy is the only delivery.
        assert!(
            tokio::time::timeout(Duration::from_millis(100), sub.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_redirect_queue_is_fifo() {
        let dispatcher = EventDispatcher::new(16);
        let mut queue = dispatcher.redirect();

        for code in -100..-80 {
            dispatcher.dispatch(error_event(code));
        }

        for expected in -100..-80 {
            match queue.recv().await.unwrap() {
                DomainEvent::Error { code, .. } => assert_eq!(code, expected),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_redirect_replaced_on_reinstall() {
        let dispatcher = EventDispatcher::new(16);
        let mut first = dispatcher.redirect();
        let mut second = dispatcher.redirect();

        dispatcher.dispatch(DomainEvent::ListenerStarted);

        assert!(second.recv().await.is_some());
        assert!(first.try_recv().is_err());
    }
}
