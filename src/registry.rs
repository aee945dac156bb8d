//! Thread-safe registry of known devices.
//!
//! The registry is the single source of truth for "which devices exist right
//! now". It is shared between the event-intake task (the only writer) and any
//! application thread taking snapshots or checking presence, so every
//! operation runs under an exclusive-or-shared lock and readers always see a
//! consistent state.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};
use crate::types::{Device, DeviceId};

/// Insertion-ordered, identifier-unique collection of devices.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<Vec<Arc<Device>>>,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a device.
    ///
    /// An arrival for an identifier already present is a protocol error and
    /// never silently overwrites the existing entry.
    pub fn insert(&self, device: Arc<Device>) -> Result<()> {
        let mut devices = self.write();
        if devices.iter().any(|known| known.id() == device.id()) {
            return Err(Error::protocol(format!(
                "duplicate arrival for device {}",
                device.id()
            )));
        }
        tracing::debug!(device = %device.id(), "device registered");
        devices.push(device);
        Ok(())
    }

    /// Removes the device with the given identifier, returning it if present.
    pub fn remove(&self, id: DeviceId) -> Option<Arc<Device>> {
        let mut devices = self.write();
        let position = devices.iter().position(|device| device.id() == id)?;
        tracing::debug!(device = %id, "device deregistered");
        Some(devices.remove(position))
    }

    /// Looks up a device by identifier.
    #[must_use]
    pub fn find(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.read()
            .iter()
            .find(|device| device.id() == id)
            .cloned()
    }

    /// Returns true if a device with the given identifier is present.
    #[must_use]
    pub fn contains(&self, id: DeviceId) -> bool {
        self.read().iter().any(|device| device.id() == id)
    }

    /// Returns an immutable snapshot of the devices present at call time,
    /// in insertion order. Mutating the snapshot never affects the registry.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Device>> {
        self.read().clone()
    }

    /// Number of devices present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if no devices are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Removes every device. Used when the session closes.
    pub(crate) fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Device>>> {
        self.devices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<Device>>> {
        self.devices.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceDescriptor, DeviceType};

    fn device(name: &str) -> Arc<Device> {
        Arc::new(Device::new(DeviceDescriptor {
            id: DeviceId::random(),
            name: name.into(),
            kind: DeviceType::Handheld,
        }))
    }

    #[test]
    fn test_arrival_removal_replay() {
        let registry = DeviceRegistry::new();
        let first = device("one");
        let second = device("two");
        let third = device("three");

        registry.insert(Arc::clone(&first)).unwrap();
        registry.insert(Arc::clone(&second)).unwrap();
        registry.insert(Arc::clone(&third)).unwrap();
        assert!(registry.remove(second.id()).is_some());

        // Exactly the devices whose last event was an arrival remain.
        let ids: Vec<DeviceId> = registry.snapshot().iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec![first.id(), third.id()]);
        assert!(!registry.contains(second.id()));
        assert!(registry.remove(second.id()).is_none());
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let registry = DeviceRegistry::new();
        let original = device("scanner");
        registry.insert(Arc::clone(&original)).unwrap();

        let duplicate = Arc::new(Device::new(DeviceDescriptor {
            id: original.id(),
            name: "impostor".into(),
            kind: DeviceType::Stand,
        }));
        assert!(registry.insert(duplicate).is_err());

        // The original entry is untouched.
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name(), "scanner");
    }

    #[test]
    fn test_snapshot_isolation() {
        let registry = DeviceRegistry::new();
        registry.insert(device("one")).unwrap();

        let mut snapshot = registry.snapshot();
        snapshot.push(device("intruder"));
        snapshot.clear();

        assert_eq!(registry.len(), 1);

        // A later arrival is invisible to a previously taken snapshot.
        let before = registry.snapshot();
        registry.insert(device("two")).unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_find_by_identifier() {
        let registry = DeviceRegistry::new();
        let known = device("known");
        registry.insert(Arc::clone(&known)).unwrap();

        assert_eq!(registry.find(known.id()).unwrap().id(), known.id());
        assert!(registry.find(DeviceId::random()).is_none());
    }
}
