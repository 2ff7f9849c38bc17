//! Device registry seam.
//!
//! The registry is owned by the host; the connection only looks devices up,
//! registers what the hub reports, and pushes attribute writes.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use hublink_devices::{AttributeUpdates, CapabilitySet, Category, Device};

/// A device as reported by the hub during discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRegistration {
    pub id: String,
    pub category: Category,
    pub owner: String,
    pub friendly_name: String,
    pub capabilities: CapabilitySet,
}

/// Host-side device collection.
///
/// Implementations must be safe for concurrent readers; every call is a
/// point operation keyed by device id.
pub trait DeviceRegistry: Send + Sync {
    fn lookup(&self, id: &str) -> Option<Device>;

    fn list_by_owner(&self, owner: &str) -> Vec<Device>;

    /// Creates the device, or refreshes its name, category and capabilities.
    fn register(&self, registration: DeviceRegistration);

    fn update_attributes(&self, device_id: &str, updates: &AttributeUpdates);
}

/// Registry held in memory, for the monitor binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    devices: RwLock<HashMap<String, Device>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a fully described device (e.g. a remote with its
    /// code table).
    pub fn insert(&self, device: Device) {
        self.write().insert(device.id.clone(), device);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Device>> {
        self.devices.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Device>> {
        self.devices.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl DeviceRegistry for InMemoryRegistry {
    fn lookup(&self, id: &str) -> Option<Device> {
        self.read().get(id).cloned()
    }

    fn list_by_owner(&self, owner: &str) -> Vec<Device> {
        let mut devices: Vec<Device> = self
            .read()
            .values()
            .filter(|d| d.owner == owner)
            .cloned()
            .collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        devices
    }

    fn register(&self, registration: DeviceRegistration) {
        let mut devices = self.write();
        match devices.get_mut(&registration.id) {
            Some(device) => {
                device.category = registration.category;
                device.owner = registration.owner;
                device.friendly_name = registration.friendly_name;
                device.capabilities = registration.capabilities;
            }
            None => {
                devices.insert(
                    registration.id.clone(),
                    Device {
                        id: registration.id,
                        category: registration.category,
                        owner: registration.owner,
                        friendly_name: registration.friendly_name,
                        capabilities: registration.capabilities,
                        attributes: AttributeUpdates::new(),
                        remote_codes: Vec::new(),
                    },
                );
            }
        }
    }

    fn update_attributes(&self, device_id: &str, updates: &AttributeUpdates) {
        match self.write().get_mut(device_id) {
            Some(device) => device.apply(updates),
            None => tracing::debug!(device = %device_id, "attribute update for unknown device"),
        }
    }
}
