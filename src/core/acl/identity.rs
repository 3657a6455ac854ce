// src/core/acl/identity.rs

use super::capability::CapabilitySet;
use crate::config::DeviceConfig;
use crate::core::errors::RemotePlayError;
use std::collections::HashMap;
use std::sync::Arc;

/// The authenticated principal bound to a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub device: String,
    pub capabilities: CapabilitySet,
}

#[derive(Debug)]
struct DeviceEntry {
    password: String,
    identity: Arc<Identity>,
}

/// The devices allowed to authenticate, keyed by device name.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, DeviceEntry>,
}

impl DeviceRegistry {
    /// Builds the registry from the `[[devices]]` configuration entries.
    pub fn from_config(devices: &[DeviceConfig]) -> Result<Self, RemotePlayError> {
        let mut registry = DeviceRegistry::default();
        for device in devices {
            let capabilities = CapabilitySet::from_names(&device.capabilities)
                .map_err(|e| RemotePlayError::Config(format!("device '{}': {e}", device.name)))?;
            registry.insert(&device.name, &device.password, capabilities);
        }
        Ok(registry)
    }

    /// Adds or replaces a device.
    pub fn insert(&mut self, device: &str, password: &str, capabilities: CapabilitySet) {
        self.devices.insert(
            device.to_string(),
            DeviceEntry {
                password: password.to_string(),
                identity: Arc::new(Identity {
                    device: device.to_string(),
                    capabilities,
                }),
            },
        );
    }

    /// Returns the identity for a matching device/password pair, `None` otherwise.
    pub fn authenticate(&self, device: &str, password: &str) -> Option<Arc<Identity>> {
        self.devices
            .get(device)
            .filter(|entry| entry.password == password)
            .map(|entry| entry.identity.clone())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
