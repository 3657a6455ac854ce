// src/core/acl/enforcer.rs

use super::capability::{Capability, CapabilitySet};
use super::identity::Identity;

/// Decides whether a session may exercise a capability.
#[derive(Debug, Clone, Copy)]
pub struct PermissionGate {
    /// Capabilities granted even without a session. Only ever `AUTHENTICATE`.
    ungated: CapabilitySet,
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionGate {
    pub fn new() -> Self {
        Self {
            ungated: CapabilitySet::AUTHENTICATE,
        }
    }

    /// The permission check. Anyone may attempt to authenticate; everything
    /// else requires a session whose identity carries the capability.
    pub fn allowed(&self, identity: Option<&Identity>, capability: Capability) -> bool {
        if self.ungated.allows(capability) {
            return true;
        }
        let Some(identity) = identity else {
            return false;
        };
        identity.capabilities.allows(capability)
    }
}
