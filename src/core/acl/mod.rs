// src/core/acl/mod.rs

//! Who may do what: capabilities, device identities and the permission gate.

pub mod capability;
pub mod enforcer;
pub mod identity;

pub use capability::{Capability, CapabilitySet};
pub use enforcer::PermissionGate;
pub use identity::{DeviceRegistry, Identity};
