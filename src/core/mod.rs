// src/core/mod.rs

//! The central module containing the core logic and data structures of the
//! remote-control server.

pub mod acl;
pub mod catalog;
pub mod errors;
pub mod events;
pub mod handler;
pub mod metrics;
pub mod player;
pub mod protocol;
pub mod state;

pub use errors::RemotePlayError;
pub use protocol::{Command, Reply};
