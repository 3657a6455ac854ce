// src/core/state/mod.rs

//! Defines the central `ServerState` struct and all related state components.

mod client;
mod core;
mod session;
mod stats;

pub use client::*;
pub use core::ServerState;
pub use session::SessionTable;
pub use stats::StatsState;
