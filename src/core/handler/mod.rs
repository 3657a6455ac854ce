// src/core/handler/mod.rs

pub mod command_router;
pub mod dispatcher;

pub use command_router::Router;
pub use dispatcher::{CommandDispatcher, Dispatched};
