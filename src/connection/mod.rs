// src/connection/mod.rs

//! Manages the lifecycle of a single client TCP connection: reading request
//! lines, routing them for execution and writing replies.

mod guard;
mod handler;

pub use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
