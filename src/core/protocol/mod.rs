// src/core/protocol/mod.rs

//! The line-oriented text protocol spoken with remote-control clients.
//!
//! Every request is a single `\n`-terminated line: a keyword optionally
//! followed by double-quoted arguments, e.g. `PLAY "song.mp3"`. Every
//! recognised request gets exactly one reply line.

pub mod command;
pub mod reply;

pub use command::{Command, ParsedLine, parse_arguments};
pub use reply::Reply;

/// Upper bound on a single request line. A longer line is reported as an
/// invalid command and ends the connection.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;
