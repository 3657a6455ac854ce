// src/core/errors.rs

//! Defines the primary error type for the server library.

use std::sync::Arc;
use thiserror::Error;
use tokio_util::codec::AnyDelimiterCodecError;

/// The main error enum, representing all failures that can cross a module boundary.
#[derive(Error, Debug, Clone)]
pub enum RemotePlayError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Line exceeds the maximum allowed length")]
    LineTooLong,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A line received from a client that does not form a recognised command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("missing argument for '{0}'")]
    MissingArgument(&'static str),

    #[error("empty line")]
    EmptyLine,

    #[error("line is not valid UTF-8")]
    InvalidEncoding,
}

// `std::io::Error` is not cloneable; wrap it in an Arc so the enum can be.
impl From<std::io::Error> for RemotePlayError {
    fn from(e: std::io::Error) -> Self {
        RemotePlayError::Io(Arc::new(e))
    }
}

impl From<AnyDelimiterCodecError> for RemotePlayError {
    fn from(e: AnyDelimiterCodecError) -> Self {
        match e {
            AnyDelimiterCodecError::MaxChunkLengthExceeded => RemotePlayError::LineTooLong,
            AnyDelimiterCodecError::Io(io) => RemotePlayError::Io(Arc::new(io)),
        }
    }
}

impl RemotePlayError {
    /// True for I/O failures that only mean the peer went away.
    pub fn is_normal_disconnect(&self) -> bool {
        matches!(self, RemotePlayError::Io(e) if matches!(
            e.kind(),
            std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::ConnectionAborted
        ))
    }
}
