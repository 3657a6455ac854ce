// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.

use super::guard::ConnectionGuard;
use crate::core::errors::ProtocolError;
use crate::core::handler::Router;
use crate::core::metrics;
use crate::core::protocol::{Command, MAX_LINE_LENGTH, Reply};
use crate::core::state::{ConnectionDescriptor, ServerState};
use crate::core::RemotePlayError;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Framed};
use tracing::{debug, info, warn};

/// What the main loop should do after handling one read.
enum NextAction {
    Continue,
    ExitLoop,
}

/// Serves one connection: one request line in, at most one reply line out,
/// strictly in order, until the peer hangs up or the handler is cancelled.
pub struct ConnectionHandler<S> {
    framed: Framed<S, AnyDelimiterCodec>,
    connection: ConnectionDescriptor,
    state: Arc<ServerState>,
    router: Router,
    shutdown_rx: broadcast::Receiver<()>,
    global_shutdown_rx: broadcast::Receiver<()>,
    read_timeout: Duration,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        socket: S,
        connection: ConnectionDescriptor,
        state: Arc<ServerState>,
        shutdown_rx: broadcast::Receiver<()>,
        global_shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let read_timeout = state.config.read_timeout();
        Self {
            framed: Framed::new(socket, line_codec()),
            connection,
            router: Router::new(state.clone(), connection),
            state,
            shutdown_rx,
            global_shutdown_rx,
            read_timeout,
        }
    }

    /// Runs the connection to completion. The session and registry entry are
    /// always gone by the time this returns.
    pub async fn run(&mut self) -> Result<(), RemotePlayError> {
        let mut guard = ConnectionGuard::new(self.state.clone(), self.connection);
        let result = self.main_loop().await;

        self.state.close_connection(&self.connection).await;
        guard.set_closed();
        debug!("Connection {} closed.", self.connection);
        result
    }

    async fn main_loop(&mut self) -> Result<(), RemotePlayError> {
        loop {
            tokio::select! {
                // Prioritize shutdown signals over other events.
                biased;
                _ = self.global_shutdown_rx.recv() => {
                    info!("Connection handler for {} received GLOBAL shutdown signal.", self.connection.addr);
                    return Ok(());
                }
                _ = self.shutdown_rx.recv() => {
                    info!("Connection handler for {} received kill signal.", self.connection.addr);
                    return Ok(());
                }
                // A timeout is not an error; it only lets the signals above be re-checked.
                read = tokio::time::timeout(self.read_timeout, self.framed.next()) => {
                    let Ok(next) = read else { continue };
                    match self.process_read(next).await? {
                        NextAction::Continue => {}
                        NextAction::ExitLoop => return Ok(()),
                    }
                }
            }
        }
    }

    async fn process_read(
        &mut self,
        next: Option<Result<Bytes, AnyDelimiterCodecError>>,
    ) -> Result<NextAction, RemotePlayError> {
        let raw = match next {
            Some(Ok(raw)) => raw,
            Some(Err(e)) => {
                let e = RemotePlayError::from(e);
                if matches!(e, RemotePlayError::LineTooLong) {
                    // The framed stream ends after a decode error.
                    self.record_invalid("<line too long>", &e);
                    return Ok(NextAction::ExitLoop);
                }
                if e.is_normal_disconnect() {
                    debug!("Connection from {} closed by peer: {}", self.connection.addr, e);
                    return Ok(NextAction::ExitLoop);
                }
                warn!("Connection error for {}: {}", self.connection.addr, e);
                return Err(e);
            }
            None => {
                debug!("Connection from {} closed by peer.", self.connection.addr);
                return Ok(NextAction::ExitLoop);
            }
        };

        let line = match decode_line(&raw) {
            Ok(line) => line,
            Err(e) => {
                self.record_invalid(&String::from_utf8_lossy(&raw), &RemotePlayError::from(e));
                return Ok(NextAction::Continue);
            }
        };

        let reply = match Command::parse(line) {
            Ok(command) => {
                debug!("Connection {}: received {:?}", self.connection, command);
                self.router.route(command).await
            }
            Err(e) => {
                self.record_invalid(line, &RemotePlayError::from(e));
                Reply::Silent
            }
        };
        if let Some(text) = reply.into_line() {
            self.framed.send(text).await?;
        }
        Ok(NextAction::Continue)
    }

    // Unrecognized input gets no reply, only this diagnostic.
    fn record_invalid(&self, line: &str, error: &RemotePlayError) {
        warn!(
            "Invalid command from {}: {} ({:?})",
            self.connection,
            error,
            truncate(line, 80)
        );
        self.state.stats.increment_invalid_commands();
        metrics::INVALID_COMMANDS_TOTAL.inc();
    }
}

/// Frames on `\n` and writes replies with a `\n` terminator.
fn line_codec() -> AnyDelimiterCodec {
    AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), b"\n".to_vec(), MAX_LINE_LENGTH)
}

/// Decodes one framed line, dropping a trailing `\r`. Bytes that are not
/// UTF-8 make the line invalid without affecting the connection.
fn decode_line(raw: &[u8]) -> Result<&str, ProtocolError> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    std::str::from_utf8(raw).map_err(|_| ProtocolError::InvalidEncoding)
}

fn truncate(line: &str, max_chars: usize) -> &str {
    match line.char_indices().nth(max_chars) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}
