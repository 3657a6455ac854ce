// src/core/handler/command_router.rs

//! The entry point from a connection handler into command execution.
//!
//! The `Router` wraps each dispatch with the bookkeeping every command shares:
//! a tracing span, statistics, the server-wide dispatch lock and change
//! notification.

use super::dispatcher::Dispatched;
use crate::core::metrics;
use crate::core::protocol::{Command, Reply};
use crate::core::state::{ConnectionDescriptor, ServerState};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, info_span};

/// Routes the commands of one connection.
pub struct Router {
    state: Arc<ServerState>,
    connection: ConnectionDescriptor,
}

impl Router {
    pub fn new(state: Arc<ServerState>, connection: ConnectionDescriptor) -> Self {
        Self { state, connection }
    }

    /// Runs one command and returns the reply to write.
    pub async fn route(&self, command: Command) -> Reply {
        let command_name = command.name();
        let span = info_span!(
            "command",
            name = %command_name,
            client.addr = %self.connection.addr,
            client.id = %self.connection.id,
        );

        async move {
            let start_time = Instant::now();
            self.state.stats.increment_total_commands();
            metrics::COMMANDS_PROCESSED_TOTAL
                .with_label_values(&[command_name])
                .inc();

            let Dispatched {
                reply,
                changed,
                denied,
            } = {
                let mut dispatcher = self.state.dispatcher.lock().await;
                dispatcher.dispatch(&self.connection, command).await
            };

            if denied {
                self.state.stats.increment_denied_commands();
            }
            metrics::COMMAND_LATENCY_SECONDS.observe(start_time.elapsed().as_secs_f64());
            debug!(?reply, changed, "Command finished.");

            if changed {
                self.state.notifier.publish();
            }
            reply
        }
        .instrument(span)
        .await
    }
}
