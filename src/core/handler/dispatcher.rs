// src/core/handler/dispatcher.rs

//! Executes one parsed command against the session table, the permission
//! gate and the player/catalog collaborators.

use crate::core::acl::{DeviceRegistry, PermissionGate};
use crate::core::catalog::CatalogProvider;
use crate::core::metrics;
use crate::core::player::{Player, PlayerError};
use crate::core::protocol::{Command, Reply};
use crate::core::state::{ConnectionDescriptor, SessionTable};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The result of dispatching one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub reply: Reply,
    /// Observers should be told that something changed.
    pub changed: bool,
    /// The permission gate refused the command.
    pub denied: bool,
}

impl Dispatched {
    fn reply(reply: Reply) -> Self {
        Self {
            reply,
            changed: false,
            denied: false,
        }
    }

    fn transition(result: Result<(), PlayerError>, name: &str) -> Self {
        match result {
            Ok(()) => Self {
                reply: Reply::Ok,
                changed: true,
                denied: false,
            },
            Err(e) => {
                debug!("{} refused by player: {}", name, e);
                Self::reply(Reply::No)
            }
        }
    }

    fn denied(command: &Command) -> Self {
        // Payload-returning commands answer a denial with an empty line.
        let reply = match command {
            Command::Update | Command::GetState => Reply::Line(String::new()),
            _ => Reply::No,
        };
        Self {
            reply,
            changed: false,
            denied: true,
        }
    }
}

/// The single owner of all dispatch-time mutable state.
///
/// There is exactly one per server and it sits behind the server-wide dispatch
/// lock, so every `dispatch` call runs to completion before the next starts.
/// The calling connection is always passed explicitly.
pub struct CommandDispatcher {
    sessions: SessionTable,
    devices: DeviceRegistry,
    gate: PermissionGate,
    player: Arc<dyn Player>,
    catalog: Arc<dyn CatalogProvider>,
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("sessions", &self.sessions.len())
            .field("devices", &self.devices.len())
            .finish_non_exhaustive()
    }
}

impl CommandDispatcher {
    pub fn new(
        devices: DeviceRegistry,
        player: Arc<dyn Player>,
        catalog: Arc<dyn CatalogProvider>,
    ) -> Self {
        Self {
            sessions: SessionTable::new(),
            devices,
            gate: PermissionGate::new(),
            player,
            catalog,
        }
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Forgets the connection's session. Returns true if it had one.
    pub fn end_session(&mut self, connection: &ConnectionDescriptor) -> bool {
        self.sessions.remove(connection).is_some()
    }

    pub async fn dispatch(&mut self, connection: &ConnectionDescriptor, command: Command) -> Dispatched {
        if let Some(capability) = command.required_capability() {
            let identity = self.sessions.get(connection);
            if !self.gate.allowed(identity, capability) {
                debug!(
                    "Denied {} for {} (capability '{}', authenticated: {}).",
                    command.name(),
                    connection,
                    capability,
                    identity.is_some()
                );
                metrics::DENIED_COMMANDS_TOTAL
                    .with_label_values(&[command.name()])
                    .inc();
                return Dispatched::denied(&command);
            }
        }

        match command {
            Command::Authenticate { device, password } => {
                self.authenticate(connection, &device, &password)
            }
            Command::Check { version } => {
                let Ok(requested) = version.trim().parse::<i64>() else {
                    debug!("CHECK with non-numeric version '{}'.", version);
                    return Dispatched::reply(Reply::No);
                };
                match self.catalog.current_version().await {
                    Ok(current) => Dispatched::reply(Reply::from_outcome(current == requested)),
                    Err(e) => {
                        warn!("Catalog version unavailable for CHECK: {}", e);
                        Dispatched::reply(Reply::No)
                    }
                }
            }
            Command::Update => match self.catalog.current_payload().await {
                Ok(payload) => Dispatched::reply(Reply::Line(payload)),
                Err(e) => {
                    warn!("Catalog unavailable for UPDATE: {}", e);
                    Dispatched::reply(Reply::Line(String::new()))
                }
            },
            Command::GetState => Dispatched::reply(Reply::state(&self.player.snapshot())),
            Command::Pause => Dispatched::transition(self.player.pause(), "PAUSE"),
            Command::Unpause => Dispatched::transition(self.player.unpause(), "UNPAUSE"),
            Command::Stop => Dispatched::transition(self.player.stop(), "STOP"),
            Command::Play { filename } => {
                Dispatched::transition(self.player.play(&filename), "PLAY")
            }
        }
    }

    // A failed attempt leaves the connection unauthenticated, even if an
    // earlier attempt had succeeded.
    fn authenticate(
        &mut self,
        connection: &ConnectionDescriptor,
        device: &str,
        password: &str,
    ) -> Dispatched {
        match self.devices.authenticate(device, password) {
            Some(identity) => {
                info!("{} authenticated as device '{}'.", connection, identity.device);
                self.sessions.insert(*connection, identity);
                Dispatched {
                    reply: Reply::Ok,
                    changed: true,
                    denied: false,
                }
            }
            None => {
                warn!("Failed authentication from {} for device '{}'.", connection, device);
                let dropped = self.sessions.remove(connection).is_some();
                Dispatched {
                    reply: Reply::No,
                    changed: dropped,
                    denied: false,
                }
            }
        }
    }
}
