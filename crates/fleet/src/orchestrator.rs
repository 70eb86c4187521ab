use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use {
    tokio::{sync::watch, task::JoinHandle},
    tokio_util::sync::CancellationToken,
    tracing::info,
};

use {qren_config::Identity, qren_store::SharedState};

use crate::{
    command::{CommandDescriptor, CommandRegistry},
    connection::{Connection, ConnectionState},
    error::Result,
    platform::PlatformConnector,
};

/// One identity plus the command surface it exposes.
pub struct IdentityRuntime {
    pub identity: Identity,
    pub commands: Vec<CommandDescriptor>,
}

/// Observer handle for one connection's lifecycle.
#[derive(Clone)]
pub struct ConnectionHandle {
    pub name: String,
    state: watch::Receiver<ConnectionState>,
}

impl ConnectionHandle {
    pub fn current(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Wait until the connection reports `target`. Returns `false` if the
    /// connection task ended without ever reaching it.
    pub async fn wait_for(&self, target: ConnectionState) -> bool {
        let mut rx = self.state.clone();
        if *rx.borrow_and_update() == target {
            return true;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow_and_update() == target {
                return true;
            }
        }
        *rx.borrow() == target
    }
}

/// The running fleet: one independent connection task per configured
/// identity with a usable credential.
pub struct Fleet {
    connections: Vec<ConnectionHandle>,
    skipped: Vec<String>,
    tasks: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
    started_at: Instant,
}

impl Fleet {
    /// Construct registries and start every connection.
    ///
    /// Identities without a credential are skipped entirely: no session
    /// establishment is attempted and they never appear as connections.
    /// The shared state must already be loaded; connections begin serving
    /// as soon as their own lifecycle allows.
    pub fn start(
        identities: Vec<IdentityRuntime>,
        connector: Arc<dyn PlatformConnector>,
        state: Arc<SharedState>,
    ) -> Result<Self> {
        let cancel = CancellationToken::new();
        let mut connections = Vec::new();
        let mut skipped = Vec::new();
        let mut tasks = Vec::new();

        for runtime in identities {
            let name = runtime.identity.name.clone();
            if !runtime.identity.has_credential() {
                info!(identity = %name, "credential not set, skipping identity");
                skipped.push(name);
                continue;
            }

            let registry = Arc::new(CommandRegistry::new(runtime.commands)?);
            let (connection, state_rx) = Connection::new(
                runtime.identity,
                registry,
                Arc::clone(&state),
                cancel.child_token(),
            );
            info!(identity = %name, "starting connection");
            tasks.push(tokio::spawn(connection.run(Arc::clone(&connector))));
            connections.push(ConnectionHandle {
                name,
                state: state_rx,
            });
        }

        Ok(Self {
            connections,
            skipped,
            tasks,
            cancel,
            started_at: Instant::now(),
        })
    }

    pub fn connections(&self) -> &[ConnectionHandle] {
        &self.connections
    }

    /// Identities that were configured but skipped for lack of a credential.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Read-only view for introspection (liveness endpoint).
    pub fn status(&self) -> FleetStatus {
        FleetStatus {
            started_at: self.started_at,
            connections: self.connections.clone(),
        }
    }

    /// Request every connection to close. Fire-and-forget: in-flight
    /// handlers are not awaited and the process is free to exit.
    pub fn shutdown(&self) {
        info!("shutting down fleet");
        self.cancel.cancel();
    }

    /// Await all connection tasks, for tests that need a settled fleet.
    pub async fn join(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// Cloneable read-only view of the fleet for introspection.
#[derive(Clone)]
pub struct FleetStatus {
    started_at: Instant,
    connections: Vec<ConnectionHandle>,
}

impl FleetStatus {
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Every connection with its current lifecycle state.
    pub fn identities(&self) -> Vec<(String, ConnectionState)> {
        self.connections
            .iter()
            .map(|c| (c.name.clone(), c.current()))
            .collect()
    }

    /// Names of connections currently serving events.
    pub fn active(&self) -> Vec<String> {
        self.connections
            .iter()
            .filter(|c| c.current() == ConnectionState::Serving)
            .map(|c| c.name.clone())
            .collect()
    }
}
