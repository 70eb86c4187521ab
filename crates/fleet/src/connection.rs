use std::{sync::Arc, time::Duration};

use {
    tokio::sync::{mpsc, watch},
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {qren_config::Identity, qren_store::SharedState};

use crate::{
    command::CommandRegistry,
    platform::{PlatformConnector, PlatformSession},
    router::InteractionRouter,
};

/// Buffered events per connection before the platform side backs off.
const EVENT_BUFFER: usize = 64;

/// Bulk command sync: attempts and fixed backoff between them.
const SYNC_ATTEMPTS: u32 = 3;
const SYNC_BACKOFF: Duration = Duration::from_secs(2);

/// Lifecycle of one identity's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Configured,
    Authenticating,
    Syncing,
    Serving,
    /// Unrecoverable failure before serving; transitions to `Terminated`.
    Error,
    Terminated,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Configured => "configured",
            Self::Authenticating => "authenticating",
            Self::Syncing => "syncing",
            Self::Serving => "serving",
            Self::Error => "error",
            Self::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Drives one identity's connection through its lifecycle, fully
/// independently of every other connection: a failure or slow step here
/// never blocks another identity's progression.
pub struct Connection {
    identity: Identity,
    registry: Arc<CommandRegistry>,
    router: Arc<InteractionRouter>,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl Connection {
    pub fn new(
        identity: Identity,
        registry: Arc<CommandRegistry>,
        state: Arc<SharedState>,
        cancel: CancellationToken,
    ) -> (Self, watch::Receiver<ConnectionState>) {
        let router = Arc::new(InteractionRouter::new(
            identity.name.clone(),
            Arc::clone(&registry),
            state,
        ));
        let (state_tx, state_rx) = watch::channel(ConnectionState::Configured);
        (
            Self {
                identity,
                registry,
                router,
                state_tx,
                cancel,
            },
            state_rx,
        )
    }

    fn transition(&self, state: ConnectionState) {
        debug!(identity = %self.identity.name, %state, "connection state");
        self.state_tx.send_replace(state);
    }

    /// Run the connection to termination.
    pub async fn run(self, connector: Arc<dyn PlatformConnector>) {
        self.transition(ConnectionState::Authenticating);

        let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER);
        let session = tokio::select! {
            _ = self.cancel.cancelled() => {
                self.transition(ConnectionState::Terminated);
                return;
            },
            result = connector.connect(&self.identity, events_tx) => match result {
                Ok(session) => session,
                Err(e) => {
                    error!(
                        identity = %self.identity.name,
                        error = %e,
                        "session establishment failed"
                    );
                    self.transition(ConnectionState::Error);
                    self.transition(ConnectionState::Terminated);
                    return;
                },
            },
        };

        info!(
            identity = %self.identity.name,
            session_id = session.session_id(),
            commands = self.registry.len(),
            "session established"
        );

        // Presence is best-effort: a failure never blocks progression.
        if let Err(e) = session.set_presence(&self.identity.activity).await {
            warn!(identity = %self.identity.name, error = %e, "failed to set presence");
        }

        self.transition(ConnectionState::Syncing);
        self.sync_commands(session.as_ref()).await;
        self.transition(ConnectionState::Serving);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = events_rx.recv() => match event {
                    Some(event) => self.router.dispatch(event),
                    None => {
                        warn!(identity = %self.identity.name, "event stream closed");
                        break;
                    },
                },
            }
        }

        session.close().await;
        self.transition(ConnectionState::Terminated);
    }

    /// One bulk replace-all call, retried with a fixed backoff. Exhausted
    /// retries leave the connection live with stale or empty commands; the
    /// failure is loud in the logs but not fatal.
    async fn sync_commands(&self, session: &dyn PlatformSession) {
        let schemas = self.registry.schemas();
        for attempt in 1..=SYNC_ATTEMPTS {
            match session.replace_commands(&schemas).await {
                Ok(()) => {
                    info!(
                        identity = %self.identity.name,
                        commands = schemas.len(),
                        "commands synced"
                    );
                    return;
                },
                Err(e) if attempt < SYNC_ATTEMPTS => {
                    warn!(
                        identity = %self.identity.name,
                        attempt,
                        error = %e,
                        "command sync rejected, retrying"
                    );
                    tokio::time::sleep(SYNC_BACKOFF).await;
                },
                Err(e) => {
                    error!(
                        identity = %self.identity.name,
                        error = %e,
                        "command sync failed, serving with stale commands"
                    );
                },
            }
        }
    }
}
