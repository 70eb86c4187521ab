use {anyhow::Result, async_trait::async_trait, tokio::sync::mpsc};

use qren_config::Identity;

use crate::{command::CommandSchema, event::InteractionEvent};

/// The chat platform's session-establishment seam.
///
/// One connector serves the whole fleet; each `connect` call authenticates
/// one identity and yields an independent session. Implementations must not
/// share session state between identities.
#[async_trait]
pub trait PlatformConnector: Send + Sync {
    /// Establish an authenticated session with the identity's credential.
    ///
    /// Inbound interactions for this connection are pushed into `events`
    /// for as long as the session lives. An invalid credential is an error;
    /// the caller owns retry policy (there is none, auth failure terminates
    /// the connection).
    async fn connect(
        &self,
        identity: &Identity,
        events: mpsc::Sender<InteractionEvent>,
    ) -> Result<Box<dyn PlatformSession>>;
}

/// One live, authenticated platform session.
#[async_trait]
pub trait PlatformSession: Send + Sync {
    /// Platform-assigned session identifier.
    fn session_id(&self) -> &str;

    /// Announce the identity's public presence/activity text. Best-effort:
    /// callers log failure and move on.
    async fn set_presence(&self, activity: &str) -> Result<()>;

    /// Replace the connection's entire externally-visible command set in
    /// one bulk call.
    async fn replace_commands(&self, commands: &[CommandSchema]) -> Result<()>;

    /// Close the session. Fire-and-forget; never blocks shutdown.
    async fn close(&self);
}
