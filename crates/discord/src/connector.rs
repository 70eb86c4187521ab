use std::sync::{Arc, Mutex};

use {
    anyhow::{Context as _, Result, anyhow, bail},
    async_trait::async_trait,
    secrecy::ExposeSecret,
    serenity::all::{ActivityData, Client, Command, Http, ShardManager},
    tokio::sync::{mpsc, oneshot},
    tracing::{debug, info},
};

use {
    qren_config::Identity,
    qren_fleet::{CommandSchema, InteractionEvent, PlatformConnector, PlatformSession},
};

use crate::{
    handler::{ForwardingHandler, SharedShard},
    schema,
};

/// Discord connector: authenticates one identity per `connect` call and
/// hands back an independent gateway session. Sessions share nothing.
#[derive(Debug, Default)]
pub struct DiscordConnector;

impl DiscordConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PlatformConnector for DiscordConnector {
    async fn connect(
        &self,
        identity: &Identity,
        events: mpsc::Sender<InteractionEvent>,
    ) -> Result<Box<dyn PlatformSession>> {
        if identity.credential.expose_secret().is_empty() {
            bail!("bot credential is required");
        }

        let shard: SharedShard = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = oneshot::channel();
        let handler = ForwardingHandler::new(
            identity.name.clone(),
            events,
            ready_tx,
            Arc::clone(&shard),
        );

        let mut client = Client::builder(
            identity.credential.expose_secret(),
            ForwardingHandler::intents(),
        )
        .event_handler(handler)
        .await
        .context("build discord client")?;

        let http = Arc::clone(&client.http);
        let shard_manager = Arc::clone(&client.shard_manager);
        let mut gateway = tokio::spawn(async move { client.start().await });

        // Wait for the gateway's ready signal; a credential rejection shows
        // up as the gateway task finishing with an error instead.
        let ready = tokio::select! {
            ready = ready_rx => {
                ready.map_err(|_| anyhow!("gateway task ended before ready"))?
            },
            result = &mut gateway => {
                let detail = match result {
                    Ok(Err(e)) => e.to_string(),
                    Ok(Ok(())) => "gateway closed during startup".into(),
                    Err(e) => e.to_string(),
                };
                bail!("session establishment failed: {detail}");
            },
        };

        info!(
            identity = %identity.name,
            bot_name = %ready.bot_name,
            "discord session established"
        );

        Ok(Box::new(DiscordSession {
            identity: identity.name.clone(),
            session_id: ready.session_id,
            http,
            shard,
            shard_manager,
        }))
    }
}

/// One live Discord gateway session.
pub struct DiscordSession {
    identity: String,
    session_id: String,
    http: Arc<Http>,
    shard: SharedShard,
    shard_manager: Arc<ShardManager>,
}

#[async_trait]
impl PlatformSession for DiscordSession {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn set_presence(&self, activity: &str) -> Result<()> {
        let messenger = {
            let shard = self.shard.lock().unwrap_or_else(|e| e.into_inner());
            shard.clone()
        };
        match messenger {
            Some(messenger) => {
                messenger.set_activity(Some(ActivityData::watching(activity)));
                Ok(())
            },
            None => Err(anyhow!("shard not ready, cannot set presence")),
        }
    }

    async fn replace_commands(&self, commands: &[CommandSchema]) -> Result<()> {
        let commands = schema::build_commands(commands);
        let count = commands.len();
        Command::set_global_commands(&self.http, commands)
            .await
            .context("bulk command sync")?;
        debug!(identity = %self.identity, count, "global commands replaced");
        Ok(())
    }

    async fn close(&self) {
        debug!(identity = %self.identity, "closing discord session");
        self.shard_manager.shutdown_all().await;
    }
}
