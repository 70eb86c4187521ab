use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use {
    serenity::{
        all::{
            ActionRowComponent, CommandInteraction, ComponentInteraction,
            ComponentInteractionDataKind, Context, EventHandler, GatewayIntents, GuildId,
            Interaction, ModalInteraction, Ready, ResolvedOption, ResolvedValue, ShardMessenger,
        },
        async_trait,
    },
    tokio::sync::{mpsc, oneshot},
    tracing::{debug, info},
};

use qren_fleet::{
    Actor, ArgValue, AttachmentRef, CommandArgs, GuildInfo, InteractionEvent, InteractionKind,
};

use crate::responder::DiscordResponder;

/// Data captured from the gateway's ready payload.
pub(crate) struct ReadyInfo {
    pub session_id: String,
    pub bot_name: String,
}

/// Shard messenger slot, filled once the gateway reports ready.
pub(crate) type SharedShard = Arc<Mutex<Option<ShardMessenger>>>;

/// Serenity event handler that classifies inbound interactions and forwards
/// them into the connection's event stream.
pub struct ForwardingHandler {
    identity: String,
    events: mpsc::Sender<InteractionEvent>,
    ready_tx: Mutex<Option<oneshot::Sender<ReadyInfo>>>,
    shard: SharedShard,
}

impl ForwardingHandler {
    pub(crate) fn new(
        identity: String,
        events: mpsc::Sender<InteractionEvent>,
        ready_tx: oneshot::Sender<ReadyInfo>,
        shard: SharedShard,
    ) -> Self {
        Self {
            identity,
            events,
            ready_tx: Mutex::new(Some(ready_tx)),
            shard,
        }
    }

    /// Required gateway intents for the bots.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MEMBERS
    }

    async fn emit(&self, event: InteractionEvent) {
        if let Err(e) = self.events.send(event).await {
            debug!(
                identity = %self.identity,
                error = %e,
                "event stream closed, dropping interaction"
            );
        }
    }

    async fn forward_command(&self, ctx: Context, cmd: CommandInteraction) {
        let args = resolve_args(&cmd.data.options());
        let actor = Actor {
            id: cmd.user.id.to_string(),
            name: cmd.user.name.clone(),
            is_admin: cmd
                .member
                .as_ref()
                .and_then(|m| m.permissions)
                .is_some_and(|p| p.administrator()),
        };
        let guild = guild_info(&ctx, cmd.guild_id);
        let responder = DiscordResponder::new(Arc::clone(&ctx.http), cmd.id, cmd.token.clone());

        self.emit(InteractionEvent {
            kind: InteractionKind::Command {
                name: cmd.data.name.clone(),
                args,
            },
            actor,
            guild,
            channel_id: Some(cmd.channel_id.to_string()),
            responder: Arc::new(responder),
        })
        .await;
    }

    async fn forward_component(&self, ctx: Context, comp: ComponentInteraction) {
        let custom_id = comp.data.custom_id.clone();
        let kind = match &comp.data.kind {
            ComponentInteractionDataKind::Button => InteractionKind::Button { custom_id },
            ComponentInteractionDataKind::StringSelect { values } => InteractionKind::SelectMenu {
                custom_id,
                values: values.clone(),
            },
            other => {
                debug!(
                    identity = %self.identity,
                    "ignoring unsupported component kind: {other:?}"
                );
                return;
            },
        };
        let actor = Actor {
            id: comp.user.id.to_string(),
            name: comp.user.name.clone(),
            is_admin: comp
                .member
                .as_ref()
                .and_then(|m| m.permissions)
                .is_some_and(|p| p.administrator()),
        };
        let guild = guild_info(&ctx, comp.guild_id);
        let responder = DiscordResponder::new(Arc::clone(&ctx.http), comp.id, comp.token.clone());

        self.emit(InteractionEvent {
            kind,
            actor,
            guild,
            channel_id: Some(comp.channel_id.to_string()),
            responder: Arc::new(responder),
        })
        .await;
    }

    async fn forward_modal(&self, ctx: Context, modal: ModalInteraction) {
        let mut fields = HashMap::new();
        for row in &modal.data.components {
            for component in &row.components {
                if let ActionRowComponent::InputText(input) = component
                    && let Some(value) = &input.value
                {
                    fields.insert(input.custom_id.clone(), value.clone());
                }
            }
        }
        let actor = Actor {
            id: modal.user.id.to_string(),
            name: modal.user.name.clone(),
            is_admin: modal
                .member
                .as_ref()
                .and_then(|m| m.permissions)
                .is_some_and(|p| p.administrator()),
        };
        let guild = guild_info(&ctx, modal.guild_id);
        let responder =
            DiscordResponder::new(Arc::clone(&ctx.http), modal.id, modal.token.clone());

        self.emit(InteractionEvent {
            kind: InteractionKind::ModalSubmit {
                custom_id: modal.data.custom_id.clone(),
                fields,
            },
            actor,
            guild,
            channel_id: Some(modal.channel_id.to_string()),
            responder: Arc::new(responder),
        })
        .await;
    }
}

#[async_trait]
impl EventHandler for ForwardingHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            identity = %self.identity,
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord session ready"
        );

        {
            let mut shard = self.shard.lock().unwrap_or_else(|e| e.into_inner());
            *shard = Some(ctx.shard.clone());
        }

        let ready_tx = {
            let mut slot = self.ready_tx.lock().unwrap_or_else(|e| e.into_inner());
            slot.take()
        };
        if let Some(tx) = ready_tx {
            let _ = tx.send(ReadyInfo {
                session_id: ready.session_id.clone(),
                bot_name: ready.user.name.clone(),
            });
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(cmd) => self.forward_command(ctx, cmd).await,
            Interaction::Component(comp) => self.forward_component(ctx, comp).await,
            Interaction::Modal(modal) => self.forward_modal(ctx, modal).await,
            _ => {
                debug!(identity = %self.identity, "ignoring non-dispatchable interaction");
            },
        }
    }
}

/// Resolve the invocation's options into platform-neutral argument values.
fn resolve_args(options: &[ResolvedOption<'_>]) -> CommandArgs {
    let mut args = CommandArgs::new();
    for option in options {
        let value = match &option.value {
            ResolvedValue::String(s) => ArgValue::String((*s).to_string()),
            ResolvedValue::Integer(n) => ArgValue::Integer(*n),
            ResolvedValue::Boolean(b) => ArgValue::Boolean(*b),
            ResolvedValue::User(user, _) => ArgValue::User(user.id.to_string()),
            ResolvedValue::Channel(channel) => ArgValue::Channel(channel.id.to_string()),
            ResolvedValue::Attachment(attachment) => ArgValue::Attachment(AttachmentRef {
                url: attachment.url.clone(),
                filename: attachment.filename.clone(),
            }),
            other => {
                debug!(option = %option.name, "skipping unsupported option value: {other:?}");
                continue;
            },
        };
        args.insert(option.name, value);
    }
    args
}

/// Guild details from the gateway cache, when the interaction came from one.
fn guild_info(ctx: &Context, guild_id: Option<GuildId>) -> Option<GuildInfo> {
    let gid = guild_id?;
    let guild = ctx.cache.guild(gid)?;
    Some(GuildInfo {
        id: gid.to_string(),
        name: guild.name.clone(),
        member_count: guild.member_count,
        created_at: Some(gid.created_at().to_string()),
    })
}
