use std::{collections::HashMap, sync::Arc};

use tracing::{debug, error, warn};

use qren_store::SharedState;

use crate::{
    command::{CommandContext, CommandRegistry},
    event::{InteractionEvent, InteractionKind, ReplyMessage, ReplyState},
};

/// Fixed user-visible message for any handler failure.
pub const ERROR_REPLY: &str = "Something went wrong while handling that interaction.";

/// Per-connection interaction dispatch.
///
/// This is the single failure-isolation layer: whatever a handler raises is
/// caught here, logged with the identity name, and converted into one
/// best-effort reply. Nothing a handler does can take down the connection's
/// event loop or another connection.
pub struct InteractionRouter {
    identity: String,
    registry: Arc<CommandRegistry>,
    state: Arc<SharedState>,
}

impl InteractionRouter {
    pub fn new(
        identity: impl Into<String>,
        registry: Arc<CommandRegistry>,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            identity: identity.into(),
            registry,
            state,
        }
    }

    /// Dispatch one event on its own task. A slow or hung handler never
    /// delays dispatch of the next event on the same connection.
    pub fn dispatch(self: &Arc<Self>, event: InteractionEvent) {
        let router = Arc::clone(self);
        tokio::spawn(async move {
            router.handle(event).await;
        });
    }

    /// Classify and run one interaction to completion.
    pub async fn handle(&self, event: InteractionEvent) {
        let InteractionEvent {
            kind,
            actor,
            guild,
            channel_id,
            responder,
        } = event;

        let result = match kind {
            InteractionKind::Command { name, args } => {
                let Some(descriptor) = self.registry.get(&name) else {
                    // Unregistered names are a silent no-op, not an error.
                    debug!(
                        identity = %self.identity,
                        command = %name,
                        "ignoring unregistered command"
                    );
                    return;
                };
                let ctx = CommandContext::new(
                    self.identity.clone(),
                    actor,
                    guild,
                    channel_id,
                    args,
                    Arc::clone(&responder),
                );
                descriptor.execute(ctx, Arc::clone(&self.state)).await
            },
            InteractionKind::Button { custom_id } => self.on_button(&custom_id, &actor.id).await,
            InteractionKind::SelectMenu { custom_id, values } => {
                self.on_select_menu(&custom_id, &values, &actor.id).await
            },
            InteractionKind::ModalSubmit { custom_id, fields } => {
                self.on_modal_submit(&custom_id, &fields, &actor.id).await
            },
        };

        if let Err(e) = result {
            error!(
                identity = %self.identity,
                error = %e,
                "interaction handler failed"
            );
            let message = ReplyMessage::ephemeral(ERROR_REPLY);
            // Respect the two-phase reply protocol: a primary reply is only
            // valid while nothing has been sent or deferred yet.
            let delivery = match responder.reply_state() {
                ReplyState::NotReplied => responder.reply(message).await,
                ReplyState::Deferred | ReplyState::Replied => responder.follow_up(message).await,
            };
            if let Err(e) = delivery {
                warn!(
                    identity = %self.identity,
                    error = %e,
                    "failed to deliver error reply"
                );
            }
        }
    }

    async fn on_button(&self, custom_id: &str, actor_id: &str) -> anyhow::Result<()> {
        debug!(identity = %self.identity, custom_id, actor_id, "button press");
        Ok(())
    }

    async fn on_select_menu(
        &self,
        custom_id: &str,
        values: &[String],
        actor_id: &str,
    ) -> anyhow::Result<()> {
        debug!(
            identity = %self.identity,
            custom_id,
            selected = values.len(),
            actor_id,
            "menu selection"
        );
        Ok(())
    }

    async fn on_modal_submit(
        &self,
        custom_id: &str,
        fields: &HashMap<String, String>,
        actor_id: &str,
    ) -> anyhow::Result<()> {
        debug!(
            identity = %self.identity,
            custom_id,
            fields = fields.len(),
            actor_id,
            "form submission"
        );
        Ok(())
    }
}
