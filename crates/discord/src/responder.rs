use std::sync::Arc;

use {
    anyhow::{Context as _, Result},
    async_trait::async_trait,
    serenity::all::{
        ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateInteractionResponse,
        CreateInteractionResponseFollowup, CreateInteractionResponseMessage, Http, InteractionId,
    },
};

use qren_fleet::{MessageCard, ReplyMessage, ReplyState, ReplyTracker, Responder};

/// Reply surface for one Discord interaction.
///
/// Works over the raw HTTP interaction endpoints (interaction id + token),
/// which are identical across command, component, and modal interactions.
/// Tracks the replied/deferred tri-state so the router can pick between the
/// primary-response and follow-up endpoints.
pub struct DiscordResponder {
    http: Arc<Http>,
    interaction_id: InteractionId,
    token: String,
    tracker: ReplyTracker,
}

impl DiscordResponder {
    pub fn new(http: Arc<Http>, interaction_id: InteractionId, token: String) -> Self {
        Self {
            http,
            interaction_id,
            token,
            tracker: ReplyTracker::new(),
        }
    }
}

#[async_trait]
impl Responder for DiscordResponder {
    fn reply_state(&self) -> ReplyState {
        self.tracker.state()
    }

    async fn reply(&self, message: ReplyMessage) -> Result<()> {
        let response = CreateInteractionResponse::Message(build_response_message(&message));
        self.http
            .create_interaction_response(self.interaction_id, &self.token, &response, Vec::new())
            .await
            .context("create interaction response")?;
        self.tracker.mark_replied();
        Ok(())
    }

    async fn follow_up(&self, message: ReplyMessage) -> Result<()> {
        let mut builder = CreateInteractionResponseFollowup::new();
        if !message.text.is_empty() {
            builder = builder.content(&message.text);
        }
        if message.ephemeral {
            builder = builder.ephemeral(true);
        }
        if let Some(ref card) = message.card {
            builder = builder.embed(build_embed(card));
        }
        if !message.buttons.is_empty() {
            builder = builder.components(build_button_rows(&message));
        }
        self.http
            .create_followup_message(&self.token, &builder, Vec::new())
            .await
            .context("create followup message")?;
        Ok(())
    }

    async fn defer(&self) -> Result<()> {
        let response = CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new());
        self.http
            .create_interaction_response(self.interaction_id, &self.token, &response, Vec::new())
            .await
            .context("defer interaction")?;
        self.tracker.mark_deferred();
        Ok(())
    }
}

fn build_response_message(message: &ReplyMessage) -> CreateInteractionResponseMessage {
    let mut builder = CreateInteractionResponseMessage::new();
    if !message.text.is_empty() {
        builder = builder.content(&message.text);
    }
    if message.ephemeral {
        builder = builder.ephemeral(true);
    }
    if let Some(ref card) = message.card {
        builder = builder.embed(build_embed(card));
    }
    if !message.buttons.is_empty() {
        builder = builder.components(build_button_rows(message));
    }
    builder
}

fn build_embed(card: &MessageCard) -> CreateEmbed {
    let mut embed = CreateEmbed::new().title(&card.title);
    if !card.description.is_empty() {
        embed = embed.description(&card.description);
    }
    for (name, value) in &card.fields {
        embed = embed.field(name, value, true);
    }
    if let Some(color) = card.color {
        embed = embed.color(color);
    }
    embed
}

fn build_button_rows(message: &ReplyMessage) -> Vec<CreateActionRow> {
    let buttons = message
        .buttons
        .iter()
        .map(|b| {
            CreateButton::new(&b.custom_id)
                .label(&b.label)
                .style(ButtonStyle::Primary)
        })
        .collect();
    vec![CreateActionRow::Buttons(buttons)]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn response_message_carries_content_and_flags() {
        let message = ReplyMessage::ephemeral("only for you");
        let value = serde_json::to_value(build_response_message(&message)).unwrap();
        assert_eq!(value["content"], "only for you");
        // Ephemeral replies set the 1 << 6 message flag.
        assert_eq!(value["flags"], 64);
    }

    #[test]
    fn card_becomes_an_embed() {
        let message = ReplyMessage::card(
            MessageCard::new("Server stats")
                .description("Counts by type")
                .field("Members", "120")
                .color(0x3498db),
        );
        let value = serde_json::to_value(build_response_message(&message)).unwrap();
        let embed = &value["embeds"].as_array().unwrap()[0];
        assert_eq!(embed["title"], "Server stats");
        assert_eq!(embed["fields"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn buttons_land_in_one_action_row() {
        let message = ReplyMessage::text("pick one").with_button("download_avatar_neo", "Download");
        let value = serde_json::to_value(build_response_message(&message)).unwrap();
        let rows = value["components"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["components"][0]["custom_id"], "download_avatar_neo");
    }
}
