//! Console bot: health and bookkeeping queries.

use std::sync::Arc;

use {
    qren_fleet::{CommandContext, CommandDescriptor, MessageCard, ReplyMessage, handler_fn},
    qren_store::SharedState,
};

use crate::{control::MODERATION_LOG, palette, require_admin};

pub fn commands() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new(
            "status",
            "Check server and store status (Admin only)",
            handler_fn(status),
        ),
        CommandDescriptor::new("ping", "Check bot responsiveness", handler_fn(ping)),
        CommandDescriptor::new(
            "logs",
            "Show recent moderation entries (Admin only)",
            handler_fn(logs),
        ),
    ]
}

async fn status(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    if !require_admin(&ctx, "This command is for administrators only.").await? {
        return Ok(());
    }

    let mut card = MessageCard::new("System status")
        .field("Avatars", state.avatars.len().to_string())
        .field("Published servers", state.servers.len().to_string())
        .field("Tags", state.tags.len().to_string())
        .color(palette::GREEN);
    if let Some(ref guild) = ctx.guild {
        card = card
            .field("Server", guild.name.clone())
            .field("Members", guild.member_count.to_string());
    }
    ctx.reply(ReplyMessage::card(card)).await
}

async fn ping(ctx: CommandContext, _state: Arc<SharedState>) -> anyhow::Result<()> {
    let card = MessageCard::new("Pong")
        .description("The bot is connected and responding.")
        .color(palette::BLUE);
    ctx.reply(ReplyMessage::card(card)).await
}

async fn logs(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    if !require_admin(&ctx, "This command is for administrators only.").await? {
        return Ok(());
    }

    let entries = state
        .control
        .get(MODERATION_LOG)
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default();

    if entries.is_empty() {
        return ctx
            .reply(ReplyMessage::ephemeral("No moderation entries recorded."))
            .await;
    }

    let lines: Vec<String> = entries
        .iter()
        .rev()
        .take(10)
        .map(|entry| {
            format!(
                "{} {} by {} ({})",
                entry["action"].as_str().unwrap_or("?"),
                entry["target"].as_str().unwrap_or("?"),
                entry["by"].as_str().unwrap_or("?"),
                entry["detail"].as_str().unwrap_or(""),
            )
        })
        .collect();

    let card = MessageCard::new("Recent moderation entries")
        .description(lines.join("\n"))
        .color(palette::BLUE);
    ctx.reply(ReplyMessage {
        ephemeral: true,
        ..ReplyMessage::card(card)
    })
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::{control::record_moderation, testutil::admin_ctx},
        qren_fleet::CommandArgs,
    };

    #[tokio::test]
    async fn ping_replies_with_a_card() {
        let state = Arc::new(SharedState::in_memory());
        let (ctx, responder) = admin_ctx(CommandArgs::new());

        ping(ctx, state).await.unwrap();

        let reply = responder.last_reply();
        assert_eq!(reply.card.unwrap().title, "Pong");
        assert!(!reply.ephemeral);
    }

    #[tokio::test]
    async fn status_reports_store_sizes() {
        let state = Arc::new(SharedState::in_memory());
        state
            .tags
            .insert("anime", serde_json::json!({"link": "x"}))
            .unwrap();
        let (ctx, responder) = admin_ctx(CommandArgs::new());

        status(ctx, state).await.unwrap();

        let card = responder.last_reply().card.unwrap();
        assert!(card.fields.iter().any(|(name, value)| name == "Tags" && value == "1"));
    }

    #[tokio::test]
    async fn logs_show_latest_entries_first() {
        let state = Arc::new(SharedState::in_memory());
        record_moderation(&state, "kick", "first", "100", "x").unwrap();
        record_moderation(&state, "ban", "second", "100", "y").unwrap();
        let (ctx, responder) = admin_ctx(CommandArgs::new());

        logs(ctx, state).await.unwrap();

        let card = responder.last_reply().card.unwrap();
        let first_line = card.description.lines().next().unwrap();
        assert!(first_line.contains("second"));
    }

    #[tokio::test]
    async fn logs_without_entries_reply_ephemerally() {
        let state = Arc::new(SharedState::in_memory());
        let (ctx, responder) = admin_ctx(CommandArgs::new());

        logs(ctx, state).await.unwrap();

        assert!(responder.last_reply().ephemeral);
    }
}
