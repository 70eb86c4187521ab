//! Control bot: panel setup, guild stats, and moderation bookkeeping.
//!
//! Moderation commands record intent to the control store and acknowledge;
//! they do not call platform moderation APIs.

use std::sync::Arc;

use serde_json::{Value, json};

use {
    qren_fleet::{
        CommandContext, CommandDescriptor, CommandOption, MessageCard, ReplyMessage, handler_fn,
    },
    qren_store::{SharedState, unix_now_millis},
};

use crate::{palette, require_admin};

/// Control-store entry holding the rolling moderation log.
pub(crate) const MODERATION_LOG: &str = "moderation_log";

/// Most recent moderation entries kept.
const MODERATION_LOG_CAP: usize = 50;

pub fn commands() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new(
            "setup_control_panel",
            "Set up the main control panel (Admin only)",
            handler_fn(setup_control_panel),
        )
        .option(CommandOption::channel("channel", "Channel that hosts the control panel").required()),
        CommandDescriptor::new(
            "get_server_stats",
            "Show statistics for this server (Admin only)",
            handler_fn(get_server_stats),
        ),
        CommandDescriptor::new("kick", "Kick a member (Admin only)", handler_fn(kick))
            .option(CommandOption::user("user", "Member to kick").required())
            .option(CommandOption::string("reason", "Reason for the kick")),
        CommandDescriptor::new("ban", "Ban a member (Admin only)", handler_fn(ban))
            .option(CommandOption::user("user", "Member to ban").required())
            .option(CommandOption::string("reason", "Reason for the ban")),
        CommandDescriptor::new(
            "clear_messages",
            "Clear messages from this channel (Admin only)",
            handler_fn(clear_messages),
        )
        .option(
            CommandOption::integer("amount", "How many messages to clear")
                .required()
                .range(1, 100),
        ),
    ]
}

async fn setup_control_panel(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    if !require_admin(&ctx, "This command is for administrators only.").await? {
        return Ok(());
    }

    let channel = ctx.args.require_channel("channel")?;
    state.control.insert(
        "panel_channel",
        json!({
            "channel_id": channel,
            "configured_by": ctx.actor.id,
            "configured_at": unix_now_millis(),
        }),
    )?;

    ctx.reply(ReplyMessage::ephemeral(format!(
        "Control panel bound to channel {channel}."
    )))
    .await
}

async fn get_server_stats(ctx: CommandContext, _state: Arc<SharedState>) -> anyhow::Result<()> {
    if !require_admin(&ctx, "This command is for administrators only.").await? {
        return Ok(());
    }

    let Some(guild) = ctx.guild.clone() else {
        return ctx
            .reply(ReplyMessage::ephemeral(
                "Server stats are only available inside a server.",
            ))
            .await;
    };

    let mut card = MessageCard::new("Server statistics")
        .field("Members", guild.member_count.to_string())
        .field("Bot status", "connected")
        .color(palette::BLUE);
    if let Some(created) = guild.created_at {
        card = card.field("Created", created);
    }
    ctx.reply(ReplyMessage::card(card)).await
}

async fn kick(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    moderation_action(ctx, state, "kick", "You do not have kick permission.").await
}

async fn ban(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    moderation_action(ctx, state, "ban", "You do not have ban permission.").await
}

async fn moderation_action(
    ctx: CommandContext,
    state: Arc<SharedState>,
    action: &str,
    denial: &str,
) -> anyhow::Result<()> {
    if !require_admin(&ctx, denial).await? {
        return Ok(());
    }

    let target = ctx.args.require_user("user")?;
    let reason = ctx.args.str("reason").unwrap_or("no reason given");
    record_moderation(&state, action, target, &ctx.actor.id, reason)?;

    ctx.reply(ReplyMessage::ephemeral(format!(
        "Recorded {action} of <@{target}>: {reason}"
    )))
    .await
}

async fn clear_messages(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    if !require_admin(&ctx, "You do not have permission to clear messages.").await? {
        return Ok(());
    }

    let amount = ctx.args.require_integer("amount")?;
    if !(1..=100).contains(&amount) {
        return ctx
            .reply(ReplyMessage::ephemeral(
                "Amount must be between 1 and 100.",
            ))
            .await;
    }

    let channel = ctx.channel_id.clone().unwrap_or_default();
    record_moderation(
        &state,
        "clear_messages",
        &channel,
        &ctx.actor.id,
        &format!("{amount} messages"),
    )?;

    ctx.reply(ReplyMessage::ephemeral(format!(
        "Clearing {amount} messages."
    )))
    .await
}

/// Append an entry to the rolling moderation log in the control store.
pub(crate) fn record_moderation(
    state: &SharedState,
    action: &str,
    target: &str,
    by: &str,
    detail: &str,
) -> anyhow::Result<()> {
    let mut log = state
        .control
        .get(MODERATION_LOG)
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default();

    log.push(json!({
        "action": action,
        "target": target,
        "by": by,
        "detail": detail,
        "at": unix_now_millis(),
    }));
    if log.len() > MODERATION_LOG_CAP {
        let excess = log.len() - MODERATION_LOG_CAP;
        log.drain(..excess);
    }

    state.control.insert(MODERATION_LOG, Value::Array(log))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::testutil::{admin_ctx, member_ctx},
        qren_fleet::{ArgValue, CommandArgs},
    };

    #[tokio::test]
    async fn kick_records_a_moderation_entry() {
        let state = Arc::new(SharedState::in_memory());
        let (ctx, responder) = admin_ctx(
            CommandArgs::new()
                .with("user", ArgValue::User("555".into()))
                .with("reason", ArgValue::String("spam".into())),
        );

        kick(ctx, Arc::clone(&state)).await.unwrap();

        let log = state.control.get(MODERATION_LOG).unwrap();
        let entries = log.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["action"], "kick");
        assert_eq!(entries[0]["target"], "555");
        assert!(responder.last_reply().text.contains("555"));
    }

    #[tokio::test]
    async fn moderation_is_admin_gated() {
        let state = Arc::new(SharedState::in_memory());
        let (ctx, responder) =
            member_ctx(CommandArgs::new().with("user", ArgValue::User("555".into())));

        ban(ctx, Arc::clone(&state)).await.unwrap();

        assert!(state.control.get(MODERATION_LOG).is_none());
        assert!(responder.last_reply().ephemeral);
    }

    #[tokio::test]
    async fn moderation_log_is_capped() {
        let state = SharedState::in_memory();
        for i in 0..60 {
            record_moderation(&state, "kick", &i.to_string(), "100", "x").unwrap();
        }
        let entries = state.control.get(MODERATION_LOG).unwrap();
        let entries = entries.as_array().unwrap();
        assert_eq!(entries.len(), MODERATION_LOG_CAP);
        // Oldest entries were dropped.
        assert_eq!(entries[0]["target"], "10");
    }

    #[tokio::test]
    async fn server_stats_require_a_guild() {
        let state = Arc::new(SharedState::in_memory());
        let (mut ctx, responder) = admin_ctx(CommandArgs::new());
        ctx.guild = None;

        get_server_stats(ctx, state).await.unwrap();

        assert!(responder.last_reply().ephemeral);
    }

    #[tokio::test]
    async fn setup_panel_stores_the_channel() {
        let state = Arc::new(SharedState::in_memory());
        let (ctx, _responder) =
            admin_ctx(CommandArgs::new().with("channel", ArgValue::Channel("777".into())));

        setup_control_panel(ctx, Arc::clone(&state)).await.unwrap();

        let entry = state.control.get("panel_channel").unwrap();
        assert_eq!(entry["channel_id"], "777");
    }
}
