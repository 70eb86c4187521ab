//! Publishing bot: server promotions behind a one-hour cooldown.

use std::{sync::Arc, time::Duration};

use serde_json::json;

use {
    qren_fleet::{
        CommandContext, CommandDescriptor, CommandOption, MessageCard, ReplyMessage, handler_fn,
    },
    qren_store::{CooldownClass, Decision, SharedState, unix_now_millis},
};

use crate::{palette, require_admin};

/// One publish per actor per hour.
pub(crate) const PUBLISH_WINDOW: Duration = Duration::from_secs(3600);

pub fn commands() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new(
            "setup_promotion",
            "Set up the server promotion system (Admin only)",
            handler_fn(setup_promotion),
        )
        .option(CommandOption::channel("channel", "Channel dedicated to server promotions").required()),
        CommandDescriptor::new(
            "setup_channels",
            "Configure the per-type promotion channels (Admin only)",
            handler_fn(setup_channels),
        )
        .option(CommandOption::channel("avatar_channel", "Channel for avatar servers"))
        .option(CommandOption::channel("server_channel", "Channel for general servers"))
        .option(CommandOption::channel("store_channel", "Channel for stores")),
        CommandDescriptor::new(
            "publish_server",
            "Publish a new server",
            handler_fn(publish_server),
        )
        .option(CommandOption::string("invite_link", "Server invite link").required())
        .option(
            CommandOption::string("server_type", "Kind of server")
                .required()
                .choice("Avatar server", "avatar")
                .choice("General server", "server")
                .choice("Store", "store"),
        ),
        CommandDescriptor::new(
            "server_stats",
            "Show statistics for published servers (Admin only)",
            handler_fn(server_stats),
        ),
        CommandDescriptor::new(
            "cooldown_status",
            "Check your publish cooldown",
            handler_fn(cooldown_status),
        ),
    ]
}

async fn setup_promotion(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    if !require_admin(&ctx, "This command is for administrators only.").await? {
        return Ok(());
    }

    let channel = ctx.args.require_channel("channel")?;
    state.control.insert(
        "promotion_channel",
        json!({
            "channel_id": channel,
            "configured_by": ctx.actor.id,
            "configured_at": unix_now_millis(),
        }),
    )?;

    ctx.reply(ReplyMessage::ephemeral(format!(
        "Server promotions bound to channel {channel}."
    )))
    .await
}

async fn setup_channels(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    if !require_admin(&ctx, "This command is for administrators only.").await? {
        return Ok(());
    }

    let mut channels = serde_json::Map::new();
    for (option, key) in [
        ("avatar_channel", "avatar"),
        ("server_channel", "server"),
        ("store_channel", "store"),
    ] {
        if let Some(channel) = ctx.args.channel(option) {
            channels.insert(key.to_string(), json!(channel));
        }
    }

    if channels.is_empty() {
        return ctx
            .reply(ReplyMessage::ephemeral("No channels given; nothing changed."))
            .await;
    }

    let configured = channels.len();
    state
        .control
        .insert("publish_channels", serde_json::Value::Object(channels))?;

    ctx.reply(ReplyMessage::ephemeral(format!(
        "Configured {configured} promotion channel(s)."
    )))
    .await
}

async fn publish_server(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    let now = unix_now_millis();

    if let Decision::Blocked { remaining_minutes } =
        state
            .cooldowns
            .check(&ctx.actor.id, CooldownClass::Publish, PUBLISH_WINDOW, now)
    {
        return ctx
            .reply(ReplyMessage::ephemeral(format!(
                "You must wait {remaining_minutes} more minute(s) before publishing another server."
            )))
            .await;
    }

    let invite_link = ctx.args.require_str("invite_link")?;
    let server_type = ctx.args.require_str("server_type")?;

    state.servers.insert(
        format!("{now}-{}", ctx.actor.id),
        json!({
            "invite_link": invite_link,
            "server_type": server_type,
            "published_by": ctx.actor.id,
            "published_at": now,
        }),
    )?;
    // The publish went through; record the window start.
    state
        .cooldowns
        .commit(&ctx.actor.id, CooldownClass::Publish, now)?;

    let card = MessageCard::new("Server published")
        .description(format!("Link: {invite_link}\nType: {server_type}"))
        .color(palette::RED);
    ctx.reply(ReplyMessage::card(card)).await
}

async fn server_stats(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    if !require_admin(&ctx, "This command is for administrators only.").await? {
        return Ok(());
    }

    let snapshot = state.servers.snapshot();
    let count_of = |kind: &str| {
        snapshot
            .values()
            .filter(|v| v["server_type"].as_str() == Some(kind))
            .count()
            .to_string()
    };

    let card = MessageCard::new("Published server statistics")
        .field("Avatar servers", count_of("avatar"))
        .field("General servers", count_of("server"))
        .field("Stores", count_of("store"))
        .color(palette::BLUE);
    ctx.reply(ReplyMessage::card(card)).await
}

async fn cooldown_status(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    let decision = state.cooldowns.check(
        &ctx.actor.id,
        CooldownClass::Publish,
        PUBLISH_WINDOW,
        unix_now_millis(),
    );

    let message = match decision {
        Decision::Allowed => "You can publish a new server now.".to_string(),
        Decision::Blocked { remaining_minutes } => format!(
            "You must wait {remaining_minutes} more minute(s) before publishing another server."
        ),
    };
    ctx.reply(ReplyMessage::ephemeral(message)).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::testutil::{admin_ctx, member_ctx},
        qren_fleet::{ArgValue, CommandArgs},
    };

    fn publish_args() -> CommandArgs {
        CommandArgs::new()
            .with(
                "invite_link",
                ArgValue::String("https://discord.gg/qren".into()),
            )
            .with("server_type", ArgValue::String("avatar".into()))
    }

    #[tokio::test]
    async fn publish_stores_the_server_and_commits_the_cooldown() {
        let state = Arc::new(SharedState::in_memory());
        let (ctx, responder) = member_ctx(publish_args());

        publish_server(ctx, Arc::clone(&state)).await.unwrap();

        assert_eq!(state.servers.len(), 1);
        assert_eq!(state.cooldowns.recorded(CooldownClass::Publish), 1);
        assert!(!responder.last_reply().ephemeral);
    }

    #[tokio::test]
    async fn second_publish_within_the_window_is_blocked() {
        let state = Arc::new(SharedState::in_memory());

        let (ctx, _responder) = member_ctx(publish_args());
        publish_server(ctx, Arc::clone(&state)).await.unwrap();

        let (ctx, responder) = member_ctx(publish_args());
        publish_server(ctx, Arc::clone(&state)).await.unwrap();

        // Nothing new stored, and the reply names the remaining wait.
        assert_eq!(state.servers.len(), 1);
        let reply = responder.last_reply();
        assert!(reply.ephemeral);
        assert!(reply.text.contains("60 more minute(s)"));
    }

    #[tokio::test]
    async fn cooldown_status_reads_without_committing() {
        let state = Arc::new(SharedState::in_memory());

        let (ctx, responder) = member_ctx(CommandArgs::new());
        cooldown_status(ctx, Arc::clone(&state)).await.unwrap();
        assert!(responder.last_reply().text.contains("now"));

        // The status query itself never starts a window.
        assert_eq!(state.cooldowns.recorded(CooldownClass::Publish), 0);
    }

    #[tokio::test]
    async fn server_stats_count_by_type() {
        let state = Arc::new(SharedState::in_memory());
        for (key, kind) in [("1", "avatar"), ("2", "avatar"), ("3", "store")] {
            state
                .servers
                .insert(key, serde_json::json!({"server_type": kind}))
                .unwrap();
        }
        let (ctx, responder) = admin_ctx(CommandArgs::new());

        server_stats(ctx, state).await.unwrap();

        let card = responder.last_reply().card.unwrap();
        assert!(card
            .fields
            .iter()
            .any(|(name, value)| name == "Avatar servers" && value == "2"));
        assert!(card.fields.iter().any(|(name, value)| name == "Stores" && value == "1"));
    }

    #[tokio::test]
    async fn setup_channels_with_no_options_changes_nothing() {
        let state = Arc::new(SharedState::in_memory());
        let (ctx, responder) = admin_ctx(CommandArgs::new());

        setup_channels(ctx, Arc::clone(&state)).await.unwrap();

        assert!(state.control.get("publish_channels").is_none());
        assert!(responder.last_reply().text.contains("nothing changed"));
    }
}
