//! Tag search bot: a shared directory mapping tags to server links.

use std::{sync::Arc, time::Duration};

use serde_json::json;

use {
    qren_fleet::{
        CommandContext, CommandDescriptor, CommandOption, MessageCard, ReplyMessage, handler_fn,
    },
    qren_store::{CooldownClass, Decision, SharedState, unix_now_millis},
};

use crate::{palette, require_admin};

/// One search per actor per minute.
pub(crate) const SEARCH_WINDOW: Duration = Duration::from_secs(60);

pub fn commands() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new(
            "search",
            "Search for a tag and get its server link",
            handler_fn(search),
        )
        .option(CommandOption::string("tag", "Tag to search for").required()),
        CommandDescriptor::new(
            "tag_add",
            "Add a new tag with its server link",
            handler_fn(tag_add),
        )
        .option(CommandOption::string("tag", "Tag to add").required())
        .option(CommandOption::string("server_link", "Server link").required())
        .option(CommandOption::string("description", "Optional tag description")),
        CommandDescriptor::new(
            "tag_delete",
            "Delete an existing tag (Admin only)",
            handler_fn(tag_delete),
        )
        .option(CommandOption::string("tag", "Tag to delete").required()),
        CommandDescriptor::new("tag_list", "List all available tags", handler_fn(tag_list)),
        CommandDescriptor::new(
            "setup_tags",
            "Post the tag lookup welcome card",
            handler_fn(setup_tags),
        )
        .option(CommandOption::channel("channel", "Channel to post into (optional)")),
    ]
}

async fn search(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    let now = unix_now_millis();

    if let Decision::Blocked { remaining_minutes } =
        state
            .cooldowns
            .check(&ctx.actor.id, CooldownClass::Search, SEARCH_WINDOW, now)
    {
        return ctx
            .reply(ReplyMessage::ephemeral(format!(
                "You must wait {remaining_minutes} more minute(s) before searching again."
            )))
            .await;
    }

    let tag = ctx.args.require_str("tag")?;
    let result = state.tags.get(tag);
    state
        .cooldowns
        .commit(&ctx.actor.id, CooldownClass::Search, now)?;

    let card = match result {
        Some(entry) => {
            let link = entry["link"].as_str().unwrap_or("(no link)").to_string();
            let mut card = MessageCard::new("Tag search results")
                .description(format!("Results for **{tag}**"))
                .field("Link", link)
                .color(palette::PURPLE);
            if let Some(description) = entry["description"].as_str()
                && !description.is_empty()
            {
                card = card.field("Description", description.to_string());
            }
            card
        },
        None => MessageCard::new("Tag search results")
            .description(format!("No servers found for **{tag}**. Use /tag_list to see every available tag."))
            .color(palette::PURPLE),
    };
    ctx.reply(ReplyMessage::card(card)).await
}

async fn tag_add(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    let tag = ctx.args.require_str("tag")?;
    let server_link = ctx.args.require_str("server_link")?;
    let description = ctx.args.str("description").unwrap_or_default();

    state.tags.insert(
        tag,
        json!({
            "link": server_link,
            "description": description,
            "added_by": ctx.actor.id,
            "added_at": unix_now_millis(),
        }),
    )?;

    let card = MessageCard::new("Tag added")
        .description(format!("**{tag}** now points at {server_link}"))
        .color(palette::GREEN);
    ctx.reply(ReplyMessage::card(card)).await
}

async fn tag_delete(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    if !require_admin(&ctx, "This command is for administrators only.").await? {
        return Ok(());
    }

    let tag = ctx.args.require_str("tag")?;
    let removed = state.tags.remove(tag)?;
    let message = if removed.is_some() {
        format!("Tag '{tag}' deleted.")
    } else {
        format!("No tag named '{tag}' exists.")
    };
    ctx.reply(ReplyMessage::ephemeral(message)).await
}

async fn tag_list(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    if state.tags.is_empty() {
        return ctx
            .reply(ReplyMessage::ephemeral("No tags available yet."))
            .await;
    }

    let mut tags = state.tags.ids();
    tags.sort();
    let card = MessageCard::new("Available tags")
        .description(tags.join(", "))
        .field("Total", tags.len().to_string())
        .color(palette::BLUE);
    ctx.reply(ReplyMessage::card(card)).await
}

async fn setup_tags(ctx: CommandContext, _state: Arc<SharedState>) -> anyhow::Result<()> {
    let card = MessageCard::new("Qren Tags")
        .description("Search server tags with /search, or browse them all with /tag_list.")
        .color(palette::GRAY);
    ctx.reply(ReplyMessage::card(card)).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::testutil::{admin_ctx, member_ctx},
        qren_fleet::{ArgValue, CommandArgs},
    };

    fn tag_args(tag: &str) -> CommandArgs {
        CommandArgs::new().with("tag", ArgValue::String(tag.into()))
    }

    #[tokio::test]
    async fn add_then_search_finds_the_tag() {
        let state = Arc::new(SharedState::in_memory());

        let (ctx, _responder) = member_ctx(
            tag_args("anime")
                .with("server_link", ArgValue::String("https://discord.gg/a".into())),
        );
        tag_add(ctx, Arc::clone(&state)).await.unwrap();

        let (ctx, responder) = member_ctx(tag_args("anime"));
        search(ctx, Arc::clone(&state)).await.unwrap();

        let card = responder.last_reply().card.unwrap();
        assert!(card
            .fields
            .iter()
            .any(|(name, value)| name == "Link" && value == "https://discord.gg/a"));
    }

    #[tokio::test]
    async fn search_miss_suggests_the_tag_list() {
        let state = Arc::new(SharedState::in_memory());
        let (ctx, responder) = member_ctx(tag_args("ghost"));

        search(ctx, state).await.unwrap();

        let card = responder.last_reply().card.unwrap();
        assert!(card.description.contains("No servers found"));
    }

    #[tokio::test]
    async fn repeated_search_is_rate_limited() {
        let state = Arc::new(SharedState::in_memory());

        let (ctx, _responder) = member_ctx(tag_args("anime"));
        search(ctx, Arc::clone(&state)).await.unwrap();

        let (ctx, responder) = member_ctx(tag_args("anime"));
        search(ctx, Arc::clone(&state)).await.unwrap();

        let reply = responder.last_reply();
        assert!(reply.ephemeral);
        assert!(reply.text.contains("wait"));
    }

    #[tokio::test]
    async fn delete_is_admin_gated() {
        let state = Arc::new(SharedState::in_memory());
        state
            .tags
            .insert("anime", serde_json::json!({"link": "x"}))
            .unwrap();

        let (ctx, _responder) = member_ctx(tag_args("anime"));
        tag_delete(ctx, Arc::clone(&state)).await.unwrap();
        assert!(state.tags.contains("anime"));

        let (ctx, _responder) = admin_ctx(tag_args("anime"));
        tag_delete(ctx, Arc::clone(&state)).await.unwrap();
        assert!(!state.tags.contains("anime"));
    }

    #[tokio::test]
    async fn tag_list_sorts_names() {
        let state = Arc::new(SharedState::in_memory());
        for tag in ["zeta", "alpha", "mid"] {
            state
                .tags
                .insert(tag, serde_json::json!({"link": "x"}))
                .unwrap();
        }
        let (ctx, responder) = member_ctx(CommandArgs::new());

        tag_list(ctx, state).await.unwrap();

        let card = responder.last_reply().card.unwrap();
        assert_eq!(card.description, "alpha, mid, zeta");
    }
}
