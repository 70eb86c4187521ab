//! Avatar catalog bot: upload, post, list, and delete shared avatars.

use std::sync::Arc;

use serde_json::json;

use {
    qren_fleet::{
        CommandContext, CommandDescriptor, CommandOption, MessageCard, ReplyMessage, handler_fn,
    },
    qren_store::{SharedState, unix_now_millis},
};

use crate::{palette, require_admin};

pub fn commands() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new(
            "upload_avatar",
            "Upload a new avatar image (Admin only)",
            handler_fn(upload_avatar),
        )
        .option(CommandOption::attachment("image", "The avatar image to upload").required())
        .option(CommandOption::string("name", "Name for this avatar (optional)")),
        CommandDescriptor::new(
            "post_avatar",
            "Post an avatar with download button",
            handler_fn(post_avatar),
        )
        .option(CommandOption::string("avatar_name", "Name of the avatar to post").required()),
        CommandDescriptor::new(
            "list_avatars",
            "List all available avatars (Admin only)",
            handler_fn(list_avatars),
        ),
        CommandDescriptor::new(
            "delete_avatar",
            "Delete an avatar (Admin only)",
            handler_fn(delete_avatar),
        )
        .option(CommandOption::string("avatar_name", "Name of the avatar to delete").required()),
    ]
}

async fn upload_avatar(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    if !require_admin(&ctx, "Only administrators can upload avatars.").await? {
        return Ok(());
    }

    let image = ctx.args.require_attachment("image")?;
    let name = ctx
        .args
        .str("name")
        .map(str::to_string)
        .unwrap_or_else(|| {
            image
                .filename
                .rsplit_once('.')
                .map(|(stem, _)| stem.to_string())
                .unwrap_or_else(|| image.filename.clone())
        });

    state.avatars.insert(
        &name,
        json!({
            "url": image.url,
            "filename": image.filename,
            "uploaded_by": ctx.actor.id,
            "uploaded_at": unix_now_millis(),
        }),
    )?;

    ctx.reply(ReplyMessage::ephemeral(format!(
        "Avatar '{name}' uploaded."
    )))
    .await
}

async fn post_avatar(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    let name = ctx.args.require_str("avatar_name")?;

    if state.avatars.get(name).is_none() {
        return ctx
            .reply(ReplyMessage::ephemeral(format!(
                "No avatar named '{name}' exists."
            )))
            .await;
    }

    let card = MessageCard::new("Qren Avatar")
        .description(format!("**{name}**"))
        .color(palette::BLUE);
    ctx.reply(ReplyMessage::card(card).with_button(format!("download_avatar_{name}"), "Download"))
        .await
}

async fn list_avatars(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    if !require_admin(&ctx, "Only administrators can view the avatar list.").await? {
        return Ok(());
    }

    if state.avatars.is_empty() {
        return ctx
            .reply(ReplyMessage::ephemeral("No avatars uploaded yet."))
            .await;
    }

    let mut names = state.avatars.ids();
    names.sort();
    let card = MessageCard::new("Available avatars")
        .description(names.join(", "))
        .field("Total", names.len().to_string())
        .color(palette::BLUE);
    ctx.reply(ReplyMessage {
        ephemeral: true,
        ..ReplyMessage::card(card)
    })
    .await
}

async fn delete_avatar(ctx: CommandContext, state: Arc<SharedState>) -> anyhow::Result<()> {
    if !require_admin(&ctx, "Only administrators can delete avatars.").await? {
        return Ok(());
    }

    let name = ctx.args.require_str("avatar_name")?;
    let removed = state.avatars.remove(name)?;
    let message = if removed.is_some() {
        format!("Avatar '{name}' deleted.")
    } else {
        format!("No avatar named '{name}' exists.")
    };
    ctx.reply(ReplyMessage::ephemeral(message)).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::testutil::{admin_ctx, member_ctx},
        qren_fleet::{ArgValue, AttachmentRef, CommandArgs},
    };

    fn upload_args() -> CommandArgs {
        CommandArgs::new().with(
            "image",
            ArgValue::Attachment(AttachmentRef {
                url: "https://cdn.example/neo.png".into(),
                filename: "neo.png".into(),
            }),
        )
    }

    #[tokio::test]
    async fn upload_is_admin_gated() {
        let state = Arc::new(SharedState::in_memory());
        let (ctx, responder) = member_ctx(upload_args());

        upload_avatar(ctx, Arc::clone(&state)).await.unwrap();

        assert!(state.avatars.is_empty());
        assert!(responder.last_reply().ephemeral);
    }

    #[tokio::test]
    async fn upload_defaults_name_to_file_stem() {
        let state = Arc::new(SharedState::in_memory());
        let (ctx, _responder) = admin_ctx(upload_args());

        upload_avatar(ctx, Arc::clone(&state)).await.unwrap();

        assert!(state.avatars.contains("neo"));
    }

    #[tokio::test]
    async fn post_known_avatar_carries_download_button() {
        let state = Arc::new(SharedState::in_memory());
        state
            .avatars
            .insert("neo", serde_json::json!({"url": "u"}))
            .unwrap();
        let (ctx, responder) =
            member_ctx(CommandArgs::new().with("avatar_name", ArgValue::String("neo".into())));

        post_avatar(ctx, state).await.unwrap();

        let reply = responder.last_reply();
        assert_eq!(reply.buttons.len(), 1);
        assert_eq!(reply.buttons[0].custom_id, "download_avatar_neo");
    }

    #[tokio::test]
    async fn post_unknown_avatar_is_a_polite_miss() {
        let state = Arc::new(SharedState::in_memory());
        let (ctx, responder) =
            member_ctx(CommandArgs::new().with("avatar_name", ArgValue::String("ghost".into())));

        post_avatar(ctx, state).await.unwrap();

        let reply = responder.last_reply();
        assert!(reply.ephemeral);
        assert!(reply.buttons.is_empty());
    }

    #[tokio::test]
    async fn delete_removes_and_reports() {
        let state = Arc::new(SharedState::in_memory());
        state
            .avatars
            .insert("neo", serde_json::json!({"url": "u"}))
            .unwrap();
        let (ctx, responder) =
            admin_ctx(CommandArgs::new().with("avatar_name", ArgValue::String("neo".into())));

        delete_avatar(ctx, Arc::clone(&state)).await.unwrap();

        assert!(state.avatars.is_empty());
        assert!(responder.last_reply().text.contains("deleted"));
    }
}
