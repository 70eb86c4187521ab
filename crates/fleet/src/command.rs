use std::{collections::HashMap, future::Future, sync::Arc};

use {anyhow::Result, async_trait::async_trait};

use qren_store::SharedState;

use crate::{
    error::Error,
    event::{Actor, CommandArgs, GuildInfo, ReplyMessage, ReplyState, Responder},
};

// ── Descriptors ─────────────────────────────────────────────────────────────

/// Value type a command option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Attachment,
}

/// A fixed choice offered for a string option.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandChoice {
    pub name: String,
    pub value: String,
}

/// One declared parameter of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub required: bool,
    pub choices: Vec<CommandChoice>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

impl CommandOption {
    fn new(kind: OptionKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            choices: Vec::new(),
            min_value: None,
            max_value: None,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionKind::String, name, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionKind::Integer, name, description)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionKind::Boolean, name, description)
    }

    pub fn user(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionKind::User, name, description)
    }

    pub fn channel(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionKind::Channel, name, description)
    }

    pub fn attachment(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(OptionKind::Attachment, name, description)
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn choice(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.choices.push(CommandChoice {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Inclusive bounds for integer options.
    #[must_use]
    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }
}

/// Platform-neutral export of one command, fed to the bulk sync call.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSchema {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// Context a command handler executes against.
pub struct CommandContext {
    /// Name of the identity that received the invocation.
    pub identity: String,
    pub actor: Actor,
    pub guild: Option<GuildInfo>,
    pub channel_id: Option<String>,
    pub args: CommandArgs,
    responder: Arc<dyn Responder>,
}

impl CommandContext {
    pub fn new(
        identity: impl Into<String>,
        actor: Actor,
        guild: Option<GuildInfo>,
        channel_id: Option<String>,
        args: CommandArgs,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            identity: identity.into(),
            actor,
            guild,
            channel_id,
            args,
            responder,
        }
    }

    pub async fn reply(&self, message: ReplyMessage) -> Result<()> {
        self.responder.reply(message).await
    }

    pub async fn follow_up(&self, message: ReplyMessage) -> Result<()> {
        self.responder.follow_up(message).await
    }

    pub async fn defer(&self) -> Result<()> {
        self.responder.defer().await
    }

    pub fn reply_state(&self) -> ReplyState {
        self.responder.reply_state()
    }
}

/// Contract every command body satisfies: reply through the context, mutate
/// state only through the shared handle, surface failure as an error (the
/// router turns it into the user-visible error reply).
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, ctx: CommandContext, state: Arc<SharedState>) -> Result<()>;
}

/// Adapter so plain async functions can serve as handlers.
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(CommandContext, Arc<SharedState>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn execute(&self, ctx: CommandContext, state: Arc<SharedState>) -> Result<()> {
        (self.0)(ctx, state).await
    }
}

/// Wrap an async function as a [`CommandHandler`].
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(CommandContext, Arc<SharedState>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    FnHandler(f)
}

/// One registered command: declared schema plus its execute contract.
/// Immutable after registration.
pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
    handler: Arc<dyn CommandHandler>,
}

impl CommandDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl CommandHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    #[must_use]
    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn schema(&self) -> CommandSchema {
        CommandSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            options: self.options.clone(),
        }
    }

    pub async fn execute(&self, ctx: CommandContext, state: Arc<SharedState>) -> Result<()> {
        self.handler.execute(ctx, state).await
    }
}

impl std::fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("options", &self.options.len())
            .finish_non_exhaustive()
    }
}

// ── Registry ────────────────────────────────────────────────────────────────

/// Per-connection command lookup, built once from the identity's ordered
/// descriptor list. Not mutated after construction.
pub struct CommandRegistry {
    order: Vec<String>,
    commands: HashMap<String, CommandDescriptor>,
}

impl CommandRegistry {
    /// Build the registry. Duplicate names are rejected rather than
    /// last-wins overwritten.
    pub fn new(descriptors: Vec<CommandDescriptor>) -> Result<Self, Error> {
        let mut order = Vec::with_capacity(descriptors.len());
        let mut commands = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if commands.contains_key(&descriptor.name) {
                return Err(Error::duplicate_command(&descriptor.name));
            }
            order.push(descriptor.name.clone());
            commands.insert(descriptor.name.clone(), descriptor);
        }
        Ok(Self { order, commands })
    }

    /// Total lookup: an unregistered name is `None`, never an error.
    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(name)
    }

    /// Every descriptor in declaration order, in schema form for the bulk
    /// sync call.
    pub fn schemas(&self) -> Vec<CommandSchema> {
        self.order
            .iter()
            .filter_map(|name| self.commands.get(name))
            .map(CommandDescriptor::schema)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.order)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn noop(name: &str) -> CommandDescriptor {
        CommandDescriptor::new(name, "test command", handler_fn(|_ctx, _state| async {
            Ok(())
        }))
    }

    #[test]
    fn lookup_is_total() {
        let registry = CommandRegistry::new(vec![noop("ping")]).unwrap();
        assert!(registry.get("ping").is_some());
        assert!(registry.get("never_registered").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = CommandRegistry::new(vec![noop("ping"), noop("ping")]).unwrap_err();
        assert!(matches!(err, Error::DuplicateCommand { name } if name == "ping"));
    }

    #[test]
    fn schemas_preserve_declaration_order() {
        let registry =
            CommandRegistry::new(vec![noop("zulu"), noop("alpha"), noop("mike")]).unwrap();
        let names: Vec<_> = registry.schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["zulu", "alpha", "mike"]);
    }

    #[test]
    fn schema_carries_options() {
        let descriptor = noop("publish_server")
            .option(CommandOption::string("invite_link", "Server invite link").required())
            .option(
                CommandOption::string("server_type", "Kind of server")
                    .required()
                    .choice("Avatar server", "avatar")
                    .choice("General server", "server")
                    .choice("Store", "store"),
            );
        let schema = descriptor.schema();
        assert_eq!(schema.options.len(), 2);
        assert!(schema.options[0].required);
        assert_eq!(schema.options[1].choices.len(), 3);
    }

    #[test]
    fn integer_option_range() {
        let option = CommandOption::integer("amount", "How many").required().range(1, 100);
        assert_eq!(option.min_value, Some(1));
        assert_eq!(option.max_value, Some(100));
    }
}
