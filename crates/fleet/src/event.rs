use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use {anyhow::Result, async_trait::async_trait};

use crate::error::Error;

// ── Inbound events ──────────────────────────────────────────────────────────

/// The user who triggered an interaction.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub name: String,
    /// Whether the platform reports the actor holding administrator
    /// permission in the originating guild.
    pub is_admin: bool,
}

/// Guild the interaction originated in, when not a DM.
#[derive(Debug, Clone)]
pub struct GuildInfo {
    pub id: String,
    pub name: String,
    pub member_count: u64,
    /// Guild creation date as a display string, when the platform knows it.
    pub created_at: Option<String>,
}

/// One inbound interaction, classified once at the platform boundary.
pub struct InteractionEvent {
    pub kind: InteractionKind,
    pub actor: Actor,
    pub guild: Option<GuildInfo>,
    pub channel_id: Option<String>,
    pub responder: Arc<dyn Responder>,
}

impl std::fmt::Debug for InteractionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionEvent")
            .field("kind", &self.kind)
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

/// Every interaction shape the router dispatches on.
#[derive(Debug, Clone)]
pub enum InteractionKind {
    /// A slash-command invocation.
    Command { name: String, args: CommandArgs },
    /// A button press on a previously sent message.
    Button { custom_id: String },
    /// A selection from a dropdown menu.
    SelectMenu {
        custom_id: String,
        values: Vec<String>,
    },
    /// A submitted form.
    ModalSubmit {
        custom_id: String,
        fields: HashMap<String, String>,
    },
}

// ── Command arguments ───────────────────────────────────────────────────────

/// A resolved option value on a command invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    /// A user option, carried as the user's platform id.
    User(String),
    /// A channel option, carried as the channel's platform id.
    Channel(String),
    Attachment(AttachmentRef),
}

/// An uploaded attachment referenced by a command option.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentRef {
    pub url: String,
    pub filename: String,
}

/// Named option values of one command invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandArgs {
    values: HashMap<String, ArgValue>,
}

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ArgValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn user(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::User(id)) => Some(id),
            _ => None,
        }
    }

    pub fn channel(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::Channel(id)) => Some(id),
            _ => None,
        }
    }

    pub fn attachment(&self, name: &str) -> Option<&AttachmentRef> {
        match self.values.get(name) {
            Some(ArgValue::Attachment(a)) => Some(a),
            _ => None,
        }
    }

    /// Required-option accessors for handlers whose schema marks the option
    /// required; absence means the platform violated the declared schema.
    pub fn require_str(&self, name: &str) -> Result<&str, Error> {
        self.str(name).ok_or_else(|| Error::missing_option(name))
    }

    pub fn require_integer(&self, name: &str) -> Result<i64, Error> {
        self.integer(name)
            .ok_or_else(|| Error::missing_option(name))
    }

    pub fn require_user(&self, name: &str) -> Result<&str, Error> {
        self.user(name).ok_or_else(|| Error::missing_option(name))
    }

    pub fn require_channel(&self, name: &str) -> Result<&str, Error> {
        self.channel(name)
            .ok_or_else(|| Error::missing_option(name))
    }

    pub fn require_attachment(&self, name: &str) -> Result<&AttachmentRef, Error> {
        self.attachment(name)
            .ok_or_else(|| Error::missing_option(name))
    }
}

// ── Outbound replies ────────────────────────────────────────────────────────

/// A rich reply card (title, body, field rows, accent color).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageCard {
    pub title: String,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub color: Option<u32>,
}

impl MessageCard {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }
}

/// A button attached to a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyButton {
    pub custom_id: String,
    pub label: String,
}

/// Content of one outbound reply or follow-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyMessage {
    pub text: String,
    pub ephemeral: bool,
    pub card: Option<MessageCard>,
    pub buttons: Vec<ReplyButton>,
}

impl ReplyMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// A text reply visible only to the originating actor.
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ephemeral: true,
            ..Self::default()
        }
    }

    pub fn card(card: MessageCard) -> Self {
        Self {
            card: Some(card),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_button(mut self, custom_id: impl Into<String>, label: impl Into<String>) -> Self {
        self.buttons.push(ReplyButton {
            custom_id: custom_id.into(),
            label: label.into(),
        });
        self
    }
}

// ── Reply discipline ────────────────────────────────────────────────────────

/// Where an interaction stands in the platform's two-phase reply protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyState {
    NotReplied,
    /// An acknowledgment-of-deferral was sent; the real answer must go out
    /// as a follow-up.
    Deferred,
    Replied,
}

/// The per-event reply surface. One primary reply per interaction; anything
/// after a reply or deferral goes through the follow-up path.
#[async_trait]
pub trait Responder: Send + Sync {
    fn reply_state(&self) -> ReplyState;

    /// Send the primary reply.
    async fn reply(&self, message: ReplyMessage) -> Result<()>;

    /// Send a supplementary message after a reply or deferral.
    async fn follow_up(&self, message: ReplyMessage) -> Result<()>;

    /// Acknowledge the interaction without answering yet.
    async fn defer(&self) -> Result<()>;
}

/// Tracks the reply tri-state for responder implementations.
#[derive(Debug, Default)]
pub struct ReplyTracker {
    state: Mutex<Option<ReplyState>>,
}

impl ReplyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReplyState {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.unwrap_or(ReplyState::NotReplied)
    }

    /// Record a successful primary reply.
    pub fn mark_replied(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = Some(ReplyState::Replied);
    }

    /// Record a successful deferral. A deferral never downgrades a reply.
    pub fn mark_deferred(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !matches!(*state, Some(ReplyState::Replied)) {
            *state = Some(ReplyState::Deferred);
        }
    }
}
