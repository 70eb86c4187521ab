//! Multi-connection orchestration core.
//!
//! One process drives a fleet of independently-authenticated bot
//! connections. Each connection owns its lifecycle (authenticate, announce
//! presence, sync commands, serve events) and dispatches inbound
//! interactions through a router that isolates handler failure from the
//! connection's event loop. Connections share a single persisted state
//! handle and nothing else.

pub mod command;
pub mod connection;
pub mod error;
pub mod event;
pub mod orchestrator;
pub mod platform;
pub mod router;

pub use {
    command::{
        CommandChoice, CommandContext, CommandDescriptor, CommandHandler, CommandOption,
        CommandRegistry, CommandSchema, FnHandler, OptionKind, handler_fn,
    },
    connection::ConnectionState,
    error::{Error, Result},
    event::{
        Actor, ArgValue, AttachmentRef, CommandArgs, GuildInfo, InteractionEvent, InteractionKind,
        MessageCard, ReplyButton, ReplyMessage, ReplyState, ReplyTracker, Responder,
    },
    orchestrator::{ConnectionHandle, Fleet, FleetStatus, IdentityRuntime},
    platform::{PlatformConnector, PlatformSession},
    router::{ERROR_REPLY, InteractionRouter},
};
