//! Discord implementation of the fleet's platform boundary.
//!
//! Wraps serenity: session establishment against the gateway, bulk
//! slash-command upload, presence announcements, and forwarding of inbound
//! interactions into a connection's event stream.

pub mod connector;
pub mod handler;
pub mod responder;
pub mod schema;

pub use connector::DiscordConnector;
