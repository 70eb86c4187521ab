use qren_common::FromMessage;

/// Crate-wide result type for fleet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed fleet errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two descriptors with the same name were registered for one identity.
    #[error("duplicate command name: {name}")]
    DuplicateCommand { name: String },

    /// A handler asked for an option the invocation did not carry.
    #[error("missing required option: {name}")]
    MissingOption { name: String },

    /// Operation is currently unavailable (session not ready).
    #[error("platform operation unavailable: {message}")]
    Unavailable { message: String },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn duplicate_command(name: impl Into<String>) -> Self {
        Self::DuplicateCommand { name: name.into() }
    }

    #[must_use]
    pub fn missing_option(name: impl Into<String>) -> Self {
        Self::MissingOption { name: name.into() }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}
