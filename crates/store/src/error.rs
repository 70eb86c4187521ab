use qren_common::FromMessage;

/// Crate-wide result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed store errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading or writing the backing file failed.
    #[error("store i/o failed for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
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

qren_common::impl_context!();
