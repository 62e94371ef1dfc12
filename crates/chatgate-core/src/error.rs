//! Error types for ChatGate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A required credential or persisted session is absent. Fatal for the
    /// call; the message names what the operator must provide.
    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    /// The remote service or automated page returned a fault, or automation
    /// could not complete a required step.
    #[error("Backend error ({channel}): {message}")]
    Backend { channel: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a backend fault tagged with the channel that produced it.
    pub fn backend(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Backend {
            channel: channel.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
