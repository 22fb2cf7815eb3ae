//! Player error type.

use thiserror::Error;

/// Errors surfaced to the player.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The gateway could not be reached or its response not decoded.
    #[error("gateway unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with an error body.
    #[error("{message} ({code})")]
    Gateway {
        /// HTTP status.
        status: u16,
        /// Machine-readable error code.
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// A choice was made before any game was started.
    #[error("no game in progress, type `new` to start one")]
    NoGame,

    /// A choice was made after the story ended.
    #[error("the story has ended, type `new` to play again")]
    GameOver,

    /// The choice is not among the ones offered.
    #[error("unknown choice: {0}")]
    UnknownChoice(String),

    /// Invalid player configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Terminal or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlayerError {
    /// The gateway error code, for gateway errors.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Gateway { code, .. } => Some(code),
            _ => None,
        }
    }
}
