use thiserror::Error;

/// Result type for all client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error, Clone)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Gateway returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unknown message identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}
