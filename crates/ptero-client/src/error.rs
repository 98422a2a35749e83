use thiserror::Error;

use crate::types::JsonObject;

#[derive(Debug, Error)]
pub enum PteroError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid http method '{0}'")]
    InvalidMethod(String),

    /// The panel rejected the request with a 4xx response.
    #[error("Pterodactyl API error: {code}")]
    Api { code: String, body: JsonObject },

    #[error("Pterodactyl API returned an invalid or unacceptable response (status: {status})")]
    Transport { status: u16 },

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PteroError {
    /// Machine-readable error code supplied by the panel, if any
    pub fn api_code(&self) -> Option<&str> {
        match self {
            PteroError::Api { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            PteroError::Transport { status } => Some(*status),
            PteroError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PteroError>;
