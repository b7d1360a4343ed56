//! Error types for chatmine.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A context window was requested for a message that does not exist.
    #[error("Message index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure category reported by an embedding provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingErrorKind {
    Network,
    Auth,
    RateLimit,
    InvalidResponse,
    InvalidRequest,
}

impl fmt::Display for EmbeddingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Auth => write!(f, "auth"),
            Self::RateLimit => write!(f, "rate_limit"),
            Self::InvalidResponse => write!(f, "invalid_response"),
            Self::InvalidRequest => write!(f, "invalid_request"),
        }
    }
}

/// Error returned by an embedding provider, passed through unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct EmbeddingError {
    pub kind: EmbeddingErrorKind,
    pub message: String,
}

impl EmbeddingError {
    pub fn new(kind: EmbeddingErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(EmbeddingErrorKind::Network, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(EmbeddingErrorKind::InvalidResponse, message)
    }

    /// Map an HTTP status code from a provider onto an error kind.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => EmbeddingErrorKind::Auth,
            429 => EmbeddingErrorKind::RateLimit,
            400 | 404 | 413 | 422 => EmbeddingErrorKind::InvalidRequest,
            _ => EmbeddingErrorKind::Network,
        };
        Self::new(kind, format!("HTTP {}: {}", status, body.into()))
    }
}
