//! Error types for Gremlins.

use thiserror::Error;

use crate::range::RangeError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum GremlinsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Unexpected content type '{content_type}' from {url}")]
    UnexpectedContentType { content_type: String, url: String },

    #[error("Failed to decode payload: {0}")]
    Decode(String),

    #[error("Sink not available: {0}")]
    SinkUnavailable(String),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GremlinsError {
    /// Whether this error comes from talking to a remote source.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::HttpStatus { .. }
                | Self::UnexpectedContentType { .. }
                | Self::Decode(_)
        )
    }
}
