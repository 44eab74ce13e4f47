//! Error taxonomy for a single quote-card generation.
//!
//! Every variant aborts the request that raised it and nothing else. The ingestion
//! loop logs the error and moves on to the next input line.

use thiserror::Error;

use crate::nostr::nip19::Nip19Error;

#[derive(Debug, Error)]
pub enum QuoteError {
    /// Background, font or other bundled asset missing or undecodable
    #[error("Asset error: {0}")]
    Asset(String),

    #[error("cannot find quoted note {0}")]
    NoteNotFound(String),

    #[error("event {0} does not reply to anything")]
    NoParent(String),

    #[error("cannot find author {0}")]
    AuthorNotFound(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("failed to publish")]
    PublishFailed,

    /// Stream line that is not an event record
    #[error("Invalid line: {0}")]
    InvalidLine(String),

    /// Malformed profile JSON, identifier, image or key material
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl From<Nip19Error> for QuoteError {
    fn from(e: Nip19Error) -> Self {
        QuoteError::Decode(e.to_string())
    }
}

impl From<serde_json::Error> for QuoteError {
    fn from(e: serde_json::Error) -> Self {
        QuoteError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QuoteError>;
