//! Error types for document, palette and background operations.

use thiserror::Error;

use crate::{EmojiId, PaletteId};

/// Result type for emoji art operations.
pub type ArtResult<T> = Result<T, ArtError>;

/// Errors returned synchronously by document and palette operations.
#[derive(Debug, Error)]
pub enum ArtError {
    /// Input text is not a single emoji grapheme.
    #[error("Not an emoji: {0:?}")]
    InvalidEmoji(String),

    /// Emoji not found in the document.
    #[error("Emoji not found: {0}")]
    NotFound(EmojiId),

    /// Palette not found in the store.
    #[error("Palette not found: {0}")]
    PaletteNotFound(PaletteId),

    /// Removing the palette would leave the store empty.
    #[error("Cannot remove the last remaining palette")]
    LastPalette,

    /// Invalid argument for an operation.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Document or palette serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be read or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors produced while resolving a background image.
///
/// These never cross the mutation boundary: they are recorded in
/// [`crate::BackgroundFetchStatus`] and logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The remote resource could not be retrieved.
    #[error("Failed to fetch {url}: {reason}")]
    Network {
        /// The offending URL.
        url: String,
        /// Transport-level reason.
        reason: String,
    },

    /// The bytes are not a decodable image.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The fetch exceeded the configured timeout.
    #[error("Timed out fetching {url}")]
    Timeout {
        /// The offending URL.
        url: String,
    },

    /// The URL scheme cannot be fetched.
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}
