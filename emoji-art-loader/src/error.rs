//! Error types for the loader.

use thiserror::Error;

/// Result type for loader setup.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors that can occur while setting up background loading.
///
/// Failures of individual fetches are not errors here; they end up in the
/// document's fetch status as [`emoji_art_core::FetchError`]s.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// No Tokio runtime is available to run fetches on.
    #[error("Background loading requires a Tokio runtime: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}
