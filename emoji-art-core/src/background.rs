//! Background references, loaded images and the fetch status machine.

use std::sync::Arc;

use url::Url;

use crate::FetchError;

/// What the document uses as its background.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Background {
    /// Plain canvas.
    #[default]
    None,
    /// A remote (or `data:`/`file:`) image.
    Url(Url),
    /// Inline encoded image bytes.
    ImageData(Vec<u8>),
}

impl Background {
    /// The URL, if this is a URL background.
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            _ => None,
        }
    }

    /// Whether this background needs resolving into an image.
    #[must_use]
    pub fn needs_resolution(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Debug for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Url(url) => f.debug_tuple("Url").field(&url.as_str()).finish(),
            Self::ImageData(bytes) => write!(f, "ImageData({} bytes)", bytes.len()),
        }
    }
}

/// A decoded background image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub pixels: Arc<[u8]>,
}

/// Progress of background resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackgroundFetchStatus {
    /// Nothing in flight. The image, if any, is current.
    #[default]
    Idle,
    /// Waiting for the current background to be fetched or decoded.
    Fetching,
    /// Resolution of the current background failed.
    Failed {
        /// The URL that failed; `None` for inline image bytes.
        url: Option<Url>,
        /// Why it failed.
        error: FetchError,
    },
}

impl BackgroundFetchStatus {
    /// Whether a fetch is in flight.
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::Fetching)
    }
}

/// A request to resolve one particular background.
///
/// The generation identifies which `set_background` call it belongs to; a
/// completion carrying an older generation is stale and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundTicket {
    /// Generation of the background this ticket resolves.
    pub generation: u64,
    /// The background to resolve.
    pub background: Background,
}
