//! # Emoji Art Loader
//!
//! Resolves document backgrounds into decoded images.
//!
//! The document itself never suspends: it hands out tickets, and a
//! [`BackgroundLoader`] fetches and decodes them on Tokio tasks and feeds
//! the results back to the document's owner.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use emoji_art_core::{Background, EditorConfig, EmojiArtDocument};
//! use emoji_art_loader::BackgroundLoader;
//!
//! let mut document = EmojiArtDocument::new();
//! let mut loader = BackgroundLoader::from_config(&EditorConfig::default())?;
//!
//! document.set_background(Background::Url("https://example.com/sky.png".parse()?));
//! loader.pump(&mut document);
//! loader.next_completion(&mut document).await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod decode;
pub mod error;
pub mod loader;
pub mod source;

pub use decode::{decode_data_url, decode_image, ImageFormat};
pub use error::{LoaderError, LoaderResult};
pub use loader::{BackgroundLoader, Completion, DEFAULT_FETCH_TIMEOUT};
pub use source::{HttpImageSource, ImageSource};
