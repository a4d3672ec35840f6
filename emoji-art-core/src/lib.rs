//! # Emoji Art Core
//!
//! Document model for emoji art: emoji placed on an integer canvas over an
//! optional background image.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               emoji-art-core                │
//! ├─────────────────────────────────────────────┤
//! │  Document          │  Geometry              │
//! │  - Emoji, z-order  │  - Emoji <-> screen    │
//! │  - Background      │  - Pan/zoom gestures   │
//! │  - Notifications   │  - Zoom to fit         │
//! ├─────────────────────────────────────────────┤
//! │  Commands          │  Palettes              │
//! │  - Inverse edits   │  - Named emoji sets    │
//! │  - Undo history    │  - Per-store files     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Background images are resolved outside this crate; the document only hands
//! out [`BackgroundTicket`]s and accepts their completions.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod background;
pub mod command;
pub mod config;
pub mod document;
pub mod drop;
pub mod emoji;
pub mod error;
pub mod geometry;
pub mod glyph;
pub mod palette;
pub mod schema;
pub mod selection;

pub use background::{Background, BackgroundFetchStatus, BackgroundImage, BackgroundTicket};
pub use command::{EditCommand, UndoAction, UndoHistory, UndoManager};
pub use config::EditorConfig;
pub use document::{DocumentChange, EmojiArtDocument, SubscriptionId};
pub use drop::{DropAction, DropOutcome, DropPayload};
pub use emoji::{Emoji, EmojiId};
pub use error::{ArtError, ArtResult, FetchError};
pub use geometry::{EmojiPoint, ScreenPoint, Vector, ViewTransform, Viewport};
pub use palette::{Palette, PaletteId, PaletteStore};
pub use schema::DocumentRecord;
pub use selection::Selection;

/// Emoji art core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
