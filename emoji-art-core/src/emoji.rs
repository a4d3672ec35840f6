//! Placed emoji - the building blocks of a document.

use serde::{Deserialize, Serialize};

use crate::glyph;
use crate::{ArtError, ArtResult, EmojiPoint};

/// Identifier of an emoji, unique for the lifetime of its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmojiId(u64);

impl EmojiId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EmojiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// An emoji placed on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Emoji {
    /// Unique identifier.
    pub id: EmojiId,
    /// A single emoji grapheme.
    pub text: String,
    /// Horizontal position in emoji space.
    pub x: i32,
    /// Vertical position in emoji space.
    pub y: i32,
    /// Point size, independent of zoom.
    pub size: i32,
}

impl Emoji {
    /// Create an emoji after checking that `text` is a single emoji grapheme.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidEmoji`] if `text` is not exactly one emoji.
    pub fn new(id: EmojiId, text: &str, at: EmojiPoint, size: i32) -> ArtResult<Self> {
        if !glyph::is_emoji(text) {
            return Err(ArtError::InvalidEmoji(text.to_string()));
        }
        Ok(Self {
            id,
            text: text.to_string(),
            x: at.x,
            y: at.y,
            size,
        })
    }

    /// Position in emoji space.
    #[must_use]
    pub const fn position(&self) -> EmojiPoint {
        EmojiPoint::new(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_text() {
        let emoji = Emoji::new(EmojiId::from_raw(1), "🐸", EmojiPoint::new(3, 4), 40)
            .expect("valid emoji");
        assert_eq!(emoji.position(), EmojiPoint::new(3, 4));

        let result = Emoji::new(EmojiId::from_raw(2), "frog", EmojiPoint::ORIGIN, 40);
        assert!(matches!(result, Err(ArtError::InvalidEmoji(_))));
    }

    #[test]
    fn test_id_serializes_as_number() {
        let json = serde_json::to_string(&EmojiId::from_raw(7)).expect("serialize");
        assert_eq!(json, "7");
    }
}
