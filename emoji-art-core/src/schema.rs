//! Canonical serialized representation of a document.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ArtError, ArtResult, Background, Emoji, EmojiArtDocument, EmojiId, EmojiPoint};

/// Serialized background: `{"kind": "none" | "url" | "imageData", "value": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum BackgroundRecord {
    /// No background.
    None,
    /// Image URL.
    Url(Url),
    /// Base64-encoded image bytes.
    ImageData(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl From<&Background> for BackgroundRecord {
    fn from(background: &Background) -> Self {
        match background {
            Background::None => Self::None,
            Background::Url(url) => Self::Url(url.clone()),
            Background::ImageData(bytes) => Self::ImageData(bytes.clone()),
        }
    }
}

impl From<BackgroundRecord> for Background {
    fn from(record: BackgroundRecord) -> Self {
        match record {
            BackgroundRecord::None => Self::None,
            BackgroundRecord::Url(url) => Self::Url(url),
            BackgroundRecord::ImageData(bytes) => Self::ImageData(bytes),
        }
    }
}

/// Serialized emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiRecord {
    /// Emoji identifier.
    pub id: u64,
    /// The emoji grapheme.
    pub text: String,
    /// Horizontal position in emoji space.
    pub x: i32,
    /// Vertical position in emoji space.
    pub y: i32,
    /// Point size.
    pub size: i32,
}

impl From<&Emoji> for EmojiRecord {
    fn from(emoji: &Emoji) -> Self {
        Self {
            id: emoji.id.get(),
            text: emoji.text.clone(),
            x: emoji.x,
            y: emoji.y,
            size: emoji.size,
        }
    }
}

impl EmojiRecord {
    /// Convert to a runtime emoji, validating the text.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidEmoji`] if the text is not a single emoji.
    pub fn into_emoji(self) -> ArtResult<Emoji> {
        Emoji::new(
            EmojiId::from_raw(self.id),
            &self.text,
            EmojiPoint::new(self.x, self.y),
            self.size,
        )
    }
}

/// Canonical document record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Background reference.
    #[serde(default = "DocumentRecord::default_background")]
    pub background: BackgroundRecord,
    /// Emoji in z-order.
    #[serde(default)]
    pub emojis: Vec<EmojiRecord>,
    /// Next identifier to assign; older files may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<u64>,
}

impl DocumentRecord {
    const fn default_background() -> BackgroundRecord {
        BackgroundRecord::None
    }

    /// Build a record from a runtime document.
    #[must_use]
    pub fn from_document(document: &EmojiArtDocument) -> Self {
        Self {
            background: BackgroundRecord::from(document.background()),
            emojis: document.emojis().iter().map(EmojiRecord::from).collect(),
            next_id: Some(document.next_id().get()),
        }
    }

    /// Materialize a runtime document.
    ///
    /// # Errors
    ///
    /// Returns an error if any emoji is invalid, two emoji share an ID, or
    /// the IDs leave no room for another emoji.
    pub fn into_document(self) -> ArtResult<EmojiArtDocument> {
        let mut seen = HashSet::new();
        let mut emojis = Vec::with_capacity(self.emojis.len());
        for record in self.emojis {
            let emoji = record.into_emoji()?;
            if !seen.insert(emoji.id) {
                return Err(ArtError::InvalidOperation(format!(
                    "duplicate emoji id {}",
                    emoji.id
                )));
            }
            emojis.push(emoji);
        }
        let mut next_id = self.next_id.unwrap_or(1);
        for emoji in &emojis {
            let after = emoji.id.get().checked_add(1).ok_or_else(|| {
                ArtError::InvalidOperation(format!("emoji id {} is out of range", emoji.id))
            })?;
            next_id = next_id.max(after);
        }
        if next_id == u64::MAX {
            return Err(ArtError::InvalidOperation(
                "nextId leaves no emoji identifiers".into(),
            ));
        }
        Ok(EmojiArtDocument::from_parts(
            self.background.into(),
            emojis,
            next_id,
        ))
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}
