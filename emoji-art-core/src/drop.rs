//! Drag-and-drop payload classification.
//!
//! A drop may carry several representations of the same item. The first
//! matching kind in the order URL, image bytes, text decides what happens.

use url::Url;

use crate::command::{EditCommand, UndoManager};
use crate::glyph;
use crate::{ArtResult, Background, EmojiArtDocument, EmojiId, ScreenPoint, ViewTransform};

/// One representation offered by a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPayload {
    /// A URL.
    Url(Url),
    /// Encoded image bytes.
    Image(Vec<u8>),
    /// Plain text.
    Text(String),
}

/// What a drop does to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropAction {
    /// Replace the background.
    SetBackground(Background),
    /// Add this emoji at the drop location.
    AddEmoji(String),
}

/// Result of applying a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing in the drop was usable.
    Ignored,
    /// The background was replaced.
    BackgroundSet,
    /// An emoji was added.
    EmojiAdded(EmojiId),
}

/// Extract the real image URL from an image-search result link.
///
/// Links carrying an `imgurl` query parameter point at the image through it;
/// anything else is returned unchanged.
#[must_use]
pub fn image_url(url: &Url) -> Url {
    url.query_pairs()
        .find(|(key, _)| key == "imgurl")
        .and_then(|(_, value)| Url::parse(&value).ok())
        .unwrap_or_else(|| url.clone())
}

/// Decide what a drop does, or `None` if nothing in it is usable.
#[must_use]
pub fn classify(payloads: &[DropPayload]) -> Option<DropAction> {
    if let Some(url) = payloads.iter().find_map(|p| match p {
        DropPayload::Url(url) => Some(url),
        _ => None,
    }) {
        return Some(DropAction::SetBackground(Background::Url(image_url(url))));
    }
    if let Some(bytes) = payloads.iter().find_map(|p| match p {
        DropPayload::Image(bytes) => Some(bytes),
        _ => None,
    }) {
        return Some(DropAction::SetBackground(Background::ImageData(
            bytes.clone(),
        )));
    }
    payloads.iter().find_map(|p| match p {
        DropPayload::Text(text) => {
            glyph::first_emoji(text).map(|emoji| DropAction::AddEmoji(emoji.to_string()))
        }
        _ => None,
    })
}

/// Emoji size for a drop: the default on-screen size divided by zoom, truncated,
/// never below 1.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // clamped into i32 range before the cast
pub fn drop_size(default_size: f64, zoom_scale: f64) -> i32 {
    let size = (default_size / crate::geometry::clamp_zoom(zoom_scale)).trunc();
    size.clamp(1.0, f64::from(i32::MAX)) as i32
}

impl EmojiArtDocument {
    /// Apply a drop at a screen location.
    ///
    /// # Errors
    ///
    /// Propagates document errors from the resulting command.
    pub fn apply_drop(
        &mut self,
        payloads: &[DropPayload],
        location: ScreenPoint,
        transform: &ViewTransform,
        default_size: f64,
        undo: Option<&mut (dyn UndoManager + '_)>,
    ) -> ArtResult<DropOutcome> {
        let Some(action) = classify(payloads) else {
            tracing::debug!("Ignoring drop with {} unusable payloads", payloads.len());
            return Ok(DropOutcome::Ignored);
        };
        match action {
            DropAction::SetBackground(background) => {
                self.perform(EditCommand::SetBackground { background }, undo)?;
                Ok(DropOutcome::BackgroundSet)
            }
            DropAction::AddEmoji(text) => {
                let command = EditCommand::AddEmoji {
                    text,
                    at: transform.to_emoji(location),
                    size: drop_size(default_size, transform.zoom_scale),
                };
                let id = self.perform(command, undo)?;
                Ok(id.map_or(DropOutcome::Ignored, DropOutcome::EmojiAdded))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EmojiPoint, UndoHistory, Vector};

    fn url(s: &str) -> Url {
        s.parse().expect("url")
    }

    #[test]
    fn test_url_wins_over_image_and_text() {
        let payloads = [
            DropPayload::Text("😀".into()),
            DropPayload::Image(vec![1, 2, 3]),
            DropPayload::Url(url("https://example.com/a.png")),
        ];
        assert_eq!(
            classify(&payloads),
            Some(DropAction::SetBackground(Background::Url(url(
                "https://example.com/a.png"
            ))))
        );
    }

    #[test]
    fn test_image_wins_over_text() {
        let payloads = [DropPayload::Text("😀".into()), DropPayload::Image(vec![7])];
        assert_eq!(
            classify(&payloads),
            Some(DropAction::SetBackground(Background::ImageData(vec![7])))
        );
    }

    #[test]
    fn test_text_uses_first_emoji_only() {
        let payloads = [DropPayload::Text("🐶🐱".into())];
        assert_eq!(classify(&payloads), Some(DropAction::AddEmoji("🐶".into())));

        let payloads = [DropPayload::Text("dog 🐶".into())];
        assert_eq!(classify(&payloads), None);
        assert_eq!(classify(&[]), None);
    }

    #[test]
    fn test_image_url_unwraps_search_links() {
        let link = url("https://www.google.com/imgres?imgurl=https%3A%2F%2Fcdn.example.com%2Fcat.jpg&imgrefurl=x");
        assert_eq!(image_url(&link).as_str(), "https://cdn.example.com/cat.jpg");

        let plain = url("https://cdn.example.com/dog.jpg?size=large");
        assert_eq!(image_url(&plain), plain);
    }

    #[test]
    fn test_drop_size_scales_with_zoom() {
        assert_eq!(drop_size(40.0, 1.0), 40);
        assert_eq!(drop_size(40.0, 3.0), 13);
        assert_eq!(drop_size(40.0, 1000.0), 1);
    }

    #[test]
    fn test_apply_drop_adds_emoji_in_emoji_space() {
        let mut doc = EmojiArtDocument::new();
        let mut history = UndoHistory::new();
        let transform = ViewTransform::new(ScreenPoint::new(400.0, 300.0), 2.0, Vector::new(20.0, 0.0));

        let outcome = doc
            .apply_drop(
                &[DropPayload::Text("🌵".into())],
                ScreenPoint::new(440.0, 250.0),
                &transform,
                40.0,
                Some(&mut history),
            )
            .expect("drop");

        let DropOutcome::EmojiAdded(id) = outcome else {
            panic!("Expected EmojiAdded, got {outcome:?}");
        };
        let emoji = doc.emoji(id).expect("emoji");
        assert_eq!(emoji.position(), EmojiPoint::new(10, -25));
        assert_eq!(emoji.size, 20);
        assert_eq!(history.undo_action_name(), Some("Add Emoji"));
    }

    #[test]
    fn test_apply_drop_sets_background() {
        let mut doc = EmojiArtDocument::new();
        let transform = ViewTransform::new(ScreenPoint::default(), 1.0, Vector::ZERO);
        let outcome = doc
            .apply_drop(
                &[DropPayload::Url(url("https://example.com/bg.png"))],
                ScreenPoint::default(),
                &transform,
                40.0,
                None,
            )
            .expect("drop");
        assert_eq!(outcome, DropOutcome::BackgroundSet);
        assert!(doc.fetch_status().is_fetching());
    }

    #[test]
    fn test_unusable_drop_is_ignored() {
        let mut doc = EmojiArtDocument::new();
        let transform = ViewTransform::new(ScreenPoint::default(), 1.0, Vector::ZERO);
        let outcome = doc
            .apply_drop(
                &[DropPayload::Text("plain text".into())],
                ScreenPoint::default(),
                &transform,
                40.0,
                None,
            )
            .expect("drop");
        assert_eq!(outcome, DropOutcome::Ignored);
        assert!(doc.is_empty());
    }
}
