//! Selected emoji and group operations on them.

use crate::command::{EditCommand, UndoManager};
use crate::{ArtError, ArtResult, EmojiArtDocument, EmojiId, Vector, ViewTransform};

/// Set of selected emoji, in the order they were selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<EmojiId>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle an emoji. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: EmojiId) -> bool {
        if let Some(pos) = self.ids.iter().position(|&s| s == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    /// Add an emoji to the selection.
    pub fn select(&mut self, id: EmojiId) {
        if !self.contains(id) {
            self.ids.push(id);
        }
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Check if an emoji is selected.
    #[must_use]
    pub fn contains(&self, id: EmojiId) -> bool {
        self.ids.contains(&id)
    }

    /// Selected IDs.
    #[must_use]
    pub fn ids(&self) -> &[EmojiId] {
        &self.ids
    }

    /// Number of selected emoji.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Forget emoji that no longer exist in `document`.
    pub fn retain_existing(&mut self, document: &EmojiArtDocument) {
        self.ids.retain(|&id| document.emoji(id).is_some());
    }

    fn check_present(&self, document: &EmojiArtDocument) -> ArtResult<()> {
        match self.ids.iter().find(|&&id| document.emoji(id).is_none()) {
            Some(&missing) => Err(ArtError::NotFound(missing)),
            None => Ok(()),
        }
    }

    /// Apply one command per selected emoji as a single undoable action.
    fn perform_group(
        &self,
        document: &mut EmojiArtDocument,
        name: &'static str,
        command: impl Fn(EmojiId) -> EditCommand,
        undo: Option<&mut (dyn UndoManager + '_)>,
    ) -> ArtResult<usize> {
        let commands = self.ids.iter().map(|&id| command(id)).collect();
        document.perform(EditCommand::Batch { name, commands }, undo)?;
        Ok(self.ids.len())
    }

    /// Move every selected emoji by a screen-space drag translation.
    ///
    /// The translation is converted to emoji space once, so all emoji move by
    /// the same integer delta. The whole group is one undo step. Returns the
    /// number of emoji moved.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NotFound`] if a selected emoji is missing from the
    /// document, or [`ArtError::InvalidOperation`] if any emoji would move
    /// out of range. Nothing moves in either case.
    pub fn move_by(
        &self,
        document: &mut EmojiArtDocument,
        translation: Vector,
        transform: &ViewTransform,
        undo: Option<&mut (dyn UndoManager + '_)>,
    ) -> ArtResult<usize> {
        self.check_present(document)?;
        let (dx, dy) = transform.to_emoji_delta(translation);
        if (dx, dy) == (0, 0) || self.ids.is_empty() {
            return Ok(0);
        }
        for emoji in self.ids.iter().filter_map(|&id| document.emoji(id)) {
            if emoji.x.checked_add(dx).is_none() || emoji.y.checked_add(dy).is_none() {
                return Err(ArtError::InvalidOperation(format!(
                    "moving emoji {} by ({dx}, {dy}) overflows",
                    emoji.id
                )));
            }
        }
        self.perform_group(
            document,
            "Move Emoji",
            |id| EditCommand::MoveEmoji { id, dx, dy },
            undo,
        )
    }

    /// Scale every selected emoji as one undo step. Returns the number resized.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NotFound`] before resizing anything if a selected
    /// emoji is missing, or [`ArtError::InvalidOperation`] for a bad scale.
    pub fn resize_by(
        &self,
        document: &mut EmojiArtDocument,
        scale: f64,
        undo: Option<&mut (dyn UndoManager + '_)>,
    ) -> ArtResult<usize> {
        self.check_present(document)?;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ArtError::InvalidOperation(format!(
                "invalid scale factor {scale}"
            )));
        }
        if self.ids.is_empty() {
            return Ok(0);
        }
        self.perform_group(
            document,
            "Resize Emoji",
            |id| EditCommand::ResizeEmoji { id, scale },
            undo,
        )
    }

    /// Remove every selected emoji as one undo step and clear the selection.
    /// Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NotFound`] before removing anything if a selected
    /// emoji is missing.
    pub fn remove_from(
        &mut self,
        document: &mut EmojiArtDocument,
        undo: Option<&mut (dyn UndoManager + '_)>,
    ) -> ArtResult<usize> {
        self.check_present(document)?;
        if self.ids.is_empty() {
            return Ok(0);
        }
        let removed =
            self.perform_group(document, "Remove Emoji", |id| EditCommand::RemoveEmoji { id }, undo)?;
        self.ids.clear();
        Ok(removed)
    }
}
