//! Reversible edit commands and the injected undo capability.
//!
//! ## Usage
//!
//! ```text
//! 1. The caller builds an EditCommand and hands it to EmojiArtDocument::perform
//! 2. perform applies it and gets back the inverse command
//! 3. If an UndoManager was supplied, the inverse is registered under the
//!    same action name, so "Move Emoji" is undone by a "Move Emoji"
//! ```
//!
//! The document never owns an undo stack. [`UndoHistory`] is a linear stack
//! hosts can use when they do not bring their own.

use crate::{ArtResult, Background, EmojiArtDocument, Emoji, EmojiId, EmojiPoint};

/// A reversible document mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Add a new emoji on top.
    AddEmoji {
        /// The emoji grapheme.
        text: String,
        /// Emoji-space position.
        at: EmojiPoint,
        /// Point size.
        size: i32,
    },
    /// Remove an emoji.
    RemoveEmoji {
        /// The emoji to remove.
        id: EmojiId,
    },
    /// Put a removed emoji back at its z-order index.
    RestoreEmoji {
        /// The emoji as it was when removed.
        emoji: Emoji,
        /// Its former z-order index.
        index: usize,
    },
    /// Move an emoji by an emoji-space delta.
    MoveEmoji {
        /// The emoji to move.
        id: EmojiId,
        /// Horizontal delta.
        dx: i32,
        /// Vertical delta.
        dy: i32,
    },
    /// Scale an emoji's size.
    ResizeEmoji {
        /// The emoji to resize.
        id: EmojiId,
        /// Multiplier applied to the size.
        scale: f64,
    },
    /// Set an emoji's size to an exact value.
    SetEmojiSize {
        /// The emoji to resize.
        id: EmojiId,
        /// New size.
        size: i32,
    },
    /// Replace the background.
    SetBackground {
        /// The new background.
        background: Background,
    },
    /// Several commands applied as one action, all or nothing.
    Batch {
        /// Action name for the whole group.
        name: &'static str,
        /// Commands in application order.
        commands: Vec<EditCommand>,
    },
}

impl EditCommand {
    /// Human-readable action name, shared by a command and its inverse.
    #[must_use]
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::AddEmoji { .. } => "Add Emoji",
            Self::RemoveEmoji { .. } | Self::RestoreEmoji { .. } => "Remove Emoji",
            Self::MoveEmoji { .. } => "Move Emoji",
            Self::ResizeEmoji { .. } | Self::SetEmojiSize { .. } => "Resize Emoji",
            Self::SetBackground { .. } => "Set Background",
            Self::Batch { name, .. } => *name,
        }
    }

    /// The emoji this command targets, if any.
    #[must_use]
    pub fn emoji_id(&self) -> Option<EmojiId> {
        match self {
            Self::RemoveEmoji { id }
            | Self::MoveEmoji { id, .. }
            | Self::ResizeEmoji { id, .. }
            | Self::SetEmojiSize { id, .. } => Some(*id),
            Self::RestoreEmoji { emoji, .. } => Some(emoji.id),
            Self::AddEmoji { .. } | Self::SetBackground { .. } | Self::Batch { .. } => None,
        }
    }

    /// Apply this command and return the command that undoes it.
    ///
    /// # Errors
    ///
    /// Propagates the document error; the document is unchanged on failure.
    pub fn apply(self, document: &mut EmojiArtDocument) -> ArtResult<EditCommand> {
        let inverse = match self {
            Self::AddEmoji { text, at, size } => Self::RemoveEmoji {
                id: document.add_emoji(&text, at, size)?,
            },
            Self::RemoveEmoji { id } => {
                let (emoji, index) = document.remove_emoji(id)?;
                Self::RestoreEmoji { emoji, index }
            }
            Self::RestoreEmoji { emoji, index } => {
                let id = emoji.id;
                document.insert_emoji(emoji, index)?;
                Self::RemoveEmoji { id }
            }
            Self::MoveEmoji { id, dx, dy } => {
                // Negating i32::MIN would overflow; such a move cannot have succeeded anyway.
                let inverse = Self::MoveEmoji {
                    id,
                    dx: dx.checked_neg().ok_or_else(|| overflow(id))?,
                    dy: dy.checked_neg().ok_or_else(|| overflow(id))?,
                };
                document.move_emoji(id, dx, dy)?;
                inverse
            }
            Self::ResizeEmoji { id, scale } => Self::SetEmojiSize {
                id,
                size: document.resize_emoji(id, scale)?,
            },
            Self::SetEmojiSize { id, size } => Self::SetEmojiSize {
                id,
                size: document.set_emoji_size(id, size)?,
            },
            Self::SetBackground { background } => {
                let previous = document.background().clone();
                document.set_background(background);
                Self::SetBackground {
                    background: previous,
                }
            }
            Self::Batch { name, commands } => Self::Batch {
                name,
                commands: apply_all(commands, document)?,
            },
        };
        Ok(inverse)
    }
}

/// Apply commands in order, returning their inverses in undo order.
///
/// If one fails, the ones already applied are reverted before the error is returned.
fn apply_all(
    commands: Vec<EditCommand>,
    document: &mut EmojiArtDocument,
) -> ArtResult<Vec<EditCommand>> {
    let mut inverses = Vec::with_capacity(commands.len());
    for command in commands {
        match command.apply(document) {
            Ok(inverse) => inverses.push(inverse),
            Err(e) => {
                for inverse in inverses.into_iter().rev() {
                    if let Err(rollback) = inverse.apply(document) {
                        tracing::warn!("Failed to roll back partial edit: {rollback}");
                    }
                }
                return Err(e);
            }
        }
    }
    inverses.reverse();
    Ok(inverses)
}

fn overflow(id: EmojiId) -> crate::ArtError {
    crate::ArtError::InvalidOperation(format!("delta for emoji {id} cannot be inverted"))
}

/// A named command waiting on an undo or redo stack.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoAction {
    /// Action name shown to the user ("Undo Move Emoji").
    pub name: &'static str,
    /// The command that reverses the action.
    pub command: EditCommand,
}

/// An externally supplied undo capability.
///
/// Coalescing of consecutive same-named actions is left to the implementation.
pub trait UndoManager {
    /// Record the action that undoes a mutation just performed.
    fn register_undo(&mut self, action: UndoAction);
}

impl EmojiArtDocument {
    /// Apply a command, registering its inverse with `undo` when supplied.
    ///
    /// Returns the ID of the emoji the command affected (for `AddEmoji`, the
    /// newly assigned ID).
    ///
    /// # Errors
    ///
    /// Propagates the document error; nothing is registered on failure.
    pub fn perform(
        &mut self,
        command: EditCommand,
        undo: Option<&mut (dyn UndoManager + '_)>,
    ) -> ArtResult<Option<EmojiId>> {
        let name = command.action_name();
        let inverse = command.apply(self)?;
        let affected = inverse.emoji_id();
        if let Some(undo) = undo {
            undo.register_undo(UndoAction {
                name,
                command: inverse,
            });
        }
        Ok(affected)
    }
}

/// Linear undo/redo stack.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    undo_stack: Vec<UndoAction>,
    redo_stack: Vec<UndoAction>,
    max_depth: usize,
    coalesce_moves: bool,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoHistory {
    /// Default maximum history depth.
    pub const DEFAULT_DEPTH: usize = 100;

    /// Create an empty history with the default depth and no coalescing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: Self::DEFAULT_DEPTH,
            coalesce_moves: false,
        }
    }

    /// Set the maximum history depth (oldest actions dropped when exceeded).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Merge consecutive moves of the same emoji into one undo step.
    #[must_use]
    pub fn with_coalesced_moves(mut self, coalesce: bool) -> Self {
        self.coalesce_moves = coalesce;
        self
    }

    /// Whether undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Name of the action the next undo reverses.
    #[must_use]
    pub fn undo_action_name(&self) -> Option<&'static str> {
        self.undo_stack.last().map(|a| a.name)
    }

    /// Name of the action the next redo repeats.
    #[must_use]
    pub fn redo_action_name(&self) -> Option<&'static str> {
        self.redo_stack.last().map(|a| a.name)
    }

    /// Number of undoable actions.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Undo the most recent action. Returns its name, or `None` if there was nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns the document error if the inverse no longer applies; the
    /// action is dropped and the document is unchanged.
    pub fn undo(&mut self, document: &mut EmojiArtDocument) -> ArtResult<Option<&'static str>> {
        let Some(action) = self.undo_stack.pop() else {
            return Ok(None);
        };
        let inverse = action.command.apply(document)?;
        tracing::debug!("Undo {}", action.name);
        self.redo_stack.push(UndoAction {
            name: action.name,
            command: inverse,
        });
        Ok(Some(action.name))
    }

    /// Redo the most recently undone action. Returns its name, or `None` if there was nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns the document error if the command no longer applies.
    pub fn redo(&mut self, document: &mut EmojiArtDocument) -> ArtResult<Option<&'static str>> {
        let Some(action) = self.redo_stack.pop() else {
            return Ok(None);
        };
        let inverse = action.command.apply(document)?;
        tracing::debug!("Redo {}", action.name);
        self.push_undo(UndoAction {
            name: action.name,
            command: inverse,
        });
        Ok(Some(action.name))
    }

    fn push_undo(&mut self, action: UndoAction) {
        if self.coalesce_moves {
            if let Some(top) = self.undo_stack.last_mut() {
                if let Some(merged) = merge_moves(&top.command, &action.command) {
                    top.command = merged;
                    return;
                }
            }
        }
        self.undo_stack.push(action);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }
}

fn merge_moves(older: &EditCommand, newer: &EditCommand) -> Option<EditCommand> {
    match (older, newer) {
        (
            EditCommand::MoveEmoji { id, dx, dy },
            EditCommand::MoveEmoji {
                id: newer_id,
                dx: ndx,
                dy: ndy,
            },
        ) if id == newer_id => Some(EditCommand::MoveEmoji {
            id: *id,
            dx: dx.checked_add(*ndx)?,
            dy: dy.checked_add(*ndy)?,
        }),
        (
            EditCommand::Batch {
                name,
                commands: older,
            },
            EditCommand::Batch { commands: newer, .. },
        ) if older.len() == newer.len() => Some(EditCommand::Batch {
            name: *name,
            commands: older
                .iter()
                .zip(newer)
                .map(|(o, n)| merge_moves(o, n))
                .collect::<Option<Vec<_>>>()?,
        }),
        _ => None,
    }
}

impl UndoManager for UndoHistory {
    fn register_undo(&mut self, action: UndoAction) {
        self.push_undo(action);
        self.redo_stack.clear();
    }
}
