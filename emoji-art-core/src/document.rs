//! The emoji art document: background plus an ordered set of placed emoji.

use std::path::Path;

use crate::schema::DocumentRecord;
use crate::{
    ArtError, ArtResult, Background, BackgroundFetchStatus, BackgroundImage, BackgroundTicket,
    Emoji, EmojiId, EmojiPoint, FetchError,
};

/// A change observed by document subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentChange {
    /// An emoji was appended or restored.
    EmojiAdded(EmojiId),
    /// An emoji moved.
    EmojiMoved(EmojiId),
    /// An emoji changed size.
    EmojiResized(EmojiId),
    /// An emoji was removed.
    EmojiRemoved(EmojiId),
    /// The background reference was replaced.
    BackgroundChanged,
    /// The resolved background image was replaced or cleared.
    BackgroundImageChanged,
    /// The background fetch status changed.
    FetchStatusChanged(BackgroundFetchStatus),
}

/// Handle returned by [`EmojiArtDocument::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn Fn(&DocumentChange) + Send + Sync>;

/// An emoji art document.
///
/// All mutation goes through the methods below; each one validates before
/// touching state, so a failed call leaves the document unchanged.
pub struct EmojiArtDocument {
    background: Background,
    emojis: Vec<Emoji>,
    next_id: u64,
    generation: u64,
    status: BackgroundFetchStatus,
    image: Option<BackgroundImage>,
    pending_fetch: Option<BackgroundTicket>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl Default for EmojiArtDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EmojiArtDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmojiArtDocument")
            .field("background", &self.background)
            .field("emojis", &self.emojis)
            .field("next_id", &self.next_id)
            .field("generation", &self.generation)
            .field("status", &self.status)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl EmojiArtDocument {
    /// Create an empty document with no background.
    #[must_use]
    pub fn new() -> Self {
        Self {
            background: Background::None,
            emojis: Vec::new(),
            next_id: 1,
            generation: 0,
            status: BackgroundFetchStatus::Idle,
            image: None,
            pending_fetch: None,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Rebuild a document from persisted parts.
    ///
    /// Fetch status is never persisted: the document starts idle with the
    /// background queued for resolution.
    pub(crate) fn from_parts(background: Background, emojis: Vec<Emoji>, next_id: u64) -> Self {
        let mut document = Self::new();
        document.emojis = emojis;
        document.next_id = next_id.max(1);
        if background.needs_resolution() {
            document.generation = 1;
            document.pending_fetch = Some(BackgroundTicket {
                generation: 1,
                background: background.clone(),
            });
        }
        document.background = background;
        document
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Placed emoji in z-order (last is drawn on top).
    #[must_use]
    pub fn emojis(&self) -> &[Emoji] {
        &self.emojis
    }

    /// Get an emoji by ID.
    #[must_use]
    pub fn emoji(&self, id: EmojiId) -> Option<&Emoji> {
        self.emojis.iter().find(|e| e.id == id)
    }

    /// Z-order index of an emoji.
    #[must_use]
    pub fn index_of(&self, id: EmojiId) -> Option<usize> {
        self.emojis.iter().position(|e| e.id == id)
    }

    /// Number of placed emoji.
    #[must_use]
    pub fn emoji_count(&self) -> usize {
        self.emojis.len()
    }

    /// Check if the document has no emoji.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emojis.is_empty()
    }

    /// The current background reference.
    #[must_use]
    pub fn background(&self) -> &Background {
        &self.background
    }

    /// The resolved background image, if loaded.
    #[must_use]
    pub fn background_image(&self) -> Option<&BackgroundImage> {
        self.image.as_ref()
    }

    /// Current background fetch status.
    #[must_use]
    pub fn fetch_status(&self) -> &BackgroundFetchStatus {
        &self.status
    }

    /// Generation of the current background.
    #[must_use]
    pub fn background_generation(&self) -> u64 {
        self.generation
    }

    /// The identifier the next added emoji will receive.
    #[must_use]
    pub fn next_id(&self) -> EmojiId {
        EmojiId::from_raw(self.next_id)
    }

    // -----------------------------------------------------------------------
    // Emoji mutation
    // -----------------------------------------------------------------------

    /// Add an emoji on top of all others.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidEmoji`] if `text` is not a single emoji, or
    /// [`ArtError::InvalidOperation`] if no identifiers are left.
    pub fn add_emoji(&mut self, text: &str, at: EmojiPoint, size: i32) -> ArtResult<EmojiId> {
        let id = EmojiId::from_raw(self.next_id);
        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| ArtError::InvalidOperation("emoji identifiers exhausted".into()))?;
        let emoji = Emoji::new(id, text, at, size)?;
        self.next_id = next_id;
        tracing::debug!("Added emoji {id} {text} at ({}, {}) size {size}", at.x, at.y);
        self.emojis.push(emoji);
        self.notify(&DocumentChange::EmojiAdded(id));
        Ok(id)
    }

    /// Put a previously removed emoji back at a z-order index.
    ///
    /// The index is clamped to the end of the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidEmoji`] if the text is not an emoji, or
    /// [`ArtError::InvalidOperation`] if the ID is already in use or is the
    /// largest representable ID.
    pub fn insert_emoji(&mut self, emoji: Emoji, index: usize) -> ArtResult<()> {
        if !crate::glyph::is_emoji(&emoji.text) {
            return Err(ArtError::InvalidEmoji(emoji.text));
        }
        if self.emoji(emoji.id).is_some() {
            return Err(ArtError::InvalidOperation(format!(
                "emoji {} already exists",
                emoji.id
            )));
        }
        let id = emoji.id;
        let after = id.get().checked_add(1).ok_or_else(|| {
            ArtError::InvalidOperation(format!("emoji id {id} is out of range"))
        })?;
        self.next_id = self.next_id.max(after);
        let index = index.min(self.emojis.len());
        self.emojis.insert(index, emoji);
        tracing::debug!("Restored emoji {id} at index {index}");
        self.notify(&DocumentChange::EmojiAdded(id));
        Ok(())
    }

    /// Move an emoji by an emoji-space delta.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NotFound`] if the emoji does not exist, or
    /// [`ArtError::InvalidOperation`] if the move would overflow.
    pub fn move_emoji(&mut self, id: EmojiId, dx: i32, dy: i32) -> ArtResult<()> {
        let emoji = self.emoji_mut(id)?;
        let (Some(x), Some(y)) = (emoji.x.checked_add(dx), emoji.y.checked_add(dy)) else {
            return Err(ArtError::InvalidOperation(format!(
                "moving emoji {id} by ({dx}, {dy}) overflows"
            )));
        };
        emoji.x = x;
        emoji.y = y;
        tracing::debug!("Moved emoji {id} to ({x}, {y})");
        self.notify(&DocumentChange::EmojiMoved(id));
        Ok(())
    }

    /// Scale an emoji's size, rounding to the nearest integer.
    ///
    /// Returns the previous size.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NotFound`] if the emoji does not exist, or
    /// [`ArtError::InvalidOperation`] if `scale` is not a positive finite number.
    pub fn resize_emoji(&mut self, id: EmojiId, scale: f64) -> ArtResult<i32> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ArtError::InvalidOperation(format!(
                "invalid scale factor {scale}"
            )));
        }
        let current = self.emoji(id).ok_or(ArtError::NotFound(id))?.size;
        let scaled = (f64::from(current) * scale).round();
        if scaled > f64::from(i32::MAX) || scaled < f64::from(i32::MIN) {
            return Err(ArtError::InvalidOperation(format!(
                "resizing emoji {id} by {scale} overflows"
            )));
        }
        // Range checked above; the value is already integral.
        #[allow(clippy::cast_possible_truncation)]
        let size = scaled as i32;
        self.set_emoji_size(id, size)
    }

    /// Set an emoji's size. Returns the previous size.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NotFound`] if the emoji does not exist.
    pub fn set_emoji_size(&mut self, id: EmojiId, size: i32) -> ArtResult<i32> {
        let emoji = self.emoji_mut(id)?;
        let previous = std::mem::replace(&mut emoji.size, size);
        tracing::debug!("Resized emoji {id} from {previous} to {size}");
        self.notify(&DocumentChange::EmojiResized(id));
        Ok(previous)
    }

    /// Remove an emoji. Returns it together with its former z-order index.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::NotFound`] if the emoji does not exist.
    pub fn remove_emoji(&mut self, id: EmojiId) -> ArtResult<(Emoji, usize)> {
        let index = self.index_of(id).ok_or(ArtError::NotFound(id))?;
        let emoji = self.emojis.remove(index);
        tracing::debug!("Removed emoji {id}");
        self.notify(&DocumentChange::EmojiRemoved(id));
        Ok((emoji, index))
    }

    fn emoji_mut(&mut self, id: EmojiId) -> ArtResult<&mut Emoji> {
        self.emojis
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(ArtError::NotFound(id))
    }

    // -----------------------------------------------------------------------
    // Background
    // -----------------------------------------------------------------------

    /// Replace the background.
    ///
    /// The previous image is discarded and any in-flight resolution becomes
    /// stale. Returns the ticket a loader must resolve, or `None` when the
    /// background was cleared. The ticket is also queued for
    /// [`take_pending_fetch`](Self::take_pending_fetch).
    pub fn set_background(&mut self, background: Background) -> Option<BackgroundTicket> {
        self.generation += 1;
        tracing::info!(
            "Background set to {background:?} (generation {})",
            self.generation
        );
        let had_image = self.image.take().is_some();
        self.background = background;
        self.notify(&DocumentChange::BackgroundChanged);
        if had_image {
            self.notify(&DocumentChange::BackgroundImageChanged);
        }

        if self.background.needs_resolution() {
            let ticket = BackgroundTicket {
                generation: self.generation,
                background: self.background.clone(),
            };
            self.pending_fetch = Some(ticket.clone());
            self.set_status(BackgroundFetchStatus::Fetching);
            Some(ticket)
        } else {
            self.pending_fetch = None;
            self.set_status(BackgroundFetchStatus::Idle);
            None
        }
    }

    /// Hand the queued background resolution to a loader.
    ///
    /// Marks the document as fetching.
    pub fn take_pending_fetch(&mut self) -> Option<BackgroundTicket> {
        let ticket = self.pending_fetch.take()?;
        self.set_status(BackgroundFetchStatus::Fetching);
        Some(ticket)
    }

    /// Close out `ticket` without an image, returning the status to idle.
    ///
    /// Used when a ticket turns out to have nothing to resolve. Returns
    /// `false` (and changes nothing) if the ticket is stale.
    pub fn settle_background(&mut self, ticket: &BackgroundTicket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        if self
            .pending_fetch
            .as_ref()
            .is_some_and(|pending| pending.generation == ticket.generation)
        {
            self.pending_fetch = None;
        }
        self.set_status(BackgroundFetchStatus::Idle);
        true
    }

    /// Apply the outcome of resolving `ticket`.
    ///
    /// Returns `false` (and changes nothing) if the ticket is stale because the
    /// background has been replaced since it was issued.
    pub fn complete_background(
        &mut self,
        ticket: &BackgroundTicket,
        result: Result<BackgroundImage, FetchError>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding stale background resolution (generation {} != {})",
                ticket.generation,
                self.generation
            );
            return false;
        }
        if self
            .pending_fetch
            .as_ref()
            .is_some_and(|pending| pending.generation == ticket.generation)
        {
            self.pending_fetch = None;
        }

        match result {
            Ok(image) => {
                tracing::info!("Background resolved: {}x{}", image.width, image.height);
                self.image = Some(image);
                self.notify(&DocumentChange::BackgroundImageChanged);
                self.set_status(BackgroundFetchStatus::Idle);
            }
            Err(error) => {
                tracing::warn!("Background resolution failed: {error}");
                self.set_status(BackgroundFetchStatus::Failed {
                    url: ticket.background.url().cloned(),
                    error,
                });
            }
        }
        true
    }

    fn set_status(&mut self, status: BackgroundFetchStatus) {
        if self.status != status {
            self.status = status;
            self.notify(&DocumentChange::FetchStatusChanged(self.status.clone()));
        }
    }

    // -----------------------------------------------------------------------
    // Change notification
    // -----------------------------------------------------------------------

    /// Register a callback invoked after every change.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&DocumentChange) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&self, change: &DocumentChange) {
        for (_, observer) in &self.observers {
            observer(change);
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Snapshot the persistent part of the document.
    #[must_use]
    pub fn to_record(&self) -> DocumentRecord {
        DocumentRecord::from_document(self)
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ArtResult<String> {
        serde_json::to_string_pretty(&self.to_record()).map_err(ArtError::Serialization)
    }

    /// Deserialize a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or describes an invalid document.
    pub fn from_json(json: &str) -> ArtResult<Self> {
        let record: DocumentRecord = serde_json::from_str(json)?;
        record.into_document()
    }

    /// Write the document to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> ArtResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        tracing::debug!("Saved document to {}", path.display());
        Ok(())
    }

    /// Read a document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> ArtResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
