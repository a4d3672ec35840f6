//! Named palettes of emoji offered for placement.
//!
//! A [`PaletteStore`] is addressed purely by its name and persists separately
//! from any document. It always holds at least one palette.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::glyph;
use crate::{ArtError, ArtResult};

/// Default palette store name.
pub const DEFAULT_STORE: &str = "Default";

const DEFAULT_PALETTES: &[(&str, &str)] = &[
    ("Vehicles", "🚙🚗🚘🚕🚖🏎🚚🛻🚛🚐🚓🚔🚑🚒🚀✈️🛫🛬🛩🚁🛸🚲🏍🛶⛵️🚤🛥🛳⛴🚢🚂🚝🚅🚆🚊🚉🚇🛺🚜"),
    ("Sports", "🏈⚾️🏀⚽️🎾🏐🥏🏓⛳️🥅🥌🏂⛷🎳"),
    ("Music", "🎼🎤🎹🪘🥁🎺🪗🪕🎻"),
    ("Animals", "🐥🐣🐂🐄🐎🐖🐏🐑🦙🐐🐓🐁🐀🐒🦆🦅🦉🦇🐢🐍🦎🦖🦕🐅🐆🦓🦍🦧🦣🐘🦛🦏🐪🐫🦒🦘🦬🐃🦌🐕🐩🦮🐈🦤🦢🦩🕊🦝🦨🦡🦫🦦🦥🐿🦔"),
    ("Animal Faces", "🐵🙈🙊🙉🐶🐱🐭🐹🐰🦊🐻🐼🐻‍❄️🐨🐯🦁🐮🐷🐸🐲"),
    ("Flora", "🌲🌴🌿☘️🍀🍁🍄🌾💐🌷🌹🥀🌺🌸🌼🌻"),
    ("Weather", "☀️🌤⛅️🌥☁️🌦🌧⛈🌩🌨❄️💨☔️💧💦🌊☂️🌫🌪"),
    ("Faces", "😀😃😄😁😆😅😂🤣🥲☺️😊😇🙂🙃😉😌😍🥰😘😗😙😚😋😛😝😜🤪🤨🧐🤓😎🥸🤩🥳😏😞😔😟😕🙁☹️😣😖😫😩🥺😢😭😤😠😡🤯😳🥶😥😓🤗🤔🤭🤫🤥😬🙄😯😧🥱😴🤮😷🤧🤒🤠"),
];

/// Identifier of a palette, unique within its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaletteId(u64);

impl PaletteId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for PaletteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// A named list of emoji.
///
/// `emojis` only ever contains emoji graphemes but may contain repeats; use
/// [`Palette::display_emojis`] for the de-duplicated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Identifier.
    pub id: PaletteId,
    /// Display name.
    pub name: String,
    /// Emoji graphemes, concatenated.
    pub emojis: String,
}

impl Palette {
    /// Emoji in display order with repeats removed.
    #[must_use]
    pub fn display_emojis(&self) -> Vec<&str> {
        glyph::unique_graphemes(&self.emojis)
    }
}

/// On-disk form of a palette store.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PaletteStoreDocument {
    name: String,
    palettes: Vec<Palette>,
    #[serde(default)]
    current: usize,
    #[serde(default)]
    next_id: u64,
}

/// Ordered collection of palettes with a current selection.
#[derive(Debug, Clone)]
pub struct PaletteStore {
    name: String,
    palettes: Vec<Palette>,
    current: usize,
    next_id: u64,
    /// Optional data directory for filesystem persistence.
    data_dir: Option<PathBuf>,
}

impl PaletteStore {
    /// Create a store seeded with the default palettes (no persistence).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut store = Self {
            name: name.into(),
            palettes: Vec::new(),
            current: 0,
            next_id: 0,
            data_dir: None,
        };
        store.seed_defaults();
        store
    }

    /// Open the store named `name` in `data_dir`, seeding defaults if none is saved.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Io`] if the directory cannot be created or the file
    /// cannot be read, [`ArtError::Serialization`] if it cannot be parsed, and
    /// [`ArtError::InvalidOperation`] if its palette IDs are exhausted.
    pub fn open(name: impl Into<String>, data_dir: impl Into<PathBuf>) -> ArtResult<Self> {
        let name = name.into();
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        let path = store_path(&data_dir, &name);

        let mut store = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let doc: PaletteStoreDocument = serde_json::from_str(&contents)?;
            tracing::debug!(
                "Loaded palette store {name} with {} palettes",
                doc.palettes.len()
            );
            Self::from_document(name, doc)?
        } else {
            tracing::info!("Creating palette store {name} with default palettes");
            Self::new(name)
        };
        store.data_dir = Some(data_dir);
        store.persist();
        Ok(store)
    }

    fn from_document(name: String, doc: PaletteStoreDocument) -> ArtResult<Self> {
        let mut next_id = doc.next_id;
        for palette in &doc.palettes {
            let after = palette.id.0.checked_add(1).ok_or_else(|| {
                ArtError::InvalidOperation(format!("palette id {} is out of range", palette.id))
            })?;
            next_id = next_id.max(after);
        }
        if next_id == u64::MAX {
            return Err(ArtError::InvalidOperation(
                "palette identifiers exhausted".into(),
            ));
        }
        let mut store = Self {
            name,
            palettes: doc.palettes,
            current: doc.current,
            next_id,
            data_dir: None,
        };
        for palette in &mut store.palettes {
            palette.emojis = glyph::filter_emojis(&palette.emojis);
        }
        if store.palettes.is_empty() {
            store.seed_defaults();
        }
        store.clamp_current();
        Ok(store)
    }

    /// Replace an empty palette list with the defaults, numbered from zero.
    fn seed_defaults(&mut self) {
        self.palettes = DEFAULT_PALETTES
            .iter()
            .zip(0..)
            .map(|((name, emojis), id)| Palette {
                id: PaletteId(id),
                name: (*name).to_string(),
                emojis: glyph::filter_emojis(emojis),
            })
            .collect();
        self.next_id = self.next_id.max(self.palettes.len() as u64);
    }

    fn allocate_id(&mut self) -> ArtResult<PaletteId> {
        let id = PaletteId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| ArtError::InvalidOperation("palette identifiers exhausted".into()))?;
        Ok(id)
    }

    fn clamp_current(&mut self) {
        self.current = self.current.min(self.palettes.len().saturating_sub(1));
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Store name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All palettes in order.
    #[must_use]
    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    /// Number of palettes (never zero).
    #[must_use]
    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    /// Always `false`: a store keeps at least one palette.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    /// Get a palette by ID.
    #[must_use]
    pub fn palette(&self, id: PaletteId) -> Option<&Palette> {
        self.palettes.iter().find(|p| p.id == id)
    }

    /// De-duplicated emoji of a palette, in display order.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::PaletteNotFound`] if the palette does not exist.
    pub fn display_emojis(&self, id: PaletteId) -> ArtResult<Vec<&str>> {
        self.palette(id)
            .map(Palette::display_emojis)
            .ok_or(ArtError::PaletteNotFound(id))
    }

    /// Palette at `index`, clamped into range.
    #[must_use]
    pub fn palette_at(&self, index: usize) -> &Palette {
        &self.palettes[index.min(self.palettes.len() - 1)]
    }

    /// The currently chosen palette.
    #[must_use]
    pub fn current(&self) -> &Palette {
        self.palette_at(self.current)
    }

    /// Index of the currently chosen palette.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Choose the palette at `index` (clamped into range).
    pub fn set_current(&mut self, index: usize) {
        self.current = index;
        self.clamp_current();
        self.persist();
    }

    /// Choose the next palette, wrapping around.
    pub fn select_next(&mut self) -> &Palette {
        self.current = (self.current + 1) % self.palettes.len();
        self.persist();
        self.current()
    }

    /// Choose the previous palette, wrapping around.
    pub fn select_previous(&mut self) -> &Palette {
        let len = self.palettes.len();
        self.current = (self.current + len - 1) % len;
        self.persist();
        self.current()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Append a palette. Non-emoji characters in `emojis` are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidOperation`] if no palette IDs are left.
    pub fn add(&mut self, name: &str, emojis: &str) -> ArtResult<PaletteId> {
        self.insert(self.palettes.len(), name, emojis)
    }

    /// Insert a palette at `index` (clamped). Non-emoji characters are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidOperation`] if no palette IDs are left; the
    /// store is unchanged.
    pub fn insert(&mut self, index: usize, name: &str, emojis: &str) -> ArtResult<PaletteId> {
        let id = self.allocate_id()?;
        let index = index.min(self.palettes.len());
        self.palettes.insert(
            index,
            Palette {
                id,
                name: name.to_string(),
                emojis: glyph::filter_emojis(emojis),
            },
        );
        if index <= self.current && self.palettes.len() > 1 {
            self.current += 1;
        }
        tracing::debug!("Inserted palette {id} {name:?} at {index}");
        self.persist();
        Ok(id)
    }

    /// Remove a palette.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::PaletteNotFound`] if the palette does not exist and
    /// [`ArtError::LastPalette`] if it is the only one left. The store is
    /// unchanged in both cases.
    pub fn remove(&mut self, id: PaletteId) -> ArtResult<Palette> {
        let index = self
            .palettes
            .iter()
            .position(|p| p.id == id)
            .ok_or(ArtError::PaletteNotFound(id))?;
        if self.palettes.len() == 1 {
            return Err(ArtError::LastPalette);
        }
        let removed = self.palettes.remove(index);
        if index < self.current {
            self.current -= 1;
        }
        self.clamp_current();
        tracing::debug!("Removed palette {id} {:?}", removed.name);
        self.persist();
        Ok(removed)
    }

    /// Rename a palette.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::PaletteNotFound`] if the palette does not exist.
    pub fn rename(&mut self, id: PaletteId, name: &str) -> ArtResult<()> {
        self.palette_mut(id)?.name = name.to_string();
        self.persist();
        Ok(())
    }

    /// Replace a palette's emoji. Non-emoji characters are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::PaletteNotFound`] if the palette does not exist.
    pub fn replace_emojis(&mut self, id: PaletteId, emojis: &str) -> ArtResult<()> {
        self.palette_mut(id)?.emojis = glyph::filter_emojis(emojis);
        self.persist();
        Ok(())
    }

    /// Put new emoji in front of a palette's existing ones. Non-emoji characters are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::PaletteNotFound`] if the palette does not exist.
    pub fn add_emojis(&mut self, id: PaletteId, emojis: &str) -> ArtResult<()> {
        let palette = self.palette_mut(id)?;
        palette.emojis = glyph::filter_emojis(&format!("{emojis}{}", palette.emojis));
        self.persist();
        Ok(())
    }

    /// Remove every occurrence of `emoji` from a palette.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::PaletteNotFound`] if the palette does not exist.
    pub fn remove_emoji(&mut self, id: PaletteId, emoji: &str) -> ArtResult<()> {
        use unicode_segmentation::UnicodeSegmentation;

        let palette = self.palette_mut(id)?;
        palette.emojis = palette
            .emojis
            .graphemes(true)
            .filter(|g| *g != emoji)
            .collect();
        self.persist();
        Ok(())
    }

    fn palette_mut(&mut self, id: PaletteId) -> ArtResult<&mut Palette> {
        self.palettes
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ArtError::PaletteNotFound(id))
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Save the store to disk as JSON.
    ///
    /// No-op if the store was created without a data directory.
    fn persist(&self) {
        let Some(ref data_dir) = self.data_dir else {
            return;
        };
        let doc = PaletteStoreDocument {
            name: self.name.clone(),
            palettes: self.palettes.clone(),
            current: self.current,
            next_id: self.next_id,
        };
        let json = match serde_json::to_string_pretty(&doc) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("Failed to serialize palette store {}: {e}", self.name);
                return;
            }
        };
        let path = store_path(data_dir, &self.name);
        if let Err(e) = std::fs::write(&path, json) {
            tracing::warn!(
                "Failed to persist palette store {} to {}: {e}",
                self.name,
                path.display()
            );
        }
    }
}

fn store_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("palettes-{}.json", sanitize_filename(name)))
}

/// Sanitize a store name for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
