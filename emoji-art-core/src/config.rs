//! Editor configuration.
//!
//! Values come from, in increasing priority: built-in defaults, a JSON file,
//! `EMOJI_ART_*` environment variables, and finally whatever the host (for
//! example the CLI) sets explicitly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::palette::DEFAULT_STORE;
use crate::{ArtError, ArtResult, UndoHistory};

/// Prefix of the environment variables read by [`EditorConfig::from_env`].
pub const ENV_PREFIX: &str = "EMOJI_ART_";

/// Editor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// On-screen size of newly dropped emoji at zoom 1.
    #[serde(default = "EditorConfig::default_emoji_size")]
    pub default_emoji_size: f64,
    /// Background fetch timeout in milliseconds.
    #[serde(default = "EditorConfig::default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Name of the palette store to open.
    #[serde(default = "EditorConfig::default_palette_store")]
    pub palette_store: String,
    /// Directory for palette files. Palettes are kept in memory when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Maximum undo depth.
    #[serde(default = "EditorConfig::default_undo_depth")]
    pub undo_depth: usize,
    /// Merge consecutive moves of one emoji into a single undo step.
    #[serde(default)]
    pub coalesce_moves: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_emoji_size: Self::default_emoji_size(),
            fetch_timeout_ms: Self::default_fetch_timeout_ms(),
            palette_store: Self::default_palette_store(),
            data_dir: None,
            undo_depth: Self::default_undo_depth(),
            coalesce_moves: false,
        }
    }
}

impl EditorConfig {
    const fn default_emoji_size() -> f64 {
        40.0
    }

    const fn default_fetch_timeout_ms() -> u64 {
        15_000
    }

    fn default_palette_store() -> String {
        DEFAULT_STORE.to_string()
    }

    const fn default_undo_depth() -> usize {
        UndoHistory::DEFAULT_DEPTH
    }

    /// Read a configuration file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Config`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> ArtResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ArtError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| ArtError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Config`] if a variable holds an unparsable value.
    pub fn from_env() -> ArtResult<Self> {
        Self::default().apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override fields from `EMOJI_ART_*` variables supplied by `lookup`.
    ///
    /// Recognized keys: `DEFAULT_EMOJI_SIZE`, `FETCH_TIMEOUT_MS`,
    /// `PALETTE_STORE`, `DATA_DIR`, `UNDO_DEPTH`, `COALESCE_MOVES`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Config`] naming the variable that failed to parse.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> ArtResult<Self> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(value) = var("DEFAULT_EMOJI_SIZE") {
            self.default_emoji_size = parse_var("DEFAULT_EMOJI_SIZE", &value)?;
        }
        if let Some(value) = var("FETCH_TIMEOUT_MS") {
            self.fetch_timeout_ms = parse_var("FETCH_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = var("PALETTE_STORE") {
            self.palette_store = value;
        }
        if let Some(value) = var("DATA_DIR") {
            self.data_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = var("UNDO_DEPTH") {
            self.undo_depth = parse_var("UNDO_DEPTH", &value)?;
        }
        if let Some(value) = var("COALESCE_MOVES") {
            self.coalesce_moves = parse_var("COALESCE_MOVES", &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> ArtResult<()> {
        if !self.default_emoji_size.is_finite() || self.default_emoji_size <= 0.0 {
            return Err(ArtError::Config(format!(
                "defaultEmojiSize must be positive, got {}",
                self.default_emoji_size
            )));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ArtError::Config("fetchTimeoutMs must be non-zero".into()));
        }
        if self.palette_store.trim().is_empty() {
            return Err(ArtError::Config("paletteStore must not be empty".into()));
        }
        Ok(())
    }

    /// Background fetch timeout.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// An empty undo history with the configured depth and coalescing.
    #[must_use]
    pub fn undo_history(&self) -> UndoHistory {
        UndoHistory::new()
            .with_max_depth(self.undo_depth)
            .with_coalesced_moves(self.coalesce_moves)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> ArtResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ArtError::Config(format!("{ENV_PREFIX}{name}={value:?}: {e}")))
}
