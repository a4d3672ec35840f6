//! # Emoji Art CLI
//!
//! Command-line editor for emoji art documents and palette stores.
//!
//! ## Components
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `Command` / `PaletteCommand` - The editing operations
//! - `run` - Executes one command against files on disk

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod commands;

pub use commands::run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use emoji_art_core::{ArtResult, EditorConfig};

/// Command-line arguments for emoji-art.
#[derive(Debug, Clone, Parser)]
#[command(name = "emoji-art")]
#[command(about = "Edit emoji art documents and emoji palettes")]
#[command(version)]
pub struct CliArgs {
    /// JSON configuration file
    #[arg(long, global = true, env = "EMOJI_ART_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding palette stores
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Palette store name
    #[arg(long, global = true)]
    pub palette_store: Option<String>,

    /// Background fetch timeout in milliseconds
    #[arg(long, global = true)]
    pub fetch_timeout_ms: Option<u64>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

impl CliArgs {
    /// Resolve the editor configuration: file, then environment, then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file or an environment variable is invalid.
    pub fn editor_config(&self) -> ArtResult<EditorConfig> {
        let base = match &self.config {
            Some(path) => EditorConfig::load(path)?,
            None => EditorConfig::default(),
        };
        let mut config = base.apply_overrides(|key| std::env::var(key).ok())?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if let Some(name) = &self.palette_store {
            config.palette_store.clone_from(name);
        }
        if let Some(ms) = self.fetch_timeout_ms {
            config.fetch_timeout_ms = ms;
        }
        Ok(config)
    }
}

/// Document and palette operations.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an empty document
    New {
        /// Document file to create
        file: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print a document's background and emoji
    Show {
        /// Document file
        file: PathBuf,
        /// Print the raw JSON document
        #[arg(long)]
        json: bool,
    },

    /// Place an emoji
    Add {
        /// Document file
        file: PathBuf,
        /// A single emoji
        emoji: String,
        /// Horizontal position in emoji space
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        x: i32,
        /// Vertical position in emoji space
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        y: i32,
        /// Point size (defaults to the configured emoji size)
        #[arg(long)]
        size: Option<i32>,
    },

    /// Move an emoji by a delta
    Move {
        /// Document file
        file: PathBuf,
        /// Emoji ID
        id: u64,
        /// Horizontal delta
        #[arg(allow_negative_numbers = true)]
        dx: i32,
        /// Vertical delta
        #[arg(allow_negative_numbers = true)]
        dy: i32,
    },

    /// Scale an emoji's size
    Resize {
        /// Document file
        file: PathBuf,
        /// Emoji ID
        id: u64,
        /// Scale factor
        scale: f64,
    },

    /// Remove an emoji
    Remove {
        /// Document file
        file: PathBuf,
        /// Emoji ID
        id: u64,
    },

    /// Set or clear the background and resolve it
    Background {
        /// Document file
        file: PathBuf,
        /// Image URL (`http(s):`, `data:` or `file:`)
        #[arg(conflicts_with_all = ["image", "clear"])]
        url: Option<String>,
        /// Embed this image file in the document
        #[arg(long, conflicts_with = "clear")]
        image: Option<PathBuf>,
        /// Remove the background
        #[arg(long)]
        clear: bool,
    },

    /// Drop a URL, image file or text onto the canvas
    Drop {
        /// Document file
        file: PathBuf,
        /// Dropped URL
        #[arg(long)]
        url: Option<String>,
        /// Dropped image file
        #[arg(long)]
        image: Option<PathBuf>,
        /// Dropped text
        #[arg(long)]
        text: Option<String>,
        /// Drop location, horizontal screen coordinate
        #[arg(long, default_value_t = 400.0, allow_negative_numbers = true)]
        at_x: f64,
        /// Drop location, vertical screen coordinate
        #[arg(long, default_value_t = 300.0, allow_negative_numbers = true)]
        at_y: f64,
        /// Viewport width
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        /// Viewport height
        #[arg(long, default_value_t = 600.0)]
        height: f64,
        /// Viewport zoom scale
        #[arg(long, default_value_t = 1.0)]
        zoom: f64,
        /// Horizontal pan offset in screen units
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        pan_x: f64,
        /// Vertical pan offset in screen units
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        pan_y: f64,
    },

    /// Manage the palette store
    #[command(subcommand)]
    Palette(PaletteCommand),
}

/// Palette store operations.
#[derive(Debug, Clone, Subcommand)]
pub enum PaletteCommand {
    /// List palettes
    List,
    /// Add a palette
    Add {
        /// Palette name
        name: String,
        /// Emoji it starts with
        #[arg(default_value = "")]
        emojis: String,
    },
    /// Remove a palette
    Remove {
        /// Palette ID
        id: u64,
    },
    /// Rename a palette
    Rename {
        /// Palette ID
        id: u64,
        /// New name
        name: String,
    },
    /// Replace all of a palette's emoji
    Replace {
        /// Palette ID
        id: u64,
        /// Text whose emoji become the palette
        emojis: String,
    },
    /// Put emoji at the front of a palette
    AddEmojis {
        /// Palette ID
        id: u64,
        /// Text whose emoji are added
        emojis: String,
    },
    /// Remove an emoji from a palette
    RemoveEmoji {
        /// Palette ID
        id: u64,
        /// The emoji to remove
        emoji: String,
    },
}
