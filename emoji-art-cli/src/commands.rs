//! Command execution.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use emoji_art_core::{
    Background, BackgroundFetchStatus, DropOutcome, DropPayload, EditCommand, EditorConfig,
    EmojiArtDocument, EmojiId, EmojiPoint, PaletteId, PaletteStore, ScreenPoint, Vector, Viewport,
};
use emoji_art_loader::BackgroundLoader;
use url::Url;

use crate::{CliArgs, Command, PaletteCommand};

/// Palette directory used when none is configured.
const FALLBACK_DATA_DIR: &str = ".emoji-art";

/// Run one command, writing its report to `out`.
///
/// # Errors
///
/// Returns an error if the command fails; documents are only written back
/// after a successful edit.
pub async fn run(args: CliArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = args.editor_config().context("Invalid configuration")?;
    tracing::debug!("Running {:?}", args.command);

    match args.command {
        Command::New { file, force } => {
            if file.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", file.display());
            }
            EmojiArtDocument::new().save(&file)?;
            writeln!(out, "Created {}", file.display())?;
        }
        Command::Show { file, json } => {
            let document = load(&file)?;
            if json {
                writeln!(out, "{}", document.to_json()?)?;
            } else {
                describe(&document, out)?;
            }
        }
        Command::Add {
            file,
            emoji,
            x,
            y,
            size,
        } => {
            let size = size.unwrap_or_else(|| default_size(&config));
            edit(&file, out, EditCommand::AddEmoji {
                text: emoji,
                at: EmojiPoint::new(x, y),
                size,
            })?;
        }
        Command::Move { file, id, dx, dy } => {
            edit(&file, out, EditCommand::MoveEmoji {
                id: EmojiId::from_raw(id),
                dx,
                dy,
            })?;
        }
        Command::Resize { file, id, scale } => {
            edit(&file, out, EditCommand::ResizeEmoji {
                id: EmojiId::from_raw(id),
                scale,
            })?;
        }
        Command::Remove { file, id } => {
            edit(&file, out, EditCommand::RemoveEmoji {
                id: EmojiId::from_raw(id),
            })?;
        }
        Command::Background {
            file,
            url,
            image,
            clear,
        } => {
            let background = match (url, image) {
                (Some(url), _) => Background::Url(parse_url(&url)?),
                (None, Some(path)) => Background::ImageData(read_image(&path)?),
                (None, None) if clear => Background::None,
                (None, None) => bail!("Give a URL, --image PATH or --clear"),
            };
            let mut document = load(&file)?;
            document.perform(EditCommand::SetBackground { background }, None)?;
            resolve_background(&mut document, &config, out).await?;
            document.save(&file)?;
        }
        Command::Drop {
            file,
            url,
            image,
            text,
            at_x,
            at_y,
            width,
            height,
            zoom,
            pan_x,
            pan_y,
        } => {
            let mut payloads = Vec::new();
            if let Some(url) = url {
                payloads.push(DropPayload::Url(parse_url(&url)?));
            }
            if let Some(path) = image {
                payloads.push(DropPayload::Image(read_image(&path)?));
            }
            if let Some(text) = text {
                payloads.push(DropPayload::Text(text));
            }
            let mut viewport = Viewport::new(width, height);
            viewport.set_zoom(zoom);
            viewport.end_pan_gesture(Vector::new(pan_x, pan_y));
            let location = ScreenPoint::new(at_x, at_y);
            drop_onto(&file, &payloads, location, &viewport, &config, out).await?;
        }
        Command::Palette(command) => palette(command, &config, out)?,
    }
    Ok(())
}

fn load(file: &Path) -> anyhow::Result<EmojiArtDocument> {
    EmojiArtDocument::load(file).with_context(|| format!("Failed to open {}", file.display()))
}

fn parse_url(raw: &str) -> anyhow::Result<Url> {
    Url::parse(raw).with_context(|| format!("Invalid URL {raw:?}"))
}

fn read_image(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[allow(clippy::cast_possible_truncation)] // validated positive and finite
fn default_size(config: &EditorConfig) -> i32 {
    config.default_emoji_size.round().clamp(1.0, f64::from(i32::MAX)) as i32
}

fn edit(file: &Path, out: &mut dyn Write, command: EditCommand) -> anyhow::Result<()> {
    let mut document = load(file)?;
    let name = command.action_name();
    let affected = document.perform(command, None)?;
    document.save(file)?;

    match affected.and_then(|id| document.emoji(id)) {
        Some(emoji) => writeln!(
            out,
            "{name}: #{} {} at ({}, {}) size {}",
            emoji.id, emoji.text, emoji.x, emoji.y, emoji.size
        )?,
        None => writeln!(out, "{name}: done")?,
    }
    Ok(())
}

fn describe(document: &EmojiArtDocument, out: &mut dyn Write) -> anyhow::Result<()> {
    match document.background() {
        Background::None => writeln!(out, "Background: none")?,
        Background::Url(url) => writeln!(out, "Background: {url}")?,
        Background::ImageData(bytes) => {
            writeln!(out, "Background: embedded image ({} bytes)", bytes.len())?;
        }
    }
    writeln!(out, "Emoji: {}", document.emoji_count())?;
    for emoji in document.emojis() {
        writeln!(
            out,
            "  #{:<4} {}  ({}, {})  size {}",
            emoji.id, emoji.text, emoji.x, emoji.y, emoji.size
        )?;
    }
    Ok(())
}

async fn drop_onto(
    file: &Path,
    payloads: &[DropPayload],
    location: ScreenPoint,
    viewport: &Viewport,
    config: &EditorConfig,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut document = load(file)?;
    let outcome = document.apply_drop(
        payloads,
        location,
        &viewport.transform(),
        config.default_emoji_size,
        None,
    )?;
    match outcome {
        DropOutcome::Ignored => {
            writeln!(out, "Nothing usable in the drop")?;
            return Ok(());
        }
        DropOutcome::BackgroundSet => resolve_background(&mut document, config, out).await?,
        DropOutcome::EmojiAdded(id) => {
            if let Some(emoji) = document.emoji(id) {
                writeln!(
                    out,
                    "Added {} as #{id} at ({}, {}) size {}",
                    emoji.text, emoji.x, emoji.y, emoji.size
                )?;
            }
        }
    }
    document.save(file)?;
    Ok(())
}

async fn resolve_background(
    document: &mut EmojiArtDocument,
    config: &EditorConfig,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut loader = BackgroundLoader::from_config(config)?;
    if loader.pump(document) {
        loader.next_completion(document).await;
    }

    match document.fetch_status() {
        BackgroundFetchStatus::Failed { error, .. } => {
            tracing::warn!("Background could not be loaded: {error}");
            writeln!(out, "Background set, but it could not be loaded: {error}")?;
        }
        BackgroundFetchStatus::Fetching => writeln!(out, "Background set, still loading")?,
        BackgroundFetchStatus::Idle => match document.background_image() {
            Some(image) => writeln!(
                out,
                "Background set ({}x{})",
                image.width, image.height
            )?,
            None => writeln!(out, "Background cleared")?,
        },
    }
    Ok(())
}

fn palette(
    command: PaletteCommand,
    config: &EditorConfig,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let data_dir = config
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_DIR));
    let mut store = PaletteStore::open(config.palette_store.as_str(), data_dir)?;

    match command {
        PaletteCommand::List => {
            for (index, palette) in store.palettes().iter().enumerate() {
                let marker = if index == store.current_index() { '*' } else { ' ' };
                writeln!(
                    out,
                    "{marker} #{:<3} {:<14} {}",
                    palette.id,
                    palette.name,
                    palette.display_emojis().concat()
                )?;
            }
        }
        PaletteCommand::Add { name, emojis } => {
            let id = store.add(&name, &emojis)?;
            writeln!(out, "Added palette #{id} {name}")?;
        }
        PaletteCommand::Remove { id } => {
            let removed = store.remove(PaletteId::from_raw(id))?;
            writeln!(out, "Removed palette #{id} {}", removed.name)?;
        }
        PaletteCommand::Rename { id, name } => {
            store.rename(PaletteId::from_raw(id), &name)?;
            writeln!(out, "Renamed palette #{id} to {name}")?;
        }
        PaletteCommand::Replace { id, emojis } => {
            let id = PaletteId::from_raw(id);
            store.replace_emojis(id, &emojis)?;
            show_palette(&store, id, out)?;
        }
        PaletteCommand::AddEmojis { id, emojis } => {
            let id = PaletteId::from_raw(id);
            store.add_emojis(id, &emojis)?;
            show_palette(&store, id, out)?;
        }
        PaletteCommand::RemoveEmoji { id, emoji } => {
            let id = PaletteId::from_raw(id);
            store.remove_emoji(id, &emoji)?;
            show_palette(&store, id, out)?;
        }
    }
    Ok(())
}

fn show_palette(store: &PaletteStore, id: PaletteId, out: &mut dyn Write) -> anyhow::Result<()> {
    let emojis = store.display_emojis(id)?.concat();
    let name = store.palette(id).map_or("", |p| p.name.as_str());
    writeln!(out, "#{id} {name}: {emojis}")?;
    Ok(())
}
