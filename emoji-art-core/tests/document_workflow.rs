//! Document Workflow Integration Tests
//!
//! Exercises the document the way an editor host drives it:
//! - Placing, moving and removing emoji through undoable commands
//! - Background resolution with out-of-order completions
//! - Persistence and palette stores on disk

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use emoji_art_core::{
    Background, BackgroundFetchStatus, BackgroundImage, BackgroundTicket, DocumentChange,
    DropOutcome, DropPayload, EditCommand, EmojiArtDocument, EmojiPoint, FetchError,
    PaletteStore, ScreenPoint, UndoHistory, Vector, Viewport,
};

/// Resolver that holds tickets until the test releases them, in any order.
#[derive(Default)]
struct OrderedResolver {
    queued: VecDeque<BackgroundTicket>,
}

impl OrderedResolver {
    fn take(&mut self, document: &mut EmojiArtDocument) {
        if let Some(ticket) = document.take_pending_fetch() {
            self.queued.push_back(ticket);
        }
    }

    fn finish_newest(
        &mut self,
        document: &mut EmojiArtDocument,
        result: Result<BackgroundImage, FetchError>,
    ) -> bool {
        let ticket = self.queued.pop_back().expect("queued ticket");
        document.complete_background(&ticket, result)
    }

    fn finish_oldest(
        &mut self,
        document: &mut EmojiArtDocument,
        result: Result<BackgroundImage, FetchError>,
    ) -> bool {
        let ticket = self.queued.pop_front().expect("queued ticket");
        document.complete_background(&ticket, result)
    }
}

fn image(width: u32, height: u32) -> BackgroundImage {
    BackgroundImage {
        width,
        height,
        pixels: vec![0; (width * height * 4) as usize].into(),
    }
}

// ============================================================================
// Editing
// ============================================================================

#[test]
fn test_add_move_and_fetch_background() {
    let mut doc = EmojiArtDocument::new();
    let mut history = UndoHistory::new();
    let mut resolver = OrderedResolver::default();

    let id = doc
        .perform(
            EditCommand::AddEmoji {
                text: "😀".into(),
                at: EmojiPoint::new(0, 0),
                size: 40,
            },
            Some(&mut history),
        )
        .expect("add")
        .expect("id");
    assert_eq!(id.get(), 1);

    doc.perform(EditCommand::MoveEmoji { id, dx: 10, dy: -5 }, Some(&mut history))
        .expect("move");
    assert_eq!(doc.emoji(id).map(|e| e.position()), Some(EmojiPoint::new(10, -5)));

    doc.perform(
        EditCommand::SetBackground {
            background: Background::Url("https://example.com/sky.png".parse().expect("url")),
        },
        Some(&mut history),
    )
    .expect("background");
    assert!(doc.fetch_status().is_fetching());

    resolver.take(&mut doc);
    assert!(resolver.finish_newest(&mut doc, Ok(image(2, 2))));
    assert_eq!(doc.fetch_status(), &BackgroundFetchStatus::Idle);
    assert_eq!(doc.background_image().map(|i| i.width), Some(2));
}

#[test]
fn test_undo_walks_back_to_empty_document() {
    let mut doc = EmojiArtDocument::new();
    let mut history = UndoHistory::new();
    let id = doc
        .perform(
            EditCommand::AddEmoji {
                text: "🐙".into(),
                at: EmojiPoint::new(-3, 4),
                size: 30,
            },
            Some(&mut history),
        )
        .expect("add")
        .expect("id");
    doc.perform(EditCommand::ResizeEmoji { id, scale: 2.0 }, Some(&mut history))
        .expect("resize");
    doc.perform(EditCommand::RemoveEmoji { id }, Some(&mut history))
        .expect("remove");
    assert!(doc.is_empty());

    assert_eq!(history.undo(&mut doc).expect("undo"), Some("Remove Emoji"));
    assert_eq!(doc.emoji(id).map(|e| e.size), Some(60));
    assert_eq!(history.undo(&mut doc).expect("undo"), Some("Resize Emoji"));
    assert_eq!(doc.emoji(id).map(|e| e.size), Some(30));
    assert_eq!(history.undo(&mut doc).expect("undo"), Some("Add Emoji"));
    assert!(doc.is_empty());
    assert_eq!(history.undo(&mut doc).expect("undo"), None);

    assert_eq!(history.redo(&mut doc).expect("redo"), Some("Add Emoji"));
    assert_eq!(doc.emoji(id).map(|e| e.position()), Some(EmojiPoint::new(-3, 4)));
}

// ============================================================================
// Background resolution
// ============================================================================

#[test]
fn test_only_latest_background_applies() {
    let mut doc = EmojiArtDocument::new();
    let mut resolver = OrderedResolver::default();

    doc.set_background(Background::Url("https://example.com/a.png".parse().expect("url")));
    resolver.take(&mut doc);
    doc.set_background(Background::Url("https://example.com/b.png".parse().expect("url")));
    resolver.take(&mut doc);

    // B finishes first, then A arrives late.
    assert!(resolver.finish_newest(&mut doc, Ok(image(8, 8))));
    assert!(!resolver.finish_oldest(&mut doc, Ok(image(1, 1))));

    assert_eq!(doc.background_image().map(|i| i.width), Some(8));
    assert_eq!(doc.fetch_status(), &BackgroundFetchStatus::Idle);
    assert_eq!(doc.background().url().map(url::Url::as_str), Some("https://example.com/b.png"));
}

#[test]
fn test_failed_fetch_is_reported_through_status() {
    let mut doc = EmojiArtDocument::new();
    let mut resolver = OrderedResolver::default();
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    doc.subscribe(move |change| sink.lock().expect("lock").push(change.clone()));

    let url: url::Url = "https://example.com/missing.png".parse().expect("url");
    doc.set_background(Background::Url(url.clone()));
    resolver.take(&mut doc);
    let error = FetchError::Network {
        url: url.to_string(),
        reason: "404 Not Found".into(),
    };
    assert!(resolver.finish_newest(&mut doc, Err(error.clone())));

    assert_eq!(
        doc.fetch_status(),
        &BackgroundFetchStatus::Failed {
            url: Some(url),
            error
        }
    );
    let changes = changes.lock().expect("lock");
    assert!(changes.contains(&DocumentChange::BackgroundChanged));
    assert!(matches!(
        changes.last(),
        Some(DocumentChange::FetchStatusChanged(BackgroundFetchStatus::Failed { .. }))
    ));
}

// ============================================================================
// Viewport and drops
// ============================================================================

#[test]
fn test_drop_after_zooming_lands_under_cursor() {
    let mut viewport = Viewport::new(800.0, 600.0);
    viewport.end_zoom_gesture(2.0);
    viewport.end_pan_gesture(Vector::new(50.0, 0.0));

    let mut doc = EmojiArtDocument::new();
    let transform = viewport.transform();
    let location = ScreenPoint::new(500.0, 340.0);
    let outcome = doc
        .apply_drop(
            &[DropPayload::Text("🦄 unicorn".into())],
            location,
            &transform,
            40.0,
            None,
        )
        .expect("drop");
    let DropOutcome::EmojiAdded(id) = outcome else {
        panic!("Expected EmojiAdded, got {outcome:?}");
    };

    let emoji = doc.emoji(id).expect("emoji");
    assert_eq!(emoji.size, 20);
    let back = transform.to_screen(emoji.position());
    assert!((back.x - location.x).abs() < 2.0);
    assert!((back.y - location.y).abs() < 2.0);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_saved_document_reloads_with_pending_background() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("art.json");

    let mut doc = EmojiArtDocument::new();
    doc.add_emoji("🌞", EmojiPoint::new(100, -100), 80).expect("add");
    doc.set_background(Background::ImageData(vec![1, 2, 3]));
    doc.save(&path).expect("save");

    let mut loaded = EmojiArtDocument::load(&path).expect("load");
    assert_eq!(loaded.emojis(), doc.emojis());
    assert_eq!(loaded.fetch_status(), &BackgroundFetchStatus::Idle);
    let ticket = loaded.take_pending_fetch().expect("pending");
    assert_eq!(ticket.background, Background::ImageData(vec![1, 2, 3]));
}

#[test]
fn test_palette_store_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let id = {
        let mut store = PaletteStore::open("Travel Kit", dir.path()).expect("open");
        let id = store.add("Beach", "🏖🌊").expect("add");
        store.add_emojis(id, "🐚 shell").expect("add emojis");
        id
    };

    let store = PaletteStore::open("Travel Kit", dir.path()).expect("reopen");
    let palette = store.palette(id).expect("palette");
    assert_eq!(palette.name, "Beach");
    assert_eq!(palette.emojis, "🐚🏖🌊");
}
