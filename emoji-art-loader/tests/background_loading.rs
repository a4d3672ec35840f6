//! Background Loading Integration Tests
//!
//! Tests the loader against a document:
//! - Inline image bytes resolve synchronously
//! - Out-of-order fetches never overwrite a newer background
//! - Timeouts and HTTP failures end in the Failed status
//! - Real HTTP fetches through a mock server

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use emoji_art_core::{Background, BackgroundFetchStatus, EmojiArtDocument, FetchError};
use emoji_art_loader::{BackgroundLoader, HttpImageSource, ImageSource};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 128, 255, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

fn url(s: &str) -> Url {
    s.parse().expect("url")
}

/// Serves a fixed image per URL after a per-URL delay.
struct DelayedSource {
    responses: HashMap<String, (Duration, Vec<u8>)>,
}

impl DelayedSource {
    fn new(entries: &[(&str, u64, Vec<u8>)]) -> Arc<Self> {
        Arc::new(Self {
            responses: entries
                .iter()
                .map(|(u, ms, bytes)| {
                    ((*u).to_string(), (Duration::from_millis(*ms), bytes.clone()))
                })
                .collect(),
        })
    }
}

#[async_trait]
impl ImageSource for DelayedSource {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let (delay, bytes) = self
            .responses
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Network {
                url: url.to_string(),
                reason: "404 Not Found".into(),
            })?;
        tokio::time::sleep(delay).await;
        Ok(bytes)
    }
}

/// A source whose fetch task dies.
struct PanickingSource;

#[async_trait]
impl ImageSource for PanickingSource {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        panic!("source blew up fetching {url}");
    }
}

// ============================================================================
// Inline and fake sources
// ============================================================================

#[tokio::test]
async fn test_inline_bytes_resolve_immediately() {
    let mut doc = EmojiArtDocument::new();
    let mut loader =
        BackgroundLoader::new(DelayedSource::new(&[]), Duration::from_secs(1)).expect("loader");

    doc.set_background(Background::ImageData(png(4, 3)));
    assert!(loader.pump(&mut doc));
    assert_eq!(doc.fetch_status(), &BackgroundFetchStatus::Idle);
    assert_eq!(doc.background_image().map(|i| (i.width, i.height)), Some((4, 3)));
    assert!(!loader.pump(&mut doc));
}

#[tokio::test]
async fn test_bad_inline_bytes_fail() {
    let mut doc = EmojiArtDocument::new();
    let mut loader =
        BackgroundLoader::new(DelayedSource::new(&[]), Duration::from_secs(1)).expect("loader");

    doc.set_background(Background::ImageData(b"definitely not a png".to_vec()));
    loader.pump(&mut doc);
    assert!(matches!(
        doc.fetch_status(),
        BackgroundFetchStatus::Failed {
            url: None,
            error: FetchError::Decode(_)
        }
    ));
}

#[tokio::test]
async fn test_newer_background_wins_over_slower_older_fetch() {
    let source = DelayedSource::new(&[
        ("https://example.com/a.png", 300, png(1, 1)),
        ("https://example.com/b.png", 10, png(2, 2)),
    ]);
    let mut doc = EmojiArtDocument::new();
    let mut loader = BackgroundLoader::new(source, Duration::from_secs(5)).expect("loader");

    doc.set_background(Background::Url(url("https://example.com/a.png")));
    loader.pump(&mut doc);
    doc.set_background(Background::Url(url("https://example.com/b.png")));
    loader.pump(&mut doc);

    assert_eq!(loader.next_completion(&mut doc).await, Some(true));
    assert_eq!(doc.fetch_status(), &BackgroundFetchStatus::Idle);
    assert_eq!(doc.background_image().map(|i| i.width), Some(2));

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(loader.apply_completions(&mut doc), 0);
    assert_eq!(doc.background_image().map(|i| i.width), Some(2));
    assert_eq!(loader.next_completion(&mut doc).await, None);
}

#[tokio::test]
async fn test_completion_for_replaced_background_is_discarded() {
    let source = DelayedSource::new(&[("https://example.com/a.png", 10, png(1, 1))]);
    let mut doc = EmojiArtDocument::new();
    let mut loader = BackgroundLoader::new(source, Duration::from_secs(5)).expect("loader");

    doc.set_background(Background::Url(url("https://example.com/a.png")));
    loader.pump(&mut doc);
    // Cleared before the fetch lands; nothing is pumped for the new value.
    doc.set_background(Background::None);

    assert_eq!(loader.next_completion(&mut doc).await, Some(false));
    assert!(doc.background_image().is_none());
    assert_eq!(doc.fetch_status(), &BackgroundFetchStatus::Idle);
}

#[tokio::test]
async fn test_slow_fetch_times_out() {
    let source = DelayedSource::new(&[("https://example.com/slow.png", 5_000, png(1, 1))]);
    let mut doc = EmojiArtDocument::new();
    let mut loader = BackgroundLoader::new(source, Duration::from_millis(50)).expect("loader");

    doc.set_background(Background::Url(url("https://example.com/slow.png")));
    loader.pump(&mut doc);
    assert!(loader.is_busy());
    assert_eq!(loader.next_completion(&mut doc).await, Some(true));

    assert_eq!(
        doc.fetch_status(),
        &BackgroundFetchStatus::Failed {
            url: Some(url("https://example.com/slow.png")),
            error: FetchError::Timeout {
                url: "https://example.com/slow.png".into()
            },
        }
    );
}

#[tokio::test]
async fn test_panicked_fetch_ends_failed() {
    let mut doc = EmojiArtDocument::new();
    let mut loader =
        BackgroundLoader::new(Arc::new(PanickingSource), Duration::from_secs(1)).expect("loader");

    doc.set_background(Background::Url(url("https://example.com/boom.png")));
    assert!(loader.pump(&mut doc));
    assert_eq!(loader.next_completion(&mut doc).await, Some(true));
    assert!(!loader.is_busy());

    match doc.fetch_status() {
        BackgroundFetchStatus::Failed { url: failed, error } => {
            assert_eq!(failed.as_ref(), Some(&url("https://example.com/boom.png")));
            assert!(matches!(error, FetchError::Network { reason, .. } if reason.contains("panicked")));
        }
        other => panic!("Expected Failed status, got {other:?}"),
    }
    assert!(doc.background_image().is_none());
}

// ============================================================================
// HTTP
// ============================================================================

#[tokio::test]
async fn test_http_fetch_through_mock_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/backgrounds/sky.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png(5, 7)),
        )
        .mount(&server)
        .await;

    let source = Arc::new(HttpImageSource::new().expect("client"));
    let mut doc = EmojiArtDocument::new();
    let mut loader = BackgroundLoader::new(source, Duration::from_secs(5)).expect("loader");

    let sky = url(&format!("{}/backgrounds/sky.png", server.uri()));
    doc.set_background(Background::Url(sky));
    loader.pump(&mut doc);
    assert_eq!(loader.next_completion(&mut doc).await, Some(true));
    assert_eq!(doc.background_image().map(|i| (i.width, i.height)), Some((5, 7)));
}

#[tokio::test]
async fn test_http_error_status_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let source = Arc::new(HttpImageSource::new().expect("client"));
    let mut doc = EmojiArtDocument::new();
    let mut loader = BackgroundLoader::new(source, Duration::from_secs(5)).expect("loader");

    doc.set_background(Background::Url(url(&format!("{}/gone.png", server.uri()))));
    loader.pump(&mut doc);
    loader.next_completion(&mut doc).await;
    assert!(matches!(
        doc.fetch_status(),
        BackgroundFetchStatus::Failed {
            error: FetchError::Network { .. },
            ..
        }
    ));
}

#[test]
fn test_loader_needs_runtime() {
    let result = BackgroundLoader::new(DelayedSource::new(&[]), Duration::from_secs(1));
    assert!(result.is_err());
}
