//! Drives background resolution for a document.
//!
//! ## Flow
//!
//! ```text
//! 1. The document queues a BackgroundTicket whenever its background changes
//! 2. pump() takes the ticket:
//!    - inline bytes are decoded and completed immediately
//!    - URLs are fetched on a Tokio task, capped by the timeout
//! 3. The task sends its Completion over a channel
//! 4. The owner applies completions with apply_completions() or next_completion()
//! ```
//!
//! Only one fetch is in flight at a time. Starting a new one aborts the old
//! one, and the document rejects anything stale that still gets through.

use std::sync::Arc;
use std::time::Duration;

use emoji_art_core::{
    Background, BackgroundImage, BackgroundTicket, EditorConfig, EmojiArtDocument, FetchError,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::decode::decode_image;
use crate::error::LoaderResult;
use crate::source::{HttpImageSource, ImageSource};

/// Default fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// The outcome of resolving one ticket.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The ticket that was resolved.
    pub ticket: BackgroundTicket,
    /// The decoded image, or why there is none.
    pub result: Result<BackgroundImage, FetchError>,
}

struct InFlight {
    ticket: BackgroundTicket,
    handle: JoinHandle<()>,
}

/// Resolves a document's background tickets.
pub struct BackgroundLoader {
    source: Arc<dyn ImageSource>,
    timeout: Duration,
    runtime: Handle,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: Option<InFlight>,
}

impl std::fmt::Debug for BackgroundLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundLoader")
            .field("timeout", &self.timeout)
            .field(
                "in_flight",
                &self.in_flight.as_ref().map(|f| f.ticket.generation),
            )
            .finish_non_exhaustive()
    }
}

impl BackgroundLoader {
    /// Create a loader that fetches through `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if called outside a Tokio runtime.
    pub fn new(source: Arc<dyn ImageSource>, timeout: Duration) -> LoaderResult<Self> {
        let runtime = Handle::try_current()?;
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self {
            source,
            timeout,
            runtime,
            tx,
            rx,
            in_flight: None,
        })
    }

    /// Create a loader over HTTP using the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or no runtime is running.
    pub fn from_config(config: &EditorConfig) -> LoaderResult<Self> {
        Self::new(Arc::new(HttpImageSource::new()?), config.fetch_timeout())
    }

    /// The fetch timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a URL fetch is running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| !f.handle.is_finished())
    }

    /// Start resolving the document's pending background, if there is one.
    ///
    /// Returns `true` if a ticket was taken.
    pub fn pump(&mut self, document: &mut EmojiArtDocument) -> bool {
        let Some(ticket) = document.take_pending_fetch() else {
            return false;
        };
        self.abort_in_flight();

        match &ticket.background {
            // Cleared backgrounds are never queued; settle one if it shows up.
            Background::None => {
                document.settle_background(&ticket);
            }
            Background::ImageData(bytes) => {
                let result = decode_image(bytes);
                document.complete_background(&ticket, result);
            }
            Background::Url(url) => {
                tracing::info!(
                    "Fetching background {url} (generation {})",
                    ticket.generation
                );
                let handle = self.runtime.spawn(resolve(
                    Arc::clone(&self.source),
                    url.clone(),
                    self.timeout,
                    ticket.clone(),
                    self.tx.clone(),
                ));
                self.in_flight = Some(InFlight { ticket, handle });
            }
        }
        true
    }

    /// Apply every completion that has already arrived. Returns how many took effect.
    pub fn apply_completions(&mut self, document: &mut EmojiArtDocument) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            if self.complete(document, completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the in-flight fetch to finish and apply what it produced.
    ///
    /// Returns `None` if nothing was in flight or waiting, otherwise whether
    /// any completion took effect.
    pub async fn next_completion(&mut self, document: &mut EmojiArtDocument) -> Option<bool> {
        let mut outcome = None;
        if let Some(InFlight { ticket, handle }) = self.in_flight.take() {
            if let Err(error) = handle.await {
                if error.is_panic() {
                    tracing::warn!("Background fetch task panicked: {error}");
                    let url = ticket.background.url().map(ToString::to_string);
                    outcome = Some(document.complete_background(
                        &ticket,
                        Err(FetchError::Network {
                            url: url.unwrap_or_default(),
                            reason: "fetch task panicked".into(),
                        }),
                    ));
                }
            }
        }

        while let Ok(completion) = self.rx.try_recv() {
            let applied = self.complete(document, completion);
            outcome = Some(outcome.unwrap_or(false) || applied);
        }
        outcome
    }

    fn complete(&mut self, document: &mut EmojiArtDocument, completion: Completion) -> bool {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.ticket.generation == completion.ticket.generation)
        {
            self.in_flight = None;
        }
        document.complete_background(&completion.ticket, completion.result)
    }

    fn abort_in_flight(&mut self) {
        if let Some(stale) = self.in_flight.take() {
            if !stale.handle.is_finished() {
                tracing::debug!(
                    "Aborting stale background fetch (generation {})",
                    stale.ticket.generation
                );
            }
            stale.handle.abort();
        }
    }
}

impl Drop for BackgroundLoader {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

async fn resolve(
    source: Arc<dyn ImageSource>,
    url: Url,
    timeout: Duration,
    ticket: BackgroundTicket,
    tx: mpsc::UnboundedSender<Completion>,
) {
    let result = match tokio::time::timeout(timeout, fetch_and_decode(source.as_ref(), &url)).await
    {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Background fetch of {url} timed out after {timeout:?}");
            Err(FetchError::Timeout {
                url: url.to_string(),
            })
        }
    };
    if tx.send(Completion { ticket, result }).is_err() {
        tracing::debug!("Loader dropped before {url} finished");
    }
}

async fn fetch_and_decode(
    source: &dyn ImageSource,
    url: &Url,
) -> Result<BackgroundImage, FetchError> {
    let bytes = source.fetch(url).await?;
    tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| FetchError::Decode(format!("decoder task failed: {e}")))?
}
