use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::cache::ThumbnailCache;
use super::cursor::NavigationCursor;
use super::deck::{DeckResolver, SlideDeck};
use super::lookup::SlideLookup;
use super::pipeline::SlideEvent;
use crate::error::RemoteFetchError;

/// Title shown while a deck is being resolved.
pub const LOADING_TITLE: &str = "Loading slides... (up to ~15 seconds)";

/// Notification shown to the master when a deck cannot be resolved.
pub const DECK_LOAD_FAILED_NOTICE: &str = "Unable to load the slides";

/// Master-side slide console: resolves decks and moves the cursor.
///
/// Owns the sending half of the slide event channel; the receiving half feeds a
/// [`ThumbnailPipeline`](super::pipeline::ThumbnailPipeline).
pub struct SlideController {
    lookup: Arc<dyn SlideLookup>,
    resolver: DeckResolver,
    cursor: NavigationCursor,
    events: mpsc::UnboundedSender<SlideEvent>,
    cache_capacity: u64,
    deck: Option<Arc<SlideDeck>>,
    title: String,
    pending_load: u64,
}

/// A deck resolution started by [`SlideController::begin_load`].
///
/// Resolve it without holding the controller, then hand the result to
/// [`SlideController::finish_load`].
pub struct DeckLoad {
    ticket: u64,
    resolver: DeckResolver,
}

impl DeckLoad {
    pub async fn resolve(&self, presentation_id: &str) -> Result<SlideDeck, RemoteFetchError> {
        self.resolver.resolve_deck(presentation_id).await
    }
}

impl SlideController {
    pub fn new(
        lookup: Arc<dyn SlideLookup>,
        cache_capacity: u64,
    ) -> (Self, mpsc::UnboundedReceiver<SlideEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let controller = Self {
            resolver: DeckResolver::new(Arc::clone(&lookup)),
            lookup,
            cursor: NavigationCursor::new(events.clone()),
            events,
            cache_capacity,
            deck: None,
            title: String::new(),
            pending_load: 0,
        };
        (controller, events_rx)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn deck(&self) -> Option<&Arc<SlideDeck>> {
        self.deck.as_ref()
    }

    pub fn cursor(&self) -> &NavigationCursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut NavigationCursor {
        &mut self.cursor
    }

    pub fn index(&self) -> Option<usize> {
        self.cursor.index()
    }

    /// Select slide `index`; `false` when it lies outside the deck.
    pub fn set_index(&mut self, index: usize) -> bool {
        self.cursor.set_index(index)
    }

    pub fn next(&mut self) {
        self.cursor.next();
    }

    pub fn back(&mut self) {
        self.cursor.back();
    }

    pub fn head(&mut self) {
        self.cursor.head();
    }

    pub fn tail(&mut self) {
        self.cursor.tail();
    }

    /// Resolve `presentation_id` and make it the current deck.
    ///
    /// On success the cursor goes to "no selection" and then to the first slide.
    /// On failure the title is cleared and the previous deck stays installed.
    pub async fn load_deck(&mut self, presentation_id: &str) -> Result<Arc<SlideDeck>, RemoteFetchError> {
        let load = self.begin_load();
        let resolved = load.resolve(presentation_id).await;
        self.finish_load(load, resolved)
    }

    /// Show the loading title and hand out a resolution that supersedes any
    /// load still in flight.
    pub fn begin_load(&mut self) -> DeckLoad {
        self.pending_load += 1;
        self.title = LOADING_TITLE.to_string();
        DeckLoad {
            ticket: self.pending_load,
            resolver: self.resolver.clone(),
        }
    }

    /// Install the outcome of `load`. A load superseded by a later
    /// [`begin_load`](Self::begin_load) changes nothing.
    pub fn finish_load(
        &mut self,
        load: DeckLoad,
        resolved: Result<SlideDeck, RemoteFetchError>,
    ) -> Result<Arc<SlideDeck>, RemoteFetchError> {
        let current = load.ticket == self.pending_load;
        let deck = match resolved {
            Ok(deck) => Arc::new(deck),
            Err(e) => {
                error!("{}: {}", DECK_LOAD_FAILED_NOTICE, e);
                if current {
                    self.title.clear();
                }
                return Err(e);
            }
        };
        if !current {
            info!("Deck '{}' superseded by a later load, not installed", deck.title);
            return Ok(deck);
        }

        let cache = ThumbnailCache::new(Arc::clone(&self.lookup), Arc::clone(&deck), self.cache_capacity);
        if self.events.send(SlideEvent::DeckLoaded(cache)).is_err() {
            warn!("Slide pipeline is gone; thumbnails will not be published");
        }

        self.cursor.set_deck_len(deck.len());
        self.cursor.reset();
        self.cursor.head();

        self.title = deck.title.clone();
        self.deck = Some(Arc::clone(&deck));
        info!("Deck '{}' installed with {} slides", deck.title, deck.len());
        Ok(deck)
    }
}
