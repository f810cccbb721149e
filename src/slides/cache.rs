use moka::future::Cache;
use std::ops::Range;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::deck::SlideDeck;
use super::lookup::SlideLookup;

/// Slides ahead of a multiple-of-ten index that get resolved eagerly.
pub const PREFETCH_STRIDE: usize = 10;

/// Minimum number of leading slides prefetched when a deck is installed.
pub const DECK_PREFETCH_MIN: usize = 20;

/// Indices to prefetch after the cursor lands on `index`, before clipping to the deck.
pub fn prefetch_window(index: usize) -> Option<Range<usize>> {
    if index % PREFETCH_STRIDE == 0 {
        Some(index + PREFETCH_STRIDE..index + 2 * PREFETCH_STRIDE)
    } else {
        None
    }
}

/// Thumbnail URLs of one deck, keyed by slide index.
///
/// Entries are written once and never invalidated; a new deck gets a new cache.
/// Failed lookups leave the slot empty so a later request tries again.
/// Concurrent requests for the same missing index share one remote call.
#[derive(Clone)]
pub struct ThumbnailCache {
    lookup: Arc<dyn SlideLookup>,
    deck: Arc<SlideDeck>,
    urls: Cache<usize, String>,
}

impl ThumbnailCache {
    pub fn new(lookup: Arc<dyn SlideLookup>, deck: Arc<SlideDeck>, capacity: u64) -> Self {
        // Never evict while the deck is live.
        let capacity = capacity.max(deck.len() as u64);
        Self {
            lookup,
            deck,
            urls: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn deck(&self) -> &Arc<SlideDeck> {
        &self.deck
    }

    /// The cached URL, without touching the network.
    pub async fn cached(&self, index: usize) -> Option<String> {
        self.urls.get(&index).await
    }

    /// Cached URL for `index`, fetching it on a miss. `None` past the deck or on failure.
    pub async fn resolve(&self, index: usize) -> Option<String> {
        let page_object_id = self.deck.slide_object_ids.get(index)?.clone();
        let lookup = Arc::clone(&self.lookup);
        let presentation_id = self.deck.presentation_id.clone();

        let fetched = self
            .urls
            .try_get_with(index, async move {
                debug!("Fetching thumbnail for slide {} ({})", index, page_object_id);
                lookup
                    .fetch_thumbnail(&presentation_id, &page_object_id)
                    .await
            })
            .await;

        match fetched {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Failed to fetch thumbnail for slide {}: {}", index, e);
                None
            }
        }
    }

    /// Resolve every index of `range` that lies inside the deck, without waiting.
    pub fn prefetch(&self, range: Range<usize>, tasks: &mut JoinSet<()>) {
        let end = range.end.min(self.deck.len());
        for index in range.start..end {
            let cache = self.clone();
            tasks.spawn(async move {
                cache.resolve(index).await;
            });
        }
    }
}
