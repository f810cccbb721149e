use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::cache::{prefetch_window, ThumbnailCache, DECK_PREFETCH_MIN};
use crate::sync::PresentationSync;

/// Input of the thumbnail pipeline, in the order the master produced it.
#[derive(Clone)]
pub enum SlideEvent {
    /// A new deck replaced the previous one.
    DeckLoaded(ThumbnailCache),
    IndexChanged(Option<usize>),
}

/// Stage between the cursor and the shared document.
///
/// Consumes slide events one at a time: deck installs trigger the deck-wide
/// prefetch, index changes trigger the windowed prefetch and a lookup of the new
/// slide. Lookups run on their own tasks, so a stalled one never holds up later
/// events. Only the lookup for the most recent event may publish.
pub struct ThumbnailPipeline {
    sync: PresentationSync,
    cache: Option<ThumbnailCache>,
    tasks: JoinSet<()>,
    generation: Arc<AtomicU64>,
    publish: Arc<Mutex<()>>,
}

impl ThumbnailPipeline {
    pub fn new(sync: PresentationSync) -> Self {
        Self {
            sync,
            cache: None,
            tasks: JoinSet::new(),
            generation: Arc::new(AtomicU64::new(0)),
            publish: Arc::new(Mutex::new(())),
        }
    }

    /// Process events until every sender is dropped, then wait for outstanding lookups.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<SlideEvent>) {
        info!("Thumbnail pipeline started");
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        self.settle().await;
        info!("Thumbnail pipeline stopped");
    }

    pub async fn handle(&mut self, event: SlideEvent) {
        // Reap finished lookups so the set does not grow with the session.
        while self.tasks.try_join_next().is_some() {}

        // Any event supersedes the slide lookups issued before it.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        match event {
            SlideEvent::DeckLoaded(cache) => {
                let deck_len = cache.deck().len();
                debug!("Installing deck of {} slides", deck_len);
                cache.prefetch(0..DECK_PREFETCH_MIN.max(deck_len), &mut self.tasks);
                self.cache = Some(cache);
            }
            SlideEvent::IndexChanged(None) => {
                debug!("Slide selection cleared");
            }
            SlideEvent::IndexChanged(Some(index)) => self.show_slide(index, generation),
        }
    }

    /// Wait for every outstanding prefetch and lookup.
    pub async fn settle(&mut self) {
        while self.tasks.join_next().await.is_some() {}
    }

    fn show_slide(&mut self, index: usize, generation: u64) {
        let Some(cache) = &self.cache else {
            warn!("Slide {} selected before any deck was loaded", index);
            return;
        };

        if let Some(window) = prefetch_window(index) {
            cache.prefetch(window, &mut self.tasks);
        }

        let cache = cache.clone();
        let sync = self.sync.clone();
        let latest = Arc::clone(&self.generation);
        let publish = Arc::clone(&self.publish);
        self.tasks.spawn(async move {
            let Some(url) = cache.resolve(index).await else {
                error!("No thumbnail for slide {}", index);
                return;
            };
            // Check and write under one lock so an older lookup cannot land last.
            let _publishing = publish.lock().await;
            if latest.load(Ordering::SeqCst) != generation {
                debug!("Thumbnail of slide {} superseded, not published", index);
                return;
            }
            if let Err(e) = sync.set_slide_thumbnail_url(&url).await {
                error!("Failed to publish thumbnail of slide {}: {}", index, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slides::deck::SlideDeck;
    use crate::sync::{LoroDocumentStore, SharedSessionState};
    use crate::testing::FakeLookup;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn setup(len: usize) -> (ThumbnailPipeline, PresentationSync, Arc<FakeLookup>, ThumbnailCache) {
        let store = LoroDocumentStore::with_state(&SharedSessionState::default()).unwrap();
        let sync = PresentationSync::new(Arc::new(store));
        let lookup = Arc::new(FakeLookup::with_deck("pres-1", "Lecture 3", len));
        let listing = lookup.listing("pres-1").unwrap();
        let deck = Arc::new(SlideDeck {
            presentation_id: "pres-1".into(),
            slide_object_ids: listing.slide_object_ids,
            title: listing.title,
        });
        let cache = ThumbnailCache::new(lookup.clone(), deck, 64);
        (ThumbnailPipeline::new(sync.clone()), sync, lookup, cache)
    }

    fn pages(range: std::ops::Range<usize>) -> BTreeSet<String> {
        range.map(|i| format!("page-{}", i)).collect()
    }

    #[tokio::test]
    async fn lecture_three_prefetch_scenario() {
        let (mut pipeline, sync, lookup, cache) = setup(25);

        pipeline.handle(SlideEvent::DeckLoaded(cache)).await;
        pipeline.settle().await;
        let after_load: BTreeSet<String> = lookup.thumbnail_calls().into_iter().collect();
        assert_eq!(after_load, pages(0..25));

        pipeline.handle(SlideEvent::IndexChanged(None)).await;
        pipeline.handle(SlideEvent::IndexChanged(Some(0))).await;
        pipeline.handle(SlideEvent::IndexChanged(Some(10))).await;
        pipeline.settle().await;

        // Everything was already cached by the deck-wide prefetch.
        assert_eq!(lookup.thumbnail_calls().len(), 25);
        assert_eq!(
            sync.current().unwrap().slide_thumbnail_url.as_deref(),
            Some("https://thumbs/pres-1/page-10.png")
        );
    }

    #[tokio::test]
    async fn index_on_multiple_of_ten_prefetches_next_window() {
        let (mut pipeline, _sync, lookup, cache) = setup(45);
        pipeline.cache = Some(cache);

        pipeline.handle(SlideEvent::IndexChanged(Some(20))).await;
        pipeline.settle().await;

        let calls: BTreeSet<String> = lookup.thumbnail_calls().into_iter().collect();
        let mut expected = pages(30..40);
        expected.insert("page-20".into());
        assert_eq!(calls, expected);
    }

    #[tokio::test]
    async fn other_indices_fetch_only_themselves() {
        let (mut pipeline, sync, lookup, cache) = setup(45);
        pipeline.cache = Some(cache);

        pipeline.handle(SlideEvent::IndexChanged(Some(7))).await;
        pipeline.settle().await;

        assert_eq!(lookup.thumbnail_calls(), vec!["page-7"]);
        assert_eq!(
            sync.current().unwrap().slide_thumbnail_url.as_deref(),
            Some("https://thumbs/pres-1/page-7.png")
        );
    }

    #[tokio::test]
    async fn failed_thumbnail_keeps_previous_url() {
        let (mut pipeline, sync, lookup, cache) = setup(5);
        pipeline.cache = Some(cache);
        lookup.fail_page("page-2");

        pipeline.handle(SlideEvent::IndexChanged(Some(1))).await;
        pipeline.settle().await;
        pipeline.handle(SlideEvent::IndexChanged(Some(2))).await;
        pipeline.settle().await;

        assert_eq!(
            sync.current().unwrap().slide_thumbnail_url.as_deref(),
            Some("https://thumbs/pres-1/page-1.png")
        );
    }

    #[tokio::test]
    async fn run_consumes_channel_in_order() {
        let (pipeline, sync, _lookup, cache) = setup(5);
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(SlideEvent::DeckLoaded(cache)).unwrap();
        tx.send(SlideEvent::IndexChanged(Some(3))).unwrap();
        tx.send(SlideEvent::IndexChanged(Some(4))).unwrap();
        drop(tx);

        pipeline.run(rx).await;

        assert_eq!(
            sync.current().unwrap().slide_thumbnail_url.as_deref(),
            Some("https://thumbs/pres-1/page-4.png")
        );
    }

    async fn wait_for_url(sync: &PresentationSync, expected: &str) {
        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while sync.current().unwrap().slide_thumbnail_url.as_deref() != Some(expected) {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn stalled_lookup_does_not_block_later_slides() {
        let (mut pipeline, sync, lookup, cache) = setup(5);
        pipeline.cache = Some(cache);
        lookup.hold_page("page-1");

        pipeline.handle(SlideEvent::IndexChanged(Some(1))).await;
        pipeline.handle(SlideEvent::IndexChanged(Some(2))).await;

        wait_for_url(&sync, "https://thumbs/pres-1/page-2.png").await;
    }

    #[tokio::test]
    async fn slow_earlier_slide_does_not_overwrite_newer_one() {
        let (mut pipeline, sync, lookup, cache) = setup(5);
        pipeline.cache = Some(cache);
        lookup.hold_page("page-1");

        pipeline.handle(SlideEvent::IndexChanged(Some(1))).await;
        pipeline.handle(SlideEvent::IndexChanged(Some(2))).await;
        wait_for_url(&sync, "https://thumbs/pres-1/page-2.png").await;

        lookup.release_page("page-1");
        pipeline.settle().await;

        assert_eq!(
            sync.current().unwrap().slide_thumbnail_url.as_deref(),
            Some("https://thumbs/pres-1/page-2.png")
        );
        assert!(lookup.thumbnail_calls().contains(&"page-1".to_string()));
    }
}
