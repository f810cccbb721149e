use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error};

use super::state::{LiveMode, SessionStatePatch, SharedSessionState, SlideMode, SlideStylePatch};
use super::store::DocumentStore;
use crate::error::{StoreError, SyncUnavailable};

/// What a subscriber receives for every change of the shared document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncUpdate {
    Snapshot(SharedSessionState),
    /// The document is missing or unreachable. Keep local fields as they are.
    Unavailable(SyncUnavailable),
}

/// Reads and writes the shared presentation state of one session group.
///
/// Masters call the `set_*` helpers (or [`publish`](Self::publish)); every role
/// calls [`subscribe`](Self::subscribe). Each helper writes only its own field.
#[derive(Clone)]
pub struct PresentationSync {
    store: Arc<dyn DocumentStore>,
}

impl PresentationSync {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Merge a partial update into the shared document.
    pub async fn publish(&self, patch: SessionStatePatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            debug!("Skipping empty session state patch");
            return Ok(());
        }
        self.store.update(&patch).await.map_err(|e| {
            error!("Failed to publish session state: {}", e);
            e
        })
    }

    /// Stream of merged snapshots, starting with the current one.
    pub fn subscribe(&self) -> SessionStateStream {
        SessionStateStream {
            rx: self.store.subscribe(),
            delivered_current: false,
        }
    }

    /// The latest merged snapshot.
    pub fn current(&self) -> Result<SharedSessionState, SyncUnavailable> {
        self.store.subscribe().borrow().clone().ok_or(SyncUnavailable)
    }

    /// Whether a locally edited group table differs from the shared one.
    pub fn group_table_changed(&self, local: &[String]) -> bool {
        match self.current() {
            Ok(state) => state.group_table.as_slice() != local,
            Err(_) => !local.is_empty(),
        }
    }

    pub async fn set_slide_style(&self, mode: SlideMode) -> Result<(), StoreError> {
        self.publish(SessionStatePatch {
            style: Some(SlideStylePatch {
                slide_mode: Some(mode),
                yt_live_mode: None,
            }),
            ..Default::default()
        })
        .await
    }

    pub async fn set_live_mode(&self, mode: LiveMode) -> Result<(), StoreError> {
        self.publish(SessionStatePatch {
            style: Some(SlideStylePatch {
                slide_mode: None,
                yt_live_mode: Some(mode),
            }),
            ..Default::default()
        })
        .await
    }

    /// An empty id clears the embedded stream.
    pub async fn set_youtube_id(&self, id: &str) -> Result<(), StoreError> {
        self.publish(SessionStatePatch {
            youtube_id: Some(id.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn set_slide_thumbnail_url(&self, url: &str) -> Result<(), StoreError> {
        self.publish(SessionStatePatch {
            slide_thumbnail_url: Some(url.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn set_fixed_text(&self, text: &str) -> Result<(), StoreError> {
        self.publish(SessionStatePatch {
            fixed_text: Some(text.to_string()),
            ..Default::default()
        })
        .await
    }

    pub async fn set_group_table(&self, table: Vec<String>) -> Result<(), StoreError> {
        self.publish(SessionStatePatch {
            group_table: Some(table),
            ..Default::default()
        })
        .await
    }

    pub async fn set_target(&self, target: BTreeMap<String, bool>) -> Result<(), StoreError> {
        self.publish(SessionStatePatch {
            target: Some(target),
            ..Default::default()
        })
        .await
    }
}

/// Subscription handle returned by [`PresentationSync::subscribe`].
pub struct SessionStateStream {
    rx: watch::Receiver<Option<SharedSessionState>>,
    delivered_current: bool,
}

impl SessionStateStream {
    /// Next snapshot. Returns `None` once the store is gone.
    pub async fn next(&mut self) -> Option<SyncUpdate> {
        if self.delivered_current {
            self.rx.changed().await.ok()?;
        }
        self.delivered_current = true;
        let snapshot = self.rx.borrow_and_update().clone();
        Some(match snapshot {
            Some(state) => SyncUpdate::Snapshot(state),
            None => {
                error!("Unable to get shared session state");
                SyncUpdate::Unavailable(SyncUnavailable)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::store::LoroDocumentStore;

    fn seeded_sync() -> PresentationSync {
        let mut seed = SharedSessionState::default();
        seed.group_table = vec!["Table 1".into(), "Table 2".into()];
        seed.fixed_text = "before".into();
        PresentationSync::new(Arc::new(LoroDocumentStore::with_state(&seed).unwrap()))
    }

    #[tokio::test]
    async fn publishing_fixed_text_twice_leaves_other_fields() {
        let sync = seeded_sync();
        let before = sync.current().unwrap();

        sync.set_fixed_text("x").await.unwrap();
        sync.set_fixed_text("x").await.unwrap();

        let after = sync.current().unwrap();
        assert_eq!(after.fixed_text, "x");
        assert_eq!(after.group_table, before.group_table);
        assert_eq!(after.style, before.style);
        assert_eq!(after.target, before.target);
        assert_eq!(after.youtube_id, before.youtube_id);
        assert_eq!(after.slide_thumbnail_url, before.slide_thumbnail_url);
    }

    #[tokio::test]
    async fn subscribe_starts_with_current_snapshot() {
        let sync = seeded_sync();
        let mut stream = sync.subscribe();

        match stream.next().await {
            Some(SyncUpdate::Snapshot(state)) => assert_eq!(state.fixed_text, "before"),
            other => panic!("unexpected update: {:?}", other),
        }

        sync.set_slide_thumbnail_url("https://thumbs/3.png").await.unwrap();
        match stream.next().await {
            Some(SyncUpdate::Snapshot(state)) => {
                assert_eq!(state.slide_thumbnail_url.as_deref(), Some("https://thumbs/3.png"));
                assert_eq!(state.fixed_text, "before");
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_document_signals_unavailable() {
        let sync = PresentationSync::new(Arc::new(LoroDocumentStore::new()));
        let mut stream = sync.subscribe();
        assert_eq!(stream.next().await, Some(SyncUpdate::Unavailable(SyncUnavailable)));
        assert_eq!(sync.current(), Err(SyncUnavailable));
    }

    #[tokio::test]
    async fn live_mode_helper_keeps_slide_mode() {
        let sync = seeded_sync();
        sync.set_slide_style(SlideMode::Half).await.unwrap();
        sync.set_live_mode(LiveMode::Hidden).await.unwrap();

        let state = sync.current().unwrap();
        assert_eq!(state.style.slide_mode, SlideMode::Half);
        assert_eq!(state.style.yt_live_mode, LiveMode::Hidden);
    }

    #[tokio::test]
    async fn clearing_youtube_id_reads_back_as_none() {
        let sync = seeded_sync();
        sync.set_youtube_id("abc").await.unwrap();
        assert_eq!(sync.current().unwrap().youtube_id.as_deref(), Some("abc"));
        sync.set_youtube_id("").await.unwrap();
        assert_eq!(sync.current().unwrap().youtube_id, None);
    }

    #[tokio::test]
    async fn group_table_dirty_check() {
        let sync = seeded_sync();
        let mut local = vec!["Table 1".to_string(), "Table 2".to_string()];
        assert!(!sync.group_table_changed(&local));

        local[1] = "Renamed".into();
        assert!(sync.group_table_changed(&local));

        sync.set_group_table(local.clone()).await.unwrap();
        assert!(!sync.group_table_changed(&local));
    }

    #[tokio::test]
    async fn empty_patch_is_a_no_op() {
        let sync = seeded_sync();
        let before = sync.current().unwrap();
        sync.publish(SessionStatePatch::default()).await.unwrap();
        assert_eq!(sync.current().unwrap(), before);
    }
}
