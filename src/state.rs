use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::error::StoreError;
use crate::presence::RealtimeDb;
use crate::slides::{SlideController, SlideLookup, ThumbnailPipeline};
use crate::sync::{LoroDocumentStore, PresentationSync, SharedSessionState};

/// Everything the HTTP handlers share.
#[derive(Clone)]
pub struct AppState {
    pub sync: PresentationSync,
    pub documents: Arc<LoroDocumentStore>,
    pub realtime: Arc<RealtimeDb>,
    pub slides: Arc<Mutex<SlideController>>,
    pub session_group: String,
    ws_connections: Arc<AtomicUsize>,
}

impl AppState {
    /// Seed the session document, wire the slide console to a thumbnail
    /// pipeline and return the pipeline task.
    pub fn build(config: &Config, lookup: Arc<dyn SlideLookup>) -> Result<(Self, JoinHandle<()>), StoreError> {
        let initial = SharedSessionState {
            group_table: config.initial_group_table(),
            ..SharedSessionState::default()
        };
        let documents = Arc::new(LoroDocumentStore::with_state(&initial)?);
        let sync = PresentationSync::new(documents.clone());

        let (controller, events) = SlideController::new(lookup, config.thumbnail_cache_capacity);
        let pipeline = tokio::spawn(ThumbnailPipeline::new(sync.clone()).run(events));

        info!(
            "Session hub state ready for group '{}' ({} tables)",
            config.session_group,
            initial.group_table.len()
        );

        let state = Self {
            sync,
            documents,
            realtime: RealtimeDb::new(),
            slides: Arc::new(Mutex::new(controller)),
            session_group: config.session_group.clone(),
            ws_connections: Arc::new(AtomicUsize::new(0)),
        };
        Ok((state, pipeline))
    }

    pub fn ws_connections(&self) -> usize {
        self.ws_connections.load(Ordering::SeqCst)
    }

    pub(crate) fn ws_opened(&self) -> usize {
        self.ws_connections.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn ws_closed(&self) -> usize {
        self.ws_connections.fetch_sub(1, Ordering::SeqCst).saturating_sub(1)
    }
}
