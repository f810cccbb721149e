use async_trait::async_trait;
use loro::{ExportMode, LoroDoc, LoroList, LoroMap, ToJson};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, error};

use super::state::{SessionStatePatch, SharedSessionState};
use crate::error::StoreError;

/// Root map holding the session fields inside the loro document.
const STATUS_MAP: &str = "status";

/// A realtime document shared by one session group.
///
/// `update` merges the fields present in the patch and leaves the rest alone.
/// `subscribe` hands out a receiver that always holds the latest merged snapshot;
/// `None` means the document does not exist (yet) or cannot be read.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn update(&self, patch: &SessionStatePatch) -> Result<(), StoreError>;

    fn subscribe(&self) -> watch::Receiver<Option<SharedSessionState>>;
}

/// Document store backed by a loro CRDT document.
///
/// Every top-level field is its own map key, so concurrent writers converge with
/// last-writer-wins per field. Replicas exchange state through
/// [`export_snapshot`](Self::export_snapshot) and [`import`](Self::import).
pub struct LoroDocumentStore {
    doc: Mutex<LoroDoc>,
    snapshots: watch::Sender<Option<SharedSessionState>>,
}

impl LoroDocumentStore {
    /// An empty document. Subscribers see `None` until the first write.
    pub fn new() -> Self {
        let (snapshots, _) = watch::channel(None);
        Self {
            doc: Mutex::new(LoroDoc::new()),
            snapshots,
        }
    }

    /// A document seeded with every field of `state`.
    pub fn with_state(state: &SharedSessionState) -> Result<Self, StoreError> {
        let store = Self::new();
        store.apply(&SessionStatePatch::full(state))?;
        Ok(store)
    }

    /// Export the whole document so another replica can import it.
    pub fn export_snapshot(&self) -> Result<Vec<u8>, StoreError> {
        let doc = self.lock_doc()?;
        doc.export(ExportMode::Snapshot)
            .map_err(|e| StoreError::Document(format!("Failed to export document: {}", e)))
    }

    /// Merge a snapshot or update exported by another replica.
    pub fn import(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let doc = self.lock_doc()?;
        doc.import(bytes)
            .map_err(|e| StoreError::Document(format!("Failed to import document: {}", e)))?;
        // Publish under the lock so snapshots leave in commit order.
        self.snapshots.send_replace(read_snapshot(&doc));
        Ok(())
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.snapshots.receiver_count()
    }

    fn lock_doc(&self) -> Result<MutexGuard<'_, LoroDoc>, StoreError> {
        self.doc
            .lock()
            .map_err(|_| StoreError::Document("document lock poisoned".to_string()))
    }

    fn apply(&self, patch: &SessionStatePatch) -> Result<(), StoreError> {
        let doc = self.lock_doc()?;
        let status = doc.get_map(STATUS_MAP);

        if let Some(style) = &patch.style {
            let style_map = status
                .get_or_create_container("style", LoroMap::new())
                .map_err(doc_err)?;
            if let Some(mode) = style.slide_mode {
                style_map.insert("slide", mode.as_str()).map_err(doc_err)?;
            }
            if let Some(mode) = style.yt_live_mode {
                style_map.insert("ytlive", mode.as_str()).map_err(doc_err)?;
            }
        }
        if let Some(id) = &patch.youtube_id {
            status.insert("ytid", id.as_str()).map_err(doc_err)?;
        }
        if let Some(url) = &patch.slide_thumbnail_url {
            status.insert("slideURL", url.as_str()).map_err(doc_err)?;
        }
        if let Some(table) = &patch.group_table {
            // The table is replaced as one value so a stale writer cannot interleave names.
            let list = status
                .insert_container("table", LoroList::new())
                .map_err(doc_err)?;
            for name in table {
                list.push(name.as_str()).map_err(doc_err)?;
            }
        }
        if let Some(target) = &patch.target {
            let target_map = status
                .get_or_create_container("target", LoroMap::new())
                .map_err(doc_err)?;
            for (name, flag) in target {
                target_map.insert(name, *flag).map_err(doc_err)?;
            }
        }
        if let Some(text) = &patch.fixed_text {
            status.insert("fixedText", text.as_str()).map_err(doc_err)?;
        }
        doc.commit();

        self.snapshots.send_replace(read_snapshot(&doc));
        Ok(())
    }
}

impl Default for LoroDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for LoroDocumentStore {
    async fn update(&self, patch: &SessionStatePatch) -> Result<(), StoreError> {
        debug!("Merging session state patch: {:?}", patch);
        self.apply(patch)
    }

    fn subscribe(&self) -> watch::Receiver<Option<SharedSessionState>> {
        self.snapshots.subscribe()
    }
}

fn doc_err(e: loro::LoroError) -> StoreError {
    StoreError::Document(e.to_string())
}

fn read_snapshot(doc: &LoroDoc) -> Option<SharedSessionState> {
    let value = doc.get_deep_value().to_json_value();
    let status = value.get(STATUS_MAP)?;
    if status.as_object().map_or(true, |fields| fields.is_empty()) {
        return None;
    }
    match SharedSessionState::from_json(status.clone()) {
        Ok(state) => Some(state),
        Err(e) => {
            error!("Failed to decode session state document: {}", e);
            None
        }
    }
}
