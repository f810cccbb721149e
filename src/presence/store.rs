use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;

/// Children of one collection: key → value.
pub type Collection = BTreeMap<String, String>;

/// Connection-scoped access to a realtime key/value tree.
///
/// Paths are `/`-separated (`users/<peer>`, `rooms/<group>/<peer>`). Records
/// registered with [`on_disconnect_remove`](Self::on_disconnect_remove) are
/// removed by the store itself when this connection goes away, graceful or not.
#[async_trait]
pub trait PresenceStore: Send + Sync {
    async fn set(&self, path: &str, value: &str) -> Result<(), StoreError>;

    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    async fn on_disconnect_remove(&self, path: &str) -> Result<(), StoreError>;

    /// Live view of the direct children of `collection`.
    fn watch(&self, collection: &str) -> watch::Receiver<Collection>;
}

/// In-process realtime database shared by every connection of a hub.
#[derive(Default)]
pub struct RealtimeDb {
    records: Mutex<BTreeMap<String, String>>,
    collections: Mutex<HashMap<String, watch::Sender<Collection>>>,
}

impl RealtimeDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open a connection whose disconnect hooks fire when it is dropped.
    pub fn connect(self: &Arc<Self>) -> RealtimeConnection {
        let id = Uuid::new_v4();
        debug!("Realtime connection {} opened", id);
        RealtimeConnection {
            db: Arc::clone(self),
            id,
            disconnect_hooks: Mutex::new(HashSet::new()),
        }
    }

    pub fn get(&self, path: &str) -> Option<String> {
        lock(&self.records).get(path).cloned()
    }

    pub fn record_count(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn watch(&self, collection: &str) -> watch::Receiver<Collection> {
        let mut collections = lock(&self.collections);
        if let Some(tx) = collections.get(collection) {
            return tx.subscribe();
        }
        let (tx, rx) = watch::channel(children(&lock(&self.records), collection));
        collections.insert(collection.to_string(), tx);
        rx
    }

    fn write(&self, path: &str, value: Option<&str>) {
        // Lock order is collections, then records. Both stay held until the
        // watchers are notified so views change in write order.
        let collections = lock(&self.collections);
        let mut records = lock(&self.records);
        match value {
            Some(value) => {
                records.insert(path.to_string(), value.to_string());
            }
            None => {
                records.remove(path);
            }
        }
        if let Some((collection, _)) = path.rsplit_once('/') {
            if let Some(tx) = collections.get(collection) {
                tx.send_replace(children(&records, collection));
            }
        }
    }
}

fn children(records: &BTreeMap<String, String>, collection: &str) -> Collection {
    let prefix = format!("{}/", collection);
    records
        .iter()
        .filter_map(|(path, value)| {
            let key = path.strip_prefix(&prefix)?;
            (!key.contains('/')).then(|| (key.to_string(), value.clone()))
        })
        .collect()
}

/// One client's session with a [`RealtimeDb`].
pub struct RealtimeConnection {
    db: Arc<RealtimeDb>,
    id: Uuid,
    disconnect_hooks: Mutex<HashSet<String>>,
}

impl RealtimeConnection {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run the disconnect hooks now. Dropping the connection does the same.
    pub fn disconnect(&self) {
        let hooks: Vec<String> = lock(&self.disconnect_hooks).drain().collect();
        if !hooks.is_empty() {
            info!("Realtime connection {} closed, removing {} records", self.id, hooks.len());
        }
        for path in hooks {
            self.db.write(&path, None);
        }
    }
}

impl Drop for RealtimeConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[async_trait]
impl PresenceStore for RealtimeConnection {
    async fn set(&self, path: &str, value: &str) -> Result<(), StoreError> {
        self.db.write(path, Some(value));
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.db.write(path, None);
        Ok(())
    }

    async fn on_disconnect_remove(&self, path: &str) -> Result<(), StoreError> {
        lock(&self.disconnect_hooks).insert(path.to_string());
        Ok(())
    }

    fn watch(&self, collection: &str) -> watch::Receiver<Collection> {
        self.db.watch(collection)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Every critical section is a single map operation, so poisoning is ignored.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn watch_sees_direct_children_only() {
        let db = RealtimeDb::new();
        let conn = db.connect();
        let rooms = conn.watch("rooms/g1");

        conn.set("rooms/g1/peer-a", "Alice").await.unwrap();
        conn.set("rooms/g2/peer-b", "Bob").await.unwrap();

        let members = rooms.borrow().clone();
        assert_eq!(members.len(), 1);
        assert_eq!(members.get("peer-a").map(String::as_str), Some("Alice"));
    }

    #[tokio::test]
    async fn dropping_connection_runs_disconnect_hooks() {
        let db = RealtimeDb::new();
        let conn = db.connect();
        conn.set("users/peer-a", "Alice").await.unwrap();
        conn.on_disconnect_remove("users/peer-a").await.unwrap();
        conn.set("notes/keep", "stays").await.unwrap();

        drop(conn);

        assert_eq!(db.get("users/peer-a"), None);
        assert_eq!(db.get("notes/keep").as_deref(), Some("stays"));
    }

    #[tokio::test]
    async fn watcher_created_after_writes_starts_populated() {
        let db = RealtimeDb::new();
        let conn = db.connect();
        conn.set("users/peer-a", "Alice").await.unwrap();

        let users = db.watch("users");
        assert_eq!(users.borrow().get("peer-a").map(String::as_str), Some("Alice"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_leave_the_watch_in_sync() {
        let db = RealtimeDb::new();
        let users = db.watch("users");

        let mut writers = tokio::task::JoinSet::new();
        for writer in 0..8 {
            let db = db.clone();
            writers.spawn(async move {
                let conn = db.connect();
                let path = format!("users/peer-{}", writer);
                for round in 0..50 {
                    if round % 2 == 0 {
                        conn.set(&path, &format!("round {}", round)).await.unwrap();
                    } else {
                        conn.remove(&path).await.unwrap();
                    }
                }
            });
        }
        while let Some(result) = writers.join_next().await {
            result.unwrap();
        }

        let expected = children(&lock(&db.records), "users");
        assert_eq!(*users.borrow(), expected);
        assert!(expected.is_empty());
    }
}
