use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

use super::store::{Collection, PresenceStore};
use crate::error::StoreError;

/// Collection holding every connected participant of the hub.
pub const USERS_COLLECTION: &str = "users";

/// Parent of the per-group room membership collections.
pub const ROOMS_COLLECTION: &str = "rooms";

pub fn user_path(peer_id: &str) -> String {
    format!("{}/{}", USERS_COLLECTION, peer_id)
}

pub fn room_collection(group: &str) -> String {
    format!("{}/{}", ROOMS_COLLECTION, group)
}

pub fn room_member_path(group: &str, peer_id: &str) -> String {
    format!("{}/{}", room_collection(group), peer_id)
}

/// Who the local participant is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantProfile {
    pub peer_id: String,
    pub display_name: String,
    pub group: String,
    pub class_no: Option<u32>,
    pub table_no: Option<u32>,
}

impl ParticipantProfile {
    pub fn new(peer_id: impl Into<String>, display_name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            display_name: display_name.into(),
            group: group.into(),
            class_no: None,
            table_no: None,
        }
    }
}

/// Publishes the local participant into the realtime roster.
///
/// Both records are registered for removal on disconnect, so a crashed client
/// disappears from the roster without running any code.
pub struct SessionPresenceRegistry {
    store: Arc<dyn PresenceStore>,
    profile: ParticipantProfile,
}

impl SessionPresenceRegistry {
    pub fn new(store: Arc<dyn PresenceStore>, profile: ParticipantProfile) -> Self {
        Self { store, profile }
    }

    pub fn profile(&self) -> &ParticipantProfile {
        &self.profile
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.profile.display_name = name.into();
        info!("Display name set to {}", self.profile.display_name);
    }

    pub fn set_class(&mut self, class_no: u32) {
        self.profile.class_no = Some(class_no);
    }

    pub fn set_table(&mut self, table_no: u32) {
        self.profile.table_no = Some(table_no);
    }

    /// Register in the global roster only.
    pub async fn register_user(&self) -> Result<(), StoreError> {
        let path = user_path(&self.profile.peer_id);
        self.store.set(&path, &self.profile.display_name).await?;
        self.store.on_disconnect_remove(&path).await
    }

    /// Register in the global roster and in the group's room membership.
    pub async fn register(&self) -> Result<(), StoreError> {
        let room_path = room_member_path(&self.profile.group, &self.profile.peer_id);
        self.store.set(&room_path, &self.profile.display_name).await?;
        self.store.on_disconnect_remove(&room_path).await?;
        self.register_user().await?;
        info!(
            "Presence registered for {} ({}) in group {}",
            self.profile.peer_id, self.profile.display_name, self.profile.group
        );
        Ok(())
    }

    /// Drop the group membership record; the global roster entry stays.
    pub async fn leave_room(&self) -> Result<(), StoreError> {
        let path = room_member_path(&self.profile.group, &self.profile.peer_id);
        self.store.remove(&path).await.map_err(|e| {
            error!("Failed to remove room membership {}: {}", path, e);
            e
        })
    }

    /// Remove both records written by [`register`](Self::register).
    pub async fn unregister(&self) -> Result<(), StoreError> {
        self.leave_room().await?;
        let path = user_path(&self.profile.peer_id);
        self.store.remove(&path).await.map_err(|e| {
            error!("Failed to remove roster entry {}: {}", path, e);
            e
        })
    }

    /// Live peer id → display name map of every connected participant.
    pub fn roster(&self) -> watch::Receiver<Collection> {
        self.store.watch(USERS_COLLECTION)
    }

    /// Live membership of `group`'s room.
    pub fn room_members(&self, group: &str) -> watch::Receiver<Collection> {
        self.store.watch(&room_collection(group))
    }
}
