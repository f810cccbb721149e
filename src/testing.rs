//! In-memory stand-ins for the slide service, capture devices and the room provider.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{MediaAcquisitionError, RemoteFetchError, RoomOperationError};
use crate::media::{
    MediaDevices, MediaKind, MediaStream, MediaTrack, RoomEvent, RoomEvents, RoomHandle, RoomMode,
    RoomOptions, RoomProvider, TrackKind,
};
use crate::slides::{SlideListing, SlideLookup};

// ---------------------------------------------------------------------------
// Slide service
// ---------------------------------------------------------------------------

/// Serves decks of `page-{i}` slides with predictable thumbnail URLs.
#[derive(Default)]
pub struct FakeLookup {
    decks: HashMap<String, SlideListing>,
    failing: Mutex<HashSet<String>>,
    held: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeLookup {
    pub fn with_deck(presentation_id: &str, title: &str, len: usize) -> Self {
        Self::default().and_deck(presentation_id, title, len)
    }

    pub fn and_deck(mut self, presentation_id: &str, title: &str, len: usize) -> Self {
        self.decks.insert(
            presentation_id.to_string(),
            SlideListing {
                slide_object_ids: (0..len).map(|i| format!("page-{}", i)).collect(),
                title: title.to_string(),
            },
        );
        self
    }

    pub fn listing(&self, presentation_id: &str) -> Option<SlideListing> {
        self.decks.get(presentation_id).cloned()
    }

    /// Page ids of every thumbnail request, in call order, failed ones included.
    pub fn thumbnail_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_page(&self, page_object_id: &str) {
        self.failing.lock().unwrap().insert(page_object_id.to_string());
    }

    pub fn heal_page(&self, page_object_id: &str) {
        self.failing.lock().unwrap().remove(page_object_id);
    }

    /// Thumbnail requests for `page_object_id` stall until released.
    pub fn hold_page(&self, page_object_id: &str) {
        self.held.lock().unwrap().insert(page_object_id.to_string());
    }

    pub fn release_page(&self, page_object_id: &str) {
        self.held.lock().unwrap().remove(page_object_id);
    }
}

#[async_trait]
impl SlideLookup for FakeLookup {
    async fn fetch_deck(&self, presentation_id: &str) -> Result<SlideListing, RemoteFetchError> {
        self.listing(presentation_id).ok_or_else(|| RemoteFetchError::Provider {
            status: 404,
            message: "presentation not found".into(),
        })
    }

    async fn fetch_thumbnail(
        &self,
        presentation_id: &str,
        page_object_id: &str,
    ) -> Result<String, RemoteFetchError> {
        self.calls.lock().unwrap().push(page_object_id.to_string());
        tokio::task::yield_now().await;
        loop {
            let held = self.held.lock().unwrap().contains(page_object_id);
            if !held {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        if self.failing.lock().unwrap().contains(page_object_id) {
            return Err(RemoteFetchError::Transport("connection reset".into()));
        }
        Ok(format!("https://thumbs/{}/{}.png", presentation_id, page_object_id))
    }
}

// ---------------------------------------------------------------------------
// Capture devices
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeDevices {
    denied: Mutex<HashSet<MediaKind>>,
    acquired: Mutex<Vec<MediaKind>>,
    issued: Mutex<Vec<MediaStream>>,
}

impl FakeDevices {
    pub fn deny(&self, kind: MediaKind) {
        self.denied.lock().unwrap().insert(kind);
    }

    pub fn allow(&self, kind: MediaKind) {
        self.denied.lock().unwrap().remove(&kind);
    }

    /// Kinds of every successful acquisition, in order.
    pub fn acquired_kinds(&self) -> Vec<MediaKind> {
        self.acquired.lock().unwrap().clone()
    }

    /// Every stream handed out so far.
    pub fn issued(&self) -> Vec<MediaStream> {
        self.issued.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDevices for FakeDevices {
    async fn acquire(&self, kind: MediaKind) -> Result<MediaStream, MediaAcquisitionError> {
        if self.denied.lock().unwrap().contains(&kind) {
            return Err(MediaAcquisitionError::PermissionDenied(kind.label().into()));
        }
        let mut tracks = Vec::new();
        if kind.wants_audio() {
            tracks.push(MediaTrack::new(TrackKind::Audio));
        }
        if kind.video_constraints().is_some() {
            tracks.push(MediaTrack::new(TrackKind::Video));
        }
        let stream = MediaStream::new(tracks);
        self.acquired.lock().unwrap().push(kind);
        self.issued.lock().unwrap().push(stream.clone());
        Ok(stream)
    }
}

// ---------------------------------------------------------------------------
// Room provider
// ---------------------------------------------------------------------------

/// A joined room as seen from the provider side.
pub struct FakeRoom {
    pub room_id: String,
    pub mode: RoomMode,
    events: mpsc::UnboundedSender<RoomEvent>,
    current: Mutex<MediaStream>,
    replaced: Mutex<Vec<MediaStream>>,
    sent: Mutex<Vec<String>>,
    closed: Mutex<bool>,
}

impl FakeRoom {
    pub fn current_stream(&self) -> Option<MediaStream> {
        Some(self.current.lock().unwrap().clone())
    }

    pub fn replaced_streams(&self) -> Vec<MediaStream> {
        self.replaced.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

struct SharedRoom(Arc<FakeRoom>);

#[async_trait]
impl RoomHandle for SharedRoom {
    async fn replace_stream(&self, stream: MediaStream) -> Result<(), RoomOperationError> {
        *self.0.current.lock().unwrap() = stream.clone();
        self.0.replaced.lock().unwrap().push(stream);
        Ok(())
    }

    async fn send(&self, data: &str) -> Result<(), RoomOperationError> {
        self.0.sent.lock().unwrap().push(data.to_string());
        Ok(())
    }

    async fn close(&self) {
        *self.0.closed.lock().unwrap() = true;
    }
}

pub struct FakeRoomProvider {
    peer_id: String,
    rooms: Mutex<Vec<Arc<FakeRoom>>>,
    fail_join: Mutex<bool>,
}

impl FakeRoomProvider {
    pub fn new(peer_id: &str) -> Self {
        Self {
            peer_id: peer_id.to_string(),
            rooms: Mutex::new(Vec::new()),
            fail_join: Mutex::new(false),
        }
    }

    pub fn fail_join(&self, fail: bool) {
        *self.fail_join.lock().unwrap() = fail;
    }

    pub fn joined_rooms(&self) -> Vec<(String, RoomMode)> {
        self.rooms
            .lock()
            .unwrap()
            .iter()
            .map(|room| (room.room_id.clone(), room.mode))
            .collect()
    }

    /// The most recently joined room.
    pub fn room(&self) -> Arc<FakeRoom> {
        self.rooms.lock().unwrap().last().cloned().expect("no room joined")
    }

    /// Deliver `event` to the most recently joined room.
    pub fn emit(&self, event: RoomEvent) {
        let _ = self.room().events.send(event);
    }
}

#[async_trait]
impl RoomProvider for FakeRoomProvider {
    fn peer_id(&self) -> String {
        self.peer_id.clone()
    }

    async fn join_room(
        &self,
        room_id: &str,
        options: RoomOptions,
    ) -> Result<(Box<dyn RoomHandle>, RoomEvents), RoomOperationError> {
        if *self.fail_join.lock().unwrap() {
            return Err(RoomOperationError::Provider("signaling server unreachable".into()));
        }
        let (events, rx) = mpsc::unbounded_channel();
        let room = Arc::new(FakeRoom {
            room_id: room_id.to_string(),
            mode: options.mode,
            events,
            current: Mutex::new(options.stream),
            replaced: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
        });
        self.rooms.lock().unwrap().push(room.clone());
        Ok((Box::new(SharedRoom(room)), rx))
    }
}
