use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Live,
    Ended,
}

#[derive(Debug)]
struct TrackInner {
    id: String,
    kind: TrackKind,
    enabled: AtomicBool,
    ready: watch::Sender<ReadyState>,
}

/// Handle to one captured audio or video track.
///
/// Clones share the same underlying track: muting or stopping through one
/// handle is visible through all of them.
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind) -> Self {
        let (ready, _) = watch::channel(ReadyState::Live);
        Self {
            inner: Arc::new(TrackInner {
                id: Uuid::new_v4().to_string(),
                kind,
                enabled: AtomicBool::new(true),
                ready,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    /// Mute or unmute. The track keeps running either way.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn ready_state(&self) -> ReadyState {
        *self.inner.ready.borrow()
    }

    pub fn is_live(&self) -> bool {
        self.ready_state() == ReadyState::Live
    }

    /// Release the capture device. Irreversible.
    pub fn stop(&self) {
        self.inner.ready.send_replace(ReadyState::Ended);
    }

    /// Resolves once the track has ended, whoever ended it.
    pub async fn ended(&self) {
        let mut rx = self.inner.ready.subscribe();
        let _ = rx.wait_for(|state| *state == ReadyState::Ended).await;
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("enabled", &self.is_enabled())
            .field("ready", &self.ready_state())
            .finish()
    }
}

/// A set of tracks sent or received together.
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn add_track(&mut self, track: MediaTrack) {
        self.tracks.push(track);
    }

    pub fn first_track(&self, kind: TrackKind) -> Option<&MediaTrack> {
        self.tracks.iter().find(|track| track.kind() == kind)
    }

    pub fn first_audio(&self) -> Option<&MediaTrack> {
        self.first_track(TrackKind::Audio)
    }

    pub fn first_video(&self) -> Option<&MediaTrack> {
        self.first_track(TrackKind::Video)
    }

    /// A stream is active while at least one track is live.
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }

    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    /// Resolves once every track has ended.
    pub async fn inactive(&self) {
        for track in &self.tracks {
            track.ended().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_track_state() {
        let track = MediaTrack::new(TrackKind::Video);
        let other = track.clone();
        other.set_enabled(false);
        other.stop();
        assert!(!track.is_enabled());
        assert_eq!(track.ready_state(), ReadyState::Ended);
    }

    #[tokio::test]
    async fn stream_goes_inactive_when_all_tracks_end() {
        let stream = MediaStream::new(vec![
            MediaTrack::new(TrackKind::Audio),
            MediaTrack::new(TrackKind::Video),
        ]);
        stream.tracks()[0].stop();
        assert!(stream.is_active());

        stream.tracks()[1].stop();
        assert!(!stream.is_active());
        stream.inactive().await;
    }

    #[tokio::test]
    async fn ended_resolves_after_stop_from_another_task() {
        let track = MediaTrack::new(TrackKind::Video);
        let remote = track.clone();
        let waiter = tokio::spawn(async move { track.ended().await });
        tokio::task::yield_now().await;
        remote.stop();
        waiter.await.unwrap();
    }
}
