//! Media room lifecycle and the camera/screen-share hand-off.

use std::mem;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::devices::{MediaDevices, MediaKind};
use super::room::{RoomEvent, RoomEvents, RoomHandle, RoomMode, RoomOptions, RoomProvider};
use super::stream::MediaStream;
use crate::error::{MediaAcquisitionError, RoomOperationError, SessionError};
use crate::presence::{Collection, SessionPresenceRegistry};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    Closed,
}

/// What the user asked for, not necessarily what the tracks are doing mid hand-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMediaState {
    pub audio: bool,
    pub video: bool,
    pub screen: bool,
}

impl Default for LocalMediaState {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
            screen: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteParticipant {
    pub id: String,
    pub stream: MediaStream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMessage {
    pub sender_id: String,
    pub data: String,
}

/// Input of the manager besides direct calls.
#[derive(Debug, Clone)]
pub enum SessionSignal {
    Room(RoomEvent),
    /// The shared screen stopped from outside (OS dialog, window closed).
    ScreenCaptureEnded { stream_id: String },
}

/// Outgoing stream sub-state. Leaving `ScreenSharing` aborts its listener.
enum Outgoing {
    Camera,
    ScreenSharing { listener: JoinHandle<()> },
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Owns one participant's membership in a media room.
///
/// All mutation goes through `&mut self`, so room events, screen-capture
/// signals and user commands are applied one at a time in arrival order.
pub struct MediaSessionManager {
    devices: Arc<dyn MediaDevices>,
    provider: Arc<dyn RoomProvider>,
    presence: SessionPresenceRegistry,

    state: watch::Sender<SessionState>,
    local_state: watch::Sender<LocalMediaState>,
    roster: watch::Sender<Vec<RemoteParticipant>>,
    local_streams: broadcast::Sender<MediaStream>,
    data_messages: broadcast::Sender<DataMessage>,

    participants: Vec<RemoteParticipant>,
    local_stream: Option<MediaStream>,
    outgoing: Outgoing,
    room_id: Option<String>,
    room: Option<Box<dyn RoomHandle>>,
    room_events: Option<RoomEvents>,
    signals_tx: mpsc::UnboundedSender<SessionSignal>,
    signals_rx: mpsc::UnboundedReceiver<SessionSignal>,
}

impl MediaSessionManager {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        provider: Arc<dyn RoomProvider>,
        presence: SessionPresenceRegistry,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        let (local_state, _) = watch::channel(LocalMediaState::default());
        let (roster, _) = watch::channel(Vec::new());
        let (local_streams, _) = broadcast::channel(16);
        let (data_messages, _) = broadcast::channel(256);
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        Self {
            devices,
            provider,
            presence,
            state,
            local_state,
            roster,
            local_streams,
            data_messages,
            participants: Vec::new(),
            local_stream: None,
            outgoing: Outgoing::Camera,
            room_id: None,
            room: None,
            room_events: None,
            signals_tx,
            signals_rx,
        }
    }

    // -- Observers ----------------------------------------------------------

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn local_state(&self) -> LocalMediaState {
        *self.local_state.borrow()
    }

    pub fn local_stream(&self) -> Option<&MediaStream> {
        self.local_stream.as_ref()
    }

    pub fn participants(&self) -> &[RemoteParticipant] {
        &self.participants
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn is_screen_sharing(&self) -> bool {
        matches!(self.outgoing, Outgoing::ScreenSharing { .. })
    }

    pub fn presence(&self) -> &SessionPresenceRegistry {
        &self.presence
    }

    pub fn presence_mut(&mut self) -> &mut SessionPresenceRegistry {
        &mut self.presence
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn subscribe_local_state(&self) -> watch::Receiver<LocalMediaState> {
        self.local_state.subscribe()
    }

    pub fn subscribe_roster(&self) -> watch::Receiver<Vec<RemoteParticipant>> {
        self.roster.subscribe()
    }

    /// Every stream that becomes the local outgoing stream.
    pub fn subscribe_local_stream(&self) -> broadcast::Receiver<MediaStream> {
        self.local_streams.subscribe()
    }

    pub fn subscribe_data(&self) -> broadcast::Receiver<DataMessage> {
        self.data_messages.subscribe()
    }

    /// Peer id → display name of everyone connected to the realtime store.
    pub fn user_roster(&self) -> watch::Receiver<Collection> {
        self.presence.roster()
    }

    pub(crate) fn local_stream_sender(&self) -> broadcast::Sender<MediaStream> {
        self.local_streams.clone()
    }

    pub(crate) fn data_sender(&self) -> broadcast::Sender<DataMessage> {
        self.data_messages.clone()
    }

    // -- Room lifecycle -----------------------------------------------------

    /// Acquire the webcam, register presence and join `room_id`.
    ///
    /// Leaves the session in `Connecting`; the room's `Open` event completes
    /// the transition. Any failure leaves nothing acquired or registered.
    pub async fn join(&mut self, room_id: &str) -> Result<(), SessionError> {
        match self.state() {
            SessionState::Idle | SessionState::Closed => {}
            _ => {
                warn!("Join of {} requested while already in a room", room_id);
                return Err(RoomOperationError::AlreadyJoined(room_id.to_string()).into());
            }
        }
        info!("Joining room {}", room_id);

        let stream = self.devices.acquire(MediaKind::WebCam).await.map_err(|e| {
            error!("Failed to acquire webcam for room {}: {}", room_id, e);
            e
        })?;

        if let Err(e) = self.presence.register().await {
            error!("Failed to register presence for room {}: {}", room_id, e);
            stream.stop_all();
            return Err(e.into());
        }

        let options = RoomOptions {
            mode: RoomMode::Sfu,
            stream: stream.clone(),
        };
        let (room, events) = match self.provider.join_room(room_id, options).await {
            Ok(joined) => joined,
            Err(e) => {
                error!("Failed to join room {}: {}", room_id, e);
                stream.stop_all();
                let _ = self.presence.unregister().await;
                return Err(e.into());
            }
        };

        self.local_stream = Some(stream.clone());
        self.apply_local_state();
        let _ = self.local_streams.send(stream);
        self.room = Some(room);
        self.room_events = Some(events);
        self.room_id = Some(room_id.to_string());
        self.state.send_replace(SessionState::Connecting);
        Ok(())
    }

    /// Leave the room and release everything tied to it.
    pub async fn exit_room(&mut self) -> Result<(), SessionError> {
        if !matches!(self.state(), SessionState::Connecting | SessionState::Connected) {
            error!("exit_room called without a room");
            return Err(RoomOperationError::RoomNotPresent("exit_room").into());
        }
        if let Some(room) = self.room.take() {
            room.close().await;
        }
        self.teardown().await;
        Ok(())
    }

    pub async fn send_message(&self, data: &str) -> Result<(), SessionError> {
        let Some(room) = &self.room else {
            error!("send_message called without a room");
            return Err(RoomOperationError::RoomNotPresent("send_message").into());
        };
        room.send(data).await?;
        debug!("{}: {}", self.provider.peer_id(), data);
        Ok(())
    }

    async fn teardown(&mut self) {
        self.room = None;
        self.room_events = None;

        self.participants.clear();
        self.roster.send_replace(Vec::new());

        self.detach_screen_listener();
        if let Some(stream) = self.local_stream.take() {
            stream.stop_all();
        }
        self.local_state.send_modify(|state| state.screen = false);

        if let Err(e) = self.presence.leave_room().await {
            warn!("Room membership record not removed: {}", e);
        }
        info!("Left room {}", self.room_id.take().unwrap_or_default());
        self.state.send_replace(SessionState::Closed);
    }

    // -- Event handling -----------------------------------------------------

    /// Wait for the next room event or screen-capture signal.
    ///
    /// Pending forever while no room is joined and no signal is queued.
    pub async fn next_signal(&mut self) -> SessionSignal {
        enum Next {
            Signal(SessionSignal),
            Room(Option<RoomEvent>),
        }

        let next = {
            let signals = &mut self.signals_rx;
            let room_events = &mut self.room_events;
            tokio::select! {
                Some(signal) = signals.recv() => Next::Signal(signal),
                event = recv_room_event(room_events) => Next::Room(event),
            }
        };

        match next {
            Next::Signal(signal) => signal,
            Next::Room(Some(event)) => SessionSignal::Room(event),
            Next::Room(None) => {
                // The provider dropped its side of the room.
                self.room_events = None;
                SessionSignal::Room(RoomEvent::Close)
            }
        }
    }

    pub async fn handle_signal(&mut self, signal: SessionSignal) {
        match signal {
            SessionSignal::Room(event) => self.handle_room_event(event).await,
            SessionSignal::ScreenCaptureEnded { stream_id } => {
                let current = self.local_stream.as_ref().map(|s| s.id().to_string());
                if !self.is_screen_sharing() || current.as_deref() != Some(stream_id.as_str()) {
                    debug!("Ignoring stale screen capture end for {}", stream_id);
                    return;
                }
                info!("Screen capture ended, switching back to camera");
                if let Err(e) = self.stop_screen_share().await {
                    error!("Failed to return to camera after screen capture ended: {}", e);
                }
            }
        }
    }

    async fn handle_room_event(&mut self, event: RoomEvent) {
        if self.room.is_none() && !matches!(event, RoomEvent::Close) {
            debug!("Dropping room event outside a room: {:?}", event);
            return;
        }
        match event {
            RoomEvent::Open => {
                if self.state() == SessionState::Connecting {
                    self.state.send_replace(SessionState::Connected);
                    info!("=== You joined {} ===", self.room_id.as_deref().unwrap_or_default());
                }
            }
            RoomEvent::PeerJoin(peer_id) => {
                info!("=== {} joined ===", peer_id);
            }
            RoomEvent::Stream { peer_id, stream } => {
                debug!("Stream {} received from {}", stream.id(), peer_id);
                self.participants.push(RemoteParticipant { id: peer_id, stream });
                self.publish_roster();
            }
            RoomEvent::PeerLeave(peer_id) => {
                info!("=== {} left ===", peer_id);
                let before = self.participants.len();
                self.participants.retain(|participant| participant.id != peer_id);
                if self.participants.len() == before {
                    warn!("Peer {} left without a known stream", peer_id);
                }
                self.publish_roster();
            }
            RoomEvent::Data { data, sender_id } => {
                debug!("{}: {}", sender_id, data);
                let _ = self.data_messages.send(DataMessage { sender_id, data });
            }
            RoomEvent::Close => {
                if matches!(self.state(), SessionState::Connecting | SessionState::Connected) {
                    info!("Room closed by provider");
                    self.teardown().await;
                }
            }
        }
    }

    fn publish_roster(&self) {
        self.roster.send_replace(self.participants.clone());
    }

    // -- Local media ----------------------------------------------------------

    pub fn toggle_local_audio(&mut self) {
        self.update_local_state(|state| state.audio = !state.audio);
    }

    pub fn toggle_local_video(&mut self) {
        self.update_local_state(|state| state.video = !state.video);
    }

    pub async fn toggle_screen_share(&mut self) -> Result<(), SessionError> {
        if self.is_screen_sharing() {
            self.stop_screen_share().await
        } else {
            self.start_screen_share().await
        }
    }

    /// `Camera → ScreenSharing`.
    ///
    /// If capture fails after the camera was stopped, a fresh webcam stream is
    /// acquired so the room is not left without outgoing media.
    pub async fn start_screen_share(&mut self) -> Result<(), SessionError> {
        self.require_room("start_screen_share")?;
        if self.is_screen_sharing() {
            return Ok(());
        }
        if let Some(current) = &self.local_stream {
            current.stop_all();
        }

        let (screen, audio) = tokio::join!(
            self.devices.acquire(MediaKind::Screen),
            self.devices.acquire(MediaKind::AudioOnly),
        );
        let (screen, mut stream) = match (screen, audio) {
            (Ok(screen), Ok(audio)) => (screen, audio),
            (screen, audio) => {
                let err = release_partial(screen, audio);
                error!("Screen share capture failed: {}", err);
                self.restore_camera().await;
                return Err(err.into());
            }
        };

        let Some(video) = screen.first_video().cloned() else {
            screen.stop_all();
            stream.stop_all();
            self.restore_camera().await;
            return Err(MediaAcquisitionError::Other("screen capture has no video track".into()).into());
        };
        stream.add_track(video.clone());

        if let Err(e) = self.commit_stream(stream.clone()).await {
            stream.stop_all();
            self.restore_camera().await;
            return Err(e);
        }
        self.update_local_state(|state| {
            state.video = true;
            state.screen = true;
        });

        let signals = self.signals_tx.clone();
        let listener = tokio::spawn(async move {
            tokio::select! {
                _ = stream.inactive() => {}
                _ = video.ended() => {}
            }
            let _ = signals.send(SessionSignal::ScreenCaptureEnded {
                stream_id: stream.id().to_string(),
            });
        });
        self.outgoing = Outgoing::ScreenSharing { listener };
        info!("Screen share started");
        Ok(())
    }

    /// `ScreenSharing → Camera`.
    pub async fn stop_screen_share(&mut self) -> Result<(), SessionError> {
        self.require_room("stop_screen_share")?;
        if !self.is_screen_sharing() {
            return Ok(());
        }
        info!("Stop capturing screen");
        self.detach_screen_listener();
        if let Some(current) = &self.local_stream {
            current.stop_all();
        }

        let stream = match self.devices.acquire(MediaKind::WebCam).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Failed to reacquire webcam: {}", e);
                self.local_stream = None;
                self.local_state.send_modify(|state| state.screen = false);
                return Err(e.into());
            }
        };
        self.commit_stream(stream.clone()).await.map_err(|e| {
            stream.stop_all();
            e
        })?;
        self.update_local_state(|state| {
            state.video = true;
            state.screen = false;
        });
        Ok(())
    }

    async fn restore_camera(&mut self) {
        self.local_state.send_modify(|state| state.screen = false);
        match self.devices.acquire(MediaKind::WebCam).await {
            Ok(stream) => {
                if let Err(e) = self.commit_stream(stream.clone()).await {
                    error!("Failed to restore camera stream: {}", e);
                    stream.stop_all();
                    self.local_stream = None;
                }
            }
            Err(e) => {
                error!("Camera could not be restored, no outgoing media: {}", e);
                self.local_stream = None;
            }
        }
    }

    /// Make `stream` the outgoing stream of the room and announce it locally.
    async fn commit_stream(&mut self, stream: MediaStream) -> Result<(), SessionError> {
        let room = self
            .room
            .as_ref()
            .ok_or(RoomOperationError::RoomNotPresent("replace_stream"))?;
        room.replace_stream(stream.clone()).await?;
        self.local_stream = Some(stream.clone());
        self.apply_local_state();
        let _ = self.local_streams.send(stream);
        Ok(())
    }

    fn detach_screen_listener(&mut self) {
        if let Outgoing::ScreenSharing { listener } = mem::replace(&mut self.outgoing, Outgoing::Camera) {
            listener.abort();
        }
    }

    fn require_room(&self, operation: &'static str) -> Result<(), SessionError> {
        if self.room.is_none() {
            error!("{} called without a room", operation);
            return Err(RoomOperationError::RoomNotPresent(operation).into());
        }
        Ok(())
    }

    fn update_local_state(&mut self, change: impl FnOnce(&mut LocalMediaState)) {
        self.local_state.send_modify(change);
        self.apply_local_state();
    }

    /// Mirror the mute flags onto the first audio and video track.
    fn apply_local_state(&self) {
        let state = self.local_state();
        debug!("Local media state: {:?}", state);
        let Some(stream) = &self.local_stream else {
            return;
        };
        if let Some(track) = stream.first_video() {
            track.set_enabled(state.video);
        }
        if let Some(track) = stream.first_audio() {
            track.set_enabled(state.audio);
        }
    }
}

async fn recv_room_event(events: &mut Option<RoomEvents>) -> Option<RoomEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Stop whatever half of a concurrent capture succeeded and return the failure.
fn release_partial(
    screen: Result<MediaStream, MediaAcquisitionError>,
    audio: Result<MediaStream, MediaAcquisitionError>,
) -> MediaAcquisitionError {
    match (screen, audio) {
        (Err(e), Ok(audio)) => {
            audio.stop_all();
            e
        }
        (Ok(screen), Err(e)) => {
            screen.stop_all();
            e
        }
        (Err(e), Err(_)) => e,
        (Ok(screen), Ok(audio)) => {
            screen.stop_all();
            audio.stop_all();
            MediaAcquisitionError::Other("capture released".into())
        }
    }
}
