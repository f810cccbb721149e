//! Task wrapper around [`MediaSessionManager`].
//!
//! The manager runs on its own task and interleaves user commands with room
//! events; callers talk to it through a cloneable [`MediaSessionHandle`].

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::manager::{
    DataMessage, LocalMediaState, MediaSessionManager, RemoteParticipant, SessionState,
};
use super::stream::MediaStream;
use crate::error::SessionError;
use crate::presence::Collection;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

enum Command {
    Join { room_id: String, reply: Reply<()> },
    Exit { reply: Reply<()> },
    Send { data: String, reply: Reply<()> },
    ToggleScreenShare { reply: Reply<()> },
    ToggleAudio { reply: oneshot::Sender<LocalMediaState> },
    ToggleVideo { reply: oneshot::Sender<LocalMediaState> },
    SetName { name: String },
    Shutdown,
}

#[derive(Clone)]
pub struct MediaSessionHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionState>,
    local_state: watch::Receiver<LocalMediaState>,
    roster: watch::Receiver<Vec<RemoteParticipant>>,
    users: watch::Receiver<Collection>,
    local_streams: broadcast::Sender<MediaStream>,
    data_messages: broadcast::Sender<DataMessage>,
}

impl MediaSessionHandle {
    /// Move `manager` onto a new task.
    pub fn spawn(manager: MediaSessionManager) -> (Self, JoinHandle<()>) {
        let (commands, rx) = mpsc::channel(32);
        let handle = Self {
            commands,
            state: manager.subscribe_state(),
            local_state: manager.subscribe_local_state(),
            roster: manager.subscribe_roster(),
            users: manager.user_roster(),
            local_streams: manager.local_stream_sender(),
            data_messages: manager.data_sender(),
        };
        let task = tokio::spawn(run(manager, rx));
        (handle, task)
    }

    pub async fn join(&self, room_id: impl Into<String>) -> Result<(), SessionError> {
        let room_id = room_id.into();
        self.request(|reply| Command::Join { room_id, reply }).await
    }

    pub async fn exit_room(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Exit { reply }).await
    }

    pub async fn send_message(&self, data: impl Into<String>) -> Result<(), SessionError> {
        let data = data.into();
        self.request(|reply| Command::Send { data, reply }).await
    }

    pub async fn toggle_screen_share(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::ToggleScreenShare { reply }).await
    }

    pub async fn toggle_local_audio(&self) -> Result<LocalMediaState, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(Command::ToggleAudio { reply }).await?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    pub async fn toggle_local_video(&self) -> Result<LocalMediaState, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(Command::ToggleVideo { reply }).await?;
        rx.await.map_err(|_| SessionError::Stopped)
    }

    /// Takes effect on the next join.
    pub async fn set_name(&self, name: impl Into<String>) -> Result<(), SessionError> {
        self.dispatch(Command::SetName { name: name.into() }).await
    }

    /// Stop the manager task, leaving the room first if one is joined.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.dispatch(Command::Shutdown).await
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn local_state(&self) -> LocalMediaState {
        *self.local_state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn subscribe_local_state(&self) -> watch::Receiver<LocalMediaState> {
        self.local_state.clone()
    }

    pub fn subscribe_roster(&self) -> watch::Receiver<Vec<RemoteParticipant>> {
        self.roster.clone()
    }

    pub fn subscribe_users(&self) -> watch::Receiver<Collection> {
        self.users.clone()
    }

    pub fn subscribe_local_stream(&self) -> broadcast::Receiver<MediaStream> {
        self.local_streams.subscribe()
    }

    pub fn subscribe_data(&self) -> broadcast::Receiver<DataMessage> {
        self.data_messages.subscribe()
    }

    async fn request<F>(&self, command: F) -> Result<(), SessionError>
    where
        F: FnOnce(Reply<()>) -> Command,
    {
        let (reply, rx) = oneshot::channel();
        self.dispatch(command(reply)).await?;
        rx.await.map_err(|_| SessionError::Stopped)?
    }

    async fn dispatch(&self, command: Command) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Stopped)
    }
}

async fn run(mut manager: MediaSessionManager, mut commands: mpsc::Receiver<Command>) {
    enum Next {
        Command(Option<Command>),
        Signal(super::manager::SessionSignal),
    }

    loop {
        let next = tokio::select! {
            command = commands.recv() => Next::Command(command),
            signal = manager.next_signal() => Next::Signal(signal),
        };

        match next {
            Next::Signal(signal) => manager.handle_signal(signal).await,
            Next::Command(Some(Command::Join { room_id, reply })) => {
                let _ = reply.send(manager.join(&room_id).await);
            }
            Next::Command(Some(Command::Exit { reply })) => {
                let _ = reply.send(manager.exit_room().await);
            }
            Next::Command(Some(Command::Send { data, reply })) => {
                let _ = reply.send(manager.send_message(&data).await);
            }
            Next::Command(Some(Command::ToggleScreenShare { reply })) => {
                let _ = reply.send(manager.toggle_screen_share().await);
            }
            Next::Command(Some(Command::ToggleAudio { reply })) => {
                manager.toggle_local_audio();
                let _ = reply.send(manager.local_state());
            }
            Next::Command(Some(Command::ToggleVideo { reply })) => {
                manager.toggle_local_video();
                let _ = reply.send(manager.local_state());
            }
            Next::Command(Some(Command::SetName { name })) => {
                manager.presence_mut().set_name(name);
            }
            Next::Command(Some(Command::Shutdown)) | Next::Command(None) => break,
        }
    }

    if matches!(manager.state(), SessionState::Connecting | SessionState::Connected) {
        let _ = manager.exit_room().await;
    }
    debug!("Media session task stopped");
    info!("👋 Media session closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::room::RoomEvent;
    use crate::presence::{ParticipantProfile, RealtimeDb, SessionPresenceRegistry};
    use crate::testing::{FakeDevices, FakeRoomProvider};
    use std::sync::Arc;

    fn spawn() -> (MediaSessionHandle, JoinHandle<()>, Arc<FakeRoomProvider>, Arc<RealtimeDb>) {
        let provider = Arc::new(FakeRoomProvider::new("peer-local"));
        let db = RealtimeDb::new();
        let presence = SessionPresenceRegistry::new(
            Arc::new(db.connect()),
            ParticipantProfile::new("peer-local", "Teacher", "g1"),
        );
        let manager =
            MediaSessionManager::new(Arc::new(FakeDevices::default()), provider.clone(), presence);
        let (handle, task) = MediaSessionHandle::spawn(manager);
        (handle, task, provider, db)
    }

    #[tokio::test]
    async fn room_events_flow_while_commands_are_served() {
        let (handle, _task, provider, _db) = spawn();
        let mut state = handle.subscribe_state();

        handle.join("room-7").await.unwrap();
        provider.emit(RoomEvent::Open);
        state.wait_for(|s| *s == SessionState::Connected).await.unwrap();

        let mut data = handle.subscribe_data();
        provider.emit(RoomEvent::Data {
            data: "hi".into(),
            sender_id: "peer-b".into(),
        });
        assert_eq!(data.recv().await.unwrap().data, "hi");

        let local = handle.toggle_local_audio().await.unwrap();
        assert!(!local.audio);

        handle.exit_room().await.unwrap();
        assert_eq!(handle.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn shutdown_leaves_the_room() {
        let (handle, task, provider, db) = spawn();
        handle.join("room-7").await.unwrap();
        assert!(db.get("rooms/g1/peer-local").is_some());

        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert!(provider.room().is_closed());
        assert_eq!(db.get("rooms/g1/peer-local"), None);
        // The manager and its connection are gone, so is the global entry.
        assert_eq!(db.get("users/peer-local"), None);
        assert_eq!(handle.join("room-7").await.unwrap_err(), SessionError::Stopped);
    }
}
