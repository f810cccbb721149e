pub mod actor;
pub mod devices;
pub mod manager;
pub mod room;
pub mod stream;

pub use actor::MediaSessionHandle;
pub use devices::{MediaDevices, MediaKind, VideoConstraints};
pub use manager::{
    DataMessage, LocalMediaState, MediaSessionManager, RemoteParticipant, SessionSignal,
    SessionState,
};
pub use room::{RoomEvent, RoomEvents, RoomHandle, RoomMode, RoomOptions, RoomProvider};
pub use stream::{MediaStream, MediaTrack, ReadyState, TrackKind};
