use async_trait::async_trait;
use tokio::sync::mpsc;

use super::stream::MediaStream;
use crate::error::RoomOperationError;

/// Media topology of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomMode {
    /// A central router forwards every participant's stream to the others.
    Sfu,
    Mesh,
}

#[derive(Debug, Clone)]
pub struct RoomOptions {
    pub mode: RoomMode,
    pub stream: MediaStream,
}

/// Everything a joined room reports back.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// The local peer is in the room.
    Open,
    PeerJoin(String),
    PeerLeave(String),
    /// A remote peer's stream became available.
    Stream { peer_id: String, stream: MediaStream },
    Data { data: String, sender_id: String },
    Close,
}

pub type RoomEvents = mpsc::UnboundedReceiver<RoomEvent>;

/// A joined room.
#[async_trait]
pub trait RoomHandle: Send + Sync {
    /// Swap the outgoing stream without renegotiating membership.
    async fn replace_stream(&self, stream: MediaStream) -> Result<(), RoomOperationError>;

    async fn send(&self, data: &str) -> Result<(), RoomOperationError>;

    async fn close(&self);
}

/// The signaling/SFU service rooms are joined through.
#[async_trait]
pub trait RoomProvider: Send + Sync {
    /// Identity of the local peer on this provider.
    fn peer_id(&self) -> String;

    async fn join_room(
        &self,
        room_id: &str,
        options: RoomOptions,
    ) -> Result<(Box<dyn RoomHandle>, RoomEvents), RoomOperationError>;
}
