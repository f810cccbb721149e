use thiserror::Error;

/// Failure of a deck or thumbnail lookup against the slide service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteFetchError {
    /// The service answered with a non-success status and (maybe) an `error` message.
    #[error("slide service returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// The request never produced a usable response.
    #[error("slide service request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("invalid slide service response: {0}")]
    Decode(String),
}

/// The shared session document is missing or unreachable.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("shared session state is unavailable")]
pub struct SyncUnavailable;

/// A camera, microphone or screen capture could not be opened.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaAcquisitionError {
    #[error("permission denied for {0}")]
    PermissionDenied(String),

    #[error("no device available for {0}")]
    DeviceUnavailable(String),

    #[error("capture failed: {0}")]
    Other(String),
}

/// A room operation was requested while no room exists.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoomOperationError {
    #[error("room is not present for {0}")]
    RoomNotPresent(&'static str),

    #[error("already joined room {0}")]
    AlreadyJoined(String),

    #[error("room provider error: {0}")]
    Provider(String),
}

/// Failure inside the document or presence store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("document store error: {0}")]
    Document(String),

    #[error("presence store error: {0}")]
    Presence(String),

    #[error("store connection closed")]
    Disconnected,
}

/// Errors surfaced by the media session manager.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Media(#[from] MediaAcquisitionError),

    #[error(transparent)]
    Room(#[from] RoomOperationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("media session is not running")]
    Stopped,
}
