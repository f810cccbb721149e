//! Realtime presence: who is connected, and who is in which group's room.

pub mod registry;
pub mod store;

pub use registry::{ParticipantProfile, SessionPresenceRegistry};
pub use store::{Collection, PresenceStore, RealtimeConnection, RealtimeDb};
