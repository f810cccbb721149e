use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for diagnostics information
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DiagnosticsResponse {
    /// Open session websockets
    pub n_conn: u32,
    /// Entries in the users roster
    pub n_users: u32,
    /// All presence records, room memberships included
    pub n_presence_records: u32,
    /// Receivers watching the session document
    pub n_state_subscribers: u32,
    pub deck_len: u32,
    pub cursor_index: Option<u32>,
    pub cpu_usage: f32,
    pub memory_alloc: u64,
    pub memory_total: u64,
    pub memory_free: u64,
    pub generated_at: DateTime<Utc>,
}
