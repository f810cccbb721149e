use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API response for readiness check
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ReadyResponse {
    pub status: String,
    pub message: String,
    /// Whether the shared session document holds a state
    pub session_available: bool,
}
