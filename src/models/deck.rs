use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadDeckRequest {
    pub presentation_id: String,
}

/// The installed deck
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeckResponse {
    pub presentation_id: String,
    pub title: String,
    pub slide_count: usize,
}
