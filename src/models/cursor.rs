use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetCursorRequest {
    pub index: usize,
}

/// Position of the navigation cursor
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CursorResponse {
    /// `None` while no slide is selected
    pub index: Option<usize>,
    pub deck_len: usize,
    pub title: String,
}
