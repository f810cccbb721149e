use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Peer id → display name
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PresenceResponse {
    pub collection: String,
    pub members: BTreeMap<String, String>,
}
