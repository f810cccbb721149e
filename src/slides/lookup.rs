use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteFetchError;

/// Body of a successful `GET /slide` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideListing {
    #[serde(rename = "result")]
    pub slide_object_ids: Vec<String>,
    #[serde(default)]
    pub title: String,
}

/// Remote service that knows the slides of a presentation and their thumbnails.
#[async_trait]
pub trait SlideLookup: Send + Sync {
    async fn fetch_deck(&self, presentation_id: &str) -> Result<SlideListing, RemoteFetchError>;

    async fn fetch_thumbnail(
        &self,
        presentation_id: &str,
        page_object_id: &str,
    ) -> Result<String, RemoteFetchError>;
}
