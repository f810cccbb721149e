use std::sync::Arc;
use tracing::{error, info};

use super::lookup::SlideLookup;
use crate::error::RemoteFetchError;

/// The resolved slides of one presentation. Never mutated after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideDeck {
    pub presentation_id: String,
    pub slide_object_ids: Vec<String>,
    pub title: String,
}

impl SlideDeck {
    pub fn len(&self) -> usize {
        self.slide_object_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slide_object_ids.is_empty()
    }
}

/// Turns a presentation id into a [`SlideDeck`]. Does not retry.
#[derive(Clone)]
pub struct DeckResolver {
    lookup: Arc<dyn SlideLookup>,
}

impl DeckResolver {
    pub fn new(lookup: Arc<dyn SlideLookup>) -> Self {
        Self { lookup }
    }

    pub async fn resolve_deck(&self, presentation_id: &str) -> Result<SlideDeck, RemoteFetchError> {
        info!("Resolving slides for presentation {}", presentation_id);
        let listing = self.lookup.fetch_deck(presentation_id).await.map_err(|e| {
            error!("Failed to resolve presentation {}: {}", presentation_id, e);
            e
        })?;
        info!(
            "Presentation {} resolved to {} slides ({})",
            presentation_id,
            listing.slide_object_ids.len(),
            listing.title
        );
        Ok(SlideDeck {
            presentation_id: presentation_id.to_string(),
            slide_object_ids: listing.slide_object_ids,
            title: listing.title,
        })
    }
}
