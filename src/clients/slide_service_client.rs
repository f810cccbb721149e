use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::error::RemoteFetchError;
use crate::slides::lookup::{SlideListing, SlideLookup};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

#[derive(Debug, Deserialize)]
struct ThumbnailBody {
    result: String,
}

/// HTTP client for the slide lookup service.
#[derive(Debug, Clone)]
pub struct SlideServiceClient {
    client: Client,
    base_url: String,
}

impl SlideServiceClient {
    /// `timeout` of `None` lets a stalled lookup wait as long as the service does.
    pub fn new(base_url: String, timeout: Option<Duration>) -> Result<Self, RemoteFetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RemoteFetchError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RemoteFetchError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let res = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", url, e);
                RemoteFetchError::Transport(e.to_string())
            })?;

        let status = res.status();
        if !status.is_success() {
            // The service reports failures as `{ "error": "..." }`.
            let message = match res.json::<ErrorBody>().await {
                Ok(body) if !body.error.is_empty() => body.error,
                _ => status.to_string(),
            };
            return Err(RemoteFetchError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        res.json::<T>()
            .await
            .map_err(|e| RemoteFetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SlideLookup for SlideServiceClient {
    async fn fetch_deck(&self, presentation_id: &str) -> Result<SlideListing, RemoteFetchError> {
        self.get_json("slide", &[("presentationId", presentation_id)])
            .await
    }

    async fn fetch_thumbnail(
        &self,
        presentation_id: &str,
        page_object_id: &str,
    ) -> Result<String, RemoteFetchError> {
        let body: ThumbnailBody = self
            .get_json(
                "thumbnail",
                &[
                    ("pageObjectId", page_object_id),
                    ("presentationId", presentation_id),
                ],
            )
            .await?;
        Ok(body.result)
    }
}
