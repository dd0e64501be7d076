// src/services/covers.rs

//! Cover image resolution.
//!
//! Resolves an ISBN to a displayable cover URL: first a deterministic
//! probe against the cover image host, then a fallback query to the
//! book metadata API for a thumbnail link. At most two outbound calls
//! per ISBN, and neither failure mode ever propagates as an error.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;

use crate::cache::Cache;
use crate::models::CoversConfig;

/// Wire shape of a metadata API volume query.
#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo", default)]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Deserialize)]
struct VolumeInfo {
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "imageLinks", default)]
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    #[serde(default)]
    thumbnail: Option<String>,
}

/// Service resolving ISBNs to cover URLs and descriptions.
pub struct CoverResolver {
    config: Arc<CoversConfig>,
    client: Client,
    covers: Cache<String, Option<String>>,
}

impl CoverResolver {
    /// Create a resolver sharing the given HTTP client.
    pub fn new(config: Arc<CoversConfig>, client: Client) -> Self {
        Self {
            config,
            client,
            covers: Cache::new(),
        }
    }

    /// Deterministic large-cover URL for an ISBN on the image host.
    pub fn cover_url(&self, isbn: &str) -> String {
        format!("{}/b/isbn/{isbn}-L.jpg", self.config.image_host)
    }

    /// Deterministic medium-cover URL, used for search result lists.
    pub fn medium_cover_url(&self, isbn: &str) -> String {
        format!("{}/b/isbn/{isbn}-M.jpg", self.config.image_host)
    }

    /// Resolve an ISBN to a displayable cover URL.
    ///
    /// Probes the image host first; when the probe does not yield an
    /// image, falls back to the metadata API's thumbnail link. `None`
    /// when both fail. Results, including `None`, are cached by ISBN.
    pub async fn resolve(&self, isbn: &str) -> Option<String> {
        let isbn = isbn.to_string();
        self.covers
            .get_or_compute(isbn.clone(), || async move {
                self.fetch_cover(&isbn).await
            })
            .await
    }

    /// Fetch the book description from the metadata API.
    ///
    /// Degrades to a placeholder string rather than erroring, matching
    /// the rest of the lookup surface.
    pub async fn description(&self, isbn: &str) -> String {
        self.query_volumes(isbn)
            .await
            .and_then(|info| info.description)
            .unwrap_or_else(|| "No description available.".to_string())
    }

    async fn fetch_cover(&self, isbn: &str) -> Option<String> {
        let probe_url = self.cover_url(isbn);

        match self.client.get(&probe_url).send().await {
            Ok(response) if Self::is_image(&response) => return Some(probe_url),
            Ok(response) => {
                log::debug!(
                    "Cover probe for {isbn} returned {} without image content",
                    response.status()
                );
            }
            Err(error) => {
                log::warn!("Cover probe failed for {isbn}: {error}");
            }
        }

        self.query_volumes(isbn)
            .await
            .and_then(|info| info.image_links)
            .and_then(|links| links.thumbnail)
    }

    /// A probe hit is a 2xx response whose content type is an image.
    fn is_image(response: &reqwest::Response) -> bool {
        response.status().is_success()
            && response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value.starts_with("image"))
    }

    /// Query the metadata API by ISBN and return the first volume's info.
    async fn query_volumes(&self, isbn: &str) -> Option<VolumeInfo> {
        let url = format!("{}/books/v1/volumes", self.config.metadata_api);

        let result = self
            .client
            .get(&url)
            .query(&[("q", format!("isbn:{isbn}"))])
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                log::warn!("Metadata lookup failed for {isbn}: {error}");
                return None;
            }
        };

        if !response.status().is_success() {
            log::warn!("Metadata API error for {isbn}: {}", response.status());
            return None;
        }

        match response.json::<VolumesResponse>().await {
            Ok(volumes) => volumes
                .items
                .and_then(|items| items.into_iter().next())
                .and_then(|volume| volume.volume_info),
            Err(error) => {
                log::warn!("Metadata decode failed for {isbn}: {error}");
                None
            }
        }
    }
}
