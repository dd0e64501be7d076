// src/services/catalogue.rs

//! Library catalogue lookup service.
//!
//! Wraps the catalogue's SearchTitles / GetAvailabilityInfo / GetBranches
//! endpoints behind the shared rate limiter and per-kind caches. Every
//! failure mode (transport error, non-2xx status, malformed payload)
//! degrades to an empty result; nothing here is fatal, and a failed
//! lookup stays cached as empty for the rest of the session.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;

use crate::cache::Cache;
use crate::limiter::RateLimiter;
use crate::models::{AvailabilityRecord, Branch, CatalogueConfig, CatalogueRecord, Location, ShelfStatus};

/// Wire shape of a SearchTitles response.
#[derive(Debug, Deserialize)]
struct SearchTitlesResponse {
    #[serde(default)]
    titles: Option<Vec<TitleHit>>,
}

#[derive(Debug, Deserialize)]
struct TitleHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    records: Vec<TitleRecord>,
}

#[derive(Debug, Deserialize)]
struct TitleRecord {
    #[serde(default, deserialize_with = "de_string_or_number")]
    brn: String,
}

/// Wire shape of a GetAvailabilityInfo response.
#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    items: Option<Vec<AvailabilityItem>>,
}

#[derive(Debug, Deserialize)]
struct AvailabilityItem {
    #[serde(default)]
    status: StatusField,
    #[serde(default)]
    location: Location,
}

#[derive(Debug, Default, Deserialize)]
struct StatusField {
    #[serde(default)]
    name: String,
}

/// Wire shape of a GetBranches response.
#[derive(Debug, Deserialize)]
struct BranchesResponse {
    #[serde(default)]
    branches: Option<Vec<BranchItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BranchItem {
    #[serde(default)]
    branch_code: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    library_images: Option<LibraryImages>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibraryImages {
    #[serde(default)]
    main_image: Option<String>,
}

/// The catalogue sends BRNs as numbers; the data model keys on strings.
fn de_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

/// Service for catalogue title search and shelf availability.
pub struct CatalogueClient {
    config: Arc<CatalogueConfig>,
    client: Client,
    limiter: RateLimiter,
    titles: Cache<String, Option<CatalogueRecord>>,
    availability: Cache<String, Vec<AvailabilityRecord>>,
    branches: Cache<String, Vec<Branch>>,
}

impl CatalogueClient {
    /// Create a catalogue client sharing the given HTTP client and limiter.
    pub fn new(config: Arc<CatalogueConfig>, client: Client, limiter: RateLimiter) -> Self {
        Self {
            config,
            client,
            limiter,
            titles: Cache::new(),
            availability: Cache::new(),
            branches: Cache::new(),
        }
    }

    /// Search the catalogue for a title.
    ///
    /// Candidates are narrowed to those whose normalized title is a
    /// substring of the normalized query; the first match's first
    /// record wins. Returns `None` when the endpoint errors, returns
    /// no candidates, or none match.
    pub async fn search_title(&self, title: &str) -> Option<CatalogueRecord> {
        let title = title.to_string();
        self.titles
            .get_or_compute(title.clone(), || async move {
                self.fetch_title(&title).await
            })
            .await
    }

    /// Fetch shelf availability for a bibliographic record number.
    ///
    /// Returns the raw list of copy records; empty on error or when
    /// the catalogue knows nothing about the BRN.
    pub async fn get_availability(&self, brn: &str) -> Vec<AvailabilityRecord> {
        let brn = brn.to_string();
        self.availability
            .get_or_compute(brn.clone(), || async move {
                self.fetch_availability(&brn).await
            })
            .await
    }

    /// Fetch branch details for a set of branch codes.
    ///
    /// Empty input issues no outbound call. The cache key is the
    /// comma-joined code list.
    pub async fn get_branches(&self, codes: &[String]) -> Vec<Branch> {
        if codes.is_empty() {
            return Vec::new();
        }
        let joined = codes.join(",");
        self.branches
            .get_or_compute(joined.clone(), || async move {
                self.fetch_branches(&joined).await
            })
            .await
    }

    async fn fetch_title(&self, title: &str) -> Option<CatalogueRecord> {
        let url = format!("{}/SearchTitles", self.config.base_url);
        let query = [
            ("Keywords", title.to_string()),
            ("Availability", "true".to_string()),
            ("Limit", self.config.search_limit.to_string()),
        ];

        let response: Option<SearchTitlesResponse> = self
            .limiter
            .schedule(self.get_json(&url, &query, title))
            .await;

        let hits = response.and_then(|r| r.titles).unwrap_or_default();
        Self::filter_titles(title, hits)
    }

    /// First-substring-match heuristic carried over from the original
    /// frontend: a candidate matches when its normalized title occurs
    /// inside the normalized query. No scoring; a known limitation.
    fn filter_titles(query: &str, hits: Vec<TitleHit>) -> Option<CatalogueRecord> {
        let normalized_query = query.to_lowercase().trim().to_string();
        hits.into_iter()
            .find(|hit| {
                let candidate = hit.title.to_lowercase();
                let candidate = candidate.trim();
                !candidate.is_empty() && normalized_query.contains(candidate)
            })
            .and_then(|hit| {
                let title = hit.title.clone();
                hit.records
                    .into_iter()
                    .next()
                    .map(|record| CatalogueRecord {
                        title,
                        brn: record.brn,
                    })
            })
    }

    async fn fetch_availability(&self, brn: &str) -> Vec<AvailabilityRecord> {
        let url = format!("{}/GetAvailabilityInfo", self.config.base_url);
        let query = [("BRN", brn.to_string())];

        let response: Option<AvailabilityResponse> = self
            .limiter
            .schedule(self.get_json(&url, &query, brn))
            .await;

        response
            .and_then(|r| r.items)
            .unwrap_or_default()
            .into_iter()
            .map(|item| AvailabilityRecord {
                status: ShelfStatus::parse(&item.status.name),
                location: item.location,
            })
            .collect()
    }

    async fn fetch_branches(&self, codes: &str) -> Vec<Branch> {
        let url = format!("{}/GetBranches", self.config.base_url);
        let query = [("BranchCodes", codes.to_string())];

        let response: Option<BranchesResponse> = self
            .limiter
            .schedule(self.get_json(&url, &query, codes))
            .await;

        response
            .and_then(|r| r.branches)
            .unwrap_or_default()
            .into_iter()
            .map(|item| Branch {
                branch_code: item.branch_code,
                name: item.name,
                main_image: item.library_images.and_then(|i| i.main_image),
            })
            .collect()
    }

    /// One authenticated GET, decoded as JSON. All failures are logged
    /// and collapse to `None`; the caller treats that as "no data".
    async fn get_json<T>(
        &self,
        url: &str,
        query: &[(&str, String)],
        context: &str,
    ) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let result = self
            .client
            .get(url)
            .query(query)
            .header("X-App-Code", &self.config.app_code)
            .header("X-Api-Key", &self.config.api_key)
            .header("Accept", "application/json")
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                log::warn!("Catalogue request failed for {context}: {error}");
                return None;
            }
        };

        if !response.status().is_success() {
            log::warn!(
                "Catalogue API error for {context}: {}",
                response.status()
            );
            return None;
        }

        match response.json::<T>().await {
            Ok(value) => Some(value),
            Err(error) => {
                log::warn!("Catalogue response decode failed for {context}: {error}");
                None
            }
        }
    }
}
