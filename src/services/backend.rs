// src/services/backend.rs

//! Recommendation/ratings backend client.
//!
//! Thin typed client over the REST backend. Non-success statuses are
//! logged and mapped to empty-equivalent results; there is no retry or
//! backoff. The backend is not rate limited.

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::{BackendConfig, Book, Rating, RecommendationGroup, SeedBook};

#[derive(Debug, Deserialize)]
struct BooksResponse {
    #[serde(default)]
    books: Vec<Book>,
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    #[serde(default)]
    results: Vec<RecommendationGroup>,
}

#[derive(Debug, Deserialize)]
struct RatingsResponse {
    #[serde(default)]
    ratings: Vec<Rating>,
}

#[derive(Debug, Serialize)]
struct RecommendationsRequest<'a> {
    books: &'a [SeedBook],
    limit_per_book: u32,
}

/// Client for the recommendation/ratings backend.
pub struct BackendClient {
    config: Arc<BackendConfig>,
    client: Client,
}

/// Collection page size used when a whole-collection scan is needed.
const COLLECTION_SCAN_LIMIT: u32 = 1000;

impl BackendClient {
    /// Create a backend client sharing the given HTTP client.
    pub fn new(config: Arc<BackendConfig>, client: Client) -> Self {
        Self { config, client }
    }

    /// Fetch up to `limit` books from the full collection.
    pub async fn get_books(&self, limit: u32) -> Vec<Book> {
        let url = format!("{}/books", self.config.base_url);
        let response: Option<BooksResponse> = self
            .get_json(&url, &[("limit", limit.to_string())], "books")
            .await;
        response.map(|r| r.books).unwrap_or_default()
    }

    /// Search books by title, then narrow with the client-side fuzzy
    /// filter (title or author contains the query, case-insensitive).
    pub async fn search_books(&self, query: &str) -> Vec<Book> {
        let url = format!("{}/books/search", self.config.base_url);
        let response: Option<BooksResponse> = self
            .get_json(&url, &[("title", query.to_string())], "book search")
            .await;
        response
            .map(|r| r.books)
            .unwrap_or_default()
            .into_iter()
            .filter(|book| book.matches_query(query))
            .collect()
    }

    /// Look up a single book by its exact ISBN.
    ///
    /// The backend's search endpoint matches on normalized titles, so
    /// an ISBN query would come back empty there. This scans the
    /// collection listing instead and matches the key exactly.
    pub async fn find_by_isbn(&self, isbn: &str) -> Option<Book> {
        self.get_books(COLLECTION_SCAN_LIMIT)
            .await
            .into_iter()
            .find(|book| book.isbn == isbn)
    }

    /// Fetch recommendation groups for a set of seed books.
    pub async fn get_recommendations(&self, seed: &[SeedBook]) -> Vec<RecommendationGroup> {
        let url = format!("{}/recommendations", self.config.base_url);
        let body = RecommendationsRequest {
            books: seed,
            limit_per_book: self.config.limit_per_book,
        };

        let result = self.client.post(&url).json(&body).send().await;
        let response = match result {
            Ok(response) => response,
            Err(error) => {
                log::warn!("Recommendation request failed: {error}");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            log::warn!("Recommendation API error: {}", response.status());
            return Vec::new();
        }

        match response.json::<RecommendationsResponse>().await {
            Ok(parsed) => parsed.results,
            Err(error) => {
                log::warn!("Recommendation decode failed: {error}");
                Vec::new()
            }
        }
    }

    /// Fetch all ratings belonging to a user.
    pub async fn get_ratings(&self, user_id: &str) -> Vec<Rating> {
        let url = format!("{}/ratings", self.config.base_url);
        let response: Option<RatingsResponse> = self
            .get_json(&url, &[("user_id", user_id.to_string())], "ratings")
            .await;
        response.map(|r| r.ratings).unwrap_or_default()
    }

    /// Create or update a rating. Returns whether the upsert succeeded.
    pub async fn upsert_rating(&self, rating: &Rating) -> bool {
        let url = format!("{}/ratings", self.config.base_url);
        let result = self.client.put(&url).json(rating).send().await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                log::warn!(
                    "Rating upsert failed for {}: {}",
                    rating.isbn,
                    response.status()
                );
                false
            }
            Err(error) => {
                log::warn!("Rating upsert failed for {}: {error}", rating.isbn);
                false
            }
        }
    }

    async fn get_json<T>(&self, url: &str, query: &[(&str, String)], context: &str) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let result = self.client.get(url).query(query).send().await;

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                log::warn!("Backend request failed for {context}: {error}");
                return None;
            }
        };

        if !response.status().is_success() {
            log::warn!("Backend API error for {context}: {}", response.status());
            return None;
        }

        match response.json::<T>().await {
            Ok(value) => Some(value),
            Err(error) => {
                log::warn!("Backend response decode failed for {context}: {error}");
                None
            }
        }
    }
}
