// src/pipeline/recommend.rs

//! Recommendation pipeline.
//!
//! Turns the user's existing ratings into recommendation seeds, asks
//! the backend for similar titles, and flattens the groups into one
//! ordered book list ready for the aggregator. Books the user has
//! already rated are dropped, and a title recommended by several seeds
//! appears once.

use std::collections::HashSet;

use crate::models::{Book, SeedBook};
use crate::services::BackendClient;

/// Fetch a recommended book list for the user.
///
/// Empty when the user has no ratings yet, or when either backend call
/// degrades to empty.
pub async fn recommended_books(backend: &BackendClient, user_id: &str) -> Vec<Book> {
    let ratings = backend.get_ratings(user_id).await;
    if ratings.is_empty() {
        log::info!("No ratings for {user_id}, nothing to recommend from");
        return Vec::new();
    }

    let seed: Vec<SeedBook> = ratings
        .iter()
        .map(|rating| SeedBook {
            isbn: rating.isbn.clone(),
            rating: rating.rating,
        })
        .collect();
    let groups = backend.get_recommendations(&seed).await;

    let mut seen: HashSet<String> = ratings.into_iter().map(|r| r.isbn).collect();
    let mut books = Vec::new();
    for group in groups {
        for book in group.similar_books {
            if seen.insert(book.isbn.clone()) {
                books.push(book);
            }
        }
    }

    log::info!("Recommendation pipeline produced {} book(s)", books.len());
    books
}
