//! Book and rating data structures.

use serde::{Deserialize, Serialize};

/// A book as returned by the recommendation backend.
///
/// Immutable once fetched; the ISBN is the primary key for caching
/// and availability lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    /// ISBN, primary key
    pub isbn: String,

    /// Book title
    pub title: String,

    /// Author display name
    pub author: String,

    /// Year of publication, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_of_publication: Option<String>,

    /// Publisher, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

impl Book {
    /// True when either title or author contains the query,
    /// case-insensitively. Used to narrow backend search results.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.author.to_lowercase().contains(&query)
    }
}

/// A user's rating for a single book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    /// Owning user (identity provider subject id)
    pub user_id: String,

    /// Rated book ISBN
    pub isbn: String,

    /// Rating value, 0–10
    pub rating: f64,
}

/// A seed book sent to the recommendation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedBook {
    pub isbn: String,
    pub rating: f64,
}

/// One recommendation group: a source book and its similar titles.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationGroup {
    /// The seed book the similar titles were derived from
    pub source_book: Book,

    /// Similar books, most similar first
    #[serde(default)]
    pub similar_books: Vec<Book>,
}
