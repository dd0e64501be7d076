// src/pipeline/onboarding.rs

//! Onboarding pipeline.
//!
//! Marks the user onboarded with the identity provider, then seeds a
//! zero rating for every selected book so the recommendation backend
//! has a starting profile.

use crate::error::Result;
use crate::models::{Book, Rating};
use crate::services::{BackendClient, IdentityProvider};

/// Whether the user still needs onboarding.
///
/// Attribute fetch failures are logged and fail open: the user is not
/// forced into onboarding when the provider is unreachable.
pub async fn needs_onboarding(identity: &dyn IdentityProvider) -> bool {
    match identity.fetch_attributes().await {
        Ok(attributes) => !attributes.onboarding_complete,
        Err(error) => {
            log::warn!("Attribute fetch failed, skipping onboarding: {error}");
            false
        }
    }
}

/// Run the onboarding flow for the selected books.
///
/// The onboarding flag update must succeed; seeding individual ratings
/// is best-effort and only logged on failure.
pub async fn run_onboarding(
    identity: &dyn IdentityProvider,
    backend: &BackendClient,
    books: &[Book],
) -> Result<()> {
    let attributes = identity.fetch_attributes().await?;
    identity.mark_onboarded().await?;
    log::info!("Marked user {} as onboarded", attributes.sub);

    let mut seeded = 0usize;
    for book in books {
        let rating = Rating {
            user_id: attributes.sub.clone(),
            isbn: book.isbn.clone(),
            rating: 0.0,
        };
        if backend.upsert_rating(&rating).await {
            seeded += 1;
        } else {
            log::warn!("Could not seed rating for {} ({})", book.title, book.isbn);
        }
    }

    log::info!("Seeded {seeded}/{} starting rating(s)", books.len());
    Ok(())
}
