//! Service layer for the betterread application.
//!
//! This module contains the clients for the external collaborators:
//! - Recommendation/ratings backend (`BackendClient`)
//! - Library catalogue API (`CatalogueClient`)
//! - Cover image and metadata services (`CoverResolver`)
//! - Identity provider contract (`IdentityProvider`)

mod backend;
mod catalogue;
mod covers;
mod identity;

pub use backend::BackendClient;
pub use catalogue::CatalogueClient;
pub use covers::CoverResolver;
pub use identity::{IdentityProvider, LocalIdentity, UserAttributes};

use std::time::Duration;

use crate::error::Result;
use crate::models::ClientConfig;

/// Create a configured asynchronous HTTP client shared by all services.
pub fn create_client(config: &ClientConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}
