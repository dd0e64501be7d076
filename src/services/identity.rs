// src/services/identity.rs

//! Identity provider contract.
//!
//! The core never implements authentication; it only consumes a stable
//! subject identifier and the onboarding-complete flag. `LocalIdentity`
//! is a file-backed stand-in so the CLI works without a real provider.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// User attributes exposed by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAttributes {
    /// Stable subject identifier
    pub sub: String,

    /// Whether the user has completed onboarding
    #[serde(default)]
    pub onboarding_complete: bool,
}

/// Contract with the external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch the current user's attributes.
    async fn fetch_attributes(&self) -> Result<UserAttributes>;

    /// Mark onboarding complete. Idempotent upsert.
    async fn mark_onboarded(&self) -> Result<()>;
}

/// File-backed identity store under a state directory.
pub struct LocalIdentity {
    path: PathBuf,
}

impl LocalIdentity {
    /// Use `user.json` inside the given state directory.
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join("user.json"),
        }
    }

    async fn load(&self) -> Result<UserAttributes> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::identity(format!("cannot read {}: {e}", self.path.display()))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn store(&self, attributes: &UserAttributes) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(attributes)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn fetch_attributes(&self) -> Result<UserAttributes> {
        self.load().await
    }

    async fn mark_onboarded(&self) -> Result<()> {
        let mut attributes = self.load().await.unwrap_or(UserAttributes {
            sub: "local-user".to_string(),
            onboarding_complete: false,
        });
        attributes.onboarding_complete = true;
        self.store(&attributes).await
    }
}
