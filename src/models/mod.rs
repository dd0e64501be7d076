// src/models/mod.rs

//! Domain models for the betterread application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod book;
mod catalogue;
mod config;

// Re-export all public types
pub use book::{Book, Rating, RecommendationGroup, SeedBook};
pub use catalogue::{
    AvailabilityRecord, AvailabilityStatus, Branch, CatalogueRecord, Location, ShelfStatus,
};
pub use config::{
    BackendConfig, CatalogueConfig, ClientConfig, Config, CoversConfig, LimiterConfig,
};
