//! Pipeline entry points for betterread operations.
//!
//! - `Aggregator`: per-book cover + availability aggregation
//! - `recommended_books`: ratings-seeded recommendation list
//! - `run_onboarding`: preference collection and rating seeding

pub mod aggregate;
pub mod onboarding;
pub mod recommend;

pub use aggregate::{Aggregator, Snapshot};
pub use onboarding::{needs_onboarding, run_onboarding};
pub use recommend::recommended_books;
