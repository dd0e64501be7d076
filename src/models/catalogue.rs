//! Catalogue records, shelf statuses, and availability classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of a catalogue title search: one matched title and its
/// bibliographic record number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogueRecord {
    /// Matched catalogue title
    pub title: String,

    /// Bibliographic record number, key for availability lookups
    pub brn: String,
}

/// Shelf status of a single physical copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShelfStatus {
    OnShelf,
    InTransit,
    OnLoan,
    /// Any status string the catalogue returns that we do not model
    Other(String),
}

impl ShelfStatus {
    /// Parse the catalogue's `status.name` display string.
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "On Shelf" => Self::OnShelf,
            "In-Transit" => Self::InTransit,
            "On Loan" => Self::OnLoan,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Physical location of a copy within the library network.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// Branch code, key for branch detail lookups
    #[serde(default)]
    pub code: String,

    /// Branch display name
    #[serde(default)]
    pub name: String,
}

/// Availability of one copy of a title: shelf status plus location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityRecord {
    pub status: ShelfStatus,
    pub location: Location,
}

/// Aggregated per-book availability shown to the user.
///
/// Classification is a strict priority order over the copy list:
/// any copy on shelf wins, then in transit, then on loan; an empty
/// list (or a failed lookup) means the title is not in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityStatus {
    Available,
    InTransit,
    OnLoan,
    NotFound,
}

impl AvailabilityStatus {
    /// Classify a list of copy records into a single display status.
    pub fn classify(records: &[AvailabilityRecord]) -> Self {
        if records.is_empty() {
            Self::NotFound
        } else if records.iter().any(|r| r.status == ShelfStatus::OnShelf) {
            Self::Available
        } else if records.iter().any(|r| r.status == ShelfStatus::InTransit) {
            Self::InTransit
        } else {
            Self::OnLoan
        }
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Available => "Available",
            Self::InTransit => "In Transit",
            Self::OnLoan => "On Loan",
            Self::NotFound => "Not Found in NLB",
        };
        write!(f, "{label}")
    }
}

/// A library branch with its display image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub branch_code: String,
    pub name: String,
    /// Main branch photo URL, if the catalogue provides one
    pub main_image: Option<String>,
}
