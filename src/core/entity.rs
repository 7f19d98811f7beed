//! Entity trait - common interface for stored records

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::RecordId;

/// Common trait for records kept in a [`RecordStore`](crate::core::store::RecordStore)
pub trait Entity: Serialize + DeserializeOwned + Clone {
    /// Record kind, used in file names (e.g. "analysis")
    const KIND: &'static str;

    /// Store-assigned id
    fn id(&self) -> RecordId;

    /// Short human-readable title
    fn title(&self) -> &str;

    /// Review status as text
    fn status(&self) -> &str;

    /// When the store first saved the record
    fn created(&self) -> DateTime<Utc>;

    /// When the store last saved the record
    fn updated(&self) -> DateTime<Utc>;

    /// Who created the record
    fn author(&self) -> &str;

    /// Set the store-owned bookkeeping fields
    fn stamp(&mut self, id: RecordId, created: DateTime<Utc>, updated: DateTime<Utc>);
}

/// Review workflow status of an analysis record
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum ReviewStatus {
    #[default]
    Draft,
    InReview,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Draft => "draft",
            ReviewStatus::InReview => "in_review",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "draft" => Ok(ReviewStatus::Draft),
            "in_review" | "review" => Ok(ReviewStatus::InReview),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("draft".parse::<ReviewStatus>().unwrap(), ReviewStatus::Draft);
        assert_eq!("In-Review".parse::<ReviewStatus>().unwrap(), ReviewStatus::InReview);
        assert!("done".parse::<ReviewStatus>().is_err());
    }

    #[test]
    fn test_status_display_matches_serde() {
        for status in [
            ReviewStatus::Draft,
            ReviewStatus::InReview,
            ReviewStatus::Approved,
            ReviewStatus::Rejected,
        ] {
            let yaml = serde_yml::to_string(&status).unwrap();
            assert_eq!(yaml.trim(), status.to_string());
        }
    }
}
