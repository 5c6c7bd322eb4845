//! Row shapes exchanged with the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;
use crate::tags::FeatureTag;

/// A sighting row as returned by the sightings list query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub id: Uuid,
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub breed: Option<String>,
    pub color: Option<String>,
    /// Feature tag ids (`"collar"`, `"scared"`, ...). Unknown ids are kept.
    pub features: Option<Vec<String>>,
    pub description: Option<String>,
    pub sighted_at: DateTime<Utc>,
}

impl Sighting {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Parsed feature tags; ids this build does not know are skipped.
    #[must_use]
    pub fn feature_tags(&self) -> Vec<FeatureTag> {
        self.features
            .iter()
            .flatten()
            .filter_map(|id| id.parse().ok())
            .collect()
    }
}

/// Insert payload for the `sightings` table.
///
/// `None` fields serialize as JSON `null` so the row stores SQL `NULL`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSighting {
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub features: Option<Vec<String>>,
    pub description: Option<String>,
    pub sighted_at: DateTime<Utc>,
}

/// One map pin derived from a [`Sighting`].
#[derive(Debug, Clone, PartialEq)]
pub struct SightingMarker {
    pub id: Uuid,
    pub coordinate: Coordinate,
    pub image_url: String,
    pub breed_label: String,
}

impl SightingMarker {
    /// Label used when a sighting has no breed.
    pub const UNKNOWN_BREED_LABEL: &'static str = "Sighting report";
}

impl From<&Sighting> for SightingMarker {
    fn from(s: &Sighting) -> Self {
        let breed_label = s
            .breed
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(Self::UNKNOWN_BREED_LABEL)
            .to_string();
        Self {
            id: s.id,
            coordinate: s.coordinate(),
            image_url: s.image_url.clone(),
            breed_label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub nickname: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUserProfile {
    pub id: Uuid,
    pub nickname: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LostPostStatus {
    Searching,
    Found,
    Closed,
}

impl LostPostStatus {
    pub const ALL: [LostPostStatus; 3] = [
        LostPostStatus::Searching,
        LostPostStatus::Found,
        LostPostStatus::Closed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LostPostStatus::Searching => "searching",
            LostPostStatus::Found => "found",
            LostPostStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostPost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub dog_name: String,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub features: Option<Vec<String>>,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub missing_at: DateTime<Utc>,
    pub status: LostPostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user lost post counters shown on the "my" page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub lost_posts_count: u64,
    pub searching_count: u64,
    pub found_count: u64,
    pub closed_count: u64,
}
