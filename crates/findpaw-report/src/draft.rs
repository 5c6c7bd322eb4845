//! In-progress report form values.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use findpaw_core::sighted_at::now_local;
use findpaw_core::{Coordinate, FeatureTag, NewSighting};

use crate::capture::ImageFile;

#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub image: Option<ImageFile>,
    pub location: Option<Coordinate>,
    /// Address shown next to the location; not persisted.
    pub address: Option<String>,
    pub breed: String,
    pub color: String,
    pub features: BTreeSet<FeatureTag>,
    pub description: String,
    /// Local wall-clock time of the sighting.
    pub sighted_at: NaiveDateTime,
}

impl Default for SubmissionDraft {
    fn default() -> Self {
        Self {
            image: None,
            location: None,
            address: None,
            breed: String::new(),
            color: String::new(),
            features: BTreeSet::new(),
            description: String::new(),
            sighted_at: now_local(),
        }
    }
}

impl SubmissionDraft {
    /// Adds or removes `tag`. Returns whether it is now selected.
    pub fn toggle_feature(&mut self, tag: FeatureTag) -> bool {
        if self.features.remove(&tag) {
            false
        } else {
            self.features.insert(tag);
            true
        }
    }

    /// True when nothing but the timestamp has been filled in.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.image.is_none()
            && self.location.is_none()
            && self.address.is_none()
            && self.breed.is_empty()
            && self.color.is_empty()
            && self.features.is_empty()
            && self.description.is_empty()
    }

    /// Row for the sightings table. Blank text becomes null and an empty
    /// feature set is omitted.
    #[must_use]
    pub fn to_row(
        &self,
        image_url: String,
        location: Coordinate,
        sighted_at: DateTime<Utc>,
    ) -> NewSighting {
        let features = (!self.features.is_empty())
            .then(|| self.features.iter().map(|t| t.id().to_owned()).collect());
        NewSighting {
            image_url,
            latitude: location.latitude,
            longitude: location.longitude,
            breed: non_blank(&self.breed),
            color: non_blank(&self.color),
            features,
            description: non_blank(&self.description),
            sighted_at,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
