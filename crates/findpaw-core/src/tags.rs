use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Distinguishing features a reporter can tick on a sighting.
///
/// Stored in the `features` JSON array by [`FeatureTag::id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureTag {
    Collar,
    Clothes,
    Scared,
    Friendly,
}

impl FeatureTag {
    pub const ALL: [FeatureTag; 4] = [
        FeatureTag::Collar,
        FeatureTag::Clothes,
        FeatureTag::Scared,
        FeatureTag::Friendly,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            FeatureTag::Collar => "collar",
            FeatureTag::Clothes => "clothes",
            FeatureTag::Scared => "scared",
            FeatureTag::Friendly => "friendly",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FeatureTag::Collar => "Wearing a collar",
            FeatureTag::Clothes => "Wearing clothes",
            FeatureTag::Scared => "Timid",
            FeatureTag::Friendly => "Approaches people",
        }
    }
}

impl FromStr for FeatureTag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureTag::ALL
            .into_iter()
            .find(|tag| tag.id() == s)
            .ok_or_else(|| CoreError::UnknownFeatureTag(s.to_string()))
    }
}

pub const BREED_OPTIONS: &[&str] = &[
    "Mixed",
    "Golden Retriever",
    "Labrador Retriever",
    "Beagle",
    "Bulldog",
    "Chihuahua",
    "Pomeranian",
    "Poodle",
    "Shih Tzu",
    "Yorkshire Terrier",
    "Husky",
    "Other",
];

pub const COLOR_OPTIONS: &[&str] = &[
    "Brown", "Black", "White", "Cream", "Gray", "Golden", "Red", "Other",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_id() {
        for tag in FeatureTag::ALL {
            assert_eq!(tag.id().parse::<FeatureTag>().unwrap(), tag);
        }
    }

    #[test]
    fn rejects_unknown_id() {
        assert_eq!(
            "spots".parse::<FeatureTag>(),
            Err(CoreError::UnknownFeatureTag("spots".to_string()))
        );
    }
}
