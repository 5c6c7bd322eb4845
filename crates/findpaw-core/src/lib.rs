pub mod app_config;
pub mod config;
pub mod geo;
pub mod nickname;
pub mod records;
pub mod sighted_at;
pub mod tags;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::Coordinate;
pub use nickname::{default_nickname, display_nickname};
pub use records::{
    LostPost, LostPostStatus, NewSighting, NewUserProfile, Sighting, SightingMarker, UserProfile,
    UserStats,
};
pub use tags::{FeatureTag, BREED_OPTIONS, COLOR_OPTIONS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("coordinate out of range: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("invalid date/time \"{0}\"")]
    InvalidDateTime(String),

    #[error("local time {0} does not map to a single instant")]
    AmbiguousLocalTime(String),

    #[error("sighting time {0} is in the future")]
    SightedAtInFuture(String),

    #[error("unknown feature tag: {0}")]
    UnknownFeatureTag(String),
}
