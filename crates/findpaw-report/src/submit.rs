//! Two-phase sighting submission: upload the photo, then insert the row.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Local, Utc};
use findpaw_core::sighted_at::{ensure_not_future, to_utc_instant};
use findpaw_core::{CoreError, NewSighting};
use findpaw_supabase::{SupabaseClient, SupabaseError};
use thiserror::Error;
use uuid::Uuid;

use crate::capture::ImageFile;
use crate::draft::SubmissionDraft;

const OBJECT_PREFIX: &str = "sightings";
const DEFAULT_EXTENSION: &str = "jpg";

#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("a photo is required")]
    MissingImage,

    #[error("a location is required")]
    MissingLocation,

    #[error("sighting time cannot be in the future")]
    SightedAtInFuture,

    #[error("invalid sighting time: {0}")]
    InvalidSightedAt(CoreError),

    #[error("a submission is already in progress")]
    InFlight,

    #[error("photo upload failed: {0}")]
    UploadFailed(String),

    #[error("saving the report failed: {0}")]
    PersistFailed(String),
}

/// Where sighting photos are stored.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `bytes` under `key`, returning the stored path.
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, SupabaseError>;

    fn public_url(&self, path: &str) -> String;
}

/// Where sighting rows are persisted.
#[async_trait]
pub trait SightingStore: Send + Sync {
    async fn insert_sighting(&self, row: &NewSighting) -> Result<(), SupabaseError>;
}

#[async_trait]
impl ImageStore for SupabaseClient {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, SupabaseError> {
        SupabaseClient::upload(self, key, bytes, content_type).await
    }

    fn public_url(&self, path: &str) -> String {
        SupabaseClient::public_url(self, path)
    }
}

#[async_trait]
impl SightingStore for SupabaseClient {
    async fn insert_sighting(&self, row: &NewSighting) -> Result<(), SupabaseError> {
        SupabaseClient::insert_sighting(self, row).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub object_path: String,
    pub image_url: String,
}

/// Storage key for a new photo: `sightings/<uuid>.<ext>`.
#[must_use]
pub fn object_key(file: &ImageFile, id: Uuid) -> String {
    let ext = file.extension().unwrap_or(DEFAULT_EXTENSION);
    format!("{OBJECT_PREFIX}/{id}.{ext}")
}

/// Clears the in-flight flag when the submission ends, on any path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SightingSubmitter<I, S> {
    images: I,
    rows: S,
    in_flight: AtomicBool,
}

impl<I: ImageStore, S: SightingStore> SightingSubmitter<I, S> {
    pub fn new(images: I, rows: S) -> Self {
        Self {
            images,
            rows,
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Uploads the draft's photo and inserts the sighting row.
    ///
    /// The draft is not modified; resetting it after success is up to the
    /// caller. When the insert fails the uploaded photo is left in storage.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::MissingImage`], [`SubmitError::MissingLocation`],
    /// [`SubmitError::SightedAtInFuture`] or [`SubmitError::InFlight`] before
    /// any network call; [`SubmitError::UploadFailed`] or
    /// [`SubmitError::PersistFailed`] when the corresponding phase fails.
    pub async fn submit(&self, draft: &SubmissionDraft) -> Result<SubmissionReceipt, SubmitError> {
        let image = draft.image.as_ref().ok_or(SubmitError::MissingImage)?;
        let location = draft.location.ok_or(SubmitError::MissingLocation)?;
        let sighted_at =
            to_utc_instant(draft.sighted_at, &Local).map_err(SubmitError::InvalidSightedAt)?;
        ensure_not_future(sighted_at, Utc::now()).map_err(|_| SubmitError::SightedAtInFuture)?;

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("submission already in flight, ignoring");
            return Err(SubmitError::InFlight);
        };

        let key = object_key(image, Uuid::new_v4());
        let object_path = self
            .images
            .upload(&key, image.bytes.to_vec(), &image.content_type)
            .await
            .map_err(|e| {
                tracing::warn!(%key, error = %e, "photo upload failed");
                SubmitError::UploadFailed(e.to_string())
            })?;
        let image_url = self.images.public_url(&object_path);

        let row = draft.to_row(image_url.clone(), location, sighted_at);
        self.rows.insert_sighting(&row).await.map_err(|e| {
            tracing::warn!(%object_path, error = %e, "sighting insert failed, photo left in storage");
            SubmitError::PersistFailed(e.to_string())
        })?;

        tracing::info!(%object_path, %location, %sighted_at, "sighting submitted");
        Ok(SubmissionReceipt {
            object_path,
            image_url,
        })
    }
}

#[cfg(test)]
#[path = "submit_test.rs"]
mod tests;
