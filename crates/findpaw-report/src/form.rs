//! One report form session: draft values, the photo and submission.

use findpaw_core::Coordinate;
use findpaw_map::{Geolocation, GeolocationResult, PositionOptions, PositionSource};

use crate::capture::{Compressor, ImageCapture, ImageFile, PreviewHandle};
use crate::draft::SubmissionDraft;
use crate::submit::{ImageStore, SightingStore, SightingSubmitter, SubmissionReceipt, SubmitError};

pub struct ReportForm<C> {
    draft: SubmissionDraft,
    capture: ImageCapture<C>,
    location_auto_detected: bool,
}

impl<C: Compressor> ReportForm<C> {
    pub fn new(capture: ImageCapture<C>) -> Self {
        Self {
            draft: SubmissionDraft::default(),
            capture,
            location_auto_detected: false,
        }
    }

    #[must_use]
    pub fn draft(&self) -> &SubmissionDraft {
        &self.draft
    }

    /// Text fields, features and time. Photo and location have their own setters.
    pub fn draft_mut(&mut self) -> &mut SubmissionDraft {
        &mut self.draft
    }

    #[must_use]
    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.capture.preview()
    }

    #[must_use]
    pub fn is_compressing(&self) -> bool {
        self.capture.is_compressing()
    }

    #[must_use]
    pub fn location_auto_detected(&self) -> bool {
        self.location_auto_detected
    }

    pub async fn select_photo(&mut self, file: ImageFile) {
        self.capture.on_file_selected(file).await;
        self.draft.image = self.capture.file().cloned();
    }

    pub fn remove_photo(&mut self) {
        self.capture.on_remove();
        self.draft.image = None;
    }

    /// Location chosen by hand in the picker.
    pub fn set_location(&mut self, location: Coordinate, address: Option<String>) {
        self.draft.location = Some(location);
        self.draft.address = address;
        self.location_auto_detected = false;
    }

    /// Fills the location from the device if none is set yet.
    pub async fn detect_location<P: PositionSource>(
        &mut self,
        geolocation: &Geolocation<P>,
    ) -> GeolocationResult {
        let outcome = geolocation
            .request_position(&PositionOptions::REPORT_FORM)
            .await;
        match &outcome {
            Ok(here) if self.draft.location.is_none() => {
                self.draft.location = Some(*here);
                self.location_auto_detected = true;
            }
            Ok(_) => {}
            Err(failure) => {
                tracing::info!(%failure, "could not detect report location, user must pick one");
            }
        }
        outcome
    }

    /// Submits the draft. On success the form is cleared and the photo
    /// preview revoked; on failure everything is kept for a retry.
    ///
    /// # Errors
    ///
    /// Propagates [`SubmitError`] from the submitter.
    pub async fn submit<I: ImageStore, S: SightingStore>(
        &mut self,
        submitter: &SightingSubmitter<I, S>,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let receipt = submitter.submit(&self.draft).await?;
        self.reset();
        Ok(receipt)
    }

    pub fn reset(&mut self) {
        self.capture.on_remove();
        self.draft = SubmissionDraft::default();
        self.location_auto_detected = false;
    }
}
