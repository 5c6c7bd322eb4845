//! Sighting reports: photo capture and compression, the form draft, and the
//! upload-then-insert submission.

pub mod capture;
pub mod draft;
pub mod form;
pub mod submit;

pub use capture::{
    CompressError, CompressionOptions, Compressor, ImageCapture, ImageFile, JpegCompressor,
    PreviewHandle, PreviewRegistry, COMPRESSION_THRESHOLD_BYTES,
};
pub use draft::SubmissionDraft;
pub use form::ReportForm;
pub use submit::{
    object_key, ImageStore, SightingStore, SightingSubmitter, SubmissionReceipt, SubmitError,
};
