//! Photo selection: optional compression and the preview handle.

use std::collections::HashSet;
use std::fmt;
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;
use tokio::sync::watch;

/// 0.7 MiB, rounded down. Files at or below this size are used as selected,
/// and compressed output aims to fit under it.
pub const COMPRESSION_THRESHOLD_BYTES: usize = 734_003;

/// A selected photo. Clones share one byte buffer.
#[derive(Clone)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

impl ImageFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Text after the last `.` in the name, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }

    /// Whether both files point at the same buffer.
    #[must_use]
    pub fn same_buffer(&self, other: &ImageFile) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.size())
            .finish()
    }
}

/// Tracks which preview handles are live.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    next_id: Arc<AtomicU64>,
    live: Arc<Mutex<HashSet<u64>>>,
}

impl PreviewRegistry {
    #[must_use]
    pub fn create(&self, file: &ImageFile) -> PreviewHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.live_set().insert(id);
        PreviewHandle {
            id,
            url: format!("preview://{id}/{}", file.name),
            registry: self.clone(),
        }
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live_set().len()
    }

    #[must_use]
    pub fn is_live(&self, id: u64) -> bool {
        self.live_set().contains(&id)
    }

    fn revoke(&self, id: u64) {
        if self.live_set().remove(&id) {
            tracing::debug!(preview = id, "preview revoked");
        }
    }

    fn live_set(&self) -> std::sync::MutexGuard<'_, HashSet<u64>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A live preview reference. Revoked when dropped.
#[derive(Debug)]
pub struct PreviewHandle {
    id: u64,
    url: String,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn revoke(self) {
        drop(self);
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.revoke(self.id);
    }
}

/// Output limits for [`Compressor`] implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOptions {
    pub max_size_bytes: usize,
    /// Longest edge of the output in pixels.
    pub max_dimension: u32,
    /// Initial JPEG quality, 1-100.
    pub quality: u8,
    pub max_iterations: u32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_size_bytes: COMPRESSION_THRESHOLD_BYTES,
            max_dimension: 1280,
            quality: 70,
            max_iterations: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("compression task failed: {0}")]
    Task(String),
}

/// Blocking image compressor. Called on the blocking thread pool.
pub trait Compressor: Send + Sync + 'static {
    /// Produces a smaller file. Missing the size target is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CompressError`] when the input cannot be decoded or encoded.
    fn compress(
        &self,
        file: &ImageFile,
        options: &CompressionOptions,
    ) -> Result<ImageFile, CompressError>;
}

/// Downscales and re-encodes as JPEG, lowering quality and size until the
/// output fits or the iteration budget runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCompressor;

const QUALITY_STEP: u8 = 10;
const MIN_QUALITY: u8 = 10;
/// Per-iteration scale factor, in percent.
const SCALE_STEP_PERCENT: u32 = 85;

impl Compressor for JpegCompressor {
    fn compress(
        &self,
        file: &ImageFile,
        options: &CompressionOptions,
    ) -> Result<ImageFile, CompressError> {
        let decoded = image::load_from_memory(&file.bytes)?;
        let max = options.max_dimension;
        let mut img = if decoded.width() > max || decoded.height() > max {
            decoded.resize(max, max, FilterType::Lanczos3)
        } else {
            decoded
        };

        let mut quality = options.quality.clamp(1, 100);
        let mut encoded = encode_jpeg(&img, quality)?;
        let mut iterations = 1;

        while encoded.len() > options.max_size_bytes && iterations < options.max_iterations {
            quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
            let width = (img.width() * SCALE_STEP_PERCENT / 100).max(1);
            let height = (img.height() * SCALE_STEP_PERCENT / 100).max(1);
            img = img.resize_exact(width, height, FilterType::Triangle);
            encoded = encode_jpeg(&img, quality)?;
            iterations += 1;
        }

        tracing::debug!(
            iterations,
            quality,
            width = img.width(),
            height = img.height(),
            size = encoded.len(),
            "jpeg compression finished"
        );
        Ok(ImageFile::new(jpeg_name(&file.name), "image/jpeg", encoded))
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality).encode_image(&img.to_rgb8())?;
    Ok(out.into_inner())
}

fn jpeg_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}.jpg"),
        _ => format!("{name}.jpg"),
    }
}

/// Photo state of the report form.
///
/// At most one preview is live; replacing or removing the photo revokes the
/// previous preview first, and dropping the capture revokes the last one.
pub struct ImageCapture<C> {
    compressor: Arc<C>,
    options: CompressionOptions,
    previews: PreviewRegistry,
    file: Option<ImageFile>,
    preview: Option<PreviewHandle>,
    compressing: watch::Sender<bool>,
}

impl<C: Compressor> ImageCapture<C> {
    pub fn new(compressor: C, previews: PreviewRegistry) -> Self {
        let (compressing, _rx) = watch::channel(false);
        Self {
            compressor: Arc::new(compressor),
            options: CompressionOptions::default(),
            previews,
            file: None,
            preview: None,
            compressing,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: CompressionOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn file(&self) -> Option<&ImageFile> {
        self.file.as_ref()
    }

    #[must_use]
    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    #[must_use]
    pub fn is_compressing(&self) -> bool {
        *self.compressing.borrow()
    }

    #[must_use]
    pub fn subscribe_compressing(&self) -> watch::Receiver<bool> {
        self.compressing.subscribe()
    }

    /// Adopts a newly selected photo, compressing it first when it is large.
    ///
    /// Compression failures fall back to the original file.
    pub async fn on_file_selected(&mut self, file: ImageFile) {
        self.preview = None;
        self.file = None;

        let original_size = file.size();
        if original_size <= COMPRESSION_THRESHOLD_BYTES {
            tracing::debug!(name = %file.name, size = original_size, "photo small enough, not compressing");
            self.adopt(file);
            return;
        }

        self.compressing.send_replace(true);
        let compressor = Arc::clone(&self.compressor);
        let options = self.options;
        let input = file.clone();
        let result = tokio::task::spawn_blocking(move || compressor.compress(&input, &options))
            .await
            .map_err(|e| CompressError::Task(e.to_string()))
            .and_then(|r| r);
        self.compressing.send_replace(false);

        match result {
            Ok(compressed) => {
                log_reduction(original_size, compressed.size());
                self.adopt(compressed);
            }
            Err(e) => {
                tracing::warn!(name = %file.name, error = %e, "compression failed, using original photo");
                self.adopt(file);
            }
        }
    }

    /// Revokes the preview and forgets the photo.
    pub fn on_remove(&mut self) {
        self.preview = None;
        self.file = None;
    }

    fn adopt(&mut self, file: ImageFile) {
        self.preview = Some(self.previews.create(&file));
        self.file = Some(file);
    }
}

#[allow(clippy::cast_precision_loss)]
fn log_reduction(original: usize, compressed: usize) {
    let mib = |bytes: usize| bytes as f64 / (1024.0 * 1024.0);
    let reduction = (1.0 - compressed as f64 / original as f64) * 100.0;
    tracing::info!(
        original_mib = %format!("{:.2}", mib(original)),
        compressed_mib = %format!("{:.2}", mib(compressed)),
        reduction_pct = %format!("{reduction:.1}"),
        "photo compressed"
    );
}

#[cfg(test)]
#[path = "capture_test.rs"]
mod tests;
