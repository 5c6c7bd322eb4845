//! `report submit`: builds a report form from flags and submits it.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use findpaw_core::sighted_at::parse_datetime_local;
use findpaw_core::{Coordinate, FeatureTag};
use findpaw_map::{FixedPositionSource, Geolocation};
use findpaw_report::{
    ImageCapture, ImageFile, JpegCompressor, PreviewRegistry, ReportForm, SightingSubmitter,
};
use findpaw_supabase::SupabaseClient;

#[derive(Debug, Subcommand)]
pub enum ReportCommands {
    /// Upload a photo and record a sighting
    Submit(SubmitArgs),
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Photo of the dog (JPEG, PNG or WebP)
    #[arg(long)]
    pub photo: PathBuf,
    /// Latitude of the sighting
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,
    /// Longitude of the sighting
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,
    /// Human-readable address of the location
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub breed: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    /// Feature tag id; repeat for several (collar, clothes, scared, friendly)
    #[arg(long = "feature")]
    pub features: Vec<FeatureTag>,
    #[arg(long)]
    pub description: Option<String>,
    /// Local sighting time as `YYYY-MM-DDTHH:MM` (defaults to now)
    #[arg(long)]
    pub sighted_at: Option<String>,
    /// Access token of the signed-in reporter
    #[arg(long, env = "FINDPAW_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,
}

/// MIME type for a photo path, judged by extension.
pub(crate) fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}

/// Reads the photo, fills a report form and submits it.
///
/// # Errors
///
/// Returns an error if the photo cannot be read, a flag value is invalid, or
/// the submission fails. A failed insert leaves the uploaded photo in storage.
pub(crate) async fn run_report_submit(
    client: &SupabaseClient,
    args: SubmitArgs,
) -> anyhow::Result<()> {
    let location = Coordinate::new(args.lat, args.lng)?;
    let sighted_at = args
        .sighted_at
        .as_deref()
        .map(parse_datetime_local)
        .transpose()?;

    let bytes = tokio::fs::read(&args.photo)
        .await
        .with_context(|| format!("reading photo {}", args.photo.display()))?;
    let name = args
        .photo
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("photo.jpg")
        .to_owned();
    let photo = ImageFile::new(name, content_type_for(&args.photo), bytes);

    let mut form = ReportForm::new(ImageCapture::new(JpegCompressor, PreviewRegistry::default()));
    form.select_photo(photo).await;
    let position = Geolocation::new(FixedPositionSource::at(location));
    form.detect_location(&position).await?;
    {
        let draft = form.draft_mut();
        draft.address = args.address;
        draft.breed = args.breed.unwrap_or_default();
        draft.color = args.color.unwrap_or_default();
        draft.description = args.description.unwrap_or_default();
        draft.features.extend(args.features);
        if let Some(sighted_at) = sighted_at {
            draft.sighted_at = sighted_at;
        }
    }

    let client = match args.access_token.as_deref() {
        Some(token) => client.with_access_token(token),
        None => client.clone(),
    };
    let submitter = SightingSubmitter::new(client.clone(), client);
    let receipt = form.submit(&submitter).await?;

    println!("Sighting submitted.");
    println!("  photo: {}", receipt.image_url);
    Ok(())
}
