//! Read-only listing of recent sightings.

use chrono::{Local, Utc};
use findpaw_core::sighted_at::format_for_display;
use findpaw_core::{Sighting, SightingMarker};
use findpaw_supabase::SupabaseClient;

/// One printable line per sighting: when, what, where and the tagged features.
pub(crate) fn format_sighting_line(sighting: &Sighting, today: chrono::NaiveDate) -> String {
    let marker = SightingMarker::from(sighting);
    let when = format_for_display(sighting.sighted_at.with_timezone(&Local).naive_local(), today);
    let features = sighting
        .feature_tags()
        .into_iter()
        .map(findpaw_core::FeatureTag::label)
        .collect::<Vec<_>>()
        .join(", ");

    let mut line = format!("{when:<18} {:<20} {}", marker.breed_label, marker.coordinate);
    if let Some(color) = sighting.color.as_deref().filter(|c| !c.trim().is_empty()) {
        line.push_str(&format!("  [{color}]"));
    }
    if !features.is_empty() {
        line.push_str(&format!("  ({features})"));
    }
    line
}

/// Lists sightings from the last `days` days, newest first.
///
/// # Errors
///
/// Returns an error if the sightings query fails after retries.
pub(crate) async fn run_sightings_list(client: &SupabaseClient, days: u32) -> anyhow::Result<()> {
    let sightings = client.list_recent_sightings(days, Utc::now()).await?;
    if sightings.is_empty() {
        println!("No sightings in the last {days} days.");
        return Ok(());
    }

    let today = Local::now().date_naive();
    println!("{} sighting(s) in the last {days} days:", sightings.len());
    for sighting in &sightings {
        println!("{}", format_sighting_line(sighting, today));
        println!("  {}", sighting.image_url);
    }
    Ok(())
}
