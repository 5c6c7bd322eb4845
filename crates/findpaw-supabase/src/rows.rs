//! `PostgREST` row queries: sightings, user profiles and lost post counts.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use findpaw_core::{
    display_nickname, LostPostStatus, NewSighting, NewUserProfile, Sighting, UserProfile,
    UserStats,
};
use reqwest::{header, Method, Url};
use uuid::Uuid;

use crate::client::SupabaseClient;
use crate::error::SupabaseError;
use crate::retry::retry_with_backoff;

const SIGHTING_COLUMNS: &str =
    "id,latitude,longitude,image_url,breed,color,features,description,sighted_at";
const PROFILE_COLUMNS: &str = "id,nickname,created_at";
/// Makes `PostgREST` answer with a bare object and fail with `PGRST116` on zero rows.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

impl SupabaseClient {
    fn table_url(&self, table: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint(&format!("rest/v1/{table}"));
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Inserts one sighting row. Returns nothing: anonymous reporters may
    /// insert but not read back.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Api`] when the insert is rejected, or
    /// [`SupabaseError::Http`] on network failure.
    pub async fn insert_sighting(&self, row: &NewSighting) -> Result<(), SupabaseError> {
        let url = self.table_url("sightings", &[]);
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        Self::check(response).await?;
        tracing::info!(image_url = %row.image_url, "sighting row inserted");
        Ok(())
    }

    /// Sightings whose `sighted_at` falls within the last `days` days of
    /// `now`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError`] after retries are exhausted for transient
    /// failures, or immediately for client errors and malformed bodies.
    pub async fn list_recent_sightings(
        &self,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Sighting>, SupabaseError> {
        let cutoff = (now - Duration::days(i64::from(days)))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let gte = format!("gte.{cutoff}");
        let url = self.table_url(
            "sightings",
            &[
                ("select", SIGHTING_COLUMNS),
                ("sighted_at", &gte),
                ("order", "sighted_at.desc"),
            ],
        );

        let sightings: Vec<Sighting> =
            retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                let url = url.clone();
                async move {
                    let response = self.request(Method::GET, url).send().await?;
                    let response = Self::check(response).await?;
                    Self::decode(response, "sightings list").await
                }
            })
            .await?;

        tracing::debug!(count = sightings.len(), days, "fetched recent sightings");
        Ok(sightings)
    }

    /// Fetches the profile row for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Api`] with code `PGRST116` when no row exists
    /// (see [`SupabaseError::is_no_rows`]).
    pub async fn fetch_profile(&self, user_id: Uuid) -> Result<UserProfile, SupabaseError> {
        let id_filter = format!("eq.{user_id}");
        let url = self.table_url("users", &[("select", PROFILE_COLUMNS), ("id", &id_filter)]);

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .request(Method::GET, url)
                    .header(header::ACCEPT, SINGLE_OBJECT)
                    .send()
                    .await?;
                let response = Self::check(response).await?;
                Self::decode(response, "user profile").await
            }
        })
        .await
    }

    /// Creates a profile row and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError`] if the insert is rejected or the returned row
    /// cannot be decoded.
    pub async fn create_profile(&self, row: &NewUserProfile) -> Result<UserProfile, SupabaseError> {
        let url = self.table_url("users", &[("select", PROFILE_COLUMNS)]);
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .header(header::ACCEPT, SINGLE_OBJECT)
            .json(row)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Self::decode(response, "created user profile").await
    }

    /// Loads the user's profile, creating it with a generated nickname when
    /// the row does not exist yet. The returned nickname is always populated.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError`] for any failure other than the missing row.
    pub async fn fetch_or_create_profile(
        &self,
        user_id: Uuid,
    ) -> Result<UserProfile, SupabaseError> {
        let mut profile = match self.fetch_profile(user_id).await {
            Ok(profile) => profile,
            Err(e) if e.is_no_rows() => {
                let nickname = findpaw_core::default_nickname(&user_id);
                tracing::info!(%user_id, %nickname, "creating missing user profile");
                self.create_profile(&NewUserProfile {
                    id: user_id,
                    nickname,
                })
                .await?
            }
            Err(e) => return Err(e),
        };
        profile.nickname = Some(display_nickname(profile.nickname.as_deref(), &profile.id));
        Ok(profile)
    }

    /// Counts the user's lost posts, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::MissingCount`] when the response has no
    /// parsable `Content-Range` total.
    pub async fn count_lost_posts(
        &self,
        user_id: Uuid,
        status: Option<LostPostStatus>,
    ) -> Result<u64, SupabaseError> {
        let user_filter = format!("eq.{user_id}");
        let status_filter = status.map(|s| format!("eq.{}", s.as_str()));
        let mut params = vec![("select", "*"), ("user_id", user_filter.as_str())];
        if let Some(filter) = &status_filter {
            params.push(("status", filter.as_str()));
        }
        let url = self.table_url("lost_posts", &params);
        let context = format!("lost_posts count (status={})", status.map_or("any", LostPostStatus::as_str));

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let context = context.clone();
            async move {
                let response = self
                    .request(Method::HEAD, url)
                    .header("Prefer", "count=exact")
                    .send()
                    .await?;
                let response = Self::check(response).await?;
                response
                    .headers()
                    .get(header::CONTENT_RANGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_content_range_total)
                    .ok_or(SupabaseError::MissingCount { context })
            }
        })
        .await
    }

    /// Lost post counters for the "my" page.
    ///
    /// The total must succeed; a failing per-status count is logged and
    /// reported as zero.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError`] if the total count fails.
    pub async fn user_stats(&self, user_id: Uuid) -> Result<UserStats, SupabaseError> {
        let lost_posts_count = self.count_lost_posts(user_id, None).await?;
        let mut stats = UserStats {
            lost_posts_count,
            ..UserStats::default()
        };

        for status in LostPostStatus::ALL {
            let count = match self.count_lost_posts(user_id, Some(status)).await {
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(%user_id, status = status.as_str(), error = %e, "status count failed, reporting 0");
                    0
                }
            };
            match status {
                LostPostStatus::Searching => stats.searching_count = count,
                LostPostStatus::Found => stats.found_count = count,
                LostPostStatus::Closed => stats.closed_count = count,
            }
        }

        Ok(stats)
    }
}

/// Extracts the total from `Content-Range` values like `0-24/3573` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}
