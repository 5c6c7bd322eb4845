//! HTTP client for the backend's REST surfaces.
//!
//! One [`SupabaseClient`] talks to three services that share a base URL:
//! `auth/v1`, `rest/v1` (`PostgREST`) and `storage/v1`. Every request carries
//! the project's anon key; requests made on behalf of a signed-in user carry
//! the user's access token as the bearer instead.

use std::time::Duration;

use findpaw_core::AppConfig;
use reqwest::{header, Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::error::SupabaseError;

const USER_AGENT: &str = "findpaw/0.1 (sighting-client)";

/// Client for the backend REST API.
///
/// Use [`SupabaseClient::from_config`] in binaries or
/// [`SupabaseClient::with_base_url`] to point at a mock server in tests.
#[derive(Clone)]
pub struct SupabaseClient {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    anon_key: String,
    access_token: Option<String>,
    pub(crate) bucket: String,
    pub(crate) max_retries: u32,
    pub(crate) backoff_base_ms: u64,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .field("bucket", &self.bucket)
            .field("authenticated", &self.access_token.is_some())
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Builds a client from loaded application config.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`SupabaseError::InvalidBaseUrl`] for a malformed URL.
    pub fn from_config(config: &AppConfig) -> Result<Self, SupabaseError> {
        let mut client = Self::with_base_url(
            &config.supabase_url,
            &config.supabase_anon_key,
            config.request_timeout_secs,
        )?;
        client.bucket.clone_from(&config.storage_bucket);
        client.max_retries = config.max_retries;
        client.backoff_base_ms = config.retry_backoff_base_ms;
        Ok(client)
    }

    /// Creates a client with a custom base URL, the `images` bucket and no retries.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`SupabaseError::InvalidBaseUrl`] for a malformed URL.
    pub fn with_base_url(
        base_url: &str,
        anon_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, SupabaseError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        // Exactly one trailing slash so `Url::join` appends instead of
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| SupabaseError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: parsed,
            anon_key: anon_key.to_owned(),
            access_token: None,
            bucket: "images".to_owned(),
            max_retries: 0,
            backoff_base_ms: 500,
        })
    }

    /// Returns a copy of this client that acts on behalf of a signed-in user.
    #[must_use]
    pub fn with_access_token(&self, access_token: &str) -> Self {
        let mut authed = self.clone();
        authed.access_token = Some(access_token.to_owned());
        authed
    }

    /// Overrides the retry policy used for idempotent reads.
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Resolves `path` (no leading slash) against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        {
            let base_path = url.path().trim_end_matches('/').to_owned();
            url.set_path(&format!("{base_path}/{}", path.trim_start_matches('/')));
        }
        url
    }

    /// Starts a request with the `apikey` and bearer headers set.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
    }

    /// Passes 2xx responses through and turns anything else into
    /// [`SupabaseError::Api`] with the body's code and message.
    pub(crate) async fn check(response: Response) -> Result<Response, SupabaseError> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(Self::error_from_response(response).await)
    }

    async fn error_from_response(response: Response) -> SupabaseError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let parsed: Option<serde_json::Value> = serde_json::from_str(&body).ok();
        let field = |key: &str| -> Option<String> {
            parsed
                .as_ref()
                .and_then(|v| v.get(key))
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        };

        let code = field("code")
            .or_else(|| field("error_code"))
            .or_else(|| field("error"));
        let message = field("message")
            .or_else(|| field("msg"))
            .or_else(|| field("error_description"))
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.clone()
                }
            });

        SupabaseError::Api {
            status,
            code,
            message,
        }
    }

    /// Reads the body as text and deserializes it, tagging failures with `context`.
    pub(crate) async fn decode<T: DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T, SupabaseError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SupabaseError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}
