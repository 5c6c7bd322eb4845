//! Object storage: upload and public URLs.

use reqwest::{header, Method, Url};
use serde::Deserialize;

use crate::client::SupabaseClient;
use crate::error::SupabaseError;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    /// Bucket-qualified key, e.g. `images/sightings/<uuid>.jpg`.
    #[serde(rename = "Key")]
    key: Option<String>,
}

impl SupabaseClient {
    fn object_url(&self, visibility: &str, path: &str) -> Url {
        let prefix = if visibility.is_empty() {
            "storage/v1/object".to_owned()
        } else {
            format!("storage/v1/object/{visibility}")
        };
        self.endpoint(&format!("{prefix}/{}/{}", self.bucket, path.trim_start_matches('/')))
    }

    /// Uploads `bytes` under `key` in the configured bucket without
    /// overwriting. Returns the object path within the bucket.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Api`] when the store rejects the object (for
    /// example a duplicate key), or [`SupabaseError::Http`] on network failure.
    pub async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, SupabaseError> {
        let size = bytes.len();
        let url = self.object_url("", key);
        let response = self
            .request(Method::POST, url)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let uploaded: UploadResponse = Self::decode(response, "storage upload").await?;

        let bucket_prefix = format!("{}/", self.bucket);
        let path = uploaded
            .key
            .as_deref()
            .map(|k| k.strip_prefix(&bucket_prefix).unwrap_or(k).to_owned())
            .unwrap_or_else(|| key.to_owned());

        tracing::info!(%path, size, bucket = %self.bucket, "object uploaded");
        Ok(path)
    }

    /// Public URL of an object in the configured bucket. No request is made.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        self.object_url("public", path).to_string()
    }
}
