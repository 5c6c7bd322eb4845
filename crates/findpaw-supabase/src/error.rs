use thiserror::Error;

/// `PostgREST` code for "JSON object requested, multiple (or no) rows returned".
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Errors returned by the backend client.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    ///
    /// `code` is the machine-readable code from the body when present
    /// (`PostgREST` `code`, auth `error_code`, storage `error`).
    #[error("backend error {status}{}: {message}", code_suffix(.code.as_deref()))]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A count query came back without a usable `Content-Range` header.
    #[error("missing or malformed Content-Range for {context}")]
    MissingCount { context: String },
}

fn code_suffix(code: Option<&str>) -> String {
    code.map(|c| format!(" ({c})")).unwrap_or_default()
}

impl SupabaseError {
    /// `true` when a single-row query matched nothing.
    #[must_use]
    pub fn is_no_rows(&self) -> bool {
        matches!(self, SupabaseError::Api { code: Some(code), .. } if code == NO_ROWS_CODE)
    }

    /// HTTP status of an API error, if this is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            SupabaseError::Api { status, .. } => Some(*status),
            SupabaseError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
