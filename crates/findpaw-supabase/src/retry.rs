//! Retry with exponential back-off and jitter for idempotent reads.
//!
//! Writes (uploads, inserts) are never routed through here: a retried insert
//! could create a duplicate row, and a retried upload collides with
//! `x-upsert: false`.

use std::future::Future;
use std::time::Duration;

use crate::error::SupabaseError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// Retriable: timeouts, connection failures, HTTP 429 and 5xx.
/// Everything else (4xx, malformed bodies) fails the same way on every attempt.
pub(crate) fn is_retriable(err: &SupabaseError) -> bool {
    match err {
        SupabaseError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SupabaseError::Api { status, .. } => *status == 429 || *status >= 500,
        SupabaseError::Deserialize { .. }
        | SupabaseError::InvalidBaseUrl { .. }
        | SupabaseError::MissingCount { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The n-th retry sleeps `backoff_base_ms * 2^(n-1)` ± 25 % jitter, capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SupabaseError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SupabaseError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient backend error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
