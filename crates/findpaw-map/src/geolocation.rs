//! Single-shot position requests against the platform location API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use findpaw_core::Coordinate;
use thiserror::Error;
use tokio::sync::watch;

const PERMISSION_DENIED: u16 = 1;
const POSITION_UNAVAILABLE: u16 = 2;
const TIMEOUT: u16 = 3;

/// Accuracy, timeout and cache policy for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest platform-cached fix that is acceptable. Zero forces a fresh fix.
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// Map page, on mount and when retrying out of fallback mode.
    pub const MAP_DEFAULT: PositionOptions = PositionOptions {
        high_accuracy: false,
        timeout: Duration::from_secs(15),
        maximum_age: Duration::ZERO,
    };

    /// Map page recenter control with no known position.
    pub const MAP_RECENTER: PositionOptions = PositionOptions {
        high_accuracy: true,
        timeout: Duration::from_secs(15),
        maximum_age: Duration::ZERO,
    };

    /// Initial location of the report form.
    pub const REPORT_FORM: PositionOptions = PositionOptions {
        high_accuracy: false,
        timeout: Duration::from_secs(10),
        maximum_age: Duration::from_secs(300),
    };
}

/// Error reported by the platform, with its numeric code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationFailure {
    #[error("location access denied; enable location permissions in settings")]
    PermissionDenied,

    #[error("location information is unavailable")]
    Unavailable,

    #[error("location request timed out")]
    Timeout,

    #[error("geolocation is not supported on this platform")]
    Unsupported,

    #[error("unknown location error: {message}")]
    Unknown { message: String },
}

impl From<PlatformError> for GeolocationFailure {
    fn from(err: PlatformError) -> Self {
        match err.code {
            PERMISSION_DENIED => Self::PermissionDenied,
            POSITION_UNAVAILABLE => Self::Unavailable,
            TIMEOUT => Self::Timeout,
            _ => Self::Unknown {
                message: err.message,
            },
        }
    }
}

pub type GeolocationResult = Result<Coordinate, GeolocationFailure>;

/// The platform location API.
#[async_trait]
pub trait PositionSource: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(&self, options: &PositionOptions)
        -> Result<Coordinate, PlatformError>;
}

/// Published request state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeolocationSnapshot {
    pub loading: bool,
    pub last: Option<GeolocationResult>,
}

/// Adapter over a [`PositionSource`].
///
/// Each request marks the snapshot as loading. Only the most recently started
/// request clears the flag and publishes its outcome; older requests still
/// complete and return their result to their own caller.
pub struct Geolocation<P> {
    source: P,
    state: watch::Sender<GeolocationSnapshot>,
    latest_request: AtomicU64,
}

impl<P: PositionSource> Geolocation<P> {
    pub fn new(source: P) -> Self {
        let (state, _rx) = watch::channel(GeolocationSnapshot::default());
        Self {
            source,
            state,
            latest_request: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> GeolocationSnapshot {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<GeolocationSnapshot> {
        self.state.subscribe()
    }

    /// Requests the current position once. Never retries.
    pub async fn request_position(&self, options: &PositionOptions) -> GeolocationResult {
        let request = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.source.is_supported() {
            let outcome = Err(GeolocationFailure::Unsupported);
            self.publish(request, &outcome);
            return outcome;
        }

        self.state.send_modify(|s| s.loading = true);
        tracing::debug!(
            request,
            high_accuracy = options.high_accuracy,
            timeout_ms = options.timeout.as_millis(),
            "requesting position"
        );

        let outcome = match tokio::time::timeout(
            options.timeout,
            self.source.current_position(options),
        )
        .await
        {
            Ok(Ok(coordinate)) => Ok(coordinate),
            Ok(Err(err)) => Err(GeolocationFailure::from(err)),
            Err(_) => Err(GeolocationFailure::Timeout),
        };

        if let Err(failure) = &outcome {
            tracing::warn!(request, %failure, "position request failed");
        }
        self.publish(request, &outcome);
        outcome
    }

    fn publish(&self, request: u64, outcome: &GeolocationResult) {
        if self.latest_request.load(Ordering::SeqCst) != request {
            tracing::debug!(request, "position request superseded, not publishing");
            return;
        }
        self.state.send_modify(|s| {
            s.loading = false;
            s.last = Some(outcome.clone());
        });
    }
}

/// A source that always answers with the same fix or error.
#[derive(Debug, Clone)]
pub struct FixedPositionSource {
    answer: Option<Result<Coordinate, PlatformError>>,
}

impl FixedPositionSource {
    #[must_use]
    pub fn at(coordinate: Coordinate) -> Self {
        Self {
            answer: Some(Ok(coordinate)),
        }
    }

    #[must_use]
    pub fn failing(code: u16, message: impl Into<String>) -> Self {
        Self {
            answer: Some(Err(PlatformError {
                code,
                message: message.into(),
            })),
        }
    }

    /// A platform without location support.
    #[must_use]
    pub fn unsupported() -> Self {
        Self { answer: None }
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    fn is_supported(&self) -> bool {
        self.answer.is_some()
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinate, PlatformError> {
        match &self.answer {
            Some(answer) => answer.clone(),
            None => Err(PlatformError {
                code: 0,
                message: "geolocation unsupported".to_owned(),
            }),
        }
    }
}
