//! The booking submission pipeline.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::{compose, validate, BookingRequest};
use crate::notifier::{Notifier, NotifyError};
use crate::ratelimit::RateLimiter;

/// Why a booking submission was refused.
///
/// The display text of each variant is exactly what the client sees.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Anything other than `POST`.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The client submitted too often.
    #[error("Too many requests. Please wait a minute and try again.")]
    RateLimited,

    /// The body was not a JSON booking request.
    #[error("Invalid request body.")]
    MalformedPayload,

    /// A required customer field was empty.
    #[error("Missing required fields.")]
    MissingFields,

    /// The email address didn't look like one.
    #[error("Invalid email address.")]
    InvalidEmail,

    /// The notification could not be delivered. The cause is logged, never
    /// shown to the client.
    #[error("Failed to send your request. Please try again or contact us directly.")]
    Delivery(#[source] NotifyError),
}

impl BookingError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::MalformedPayload | Self::MissingFields | Self::InvalidEmail => {
                StatusCode::BAD_REQUEST
            }
            Self::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

/// What happened to an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOutcome {
    /// The notification was handed to the mail relay.
    Delivered,
    /// The honeypot was filled in; nothing was sent.
    Discarded,
}

impl IntoResponse for BookingOutcome {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response()
    }
}

/// Runs submissions through rate limiting, spam filtering, validation and
/// delivery.
#[derive(Clone)]
pub struct BookingService {
    limiter: Arc<dyn RateLimiter>,
    notifier: Arc<dyn Notifier>,
    delivery_timeout: Duration,
}

impl BookingService {
    /// Create a service.
    #[must_use]
    pub fn new(
        limiter: Arc<dyn RateLimiter>,
        notifier: Arc<dyn Notifier>,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            limiter,
            notifier,
            delivery_timeout,
        }
    }

    /// Count a submission attempt from `client_key` against its quota.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::RateLimited`] if the client is over its quota.
    pub fn check_rate(&self, client_key: &str) -> Result<(), BookingError> {
        if self.limiter.check(client_key) {
            Ok(())
        } else {
            warn!(client = client_key, "Booking submission rate limited");
            Err(BookingError::RateLimited)
        }
    }

    /// Process a request that already passed the rate limit.
    ///
    /// A filled-in honeypot is reported as success without sending anything.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or [`BookingError::Delivery`] if the
    /// notifier failed or took longer than the delivery timeout.
    pub async fn process(
        &self,
        client_key: &str,
        request: BookingRequest,
    ) -> Result<BookingOutcome, BookingError> {
        if request.is_honeypotted() {
            info!(client = client_key, "Honeypot filled in, discarding submission");
            return Ok(BookingOutcome::Discarded);
        }

        if let Err(e) = validate(&request.customer) {
            debug!(client = client_key, "Booking rejected: {e}");
            return Err(e);
        }

        let email = compose(&request);
        let sent = tokio::time::timeout(self.delivery_timeout, self.notifier.send(&email))
            .await
            .unwrap_or(Err(NotifyError::Timeout(self.delivery_timeout)));

        match sent {
            Ok(()) => {
                info!(
                    client = client_key,
                    "Booking email sent for {} ({})",
                    request.customer.parent_name,
                    request.customer.email
                );
                Ok(BookingOutcome::Delivered)
            }
            Err(e) => {
                error!(client = client_key, "Failed to send booking email: {e}");
                Err(BookingError::Delivery(e))
            }
        }
    }

    /// Rate-limit and then process a submission.
    ///
    /// # Errors
    ///
    /// See [`check_rate`](Self::check_rate) and [`process`](Self::process).
    pub async fn submit(
        &self,
        client_key: &str,
        request: BookingRequest,
    ) -> Result<BookingOutcome, BookingError> {
        self.check_rate(client_key)?;
        self.process(client_key, request).await
    }
}

impl std::fmt::Debug for BookingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingService")
            .field("delivery_timeout", &self.delivery_timeout)
            .finish_non_exhaustive()
    }
}
