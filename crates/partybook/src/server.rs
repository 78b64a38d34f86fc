//! HTTP server.
//!
//! Serves the package catalog and the booking endpoint:
//!
//! | Route | Method | Handler |
//! |---|---|---|
//! | `/health` | GET | liveness probe |
//! | `/api/packages` | GET | catalog with price ranges |
//! | `/api/booking` | POST | booking submission |
//!
//! Any other method on `/api/booking` gets a 405 with the usual JSON error
//! body.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, error, info};

use crate::booking::{BookingError, BookingOutcome, BookingRequest, BookingService};
use crate::catalog::{self, PackageView};
use crate::config::{Config, ServerConfig};
use crate::error::{Error, Result};
use crate::notifier::SmtpNotifier;
use crate::ratelimit::{RateLimiter, SlidingWindowLimiter};

const UNKNOWN_CLIENT: &str = "unknown";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The booking pipeline.
    pub booking: BookingService,
}

impl AppState {
    /// Wrap a booking service.
    #[must_use]
    pub fn new(booking: BookingService) -> Self {
        Self { booking }
    }
}

/// Build the router without any middleware.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/packages", get(packages_handler))
        .route(
            "/api/booking",
            post(booking_handler).fallback(method_not_allowed),
        )
        .with_state(state)
}

/// Build the CORS layer for the configured origins.
///
/// # Errors
///
/// Returns an error if an origin is not a valid header value.
pub fn cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    let origins = if config.cors_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let values = config
            .cors_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| Error::config(format!("invalid CORS origin: {origin}")))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60)))
}

/// Build the full application: router plus CORS.
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
pub fn app(state: AppState, config: &ServerConfig) -> Result<Router> {
    Ok(router(state).layer(cors_layer(config)?))
}

/// Key a client is rate limited under: the first `X-Forwarded-For` entry,
/// else the peer IP, else `"unknown"`.
#[must_use]
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match (forwarded, peer) {
        (Some(forwarded), _) => forwarded.to_string(),
        (None, Some(peer)) => peer.ip().to_string(),
        (None, None) => UNKNOWN_CLIENT.to_string(),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn packages_handler() -> impl IntoResponse {
    let views: Vec<PackageView> = catalog::packages().iter().map(PackageView::from).collect();
    Json(views)
}

async fn booking_handler(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<BookingOutcome, BookingError> {
    let key = client_key(&headers, peer.map(|ConnectInfo(addr)| addr));
    state.booking.check_rate(&key)?;

    let request: BookingRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(client = %key, "Unreadable booking body: {e}");
        BookingError::MalformedPayload
    })?;

    state.booking.process(&key, request).await
}

async fn method_not_allowed() -> BookingError {
    BookingError::MethodNotAllowed
}

/// Evict idle rate-limit entries every `interval` until the task is aborted.
fn spawn_sweeper(
    limiter: Arc<dyn RateLimiter>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = limiter.evict_idle();
            if evicted > 0 {
                debug!(evicted, "Evicted idle rate limit entries");
            }
        }
    })
}

/// Run the booking server until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the mail transport
/// can't be built or the listener can't be bound.
pub async fn serve(config: &Config) -> Result<()> {
    config.validate()?;

    info!("Initializing state...");
    let notifier = SmtpNotifier::from_config(&config.mail)?;
    let limiter: Arc<dyn RateLimiter> = Arc::new(SlidingWindowLimiter::new(
        config.rate_limit_window(),
        config.rate_limit.max_requests,
    ));
    let booking = BookingService::new(
        Arc::clone(&limiter),
        Arc::new(notifier),
        config.delivery_timeout(),
    );

    let app = app(AppState::new(booking), &config.server)?;
    let sweeper = spawn_sweeper(limiter, config.sweep_interval());

    let address = &config.server.bind_addr;
    info!("Binding to {address}");
    let listener = TcpListener::bind(address).await?;
    info!("Server running on {address}");

    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    sweeper.abort();
    info!("Server shut down");
    Ok(result?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"),
        );
        let peer: SocketAddr = "10.0.0.2:4000".parse().unwrap();

        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn test_client_key_falls_back_to_peer_ip() {
        let peer: SocketAddr = "10.0.0.2:4000".parse().unwrap();
        assert_eq!(client_key(&HeaderMap::new(), Some(peer)), "10.0.0.2");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  "));
        assert_eq!(client_key(&headers, Some(peer)), "10.0.0.2");
    }

    #[test]
    fn test_client_key_unknown() {
        assert_eq!(client_key(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn test_cors_layer_rejects_bad_origin() {
        let config = ServerConfig {
            cors_origins: vec!["https://ok.example".to_string(), "bad\norigin".to_string()],
            ..ServerConfig::default()
        };
        let err = cors_layer(&config).unwrap_err();
        assert!(err.to_string().contains("CORS origin"));
    }

    #[test]
    fn test_cors_layer_accepts_defaults() {
        assert!(cors_layer(&ServerConfig::default()).is_ok());
    }
}
