use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, header::HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::TrustedProxyMode;
use crate::geo::extract_client_ip;
use crate::service::{RedirectService, ResolveError};

pub struct RedirectState {
    pub service: Arc<RedirectService>,
    pub trusted_proxy_mode: TrustedProxyMode,
}

/// Redirect to the original URL after recording the click
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let referrer = headers
        .get(header::REFERER)
        .and_then(|h| h.to_str().ok());
    let client_ip = extract_client_ip(&headers, addr.ip(), state.trusted_proxy_mode).to_string();

    match state
        .service
        .resolve(&code, referrer, Some(client_ip.as_str()))
        .await
    {
        // Temporary redirect: every visit has to reach the service to be counted.
        Ok(target) => (StatusCode::FOUND, [(header::LOCATION, target)]).into_response(),
        Err(ResolveError::NotFound) => (StatusCode::NOT_FOUND, "URL not found").into_response(),
        Err(ResolveError::Expired) => (StatusCode::GONE, "This link has expired").into_response(),
        Err(ResolveError::RecordingFailed(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "Please try again").into_response()
        }
        Err(ResolveError::Storage(err)) => {
            tracing::error!(short_code = %code, error = %err, "lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
