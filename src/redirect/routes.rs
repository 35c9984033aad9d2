use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::TrustedProxyMode;
use crate::service::RedirectService;

use super::handlers::{health_check, redirect_url, RedirectState};

pub fn create_redirect_router(
    service: Arc<RedirectService>,
    trusted_proxy_mode: TrustedProxyMode,
) -> Router {
    let state = Arc::new(RedirectState {
        service,
        trusted_proxy_mode,
    });

    Router::new()
        .route("/", get(health_check))
        .route("/{code}", get(redirect_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
