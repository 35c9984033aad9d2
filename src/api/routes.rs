use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::RedirectService;

use super::handlers::{create_url, get_stats, health_check, AppState};

pub fn create_api_router(service: Arc<RedirectService>, public_base_url: &str) -> Router {
    let state = Arc::new(AppState {
        service,
        public_base_url: public_base_url.trim_end_matches('/').to_string(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/shorturls", post(create_url))
        .route("/shorturls/{code}", get(get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
