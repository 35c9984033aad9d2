use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::models::{CreateUrlRequest, CreateUrlResponse, StatsResponse};
use crate::service::{CreateError, RedirectService, StatsError};

pub struct AppState {
    pub service: Arc<RedirectService>,
    pub public_base_url: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
}

/// Create a new short link
pub async fn create_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUrlResponse>), ApiError> {
    let Json(payload) = payload.map_err(|e| error(StatusCode::BAD_REQUEST, e.body_text()))?;

    let record = state
        .service
        .create(
            &payload.url,
            payload.validity,
            payload.shortcode.as_deref(),
        )
        .await
        .map_err(|e| match &e {
            CreateError::InvalidUrl(_) | CreateError::InvalidValidity(_) => {
                error(StatusCode::BAD_REQUEST, e.to_string())
            }
            CreateError::ShortcodeTaken(_) | CreateError::GenerationExhausted { .. } => {
                error(StatusCode::CONFLICT, e.to_string())
            }
            CreateError::Storage(err) => {
                tracing::error!(error = %err, "failed to create short link");
                error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create short link")
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUrlResponse {
            short_link: format!("{}/{}", state.public_base_url, record.link.shortcode),
            expiry: record.link.expiry,
        }),
    ))
}

/// Get click statistics for a shortcode
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    match state.service.stats(&code).await {
        Ok(record) => Ok(Json(record.into())),
        Err(StatsError::NotFound) => Err(error(StatusCode::NOT_FOUND, "Shortcode not found")),
        Err(StatsError::Storage(err)) => {
            tracing::error!(short_code = %code, error = %err, "failed to load stats");
            Err(error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load statistics",
            ))
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
