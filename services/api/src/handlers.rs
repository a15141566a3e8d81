//! Axum Handlers for the REST API
//!
//! Read access to the check-in history and a manual way to record a
//! check-in outside a conversation. It uses `utoipa` doc comments to generate
//! OpenAPI documentation.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::{
    models::{CheckIn, CheckInContext, ErrorResponse, SaveCheckInPayload, SaveCheckInResponse},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// List every recorded check-in, oldest first.
#[utoipa::path(
    get,
    path = "/checkins",
    responses(
        (status = 200, description = "Check-in history", body = [CheckIn]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_checkins(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CheckIn>>, ApiError> {
    let history = state.persister.history().load().await?;
    Ok(Json(history.into_iter().map(CheckIn::from).collect()))
}

/// The context sentence the next conversation will start with.
#[utoipa::path(
    get,
    path = "/checkins/context",
    responses(
        (status = 200, description = "Context from the latest check-in", body = CheckInContext),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_context(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CheckInContext>, ApiError> {
    let context = state.persister.history().context_summary().await?;
    Ok(Json(CheckInContext { context }))
}

/// Record a check-in, mirroring it to Notion when configured.
#[utoipa::path(
    post,
    path = "/checkins",
    request_body = SaveCheckInPayload,
    responses(
        (status = 201, description = "Check-in saved", body = SaveCheckInResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn save_checkin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SaveCheckInPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.mood.trim().is_empty() {
        return Err(ApiError::BadRequest("mood must not be empty".to_string()));
    }

    let receipt = state
        .persister
        .save(
            &payload.mood,
            &payload.objectives,
            payload.summary.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(SaveCheckInResponse::from(receipt))))
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}
