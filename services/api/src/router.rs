//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API, WebSocket endpoint, and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        CheckIn, CheckInContext, ErrorResponse, MirrorOutcome, SaveCheckInPayload,
        SaveCheckInResponse,
    },
    state::AppState,
    ws::ws_handler,
};

use axum::{Router, routing::get};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_checkins,
        handlers::get_context,
        handlers::save_checkin,
        handlers::health,
    ),
    components(
        schemas(CheckIn, CheckInContext, SaveCheckInPayload, SaveCheckInResponse, MirrorOutcome, ErrorResponse)
    ),
    tags(
        (name = "Wellness API", description = "Check-in history for the wellness voice companion")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route(
            "/checkins",
            get(handlers::list_checkins).post(handlers::save_checkin),
        )
        .route("/checkins/context", get(handlers::get_context))
        .route("/health", get(handlers::health))
        .route("/ws", get(ws_handler))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
