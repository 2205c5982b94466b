use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::public::{EventConfigResponse, PhaseResponse},
    error::AppError,
    services::public_service,
    state::SharedState,
};

/// Read-only event endpoints for unauthenticated guests.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/event/config", get(event_config))
        .route("/event/phase", get(phase))
}

/// The event configuration with derived statistics.
#[utoipa::path(
    get,
    path = "/event/config",
    tag = "public",
    responses(
        (status = 200, description = "Event configuration", body = EventConfigResponse),
        (status = 429, description = "Fetched too often"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn event_config(
    State(state): State<SharedState>,
) -> Result<Json<EventConfigResponse>, AppError> {
    Ok(Json(public_service::event_config(&state).await?))
}

/// Current session phase and degraded flag.
#[utoipa::path(
    get,
    path = "/event/phase",
    tag = "public",
    responses((status = 200, description = "Current phase", body = PhaseResponse))
)]
pub async fn phase(State(state): State<SharedState>) -> Json<PhaseResponse> {
    Json(public_service::phase(&state).await)
}
