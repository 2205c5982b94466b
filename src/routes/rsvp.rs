use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::rsvp::{
        AvailabilityRequest, AvailabilityResponse, ConfirmationRequest, ConfirmationResponse,
        ConfirmedResponse, GiftStockItem,
    },
    error::AppError,
    services::rsvp_service,
    state::SharedState,
};

/// Baby shower attendance endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/rsvp/gifts", get(gift_stock))
        .route("/rsvp/availability", post(check_availability))
        .route("/rsvp/confirmed/{group_id}", get(has_confirmed))
        .route("/rsvp/confirmation", post(submit_confirmation))
}

/// List the gift stock with availability flags.
#[utoipa::path(
    get,
    path = "/rsvp/gifts",
    tag = "rsvp",
    responses(
        (status = 200, description = "Gift stock", body = [GiftStockItem]),
        (status = 429, description = "Fetched too often")
    )
)]
pub async fn gift_stock(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GiftStockItem>>, AppError> {
    Ok(Json(rsvp_service::gift_stock(&state).await?))
}

/// Check whether a selection could currently be fulfilled.
#[utoipa::path(
    post,
    path = "/rsvp/availability",
    tag = "rsvp",
    request_body = AvailabilityRequest,
    responses((status = 200, description = "Advisory availability", body = AvailabilityResponse))
)]
pub async fn check_availability(
    State(state): State<SharedState>,
    Json(request): Json<AvailabilityRequest>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    Ok(Json(rsvp_service::check_availability(&state, request).await?))
}

/// Whether a group has already confirmed.
#[utoipa::path(
    get,
    path = "/rsvp/confirmed/{group_id}",
    tag = "rsvp",
    params(("group_id" = String, Path, description = "Identifier of the invited group")),
    responses((status = 200, description = "Confirmation status", body = ConfirmedResponse))
)]
pub async fn has_confirmed(
    State(state): State<SharedState>,
    Path(group_id): Path<String>,
) -> Result<Json<ConfirmedResponse>, AppError> {
    Ok(Json(rsvp_service::has_confirmed(&state, group_id).await?))
}

/// Record a group's confirmation and allocate its gifts.
#[utoipa::path(
    post,
    path = "/rsvp/confirmation",
    tag = "rsvp",
    request_body = ConfirmationRequest,
    responses(
        (status = 200, description = "Confirmation recorded or already present", body = ConfirmationResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Gift stock ran out during confirmation")
    )
)]
pub async fn submit_confirmation(
    State(state): State<SharedState>,
    Json(request): Json<ConfirmationRequest>,
) -> Result<Json<ConfirmationResponse>, AppError> {
    Ok(Json(
        rsvp_service::submit_confirmation(&state, request).await?,
    ))
}
