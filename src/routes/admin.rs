use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};

use crate::{
    dto::admin::{ActionResponse, ConfirmationSummary, PredictionSummary, RevealRequest},
    error::AppError,
    services::admin_service,
    state::SharedState,
};

const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Admin-only endpoints for listings and event management.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/predictions", get(list_predictions))
        .route("/admin/confirmations", get(list_confirmations))
        .route("/admin/event/init", post(init_event))
        .route("/admin/event/reveal", post(reveal))
        .route("/admin/gifts/init", post(init_gift_stock))
        .route_layer(middleware::from_fn_with_state(state, require_admin_password))
}

/// Every submitted prediction, oldest first.
#[utoipa::path(
    get,
    path = "/admin/predictions",
    tag = "admin",
    params(("X-Admin-Password" = String, Header, description = "Admin password")),
    responses((status = 200, description = "Submitted predictions", body = [PredictionSummary]))
)]
pub async fn list_predictions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<PredictionSummary>>, AppError> {
    Ok(Json(admin_service::list_predictions(&state).await?))
}

/// Every recorded confirmation, oldest first.
#[utoipa::path(
    get,
    path = "/admin/confirmations",
    tag = "admin",
    params(("X-Admin-Password" = String, Header, description = "Admin password")),
    responses((status = 200, description = "Recorded confirmations", body = [ConfirmationSummary]))
)]
pub async fn list_confirmations(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ConfirmationSummary>>, AppError> {
    Ok(Json(admin_service::list_confirmations(&state).await?))
}

/// Seed the remote event configuration from the local one.
#[utoipa::path(
    post,
    path = "/admin/event/init",
    tag = "admin",
    params(("X-Admin-Password" = String, Header, description = "Admin password")),
    responses((status = 200, description = "Event configuration seeded", body = ActionResponse))
)]
pub async fn init_event(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::init_event(&state).await?))
}

/// Announce the result.
#[utoipa::path(
    post,
    path = "/admin/event/reveal",
    tag = "admin",
    request_body = RevealRequest,
    params(("X-Admin-Password" = String, Header, description = "Admin password")),
    responses((status = 200, description = "Result revealed", body = ActionResponse))
)]
pub async fn reveal(
    State(state): State<SharedState>,
    Json(request): Json<RevealRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::reveal(&state, request).await?))
}

/// Replace the gift stock with a fresh, full catalog.
#[utoipa::path(
    post,
    path = "/admin/gifts/init",
    tag = "admin",
    params(("X-Admin-Password" = String, Header, description = "Admin password")),
    responses((status = 200, description = "Gift stock initialized", body = ActionResponse))
)]
pub async fn init_gift_stock(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::init_gift_stock(&state).await?))
}

/// Reject requests whose admin password header is missing or wrong.
async fn require_admin_password(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin password header `X-Admin-Password`".into())
        })?;

    if provided != state.config().admin_password {
        return Err(AppError::Unauthorized("invalid admin password".into()));
    }

    Ok(next.run(req).await)
}
