use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};

use crate::{
    dto::session::{
        DraftResponse, HypothesisRequest, PersonalDataRequest, PhaseChangeResponse,
        StageScoreRequest, SubmitOutcomeResponse,
    },
    error::AppError,
    services::{session_service, submission_service},
    state::SharedState,
};

/// Guest session endpoints walking the prediction flow.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/session/draft", get(get_draft).delete(discard_draft))
        .route("/session/begin", post(begin))
        .route("/session/hypothesis", post(choose_hypothesis))
        .route("/session/personal-data", post(save_personal_data))
        .route("/session/back", post(back_to_hypothesis))
        .route("/session/score", post(complete_stage))
        .route("/session/reopen", post(reopen))
        .route("/session/submit", post(submit))
}

/// Return the in-progress draft, creating one when none exists.
#[utoipa::path(
    get,
    path = "/session/draft",
    tag = "session",
    responses((status = 200, description = "Current draft", body = DraftResponse))
)]
pub async fn get_draft(State(state): State<SharedState>) -> Json<DraftResponse> {
    Json(session_service::draft(&state))
}

/// Discard the persisted draft after the success screen is dismissed.
#[utoipa::path(
    delete,
    path = "/session/draft",
    tag = "session",
    responses((status = 204, description = "Draft discarded"))
)]
pub async fn discard_draft(State(state): State<SharedState>) -> StatusCode {
    session_service::discard_draft(&state);
    StatusCode::NO_CONTENT
}

/// Leave the intro screen and start the prediction flow.
#[utoipa::path(
    post,
    path = "/session/begin",
    tag = "session",
    responses(
        (status = 200, description = "Flow started or closed by the deadline", body = PhaseChangeResponse),
        (status = 409, description = "Flow already started")
    )
)]
pub async fn begin(
    State(state): State<SharedState>,
) -> Result<Json<PhaseChangeResponse>, AppError> {
    Ok(Json(session_service::begin(&state).await?))
}

/// Record the guest's hypothesis.
#[utoipa::path(
    post,
    path = "/session/hypothesis",
    tag = "session",
    request_body = HypothesisRequest,
    responses(
        (status = 200, description = "Hypothesis recorded", body = PhaseChangeResponse),
        (status = 409, description = "Not on the hypothesis screen")
    )
)]
pub async fn choose_hypothesis(
    State(state): State<SharedState>,
    Json(request): Json<HypothesisRequest>,
) -> Result<Json<PhaseChangeResponse>, AppError> {
    Ok(Json(
        session_service::choose_hypothesis(&state, request).await?,
    ))
}

/// Record name, suggested name, and message.
#[utoipa::path(
    post,
    path = "/session/personal-data",
    tag = "session",
    request_body = PersonalDataRequest,
    responses(
        (status = 200, description = "Personal data recorded", body = PhaseChangeResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn save_personal_data(
    State(state): State<SharedState>,
    Json(request): Json<PersonalDataRequest>,
) -> Result<Json<PhaseChangeResponse>, AppError> {
    Ok(Json(
        session_service::save_personal_data(&state, request).await?,
    ))
}

/// Return to the hypothesis screen.
#[utoipa::path(
    post,
    path = "/session/back",
    tag = "session",
    responses((status = 200, description = "Back on the hypothesis screen", body = PhaseChangeResponse))
)]
pub async fn back_to_hypothesis(
    State(state): State<SharedState>,
) -> Result<Json<PhaseChangeResponse>, AppError> {
    Ok(Json(session_service::back_to_hypothesis(&state).await?))
}

/// Record a mini-game stage score.
#[utoipa::path(
    post,
    path = "/session/score",
    tag = "session",
    request_body = StageScoreRequest,
    responses(
        (status = 200, description = "Score recorded", body = PhaseChangeResponse),
        (status = 409, description = "Stage is not the active one")
    )
)]
pub async fn complete_stage(
    State(state): State<SharedState>,
    Json(request): Json<StageScoreRequest>,
) -> Result<Json<PhaseChangeResponse>, AppError> {
    Ok(Json(
        session_service::complete_stage(&state, request).await?,
    ))
}

/// Reset the flow to the intro screen without losing the draft.
#[utoipa::path(
    post,
    path = "/session/reopen",
    tag = "session",
    responses((status = 200, description = "Flow reset", body = PhaseChangeResponse))
)]
pub async fn reopen(State(state): State<SharedState>) -> Json<PhaseChangeResponse> {
    Json(session_service::reopen(&state).await)
}

/// Submit the draft as the final prediction.
#[utoipa::path(
    post,
    path = "/session/submit",
    tag = "session",
    responses(
        (status = 200, description = "Prediction stored", body = SubmitOutcomeResponse),
        (status = 400, description = "Draft incomplete or hypothesis missing"),
        (status = 429, description = "Submitted again too quickly"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn submit(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<SubmitOutcomeResponse>, AppError> {
    let fingerprint = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned());

    Ok(Json(submission_service::submit(&state, fingerprint).await?))
}
