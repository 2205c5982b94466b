use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Baby Reveal Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::get_draft,
        crate::routes::session::discard_draft,
        crate::routes::session::begin,
        crate::routes::session::choose_hypothesis,
        crate::routes::session::save_personal_data,
        crate::routes::session::back_to_hypothesis,
        crate::routes::session::complete_stage,
        crate::routes::session::reopen,
        crate::routes::session::submit,
        crate::routes::rsvp::gift_stock,
        crate::routes::rsvp::check_availability,
        crate::routes::rsvp::has_confirmed,
        crate::routes::rsvp::submit_confirmation,
        crate::routes::public::event_config,
        crate::routes::public::phase,
        crate::routes::admin::list_predictions,
        crate::routes::admin::list_confirmations,
        crate::routes::admin::init_event,
        crate::routes::admin::reveal,
        crate::routes::admin::init_gift_stock,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::ServiceStatus,
            crate::dto::session::HypothesisRequest,
            crate::dto::session::PersonalDataRequest,
            crate::dto::session::StageScoreRequest,
            crate::dto::session::DraftResponse,
            crate::dto::session::PhaseChangeResponse,
            crate::dto::session::SubmitOutcomeResponse,
            crate::dto::rsvp::GiftStockItem,
            crate::dto::rsvp::GiftSelectionRequest,
            crate::dto::rsvp::AvailabilityRequest,
            crate::dto::rsvp::AvailabilityResponse,
            crate::dto::rsvp::AttendeeRequest,
            crate::dto::rsvp::ConfirmationRequest,
            crate::dto::rsvp::ConfirmationResponse,
            crate::dto::rsvp::ConfirmedResponse,
            crate::dto::public::EventConfigResponse,
            crate::dto::public::StatsResponse,
            crate::dto::public::PhaseResponse,
            crate::dto::public::PublicSessionPhase,
            crate::dto::admin::RevealRequest,
            crate::dto::admin::ActionResponse,
            crate::dto::admin::PredictionSummary,
            crate::dto::admin::ConfirmationSummary,
            crate::dao::models::Hypothesis,
            crate::dao::models::Minigame,
            crate::dao::models::GameScores,
            crate::dao::models::AttendeeEntity,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Guest prediction flow"),
        (name = "rsvp", description = "Baby shower attendance and gifts"),
        (name = "public", description = "Read-only event information"),
        (name = "admin", description = "Event management"),
    )
)]
pub struct ApiDoc;
