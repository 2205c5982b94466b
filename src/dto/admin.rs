use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{AttendeeEntity, ConfirmationEntity, GameScores, Hypothesis, PredictionEntity},
    dto::{format_epoch_millis, validation::validate_person_name},
};

/// Body of the reveal route.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RevealRequest {
    /// The actual result being announced.
    pub actual_result: Hypothesis,
    /// The chosen baby name.
    #[validate(
        length(min = 2, max = 30),
        custom(function = validate_person_name)
    )]
    pub baby_name: String,
}

/// Generic acknowledgement for admin actions.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Outcome of the action.
    pub status: String,
}

impl ActionResponse {
    /// Acknowledge a completed action.
    pub fn done() -> Self {
        Self {
            status: "done".to_string(),
        }
    }
}

/// One submitted prediction as shown on the admin listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct PredictionSummary {
    /// Session identifier the prediction was stored under.
    pub session_id: String,
    /// The guest's guess.
    pub hypothesis: Hypothesis,
    /// Guest display name.
    pub user_name: String,
    /// Suggested baby name.
    pub suggested_name: String,
    /// Message for the parents.
    pub message: String,
    /// Mini-game scores.
    pub scores: GameScores,
    /// Submission time, RFC 3339.
    pub submitted_at: String,
}

impl From<PredictionEntity> for PredictionSummary {
    fn from(value: PredictionEntity) -> Self {
        Self {
            session_id: value.session_id,
            hypothesis: value.hypothesis,
            user_name: value.user_name,
            suggested_name: value.suggested_name,
            message: value.message,
            scores: value.scores,
            submitted_at: format_epoch_millis(value.submitted_at),
        }
    }
}

/// One recorded confirmation as shown on the admin listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmationSummary {
    /// Identifier of the invited group.
    pub group_id: String,
    /// Name of the person who answered.
    pub main_guest_name: String,
    /// Everyone covered by the invitation.
    pub attendees: Vec<AttendeeEntity>,
    /// Gift identifiers with quantities, rendered as `id x qty`.
    pub gifts: Vec<String>,
    /// Whether the whole group declined.
    pub all_declined: bool,
    /// Submission time, RFC 3339.
    pub submitted_at: String,
}

impl From<ConfirmationEntity> for ConfirmationSummary {
    fn from(value: ConfirmationEntity) -> Self {
        Self {
            group_id: value.group_id,
            main_guest_name: value.main_guest_name,
            attendees: value.attendees,
            gifts: value
                .gifts
                .iter()
                .map(|gift| format!("{} x {}", gift.gift_id, gift.quantity))
                .collect(),
            all_declined: value.all_declined,
            submitted_at: format_epoch_millis(value.submitted_at),
        }
    }
}
