use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::{
        draft::Draft,
        models::{GameScores, Hypothesis, Minigame},
    },
    dto::{format_epoch_millis, public::PublicSessionPhase, validation::validate_person_name},
};

/// Body of the hypothesis choice route.
#[derive(Debug, Deserialize, ToSchema)]
pub struct HypothesisRequest {
    /// The guest's guess.
    pub hypothesis: Hypothesis,
}

/// Body of the personal data route.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PersonalDataRequest {
    /// Guest display name.
    #[validate(
        length(min = 2, max = 50),
        custom(function = validate_person_name)
    )]
    pub user_name: String,
    /// Name suggested for the baby.
    #[validate(
        length(min = 2, max = 30),
        custom(function = validate_person_name)
    )]
    pub suggested_name: String,
    /// Free-text message for the parents.
    #[validate(length(min = 10, max = 500))]
    pub message: String,
}

/// Body of the stage score route.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StageScoreRequest {
    /// Which mini-game stage was played.
    pub game: Minigame,
    /// Score achieved in the stage.
    #[validate(range(min = 0, max = 100))]
    pub score: u16,
}

/// The in-progress draft as returned to the client.
#[derive(Debug, Serialize, ToSchema)]
pub struct DraftResponse {
    /// Stable session identifier.
    pub session_id: String,
    /// Chosen hypothesis, if any.
    pub hypothesis: Option<Hypothesis>,
    /// Guest display name.
    pub user_name: String,
    /// Suggested baby name.
    pub suggested_name: String,
    /// Message for the parents.
    pub message: String,
    /// Mini-game scores.
    pub scores: GameScores,
    /// Creation time, RFC 3339.
    pub created_at: String,
    /// Last mutation time, RFC 3339.
    pub updated_at: String,
}

impl From<Draft> for DraftResponse {
    fn from(value: Draft) -> Self {
        Self {
            session_id: value.session_id,
            hypothesis: value.hypothesis,
            user_name: value.user_name,
            suggested_name: value.suggested_name,
            message: value.message,
            scores: value.scores,
            created_at: format_epoch_millis(value.created_at),
            updated_at: format_epoch_millis(value.updated_at),
        }
    }
}

/// Result of a session mutation: the phase the flow landed in.
#[derive(Debug, Serialize, ToSchema)]
pub struct PhaseChangeResponse {
    /// Phase after the operation.
    pub phase: PublicSessionPhase,
}

/// Result of the final submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitOutcomeResponse {
    /// Session identifier the prediction was stored under.
    pub session_id: String,
    /// Phase after the submission.
    pub phase: PublicSessionPhase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personal_data_bounds_are_enforced() {
        let valid = PersonalDataRequest {
            user_name: "Ana Gomez".into(),
            suggested_name: "Luna".into(),
            message: "Mucho amor para ustedes tres".into(),
        };
        assert!(valid.validate().is_ok());

        let short_message = PersonalDataRequest {
            message: "corto".into(),
            ..valid_request()
        };
        assert!(short_message.validate().is_err());

        let bad_name = PersonalDataRequest {
            user_name: "Ana3".into(),
            ..valid_request()
        };
        assert!(bad_name.validate().is_err());
    }

    #[test]
    fn stage_score_is_capped_at_one_hundred() {
        let ok = StageScoreRequest {
            game: Minigame::Collider,
            score: 100,
        };
        assert!(ok.validate().is_ok());

        let over = StageScoreRequest {
            game: Minigame::Collider,
            score: 101,
        };
        assert!(over.validate().is_err());
    }

    fn valid_request() -> PersonalDataRequest {
        PersonalDataRequest {
            user_name: "Ana Gomez".into(),
            suggested_name: "Luna".into(),
            message: "Mucho amor para ustedes tres".into(),
        }
    }
}
