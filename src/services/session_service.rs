//! Guest session flow: walks the shared state machine from the intro screen
//! to the final submission while keeping the local draft in sync.

use validator::Validate;

use crate::{
    dao::models::{EpochMillis, Minigame},
    dto::session::{
        DraftResponse, HypothesisRequest, PersonalDataRequest, PhaseChangeResponse,
        StageScoreRequest,
    },
    error::ServiceError,
    state::{
        SharedState,
        state_machine::{SessionEvent, SessionPhase},
    },
};

/// The persisted draft, initializing a fresh one when none exists.
pub fn draft(state: &SharedState) -> DraftResponse {
    state.drafts().get().into()
}

/// Discard the persisted draft. The success screen calls this once the
/// guest dismisses it; the next `draft` read mints a fresh session.
pub fn discard_draft(state: &SharedState) {
    state.drafts().clear();
}

/// Leave the intro screen, or land on the closed screen when the reveal
/// moment already passed.
pub async fn begin(state: &SharedState) -> Result<PhaseChangeResponse, ServiceError> {
    if deadline_passed(state).await {
        let (_, phase) = state
            .run_transition(SessionEvent::DeadlineReached, || async { Ok(()) })
            .await?;
        return Ok(PhaseChangeResponse {
            phase: phase.into(),
        });
    }

    let (_, phase) = state
        .run_transition(SessionEvent::Begin, || async { Ok(()) })
        .await?;
    Ok(PhaseChangeResponse {
        phase: phase.into(),
    })
}

/// Record the guest's hypothesis and advance to personal data entry.
pub async fn choose_hypothesis(
    state: &SharedState,
    request: HypothesisRequest,
) -> Result<PhaseChangeResponse, ServiceError> {
    let (_, phase) = state
        .run_transition(SessionEvent::HypothesisChosen, || async {
            state.drafts().set_hypothesis(request.hypothesis);
            Ok(())
        })
        .await?;

    Ok(PhaseChangeResponse {
        phase: phase.into(),
    })
}

/// Validate and record the personal data fields, then advance to the first
/// mini-game stage.
pub async fn save_personal_data(
    state: &SharedState,
    request: PersonalDataRequest,
) -> Result<PhaseChangeResponse, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let (_, phase) = state
        .run_transition(SessionEvent::InputCompleted, || async {
            state.drafts().set_personal_data(
                &request.user_name,
                &request.suggested_name,
                &request.message,
            );
            Ok(())
        })
        .await?;

    Ok(PhaseChangeResponse {
        phase: phase.into(),
    })
}

/// Return to the hypothesis screen; the draft keeps everything typed so far.
pub async fn back_to_hypothesis(
    state: &SharedState,
) -> Result<PhaseChangeResponse, ServiceError> {
    let (_, phase) = state
        .run_transition(SessionEvent::BackToHypothesis, || async { Ok(()) })
        .await?;
    Ok(PhaseChangeResponse {
        phase: phase.into(),
    })
}

/// Record a mini-game score. Clearing the collider or equation stage advances
/// the flow; the synthesis score is only recorded, submission is a separate
/// call.
pub async fn complete_stage(
    state: &SharedState,
    request: StageScoreRequest,
) -> Result<PhaseChangeResponse, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let current = state.session_phase().await;
    if current != SessionPhase::Minigame(request.game) {
        return Err(ServiceError::InvalidState(format!(
            "stage {:?} is not the active stage (current phase {current:?})",
            request.game
        )));
    }

    if request.game == Minigame::Synthesis {
        state.drafts().set_score(request.game, request.score);
        return Ok(PhaseChangeResponse {
            phase: current.into(),
        });
    }

    let (_, phase) = state
        .run_transition(SessionEvent::StageCleared(request.game), || async {
            state.drafts().set_score(request.game, request.score);
            Ok(())
        })
        .await?;

    Ok(PhaseChangeResponse {
        phase: phase.into(),
    })
}

/// Reset the flow to the intro screen without touching the draft, as a page
/// reload would.
pub async fn reopen(state: &SharedState) -> PhaseChangeResponse {
    state.reopen_session().await;
    PhaseChangeResponse {
        phase: SessionPhase::Intro.into(),
    }
}

/// Whether the reveal moment has passed. The remotely stored event
/// configuration wins over the baked-in one when it is reachable.
async fn deadline_passed(state: &SharedState) -> bool {
    let reveal_date = match state.event_store().await {
        Some(store) => match store.event_config().await {
            Ok(Some(config)) => config.reveal_date,
            _ => state.config().reveal_date,
        },
        None => state.config().reveal_date,
    };

    EpochMillis::now() >= reveal_date
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            draft::{DraftStore, MemorySlot},
            event_store::memory::MemoryEventStore,
            models::{EventConfigEntity, EventStats, Hypothesis},
        },
        dto::public::PublicSessionPhase,
        state::AppState,
    };

    async fn state_with_store() -> SharedState {
        let state = AppState::new(
            AppConfig::default(),
            DraftStore::new(Box::new(MemorySlot::default())),
        );
        state
            .install_event_store(Arc::new(MemoryEventStore::default()))
            .await;
        state
    }

    fn far_future_config() -> AppConfig {
        AppConfig {
            reveal_date: EpochMillis(i64::MAX),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn full_walk_from_intro_to_synthesis() {
        let state = AppState::new(
            far_future_config(),
            DraftStore::new(Box::new(MemorySlot::default())),
        );
        state
            .install_event_store(Arc::new(MemoryEventStore::default()))
            .await;

        assert_eq!(begin(&state).await.unwrap().phase, PublicSessionPhase::Hypothesis);

        let phase = choose_hypothesis(
            &state,
            HypothesisRequest {
                hypothesis: Hypothesis::XX,
            },
        )
        .await
        .unwrap();
        assert_eq!(phase.phase, PublicSessionPhase::Input);

        let phase = save_personal_data(
            &state,
            PersonalDataRequest {
                user_name: "Ana Gomez".into(),
                suggested_name: "Luna".into(),
                message: "Mucho amor para ustedes tres".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(phase.phase, PublicSessionPhase::Collider);

        let phase = complete_stage(
            &state,
            StageScoreRequest {
                game: Minigame::Collider,
                score: 70,
            },
        )
        .await
        .unwrap();
        assert_eq!(phase.phase, PublicSessionPhase::Equation);

        let phase = complete_stage(
            &state,
            StageScoreRequest {
                game: Minigame::Equation,
                score: 90,
            },
        )
        .await
        .unwrap();
        assert_eq!(phase.phase, PublicSessionPhase::Synthesis);

        // Synthesis records the score but stays put until the submission.
        let phase = complete_stage(
            &state,
            StageScoreRequest {
                game: Minigame::Synthesis,
                score: 50,
            },
        )
        .await
        .unwrap();
        assert_eq!(phase.phase, PublicSessionPhase::Synthesis);

        let draft = state.drafts().get();
        assert_eq!(draft.scores.total, 210);
        assert!(draft.is_complete());
    }

    #[tokio::test]
    async fn begin_past_the_deadline_closes_the_session() {
        let state = AppState::new(
            AppConfig {
                reveal_date: EpochMillis(1),
                ..AppConfig::default()
            },
            DraftStore::new(Box::new(MemorySlot::default())),
        );

        let phase = begin(&state).await.unwrap();
        assert_eq!(phase.phase, PublicSessionPhase::PastDeadline);
    }

    #[tokio::test]
    async fn remote_reveal_date_wins_over_the_local_default() {
        let state = state_with_store().await;
        let store = state.require_event_store().await.unwrap();
        store
            .put_event_config(EventConfigEntity {
                reveal_date: EpochMillis(i64::MAX),
                is_revealed: false,
                actual_result: None,
                baby_name: None,
                meet_link: String::new(),
                stats: EventStats::default(),
            })
            .await
            .unwrap();

        // The baked-in default date may already be in the past; the remote
        // one keeps the flow open regardless.
        assert_eq!(begin(&state).await.unwrap().phase, PublicSessionPhase::Hypothesis);
    }

    #[tokio::test]
    async fn wrong_stage_is_rejected_without_touching_the_draft() {
        let state = AppState::new(
            far_future_config(),
            DraftStore::new(Box::new(MemorySlot::default())),
        );
        begin(&state).await.unwrap();

        let err = complete_stage(
            &state,
            StageScoreRequest {
                game: Minigame::Equation,
                score: 10,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(state.drafts().get().scores.equation, 0);
    }

    #[tokio::test]
    async fn reopen_preserves_the_draft() {
        let state = AppState::new(
            far_future_config(),
            DraftStore::new(Box::new(MemorySlot::default())),
        );
        begin(&state).await.unwrap();
        choose_hypothesis(
            &state,
            HypothesisRequest {
                hypothesis: Hypothesis::XY,
            },
        )
        .await
        .unwrap();

        let before = state.drafts().get();
        let phase = reopen(&state).await;
        assert_eq!(phase.phase, PublicSessionPhase::Intro);

        let after = state.drafts().get();
        assert_eq!(after.session_id, before.session_id);
        assert_eq!(after.hypothesis, Some(Hypothesis::XY));
    }

    #[tokio::test]
    async fn discarding_the_draft_starts_a_new_session() {
        let state = AppState::new(
            far_future_config(),
            DraftStore::new(Box::new(MemorySlot::default())),
        );
        begin(&state).await.unwrap();
        choose_hypothesis(
            &state,
            HypothesisRequest {
                hypothesis: Hypothesis::XX,
            },
        )
        .await
        .unwrap();

        let before = draft(&state);
        discard_draft(&state);

        let after = draft(&state);
        assert_ne!(after.session_id, before.session_id);
        assert_eq!(after.hypothesis, None);
    }

    #[tokio::test]
    async fn invalid_personal_data_does_not_advance() {
        let state = AppState::new(
            far_future_config(),
            DraftStore::new(Box::new(MemorySlot::default())),
        );
        begin(&state).await.unwrap();
        choose_hypothesis(
            &state,
            HypothesisRequest {
                hypothesis: Hypothesis::XX,
            },
        )
        .await
        .unwrap();

        let err = save_personal_data(
            &state,
            PersonalDataRequest {
                user_name: "A".into(),
                suggested_name: "Luna".into(),
                message: "Mucho amor para ustedes tres".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(state.session_phase().await, SessionPhase::Input);
    }
}
