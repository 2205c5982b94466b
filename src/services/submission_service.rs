//! Final submission gate: validates the local draft, enforces the call rate,
//! persists the prediction, and folds it into the shared statistics.

use tracing::{info, warn};

use crate::{
    dao::models::{EpochMillis, PredictionEntity, StatsDelta},
    dto::session::SubmitOutcomeResponse,
    error::ServiceError,
    services::rate_limit::SUBMIT_PREDICTION,
    state::{SharedState, state_machine::SessionEvent},
};

/// Limiter key covering the submission route.
const SUBMIT_KEY: &str = "submit_prediction";

/// Submit the current draft as the guest's final prediction.
///
/// The write is keyed by the draft's session id, so a retry after a lost
/// response lands on the same record instead of creating a duplicate. The
/// statistics update afterwards is best effort: the submission has already
/// succeeded and a stats failure must not undo it.
pub async fn submit(
    state: &SharedState,
    client_fingerprint: Option<String>,
) -> Result<SubmitOutcomeResponse, ServiceError> {
    let draft = state.drafts().get();

    let Some(hypothesis) = draft.hypothesis else {
        return Err(ServiceError::MissingHypothesis);
    };
    if !draft.is_partially_complete() {
        return Err(ServiceError::InvalidInput(
            "draft is incomplete; fill in your data before submitting".into(),
        ));
    }

    if !state.limiter().is_allowed(SUBMIT_KEY, &SUBMIT_PREDICTION) {
        return Err(ServiceError::RateLimited(SUBMIT_KEY.into()));
    }

    let store = state.require_event_store().await?;

    let session_id = draft.session_id.clone();
    let delta = StatsDelta {
        hypothesis,
        suggested_name: draft.suggested_name.clone(),
    };
    let prediction = PredictionEntity {
        session_id: session_id.clone(),
        hypothesis,
        user_name: draft.user_name,
        suggested_name: draft.suggested_name,
        message: draft.message,
        scores: draft.scores,
        submitted_at: EpochMillis::default(),
        client_fingerprint,
    };

    let work_session_id = session_id.clone();
    let (_, phase) = state
        .run_transition(SessionEvent::PredictionSubmitted, || async move {
            store.save_prediction(prediction).await?;
            info!(session_id = %work_session_id, "prediction persisted");

            if let Err(err) = store.apply_stats(delta).await {
                warn!(
                    session_id = %work_session_id,
                    error = %err,
                    "statistics update failed; submission stands"
                );
            }

            Ok(())
        })
        .await?;

    Ok(SubmitOutcomeResponse {
        session_id,
        phase: phase.into(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            draft::{DraftStore, MemorySlot},
            event_store::{EventStore, memory::MemoryEventStore},
            models::{
                ConfirmationEntity, ConfirmationOutcome, EventConfigEntity, GiftSelectionEntity,
                GiftStockEntity, Hypothesis, Minigame, StockUpdate,
            },
            storage::{StorageError, StorageResult},
        },
        state::{AppState, state_machine::SessionPhase},
    };

    async fn arranged_state() -> SharedState {
        let state = AppState::new(
            AppConfig::default(),
            DraftStore::new(Box::new(MemorySlot::default())),
        );
        state
            .install_event_store(Arc::new(MemoryEventStore::default()))
            .await;
        walk_to_last_stage(&state).await;
        state
    }

    async fn walk_to_last_stage(state: &SharedState) {
        for event in [
            SessionEvent::Begin,
            SessionEvent::HypothesisChosen,
            SessionEvent::InputCompleted,
            SessionEvent::StageCleared(Minigame::Collider),
            SessionEvent::StageCleared(Minigame::Equation),
        ] {
            state
                .run_transition(event, || async { Ok(()) })
                .await
                .unwrap();
        }
    }

    fn fill_draft(state: &SharedState) {
        let drafts = state.drafts();
        drafts.get();
        drafts.set_hypothesis(Hypothesis::XX);
        drafts.set_personal_data("Ana Gomez", "Luna", "Mucho amor para ustedes tres");
        drafts.set_score(Minigame::Collider, 80);
    }

    #[tokio::test]
    async fn submission_without_hypothesis_is_rejected() {
        let state = arranged_state().await;
        state.drafts().get();

        let err = submit(&state, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingHypothesis));
        assert_eq!(state.session_phase().await, SessionPhase::Minigame(Minigame::Synthesis));
    }

    #[tokio::test]
    async fn incomplete_draft_is_rejected() {
        let state = arranged_state().await;
        state.drafts().get();
        state.drafts().set_hypothesis(Hypothesis::XY);
        state.drafts().set_personal_data("Ana Gomez", "Luna", "corto");

        let err = submit(&state, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn rapid_second_submission_is_rate_limited() {
        let state = arranged_state().await;
        fill_draft(&state);

        submit(&state, None).await.unwrap();

        let err = submit(&state, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::RateLimited(_)));
    }

    #[tokio::test]
    async fn successful_submission_lands_in_submitted_phase() {
        let state = arranged_state().await;
        fill_draft(&state);

        let outcome = submit(&state, Some("test-agent".into())).await.unwrap();
        assert!(outcome.session_id.starts_with("user_"));
        assert_eq!(state.session_phase().await, SessionPhase::Submitted);

        let store = state.require_event_store().await.unwrap();
        let stored = store
            .find_prediction(outcome.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.client_fingerprint.as_deref(), Some("test-agent"));
    }

    #[tokio::test]
    async fn stats_failure_does_not_undo_the_submission() {
        let state = AppState::new(
            AppConfig::default(),
            DraftStore::new(Box::new(MemorySlot::default())),
        );
        state
            .install_event_store(Arc::new(FailingStatsStore::default()))
            .await;
        walk_to_last_stage(&state).await;
        fill_draft(&state);

        let outcome = submit(&state, None).await.unwrap();
        assert_eq!(state.session_phase().await, SessionPhase::Submitted);

        let store = state.require_event_store().await.unwrap();
        assert!(
            store
                .find_prediction(outcome.session_id)
                .await
                .unwrap()
                .is_some()
        );
    }

    /// Delegates everything to an in-memory store except the stats update,
    /// which always fails.
    #[derive(Default)]
    struct FailingStatsStore {
        inner: MemoryEventStore,
    }

    impl EventStore for FailingStatsStore {
        fn save_prediction(
            &self,
            prediction: PredictionEntity,
        ) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.save_prediction(prediction)
        }

        fn find_prediction(
            &self,
            session_id: String,
        ) -> BoxFuture<'static, StorageResult<Option<PredictionEntity>>> {
            self.inner.find_prediction(session_id)
        }

        fn list_predictions(&self) -> BoxFuture<'static, StorageResult<Vec<PredictionEntity>>> {
            self.inner.list_predictions()
        }

        fn event_config(&self) -> BoxFuture<'static, StorageResult<Option<EventConfigEntity>>> {
            self.inner.event_config()
        }

        fn put_event_config(
            &self,
            config: EventConfigEntity,
        ) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.put_event_config(config)
        }

        fn apply_stats(&self, _delta: StatsDelta) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async {
                Err(StorageError::unavailable(
                    "stats rejected".to_string(),
                    std::io::Error::other("stats rejected"),
                ))
            })
        }

        fn set_reveal(
            &self,
            actual_result: Hypothesis,
            baby_name: String,
        ) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.set_reveal(actual_result, baby_name)
        }

        fn gift_stock(&self) -> BoxFuture<'static, StorageResult<Vec<GiftStockEntity>>> {
            self.inner.gift_stock()
        }

        fn init_gift_stock(
            &self,
            entries: Vec<GiftStockEntity>,
        ) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.init_gift_stock(entries)
        }

        fn try_decrement_stock(
            &self,
            selections: Vec<GiftSelectionEntity>,
        ) -> BoxFuture<'static, StorageResult<StockUpdate>> {
            self.inner.try_decrement_stock(selections)
        }

        fn record_confirmation(
            &self,
            confirmation: ConfirmationEntity,
        ) -> BoxFuture<'static, StorageResult<ConfirmationOutcome>> {
            self.inner.record_confirmation(confirmation)
        }

        fn delete_confirmation(&self, group_id: String) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.delete_confirmation(group_id)
        }

        fn list_confirmations(
            &self,
        ) -> BoxFuture<'static, StorageResult<Vec<ConfirmationEntity>>> {
            self.inner.list_confirmations()
        }

        fn has_confirmed(&self, group_id: String) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.has_confirmed(group_id)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }
}
