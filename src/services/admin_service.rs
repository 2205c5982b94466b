//! Business logic powering the admin REST routes: listings, event seeding,
//! the reveal itself, and gift stock resets.

use tracing::info;
use validator::Validate;

use crate::{
    dao::models::{EventConfigEntity, EventStats},
    dto::admin::{ActionResponse, ConfirmationSummary, PredictionSummary, RevealRequest},
    error::ServiceError,
    state::SharedState,
};

/// All submitted predictions, oldest first.
pub async fn list_predictions(
    state: &SharedState,
) -> Result<Vec<PredictionSummary>, ServiceError> {
    let store = state.require_event_store().await?;
    let predictions = store.list_predictions().await?;
    Ok(predictions.into_iter().map(Into::into).collect())
}

/// All recorded confirmations, oldest first.
pub async fn list_confirmations(
    state: &SharedState,
) -> Result<Vec<ConfirmationSummary>, ServiceError> {
    let store = state.require_event_store().await?;
    let confirmations = store.list_confirmations().await?;
    Ok(confirmations.into_iter().map(Into::into).collect())
}

/// Seed the remote event configuration from the local one.
///
/// Statistics already accumulated remotely are kept; only the event metadata
/// is (re)written.
pub async fn init_event(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let store = state.require_event_store().await?;

    let stats = match store.event_config().await? {
        Some(existing) => existing.stats,
        None => EventStats::default(),
    };

    let config = state.config();
    store
        .put_event_config(EventConfigEntity {
            reveal_date: config.reveal_date,
            is_revealed: false,
            actual_result: None,
            baby_name: None,
            meet_link: config.meet_link.clone(),
            stats,
        })
        .await?;

    info!("event configuration seeded");
    Ok(ActionResponse::done())
}

/// Announce the result.
pub async fn reveal(
    state: &SharedState,
    request: RevealRequest,
) -> Result<ActionResponse, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let store = state.require_event_store().await?;
    store
        .set_reveal(request.actual_result, request.baby_name.clone())
        .await?;

    info!(result = %request.actual_result, "result revealed");
    Ok(ActionResponse::done())
}

/// Replace the gift stock with a fresh, full catalog.
pub async fn init_gift_stock(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let store = state.require_event_store().await?;
    let entries = state.config().initial_gift_stock();
    let count = entries.len();
    store.init_gift_stock(entries).await?;

    info!(gifts = count, "gift stock initialized");
    Ok(ActionResponse::done())
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
            models::{Hypothesis, StatsDelta},
        },
        state::AppState,
    };

    async fn arranged_state() -> SharedState {
        let state = AppState::new(
            AppConfig::default(),
            DraftStore::new(Box::new(MemorySlot::default())),
        );
        state
            .install_event_store(Arc::new(MemoryEventStore::default()))
            .await;
        state
    }

    #[tokio::test]
    async fn init_event_preserves_accumulated_stats() {
        let state = arranged_state().await;
        let store = state.require_event_store().await.unwrap();

        store
            .apply_stats(StatsDelta {
                hypothesis: Hypothesis::XX,
                suggested_name: "Luna".into(),
            })
            .await
            .unwrap();

        init_event(&state).await.unwrap();

        let config = store.event_config().await.unwrap().unwrap();
        assert_eq!(config.stats.total_predictions, 1);
        assert_eq!(config.stats.xx_count, 1);
        assert!(!config.is_revealed);
    }

    #[tokio::test]
    async fn reveal_updates_the_event_configuration() {
        let state = arranged_state().await;
        init_event(&state).await.unwrap();

        reveal(
            &state,
            RevealRequest {
                actual_result: Hypothesis::XY,
                baby_name: "Mateo".into(),
            },
        )
        .await
        .unwrap();

        let store = state.require_event_store().await.unwrap();
        let config = store.event_config().await.unwrap().unwrap();
        assert!(config.is_revealed);
        assert_eq!(config.actual_result, Some(Hypothesis::XY));
        assert_eq!(config.baby_name.as_deref(), Some("Mateo"));
    }

    #[tokio::test]
    async fn stock_init_loads_the_full_catalog() {
        let state = arranged_state().await;
        init_gift_stock(&state).await.unwrap();

        let store = state.require_event_store().await.unwrap();
        let stock = store.gift_stock().await.unwrap();
        assert_eq!(stock.len(), state.config().gifts.len());
        assert!(stock.iter().all(|entry| entry.current_count == entry.max_count));
    }
}
