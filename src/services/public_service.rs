//! Read-only projections of the event for unauthenticated guests.

use crate::{
    dao::models::{EventConfigEntity, EventStats},
    dto::public::{EventConfigResponse, PhaseResponse},
    error::ServiceError,
    services::rate_limit::CONFIG_FETCH,
    state::SharedState,
};

/// Limiter key covering the event configuration route.
const CONFIG_KEY: &str = "config_fetch";

/// The event configuration with derived statistics.
///
/// Falls back to the baked-in configuration when the remote one has not been
/// seeded yet, so guests always get a reveal date.
pub async fn event_config(state: &SharedState) -> Result<EventConfigResponse, ServiceError> {
    if !state.limiter().is_allowed(CONFIG_KEY, &CONFIG_FETCH) {
        return Err(ServiceError::RateLimited(CONFIG_KEY.into()));
    }

    let store = state.require_event_store().await?;
    let config = match store.event_config().await? {
        Some(config) => config,
        None => {
            let local = state.config();
            EventConfigEntity {
                reveal_date: local.reveal_date,
                is_revealed: false,
                actual_result: None,
                baby_name: None,
                meet_link: local.meet_link.clone(),
                stats: EventStats::default(),
            }
        }
    };

    Ok(config.into())
}

/// Current session phase and the degraded flag.
pub async fn phase(state: &SharedState) -> PhaseResponse {
    PhaseResponse {
        phase: state.session_phase().await.into(),
        degraded: state.is_degraded().await,
    }
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
    async fn unseeded_event_falls_back_to_local_defaults() {
        let state = arranged_state().await;

        let response = event_config(&state).await.unwrap();
        assert!(!response.is_revealed);
        assert_eq!(response.stats.total_predictions, 0);
    }

    #[tokio::test]
    async fn config_fetch_is_rate_limited() {
        let state = arranged_state().await;

        event_config(&state).await.unwrap();
        let err = event_config(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::RateLimited(_)));
    }
}
