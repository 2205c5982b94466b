//! Baby shower attendance: gift stock listing, advisory availability checks,
//! and group confirmations with atomic stock allocation.

use tracing::{info, warn};
use validator::Validate;

use crate::{
    dao::models::{ConfirmationEntity, ConfirmationOutcome, StockUpdate},
    dto::rsvp::{
        AvailabilityRequest, AvailabilityResponse, ConfirmationRequest, ConfirmationResponse,
        ConfirmedResponse, GiftStockItem,
    },
    error::ServiceError,
    services::rate_limit::GENERAL_FETCH,
    state::SharedState,
};

/// Limiter key covering the read-only attendance routes.
const FETCH_KEY: &str = "general_fetch";

/// List the gift stock with per-entry availability.
pub async fn gift_stock(state: &SharedState) -> Result<Vec<GiftStockItem>, ServiceError> {
    if !state.limiter().is_allowed(FETCH_KEY, &GENERAL_FETCH) {
        return Err(ServiceError::RateLimited(FETCH_KEY.into()));
    }

    let store = state.require_event_store().await?;
    let stock = store.gift_stock().await?;
    Ok(stock.into_iter().map(Into::into).collect())
}

/// Advisory pre-check of a selection against current stock.
///
/// A positive answer is a hint, not a reservation: only the confirmation
/// itself allocates stock, and it re-checks atomically.
pub async fn check_availability(
    state: &SharedState,
    request: AvailabilityRequest,
) -> Result<AvailabilityResponse, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    let store = state.require_event_store().await?;
    let stock = store.gift_stock().await?;

    let unavailable: Vec<String> = request
        .gifts
        .iter()
        .filter(|selection| {
            !stock
                .iter()
                .any(|entry| entry.id == selection.gift_id && entry.current_count >= selection.quantity)
        })
        .map(|selection| selection.gift_id.clone())
        .collect();

    Ok(AvailabilityResponse {
        available: unavailable.is_empty(),
        unavailable,
    })
}

/// Record a group's confirmation and allocate the selected gifts.
///
/// The confirmation is inserted first; its key is unique per group, so a
/// concurrent duplicate resolves to [`ConfirmationOutcome::AlreadyConfirmed`]
/// instead of a second record. Stock is then decremented conditionally, and a
/// shortfall deletes the just-inserted confirmation so the group can pick
/// again.
pub async fn submit_confirmation(
    state: &SharedState,
    request: ConfirmationRequest,
) -> Result<ConfirmationResponse, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    if request.all_declined && !request.gifts.is_empty() {
        return Err(ServiceError::InvalidInput(
            "a declining group cannot bring gifts".into(),
        ));
    }
    if !request.all_declined
        && !request.attendees.iter().any(|attendee| attendee.attending)
        && request.special_companion.is_none()
    {
        return Err(ServiceError::InvalidInput(
            "mark at least one attendee or decline for the whole group".into(),
        ));
    }

    let store = state.require_event_store().await?;
    let confirmation: ConfirmationEntity = request.into();
    let group_id = confirmation.group_id.clone();
    let gifts = confirmation.gifts.clone();

    match store.record_confirmation(confirmation).await? {
        ConfirmationOutcome::AlreadyConfirmed => {
            return Ok(ConfirmationResponse {
                status: ConfirmationOutcome::AlreadyConfirmed.into(),
                group_id,
            });
        }
        ConfirmationOutcome::Recorded => {}
    }

    if !gifts.is_empty() {
        match store.try_decrement_stock(gifts).await? {
            StockUpdate::Applied => {}
            StockUpdate::Shortfall { gift_id } => {
                warn!(
                    group_id = %group_id,
                    gift_id = %gift_id,
                    "gift stock ran out during confirmation; rolling back"
                );
                if let Err(err) = store.delete_confirmation(group_id.clone()).await {
                    warn!(
                        group_id = %group_id,
                        error = %err,
                        "failed to roll back confirmation after stock shortfall"
                    );
                }
                return Err(ServiceError::StockConflict(gift_id));
            }
        }
    }

    info!(group_id = %group_id, "confirmation recorded");
    Ok(ConfirmationResponse {
        status: ConfirmationOutcome::Recorded.into(),
        group_id,
    })
}

/// Whether a confirmation already exists for the group.
pub async fn has_confirmed(
    state: &SharedState,
    group_id: String,
) -> Result<ConfirmedResponse, ServiceError> {
    if !state.limiter().is_allowed(FETCH_KEY, &GENERAL_FETCH) {
        return Err(ServiceError::RateLimited(FETCH_KEY.into()));
    }

    let store = state.require_event_store().await?;
    let confirmed = store.has_confirmed(group_id).await?;
    Ok(ConfirmedResponse { confirmed })
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
            models::GiftStockEntity,
        },
        dto::rsvp::{AttendeeRequest, ConfirmationStatus, GiftSelectionRequest},
        state::AppState,
    };

    async fn state_with_stock(entries: Vec<GiftStockEntity>) -> SharedState {
        let state = AppState::new(
            AppConfig::default(),
            DraftStore::new(Box::new(MemorySlot::default())),
        );
        state
            .install_event_store(Arc::new(MemoryEventStore::default()))
            .await;
        state
            .require_event_store()
            .await
            .unwrap()
            .init_gift_stock(entries)
            .await
            .unwrap();
        state
    }

    fn stock_entry(id: &str, count: u32) -> GiftStockEntity {
        GiftStockEntity {
            id: id.into(),
            name: id.into(),
            max_count: count,
            current_count: count,
            is_unique: count == 1,
        }
    }

    fn attendee(name: &str) -> AttendeeRequest {
        AttendeeRequest {
            name: name.into(),
            identity_number: "12345678".into(),
            attending: true,
        }
    }

    fn confirmation(group: &str, gifts: Vec<GiftSelectionRequest>) -> ConfirmationRequest {
        ConfirmationRequest {
            group_id: group.into(),
            main_guest_name: "Ana Gomez".into(),
            attendees: vec![attendee("Ana Gomez")],
            gifts,
            special_companion: None,
            all_declined: false,
        }
    }

    fn selection(id: &str, quantity: u32) -> GiftSelectionRequest {
        GiftSelectionRequest {
            gift_id: id.into(),
            name: id.into(),
            quantity,
        }
    }

    #[tokio::test]
    async fn confirmation_allocates_stock() {
        let state = state_with_stock(vec![stock_entry("baberos", 3)]).await;

        let response = submit_confirmation(
            &state,
            confirmation("familia-gomez", vec![selection("baberos", 2)]),
        )
        .await
        .unwrap();
        assert_eq!(response.status, ConfirmationStatus::Recorded);

        let store = state.require_event_store().await.unwrap();
        let stock = store.gift_stock().await.unwrap();
        assert_eq!(stock[0].current_count, 1);
    }

    #[tokio::test]
    async fn second_confirmation_for_a_group_changes_nothing() {
        let state = state_with_stock(vec![stock_entry("baberos", 3)]).await;

        submit_confirmation(
            &state,
            confirmation("familia-gomez", vec![selection("baberos", 1)]),
        )
        .await
        .unwrap();

        let response = submit_confirmation(
            &state,
            confirmation("familia-gomez", vec![selection("baberos", 1)]),
        )
        .await
        .unwrap();
        assert_eq!(response.status, ConfirmationStatus::AlreadyConfirmed);

        let store = state.require_event_store().await.unwrap();
        let stock = store.gift_stock().await.unwrap();
        assert_eq!(stock[0].current_count, 2);
    }

    #[tokio::test]
    async fn shortfall_rolls_the_confirmation_back() {
        let state = state_with_stock(vec![stock_entry("fular", 1)]).await;

        submit_confirmation(
            &state,
            confirmation("familia-gomez", vec![selection("fular", 1)]),
        )
        .await
        .unwrap();

        let err = submit_confirmation(
            &state,
            confirmation("familia-perez", vec![selection("fular", 1)]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::StockConflict(_)));

        // The losing group left no trace and may confirm again later.
        let store = state.require_event_store().await.unwrap();
        assert!(!store.has_confirmed("familia-perez".into()).await.unwrap());
    }

    #[tokio::test]
    async fn declining_group_brings_no_gifts() {
        let state = state_with_stock(vec![stock_entry("baberos", 3)]).await;

        let mut request = confirmation("familia-gomez", vec![selection("baberos", 1)]);
        request.all_declined = true;
        let err = submit_confirmation(&state, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let mut declined = confirmation("familia-gomez", vec![]);
        declined.all_declined = true;
        declined.attendees[0].attending = false;
        let response = submit_confirmation(&state, declined).await.unwrap();
        assert_eq!(response.status, ConfirmationStatus::Recorded);

        let store = state.require_event_store().await.unwrap();
        let stock = store.gift_stock().await.unwrap();
        assert_eq!(stock[0].current_count, 3);
    }

    #[tokio::test]
    async fn availability_is_advisory_and_lists_missing_gifts() {
        let state = state_with_stock(vec![stock_entry("fular", 1), stock_entry("baberos", 2)])
            .await;

        let response = check_availability(
            &state,
            AvailabilityRequest {
                gifts: vec![selection("fular", 1), selection("baberos", 3)],
            },
        )
        .await
        .unwrap();

        assert!(!response.available);
        assert_eq!(response.unavailable, vec!["baberos".to_string()]);
    }
}
