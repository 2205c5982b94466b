//! Remote document-store abstraction for the event: predictions, the
//! singleton event config/summary, RSVP confirmations, and gift stock.

pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::{
    models::{
        ConfirmationEntity, ConfirmationOutcome, EventConfigEntity, GiftSelectionEntity,
        GiftStockEntity, Hypothesis, PredictionEntity, StatsDelta, StockUpdate,
    },
    storage::StorageResult,
};

/// Abstraction over the remote persistence layer.
///
/// The two operations with cross-session invariants are contractual here
/// rather than advisory: `record_confirmation` enforces group uniqueness
/// inside the store, and `try_decrement_stock` is an atomic conditional
/// decrement that never leaves a partial decrement behind on shortfall.
pub trait EventStore: Send + Sync {
    /// Create-or-replace a prediction keyed by its session id.
    fn save_prediction(&self, prediction: PredictionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a prediction by session id.
    fn find_prediction(
        &self,
        session_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<PredictionEntity>>>;
    /// All predictions, for the admin wall and exports.
    fn list_predictions(&self) -> BoxFuture<'static, StorageResult<Vec<PredictionEntity>>>;

    /// Read the singleton event config document, if it has been seeded.
    fn event_config(&self) -> BoxFuture<'static, StorageResult<Option<EventConfigEntity>>>;
    /// Seed or replace the singleton event config document.
    fn put_event_config(&self, config: EventConfigEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Apply one prediction's worth of statistics with atomic primitives.
    fn apply_stats(&self, delta: StatsDelta) -> BoxFuture<'static, StorageResult<()>>;
    /// Mark the event as revealed with the actual result and chosen name.
    fn set_reveal(
        &self,
        actual_result: Hypothesis,
        baby_name: String,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Current gift stock snapshot, in catalog order.
    fn gift_stock(&self) -> BoxFuture<'static, StorageResult<Vec<GiftStockEntity>>>;
    /// Seed the stock collection; replaces existing entries wholesale.
    fn init_gift_stock(
        &self,
        entries: Vec<GiftStockEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Atomically decrement stock for every selection, or report the first
    /// shortfall with all prior decrements undone.
    fn try_decrement_stock(
        &self,
        selections: Vec<GiftSelectionEntity>,
    ) -> BoxFuture<'static, StorageResult<StockUpdate>>;

    /// Insert a confirmation under the group-id uniqueness constraint.
    fn record_confirmation(
        &self,
        confirmation: ConfirmationEntity,
    ) -> BoxFuture<'static, StorageResult<ConfirmationOutcome>>;
    /// Remove a confirmation; compensation path when stock ran short after
    /// the group slot was claimed.
    fn delete_confirmation(&self, group_id: String) -> BoxFuture<'static, StorageResult<()>>;
    /// All confirmations, for the admin view.
    fn list_confirmations(&self) -> BoxFuture<'static, StorageResult<Vec<ConfirmationEntity>>>;
    /// Whether any confirmation references the group.
    fn has_confirmed(&self, group_id: String) -> BoxFuture<'static, StorageResult<bool>>;

    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a broken connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
