//! In-memory [`EventStore`] used by the test suite and storeless demo runs.
//!
//! Every operation holds one lock for its whole duration, which makes the
//! conditional stock decrement and the group-unique confirmation insert
//! genuinely atomic, matching the contract the MongoDB backend honors with
//! conditional updates and a keyed insert.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::dao::{
    event_store::EventStore,
    models::{
        ConfirmationEntity, ConfirmationOutcome, EpochMillis, EventConfigEntity,
        GiftSelectionEntity, GiftStockEntity, Hypothesis, PredictionEntity, StatsDelta,
        StockUpdate,
    },
    storage::StorageResult,
};

#[derive(Default)]
struct Inner {
    predictions: IndexMap<String, PredictionEntity>,
    event: Option<EventConfigEntity>,
    stock: IndexMap<String, GiftStockEntity>,
    confirmations: IndexMap<String, ConfirmationEntity>,
}

/// Lock-per-operation in-memory store.
#[derive(Clone, Default)]
pub struct MemoryEventStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryEventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store poisoned")
    }
}

fn default_event_config() -> EventConfigEntity {
    EventConfigEntity {
        reveal_date: EpochMillis(0),
        is_revealed: false,
        actual_result: None,
        baby_name: None,
        meet_link: String::new(),
        stats: Default::default(),
    }
}

impl EventStore for MemoryEventStore {
    fn save_prediction(
        &self,
        mut prediction: PredictionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            prediction.submitted_at = EpochMillis::now();
            let mut inner = store.lock();
            inner
                .predictions
                .insert(prediction.session_id.clone(), prediction);
            Ok(())
        })
    }

    fn find_prediction(
        &self,
        session_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<PredictionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().predictions.get(&session_id).cloned()) })
    }

    fn list_predictions(&self) -> BoxFuture<'static, StorageResult<Vec<PredictionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().predictions.values().cloned().collect()) })
    }

    fn event_config(&self) -> BoxFuture<'static, StorageResult<Option<EventConfigEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().event.clone()) })
    }

    fn put_event_config(&self, config: EventConfigEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.lock().event = Some(config);
            Ok(())
        })
    }

    fn apply_stats(&self, delta: StatsDelta) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut inner = store.lock();
            let event = inner.event.get_or_insert_with(default_event_config);
            let stats = &mut event.stats;
            stats.total_predictions += 1;
            match delta.hypothesis {
                Hypothesis::XX => stats.xx_count += 1,
                Hypothesis::XY => stats.xy_count += 1,
            }
            if !stats.top_names.contains(&delta.suggested_name) {
                stats.top_names.push(delta.suggested_name);
            }
            stats.last_updated = EpochMillis::now();
            Ok(())
        })
    }

    fn set_reveal(
        &self,
        actual_result: Hypothesis,
        baby_name: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut inner = store.lock();
            let event = inner.event.get_or_insert_with(default_event_config);
            event.is_revealed = true;
            event.actual_result = Some(actual_result);
            event.baby_name = Some(baby_name);
            Ok(())
        })
    }

    fn gift_stock(&self) -> BoxFuture<'static, StorageResult<Vec<GiftStockEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().stock.values().cloned().collect()) })
    }

    fn init_gift_stock(
        &self,
        entries: Vec<GiftStockEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut inner = store.lock();
            inner.stock = entries
                .into_iter()
                .map(|entry| (entry.id.clone(), entry))
                .collect();
            Ok(())
        })
    }

    fn try_decrement_stock(
        &self,
        selections: Vec<GiftSelectionEntity>,
    ) -> BoxFuture<'static, StorageResult<StockUpdate>> {
        let store = self.clone();
        Box::pin(async move {
            let mut inner = store.lock();
            // Stage the decrements on a scratch copy so a shortfall anywhere
            // leaves the live stock untouched.
            let mut staged = inner.stock.clone();
            for selection in &selections {
                let Some(entry) = staged.get_mut(&selection.gift_id) else {
                    return Ok(StockUpdate::Shortfall {
                        gift_id: selection.gift_id.clone(),
                    });
                };
                if entry.current_count < selection.quantity {
                    return Ok(StockUpdate::Shortfall {
                        gift_id: selection.gift_id.clone(),
                    });
                }
                entry.current_count -= selection.quantity;
            }
            inner.stock = staged;
            Ok(StockUpdate::Applied)
        })
    }

    fn record_confirmation(
        &self,
        mut confirmation: ConfirmationEntity,
    ) -> BoxFuture<'static, StorageResult<ConfirmationOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            let mut inner = store.lock();
            if inner.confirmations.contains_key(&confirmation.group_id) {
                return Ok(ConfirmationOutcome::AlreadyConfirmed);
            }
            confirmation.submitted_at = EpochMillis::now();
            inner
                .confirmations
                .insert(confirmation.group_id.clone(), confirmation);
            Ok(ConfirmationOutcome::Recorded)
        })
    }

    fn delete_confirmation(&self, group_id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.lock().confirmations.shift_remove(&group_id);
            Ok(())
        })
    }

    fn list_confirmations(&self) -> BoxFuture<'static, StorageResult<Vec<ConfirmationEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().confirmations.values().cloned().collect()) })
    }

    fn has_confirmed(&self, group_id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.lock().confirmations.contains_key(&group_id)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
