use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoConfirmationDocument, MongoEventConfigDocument, MongoGiftStockDocument,
        MongoPredictionDocument,
    },
};
use crate::dao::{
    event_store::EventStore,
    models::{
        ConfirmationEntity, ConfirmationOutcome, EpochMillis, EventConfigEntity,
        GiftSelectionEntity, GiftStockEntity, Hypothesis, PredictionEntity, StatsDelta,
        StockUpdate,
    },
    storage::StorageResult,
};

const PREDICTION_COLLECTION: &str = "predictions";
const CONFIG_COLLECTION: &str = "config";
const CONFIRMATION_COLLECTION: &str = "baby-shower-confirmations";
const STOCK_COLLECTION: &str = "baby-shower-gifts-stock";

/// MongoDB-backed event store.
#[derive(Clone)]
pub struct MongoEventStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoEventStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        let collection = database.collection::<MongoPredictionDocument>(PREDICTION_COLLECTION);
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"submitted_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("prediction_submitted_at_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PREDICTION_COLLECTION,
                index: "submitted_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn prediction_collection(&self) -> Collection<MongoPredictionDocument> {
        self.database()
            .await
            .collection::<MongoPredictionDocument>(PREDICTION_COLLECTION)
    }

    async fn config_collection(&self) -> Collection<MongoEventConfigDocument> {
        self.database()
            .await
            .collection::<MongoEventConfigDocument>(CONFIG_COLLECTION)
    }

    async fn stock_collection(&self) -> Collection<MongoGiftStockDocument> {
        self.database()
            .await
            .collection::<MongoGiftStockDocument>(STOCK_COLLECTION)
    }

    async fn confirmation_collection(&self) -> Collection<MongoConfirmationDocument> {
        self.database()
            .await
            .collection::<MongoConfirmationDocument>(CONFIRMATION_COLLECTION)
    }

    async fn save_prediction(&self, mut prediction: PredictionEntity) -> MongoResult<()> {
        prediction.submitted_at = EpochMillis::now();
        let session_id = prediction.session_id.clone();
        let document: MongoPredictionDocument = prediction.into();

        self.prediction_collection()
            .await
            .replace_one(doc! {"_id": &session_id}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SavePrediction { session_id, source })?;

        Ok(())
    }

    async fn find_prediction(&self, session_id: String) -> MongoResult<Option<PredictionEntity>> {
        let document = self
            .prediction_collection()
            .await
            .find_one(doc! {"_id": &session_id})
            .await
            .map_err(|source| MongoDaoError::LoadPredictions { source })?;

        Ok(document.map(Into::into))
    }

    async fn list_predictions(&self) -> MongoResult<Vec<PredictionEntity>> {
        let documents: Vec<MongoPredictionDocument> = self
            .prediction_collection()
            .await
            .find(doc! {})
            .sort(doc! {"submitted_at": 1})
            .await
            .map_err(|source| MongoDaoError::LoadPredictions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadPredictions { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn event_config(&self) -> MongoResult<Option<EventConfigEntity>> {
        let document = self
            .config_collection()
            .await
            .find_one(doc! {"_id": MongoEventConfigDocument::DOC_ID})
            .await
            .map_err(|source| MongoDaoError::EventConfig { source })?;

        Ok(document.map(Into::into))
    }

    async fn put_event_config(&self, config: EventConfigEntity) -> MongoResult<()> {
        let document = MongoEventConfigDocument::from_entity(config);

        self.config_collection()
            .await
            .replace_one(doc! {"_id": MongoEventConfigDocument::DOC_ID}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::EventConfig { source })?;

        Ok(())
    }

    /// Stats mutate through `$inc`/`$addToSet` only so concurrent submitters
    /// never lose increments to a read-modify-write race.
    async fn apply_stats(&self, delta: StatsDelta) -> MongoResult<()> {
        let bucket = match delta.hypothesis {
            Hypothesis::XX => "stats.xx_count",
            Hypothesis::XY => "stats.xy_count",
        };

        self.config_collection()
            .await
            .update_one(
                doc! {"_id": MongoEventConfigDocument::DOC_ID},
                doc! {
                    "$inc": { "stats.total_predictions": 1i64, bucket: 1i64 },
                    "$addToSet": { "stats.top_names": &delta.suggested_name },
                    "$set": { "stats.last_updated": EpochMillis::now().0 },
                },
            )
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::ApplyStats { source })?;

        Ok(())
    }

    async fn set_reveal(&self, actual_result: Hypothesis, baby_name: String) -> MongoResult<()> {
        self.config_collection()
            .await
            .update_one(
                doc! {"_id": MongoEventConfigDocument::DOC_ID},
                doc! {"$set": {
                    "is_revealed": true,
                    "actual_result": actual_result.to_string(),
                    "baby_name": baby_name,
                }},
            )
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::EventConfig { source })?;

        Ok(())
    }

    async fn gift_stock(&self) -> MongoResult<Vec<GiftStockEntity>> {
        let documents: Vec<MongoGiftStockDocument> = self
            .stock_collection()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::GiftStock { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::GiftStock { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn init_gift_stock(&self, entries: Vec<GiftStockEntity>) -> MongoResult<()> {
        let collection = self.stock_collection().await;

        collection
            .delete_many(doc! {})
            .await
            .map_err(|source| MongoDaoError::GiftStock { source })?;

        if entries.is_empty() {
            return Ok(());
        }

        let documents: Vec<MongoGiftStockDocument> =
            entries.into_iter().map(Into::into).collect();
        collection
            .insert_many(documents)
            .await
            .map_err(|source| MongoDaoError::GiftStock { source })?;

        Ok(())
    }

    /// Per-gift "decrement only if enough remains" conditional update; a
    /// shortfall undoes every decrement already applied in this call before
    /// reporting, so the caller never observes a partial allocation.
    async fn try_decrement_stock(
        &self,
        selections: Vec<GiftSelectionEntity>,
    ) -> MongoResult<StockUpdate> {
        let collection = self.stock_collection().await;
        let mut applied: Vec<&GiftSelectionEntity> = Vec::new();

        for selection in &selections {
            let quantity = i64::from(selection.quantity);
            let updated = collection
                .find_one_and_update(
                    doc! {"_id": &selection.gift_id, "current_count": {"$gte": quantity}},
                    doc! {"$inc": {"current_count": -quantity}},
                )
                .await
                .map_err(|source| MongoDaoError::DecrementStock {
                    gift_id: selection.gift_id.clone(),
                    source,
                })?;

            if updated.is_none() {
                self.restore_stock(&collection, &applied).await?;
                return Ok(StockUpdate::Shortfall {
                    gift_id: selection.gift_id.clone(),
                });
            }

            applied.push(selection);
        }

        Ok(StockUpdate::Applied)
    }

    async fn restore_stock(
        &self,
        collection: &Collection<MongoGiftStockDocument>,
        applied: &[&GiftSelectionEntity],
    ) -> MongoResult<()> {
        for selection in applied {
            collection
                .update_one(
                    doc! {"_id": &selection.gift_id},
                    doc! {"$inc": {"current_count": i64::from(selection.quantity)}},
                )
                .await
                .map_err(|source| MongoDaoError::DecrementStock {
                    gift_id: selection.gift_id.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    async fn record_confirmation(
        &self,
        mut confirmation: ConfirmationEntity,
    ) -> MongoResult<ConfirmationOutcome> {
        confirmation.submitted_at = EpochMillis::now();
        let group_id = confirmation.group_id.clone();
        let document: MongoConfirmationDocument = confirmation.into();

        match self.confirmation_collection().await.insert_one(&document).await {
            Ok(_) => Ok(ConfirmationOutcome::Recorded),
            Err(err) if is_duplicate_key(&err) => Ok(ConfirmationOutcome::AlreadyConfirmed),
            Err(source) => Err(MongoDaoError::Confirmation { group_id, source }),
        }
    }

    async fn delete_confirmation(&self, group_id: String) -> MongoResult<()> {
        self.confirmation_collection()
            .await
            .delete_one(doc! {"_id": &group_id})
            .await
            .map_err(|source| MongoDaoError::Confirmation { group_id, source })?;

        Ok(())
    }

    async fn list_confirmations(&self) -> MongoResult<Vec<ConfirmationEntity>> {
        let documents: Vec<MongoConfirmationDocument> = self
            .confirmation_collection()
            .await
            .find(doc! {})
            .sort(doc! {"submitted_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListConfirmations { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListConfirmations { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn has_confirmed(&self, group_id: String) -> MongoResult<bool> {
        let found = self
            .confirmation_collection()
            .await
            .find_one(doc! {"_id": &group_id})
            .await
            .map_err(|source| MongoDaoError::Confirmation { group_id, source })?;

        Ok(found.is_some())
    }
}

/// Whether the driver error is a unique-key violation (code 11000).
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}

impl EventStore for MongoEventStore {
    fn save_prediction(&self, prediction: PredictionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_prediction(prediction).await.map_err(Into::into) })
    }

    fn find_prediction(
        &self,
        session_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<PredictionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_prediction(session_id).await.map_err(Into::into) })
    }

    fn list_predictions(&self) -> BoxFuture<'static, StorageResult<Vec<PredictionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_predictions().await.map_err(Into::into) })
    }

    fn event_config(&self) -> BoxFuture<'static, StorageResult<Option<EventConfigEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.event_config().await.map_err(Into::into) })
    }

    fn put_event_config(&self, config: EventConfigEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.put_event_config(config).await.map_err(Into::into) })
    }

    fn apply_stats(&self, delta: StatsDelta) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.apply_stats(delta).await.map_err(Into::into) })
    }

    fn set_reveal(
        &self,
        actual_result: Hypothesis,
        baby_name: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .set_reveal(actual_result, baby_name)
                .await
                .map_err(Into::into)
        })
    }

    fn gift_stock(&self) -> BoxFuture<'static, StorageResult<Vec<GiftStockEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.gift_stock().await.map_err(Into::into) })
    }

    fn init_gift_stock(
        &self,
        entries: Vec<GiftStockEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.init_gift_stock(entries).await.map_err(Into::into) })
    }

    fn try_decrement_stock(
        &self,
        selections: Vec<GiftSelectionEntity>,
    ) -> BoxFuture<'static, StorageResult<StockUpdate>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .try_decrement_stock(selections)
                .await
                .map_err(Into::into)
        })
    }

    fn record_confirmation(
        &self,
        confirmation: ConfirmationEntity,
    ) -> BoxFuture<'static, StorageResult<ConfirmationOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .record_confirmation(confirmation)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_confirmation(&self, group_id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.delete_confirmation(group_id).await.map_err(Into::into) })
    }

    fn list_confirmations(&self) -> BoxFuture<'static, StorageResult<Vec<ConfirmationEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_confirmations().await.map_err(Into::into) })
    }

    fn has_confirmed(&self, group_id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.has_confirmed(group_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
