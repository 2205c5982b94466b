use serde::{Deserialize, Serialize};

use crate::dao::models::{
    AttendeeEntity, ConfirmationEntity, EpochMillis, EventConfigEntity, EventStats, GameScores,
    GiftSelectionEntity, GiftStockEntity, Hypothesis, PredictionEntity,
};

/// Prediction document keyed by session id so retries replace in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPredictionDocument {
    #[serde(rename = "_id")]
    session_id: String,
    hypothesis: Hypothesis,
    user_name: String,
    suggested_name: String,
    message: String,
    scores: GameScores,
    submitted_at: i64,
    client_fingerprint: Option<String>,
}

impl From<PredictionEntity> for MongoPredictionDocument {
    fn from(value: PredictionEntity) -> Self {
        Self {
            session_id: value.session_id,
            hypothesis: value.hypothesis,
            user_name: value.user_name,
            suggested_name: value.suggested_name,
            message: value.message,
            scores: value.scores,
            submitted_at: value.submitted_at.0,
            client_fingerprint: value.client_fingerprint,
        }
    }
}

impl From<MongoPredictionDocument> for PredictionEntity {
    fn from(value: MongoPredictionDocument) -> Self {
        Self {
            session_id: value.session_id,
            hypothesis: value.hypothesis,
            user_name: value.user_name,
            suggested_name: value.suggested_name,
            message: value.message,
            scores: value.scores,
            submitted_at: EpochMillis(value.submitted_at),
            client_fingerprint: value.client_fingerprint,
        }
    }
}

/// Singleton config document stored under a fixed `_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEventConfigDocument {
    #[serde(rename = "_id")]
    pub id: String,
    // Stats deltas may upsert this document before the admin seeds it, so
    // every field outside `_id` needs a deserialization default.
    #[serde(default)]
    reveal_date: i64,
    #[serde(default)]
    is_revealed: bool,
    #[serde(default)]
    actual_result: Option<Hypothesis>,
    #[serde(default)]
    baby_name: Option<String>,
    #[serde(default)]
    meet_link: String,
    #[serde(default)]
    stats: MongoStatsDocument,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MongoStatsDocument {
    #[serde(default)]
    total_predictions: i64,
    #[serde(default)]
    xx_count: i64,
    #[serde(default)]
    xy_count: i64,
    #[serde(default)]
    top_names: Vec<String>,
    #[serde(default)]
    last_updated: i64,
}

impl MongoEventConfigDocument {
    /// Fixed identifier of the singleton document.
    pub const DOC_ID: &'static str = "event";

    pub fn from_entity(value: EventConfigEntity) -> Self {
        Self {
            id: Self::DOC_ID.to_owned(),
            reveal_date: value.reveal_date.0,
            is_revealed: value.is_revealed,
            actual_result: value.actual_result,
            baby_name: value.baby_name,
            meet_link: value.meet_link,
            stats: MongoStatsDocument {
                total_predictions: value.stats.total_predictions,
                xx_count: value.stats.xx_count,
                xy_count: value.stats.xy_count,
                top_names: value.stats.top_names,
                last_updated: value.stats.last_updated.0,
            },
        }
    }
}

impl From<MongoEventConfigDocument> for EventConfigEntity {
    fn from(value: MongoEventConfigDocument) -> Self {
        Self {
            reveal_date: EpochMillis(value.reveal_date),
            is_revealed: value.is_revealed,
            actual_result: value.actual_result,
            baby_name: value.baby_name,
            meet_link: value.meet_link,
            stats: EventStats {
                total_predictions: value.stats.total_predictions,
                xx_count: value.stats.xx_count,
                xy_count: value.stats.xy_count,
                top_names: value.stats.top_names,
                last_updated: EpochMillis(value.stats.last_updated),
            },
        }
    }
}

/// Gift stock document keyed by the gift identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGiftStockDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    max_count: i64,
    current_count: i64,
    is_unique: bool,
}

impl From<GiftStockEntity> for MongoGiftStockDocument {
    fn from(value: GiftStockEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            max_count: i64::from(value.max_count),
            current_count: i64::from(value.current_count),
            is_unique: value.is_unique,
        }
    }
}

impl From<MongoGiftStockDocument> for GiftStockEntity {
    fn from(value: MongoGiftStockDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            max_count: value.max_count.max(0) as u32,
            current_count: value.current_count.max(0) as u32,
            is_unique: value.is_unique,
        }
    }
}

/// Confirmation document keyed by group id; the `_id` uniqueness constraint
/// is what makes double-confirmation impossible under concurrency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfirmationDocument {
    #[serde(rename = "_id")]
    group_id: String,
    main_guest_name: String,
    attendees: Vec<AttendeeEntity>,
    gifts: Vec<MongoGiftSelection>,
    special_companion: Option<AttendeeEntity>,
    all_declined: bool,
    submitted_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoGiftSelection {
    gift_id: String,
    name: String,
    quantity: i64,
}

impl From<ConfirmationEntity> for MongoConfirmationDocument {
    fn from(value: ConfirmationEntity) -> Self {
        Self {
            group_id: value.group_id,
            main_guest_name: value.main_guest_name,
            attendees: value.attendees,
            gifts: value
                .gifts
                .into_iter()
                .map(|gift| MongoGiftSelection {
                    gift_id: gift.gift_id,
                    name: gift.name,
                    quantity: i64::from(gift.quantity),
                })
                .collect(),
            special_companion: value.special_companion,
            all_declined: value.all_declined,
            submitted_at: value.submitted_at.0,
        }
    }
}

impl From<MongoConfirmationDocument> for ConfirmationEntity {
    fn from(value: MongoConfirmationDocument) -> Self {
        Self {
            group_id: value.group_id,
            main_guest_name: value.main_guest_name,
            attendees: value.attendees,
            gifts: value
                .gifts
                .into_iter()
                .map(|gift| GiftSelectionEntity {
                    gift_id: gift.gift_id,
                    name: gift.name,
                    quantity: gift.quantity.max(0) as u32,
                })
                .collect(),
            special_companion: value.special_companion,
            all_declined: value.all_declined,
            submitted_at: EpochMillis(value.submitted_at),
        }
    }
}
