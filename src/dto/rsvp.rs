use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{
        AttendeeEntity, ConfirmationEntity, ConfirmationOutcome, EpochMillis, GiftSelectionEntity,
        GiftStockEntity,
    },
    dto::validation::{validate_identity_number, validate_person_name},
};

/// One gift entry of the stock listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct GiftStockItem {
    /// Stable gift identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Total units planned.
    pub max_count: u32,
    /// Units still unclaimed.
    pub current_count: u32,
    /// Whether at most one group may claim it.
    pub is_unique: bool,
    /// Derived availability flag.
    pub available: bool,
}

impl From<GiftStockEntity> for GiftStockItem {
    fn from(value: GiftStockEntity) -> Self {
        let available = value.is_available();
        Self {
            id: value.id,
            name: value.name,
            max_count: value.max_count,
            current_count: value.current_count,
            is_unique: value.is_unique,
            available,
        }
    }
}

/// One selected gift inside an availability check or confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GiftSelectionRequest {
    /// Gift identifier from the stock listing.
    #[validate(length(min = 1, max = 64))]
    pub gift_id: String,
    /// Display name, echoed back on the confirmation.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// How many units the group wants to bring.
    #[validate(range(min = 1, max = 99))]
    pub quantity: u32,
}

impl From<GiftSelectionRequest> for GiftSelectionEntity {
    fn from(value: GiftSelectionRequest) -> Self {
        Self {
            gift_id: value.gift_id,
            name: value.name,
            quantity: value.quantity,
        }
    }
}

/// Advisory pre-check of a gift selection.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AvailabilityRequest {
    /// Gifts the group intends to claim.
    #[validate(nested, length(min = 1))]
    pub gifts: Vec<GiftSelectionRequest>,
}

/// Outcome of the advisory availability check.
#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    /// Whether every selected gift currently has enough stock.
    pub available: bool,
    /// Identifiers of gifts with insufficient stock.
    pub unavailable: Vec<String>,
}

/// One person of the confirming group.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AttendeeRequest {
    /// Full name.
    #[validate(
        length(min = 2, max = 50),
        custom(function = validate_person_name)
    )]
    pub name: String,
    /// National identity number.
    #[validate(custom(function = validate_identity_number))]
    pub identity_number: String,
    /// Whether this person will attend.
    pub attending: bool,
}

impl From<AttendeeRequest> for AttendeeEntity {
    fn from(value: AttendeeRequest) -> Self {
        Self {
            name: value.name,
            identity_number: value.identity_number,
            attending: value.attending,
        }
    }
}

/// Full confirmation of an invited group.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ConfirmationRequest {
    /// Identifier of the invited group.
    #[validate(length(min = 3, max = 64))]
    pub group_id: String,
    /// Name of the person answering for the group.
    #[validate(
        length(min = 2, max = 50),
        custom(function = validate_person_name)
    )]
    pub main_guest_name: String,
    /// Everyone covered by the invitation.
    #[validate(nested, length(min = 1))]
    pub attendees: Vec<AttendeeRequest>,
    /// Gifts the group commits to bring; must be empty when declining.
    #[validate(nested)]
    pub gifts: Vec<GiftSelectionRequest>,
    /// Optional extra companion outside the invitation.
    #[validate(nested)]
    pub special_companion: Option<AttendeeRequest>,
    /// Whether the whole group declined.
    pub all_declined: bool,
}

impl From<ConfirmationRequest> for ConfirmationEntity {
    fn from(value: ConfirmationRequest) -> Self {
        Self {
            group_id: value.group_id,
            main_guest_name: value.main_guest_name,
            attendees: value.attendees.into_iter().map(Into::into).collect(),
            gifts: value.gifts.into_iter().map(Into::into).collect(),
            special_companion: value.special_companion.map(Into::into),
            all_declined: value.all_declined,
            submitted_at: EpochMillis::default(),
        }
    }
}

/// Wire status of a confirmation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    /// The confirmation was stored and stock was allocated.
    Recorded,
    /// The group had already confirmed; nothing changed.
    AlreadyConfirmed,
}

impl From<ConfirmationOutcome> for ConfirmationStatus {
    fn from(value: ConfirmationOutcome) -> Self {
        match value {
            ConfirmationOutcome::Recorded => Self::Recorded,
            ConfirmationOutcome::AlreadyConfirmed => Self::AlreadyConfirmed,
        }
    }
}

/// Result of submitting a confirmation.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmationResponse {
    /// What happened to the submission.
    pub status: ConfirmationStatus,
    /// Echo of the group identifier.
    pub group_id: String,
}

/// Whether a group already confirmed.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmedResponse {
    /// True when a confirmation exists for the group.
    pub confirmed: bool,
}
