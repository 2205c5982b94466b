use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

/// Timestamp in milliseconds since the Unix epoch.
///
/// The single timestamp representation used across entities; backends convert
/// to their native type at the storage boundary and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochMillis(pub i64);

impl EpochMillis {
    /// Capture the current wall-clock time.
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        Self((now.unix_timestamp_nanos() / 1_000_000) as i64)
    }
}

/// The two-valued guess a guest can make about the baby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Hypothesis {
    /// Girl.
    XX,
    /// Boy.
    XY,
}

impl std::fmt::Display for Hypothesis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hypothesis::XX => write!(f, "XX"),
            Hypothesis::XY => write!(f, "XY"),
        }
    }
}

/// One of the three mini-games played during the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Minigame {
    /// Particle collider timing game.
    Collider,
    /// Bond equation balancing game.
    Equation,
    /// Molecular synthesis catch game.
    Synthesis,
}

/// Per-game sub-scores plus the derived total.
///
/// `total` is never written directly; it is recomputed from the three
/// sub-scores on every mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GameScores {
    /// Collider score (0-100).
    pub collider: u16,
    /// Equation score (0-100).
    pub equation: u16,
    /// Synthesis score (0-100).
    pub synthesis: u16,
    /// Sum of the three sub-scores (0-300).
    pub total: u16,
}

impl GameScores {
    /// Record a sub-score and recompute the total.
    pub fn record(&mut self, game: Minigame, score: u16) {
        match game {
            Minigame::Collider => self.collider = score,
            Minigame::Equation => self.equation = score,
            Minigame::Synthesis => self.synthesis = score,
        }
        self.total = self.collider + self.equation + self.synthesis;
    }
}

/// Immutable prediction record persisted once a draft is finalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictionEntity {
    /// Session identifier the record is keyed by; retries overwrite in place.
    pub session_id: String,
    /// The guest's guess.
    pub hypothesis: Hypothesis,
    /// Guest display name.
    pub user_name: String,
    /// Name the guest suggests for the baby.
    pub suggested_name: String,
    /// Free-text message for the parents.
    pub message: String,
    /// Mini-game scores at submission time.
    pub scores: GameScores,
    /// Server-assigned submission timestamp.
    pub submitted_at: EpochMillis,
    /// Advisory client fingerprint (User-Agent) for post-hoc duplicate review.
    pub client_fingerprint: Option<String>,
}

/// Running statistics over all submitted predictions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventStats {
    /// Total number of submitted predictions.
    pub total_predictions: i64,
    /// How many guests guessed XX.
    pub xx_count: i64,
    /// How many guests guessed XY.
    pub xy_count: i64,
    /// Distinct suggested names, in arrival order.
    pub top_names: Vec<String>,
    /// Last time the summary was touched.
    #[serde(default = "epoch_zero")]
    pub last_updated: EpochMillis,
}

fn epoch_zero() -> EpochMillis {
    EpochMillis(0)
}

impl Default for EpochMillis {
    fn default() -> Self {
        epoch_zero()
    }
}

/// Singleton event configuration document, including the aggregate summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventConfigEntity {
    /// When the reveal happens; the wizard refuses to start past this point.
    pub reveal_date: EpochMillis,
    /// Whether the result has been revealed.
    pub is_revealed: bool,
    /// The actual result, once revealed.
    pub actual_result: Option<Hypothesis>,
    /// The baby's name, once revealed.
    pub baby_name: Option<String>,
    /// External meeting link shown to guests.
    pub meet_link: String,
    /// Aggregate summary mutated only through [`StatsDelta`] application.
    pub stats: EventStats,
}

/// Incremental statistics update derived from one submitted prediction.
///
/// Backends apply this with atomic increment/append primitives, never by
/// rewriting the whole summary document.
#[derive(Debug, Clone)]
pub struct StatsDelta {
    /// Hypothesis bucket to increment.
    pub hypothesis: Hypothesis,
    /// Suggested name to append to the running list.
    pub suggested_name: String,
}

/// One line item of the shared gift inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GiftStockEntity {
    /// Stable gift identifier.
    pub id: String,
    /// Human readable gift name.
    pub name: String,
    /// Stock ceiling; unique items always have 1.
    pub max_count: u32,
    /// Remaining stock (0 ..= max_count).
    pub current_count: u32,
    /// Unique items behave as taken/available rather than counted.
    pub is_unique: bool,
}

impl GiftStockEntity {
    /// Whether at least one unit remains.
    pub fn is_available(&self) -> bool {
        self.current_count > 0
    }
}

/// A gift pick inside a confirmation: which gift and how many units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GiftSelectionEntity {
    /// Identifier of the selected gift.
    pub gift_id: String,
    /// Gift name snapshot at selection time.
    pub name: String,
    /// Units requested; must be at least 1.
    pub quantity: u32,
}

/// One guest inside a confirmed group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct AttendeeEntity {
    /// Guest name.
    pub name: String,
    /// National identity number used at the venue entrance.
    pub identity_number: String,
    /// Whether this guest attends.
    pub attending: bool,
}

/// Append-only RSVP confirmation record, at most one per invited group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmationEntity {
    /// Invited group this confirmation belongs to; unique across records.
    pub group_id: String,
    /// Main guest of the group.
    pub main_guest_name: String,
    /// Everyone in the group with their attendance flags.
    pub attendees: Vec<AttendeeEntity>,
    /// Gift selections; empty when the group declined.
    pub gifts: Vec<GiftSelectionEntity>,
    /// Optional extra companion outside the invited list.
    pub special_companion: Option<AttendeeEntity>,
    /// True when the whole group declined; consumes the group slot anyway.
    pub all_declined: bool,
    /// Server-assigned confirmation timestamp.
    pub submitted_at: EpochMillis,
}

/// Result of inserting a confirmation under the group uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The record was written and the group slot is now taken.
    Recorded,
    /// Another confirmation already references this group; recoverable.
    AlreadyConfirmed,
}

/// Result of an atomic conditional stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockUpdate {
    /// Every selection was decremented.
    Applied,
    /// A gift ran short; nothing remains decremented.
    Shortfall {
        /// Gift that could not cover the requested quantity.
        gift_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_follows_every_sub_score_write() {
        let mut scores = GameScores::default();

        scores.record(Minigame::Collider, 80);
        assert_eq!(scores.total, 80);

        scores.record(Minigame::Equation, 55);
        assert_eq!(scores.total, 135);

        scores.record(Minigame::Synthesis, 100);
        assert_eq!(scores.total, 235);

        // Overwriting a sub-score recomputes rather than accumulates.
        scores.record(Minigame::Collider, 10);
        assert_eq!(scores.total, 165);
        assert_eq!(
            scores.total,
            scores.collider + scores.equation + scores.synthesis
        );
    }
}
