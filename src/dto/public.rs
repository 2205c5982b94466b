use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dao::models::{EventConfigEntity, EventStats, Hypothesis, Minigame},
    dto::format_epoch_millis,
    state::state_machine::SessionPhase,
};

/// Read-only event configuration exposed to guests.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventConfigResponse {
    /// Reveal moment as an RFC 3339 timestamp.
    pub reveal_date: String,
    /// Whether the result has been revealed.
    pub is_revealed: bool,
    /// The actual result, present once revealed.
    pub actual_result: Option<Hypothesis>,
    /// The chosen baby name, present once revealed.
    pub baby_name: Option<String>,
    /// Video call link for the remote reveal.
    pub meet_link: String,
    /// Aggregated prediction statistics.
    pub stats: StatsResponse,
}

/// Aggregated statistics with percentages derived on the fly.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Total number of submitted predictions.
    pub total_predictions: i64,
    /// How many guests guessed XX.
    pub xx_count: i64,
    /// How many guests guessed XY.
    pub xy_count: i64,
    /// Share of XX guesses, 0 when nothing was submitted yet.
    pub xx_percent: f64,
    /// Share of XY guesses, 0 when nothing was submitted yet.
    pub xy_percent: f64,
    /// Distinct suggested names, in arrival order.
    pub top_names: Vec<String>,
    /// When the statistics last changed, RFC 3339.
    pub last_updated: String,
}

impl From<EventStats> for StatsResponse {
    fn from(value: EventStats) -> Self {
        let total = value.xx_count + value.xy_count;
        let percent = |count: i64| {
            if total == 0 {
                0.0
            } else {
                (count as f64 / total as f64) * 100.0
            }
        };

        Self {
            total_predictions: value.total_predictions,
            xx_count: value.xx_count,
            xy_count: value.xy_count,
            xx_percent: percent(value.xx_count),
            xy_percent: percent(value.xy_count),
            top_names: value.top_names,
            last_updated: format_epoch_millis(value.last_updated),
        }
    }
}

impl From<EventConfigEntity> for EventConfigResponse {
    fn from(value: EventConfigEntity) -> Self {
        Self {
            reveal_date: format_epoch_millis(value.reveal_date),
            is_revealed: value.is_revealed,
            actual_result: value.actual_result,
            baby_name: value.baby_name,
            meet_link: value.meet_link,
            stats: value.stats.into(),
        }
    }
}

/// Wire representation of the session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PublicSessionPhase {
    /// Landing screen.
    Intro,
    /// Picking the XX/XY hypothesis.
    Hypothesis,
    /// Personal data entry.
    Input,
    /// First mini-game stage.
    Collider,
    /// Second mini-game stage.
    Equation,
    /// Last mini-game stage.
    Synthesis,
    /// Prediction persisted.
    Submitted,
    /// Reveal moment passed before the guest finished.
    PastDeadline,
}

impl From<SessionPhase> for PublicSessionPhase {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::Intro => Self::Intro,
            SessionPhase::Hypothesis => Self::Hypothesis,
            SessionPhase::Input => Self::Input,
            SessionPhase::Minigame(Minigame::Collider) => Self::Collider,
            SessionPhase::Minigame(Minigame::Equation) => Self::Equation,
            SessionPhase::Minigame(Minigame::Synthesis) => Self::Synthesis,
            SessionPhase::Submitted => Self::Submitted,
            SessionPhase::PastDeadline => Self::PastDeadline,
        }
    }
}

/// Phase snapshot returned by the public phase route.
#[derive(Debug, Serialize, ToSchema)]
pub struct PhaseResponse {
    /// Current session phase.
    pub phase: PublicSessionPhase,
    /// Whether the application is running without its storage backend.
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::EpochMillis;

    #[test]
    fn percentages_split_over_decided_guesses() {
        let stats = EventStats {
            total_predictions: 4,
            xx_count: 3,
            xy_count: 1,
            top_names: vec!["Luna".into()],
            last_updated: EpochMillis(0),
        };

        let response: StatsResponse = stats.into();
        assert_eq!(response.xx_percent, 75.0);
        assert_eq!(response.xy_percent, 25.0);
    }

    #[test]
    fn empty_stats_yield_zero_percentages() {
        let response: StatsResponse = EventStats::default().into();
        assert_eq!(response.xx_percent, 0.0);
        assert_eq!(response.xy_percent, 0.0);
    }
}
