use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::Minigame;

/// High-level phases a guest session moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Landing screen; nothing has been chosen yet.
    Intro,
    /// The guest is picking their XX/XY hypothesis.
    Hypothesis,
    /// Personal data entry (name, suggested name, message).
    Input,
    /// Working through one of the three minigame stages.
    Minigame(Minigame),
    /// Prediction has been persisted; the session is terminal.
    Submitted,
    /// The reveal deadline passed before the guest finished.
    PastDeadline,
}

/// Events that can be applied to the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Guest leaves the landing screen.
    Begin,
    /// The reveal moment arrived while the session was still open.
    DeadlineReached,
    /// A hypothesis was picked.
    HypothesisChosen,
    /// Personal data passed validation.
    InputCompleted,
    /// Guest went back to change their hypothesis.
    BackToHypothesis,
    /// One of the minigame stages finished with a recorded score.
    StageCleared(Minigame),
    /// The prediction was persisted remotely.
    PredictionSubmitted,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// State machine phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when plan was created.
        expected: SessionPhase,
        /// Current phase.
        actual: SessionPhase,
    },
    /// State machine version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A planned state machine transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the state machine is currently in.
    pub from: SessionPhase,
    /// Phase the state machine will transition to.
    pub to: SessionPhase,
    /// Event that triggered this transition.
    pub event: SessionEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: SessionPhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
    /// Pending transition phase, if a transition is planned but not yet applied.
    pub pending: Option<SessionPhase>,
}

/// State machine driving the guest flow from intro to submission.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Intro,
            version: 0,
            pending: None,
        }
    }
}

impl SessionStateMachine {
    /// Create a new state machine initialised on the intro screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Reset to the intro screen, e.g. after a saved draft was restored.
    /// Clears any pending plan so a stuck transition cannot wedge the flow.
    pub fn reopen(&mut self) {
        self.phase = SessionPhase::Intro;
        self.version += 1;
        self.pending = None;
    }

    /// Plan a transition by validating that the event can be applied from the current phase.
    /// Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, event: SessionEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the state machine to the next phase.
    /// Returns the new phase after the transition.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<SessionPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        self.pending = None;

        Ok(self.phase)
    }

    /// Abort a planned transition without applying it, returning the state machine to its previous state.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (SessionPhase::Intro, SessionEvent::Begin) => SessionPhase::Hypothesis,
            (
                SessionPhase::Intro | SessionPhase::Hypothesis | SessionPhase::Input,
                SessionEvent::DeadlineReached,
            ) => SessionPhase::PastDeadline,
            (SessionPhase::Hypothesis, SessionEvent::HypothesisChosen) => SessionPhase::Input,
            (SessionPhase::Input, SessionEvent::BackToHypothesis) => SessionPhase::Hypothesis,
            (SessionPhase::Input, SessionEvent::InputCompleted) => {
                SessionPhase::Minigame(Minigame::Collider)
            }
            (
                SessionPhase::Minigame(Minigame::Collider),
                SessionEvent::StageCleared(Minigame::Collider),
            ) => SessionPhase::Minigame(Minigame::Equation),
            (
                SessionPhase::Minigame(Minigame::Equation),
                SessionEvent::StageCleared(Minigame::Equation),
            ) => SessionPhase::Minigame(Minigame::Synthesis),
            (SessionPhase::Minigame(Minigame::Synthesis), SessionEvent::PredictionSubmitted) => {
                SessionPhase::Submitted
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut SessionStateMachine, event: SessionEvent) -> SessionPhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn initial_state_is_intro() {
        let sm = SessionStateMachine::new();
        assert_eq!(sm.phase(), SessionPhase::Intro);
    }

    #[test]
    fn full_happy_path_through_session() {
        let mut sm = SessionStateMachine::new();

        assert_eq!(apply(&mut sm, SessionEvent::Begin), SessionPhase::Hypothesis);
        assert_eq!(
            apply(&mut sm, SessionEvent::HypothesisChosen),
            SessionPhase::Input
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::InputCompleted),
            SessionPhase::Minigame(Minigame::Collider)
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::StageCleared(Minigame::Collider)),
            SessionPhase::Minigame(Minigame::Equation)
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::StageCleared(Minigame::Equation)),
            SessionPhase::Minigame(Minigame::Synthesis)
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::PredictionSubmitted),
            SessionPhase::Submitted
        );
    }

    #[test]
    fn going_back_returns_to_hypothesis() {
        let mut sm = SessionStateMachine::new();
        apply(&mut sm, SessionEvent::Begin);
        apply(&mut sm, SessionEvent::HypothesisChosen);

        assert_eq!(
            apply(&mut sm, SessionEvent::BackToHypothesis),
            SessionPhase::Hypothesis
        );
    }

    #[test]
    fn deadline_closes_open_phases_only() {
        let mut sm = SessionStateMachine::new();
        assert_eq!(
            apply(&mut sm, SessionEvent::DeadlineReached),
            SessionPhase::PastDeadline
        );

        let mut sm = SessionStateMachine::new();
        apply(&mut sm, SessionEvent::Begin);
        apply(&mut sm, SessionEvent::HypothesisChosen);
        apply(&mut sm, SessionEvent::InputCompleted);

        let err = sm.plan(SessionEvent::DeadlineReached).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, SessionPhase::Minigame(Minigame::Collider));
                assert_eq!(invalid.event, SessionEvent::DeadlineReached);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn stages_cannot_be_skipped() {
        let mut sm = SessionStateMachine::new();
        apply(&mut sm, SessionEvent::Begin);
        apply(&mut sm, SessionEvent::HypothesisChosen);
        apply(&mut sm, SessionEvent::InputCompleted);

        let err = sm
            .plan(SessionEvent::StageCleared(Minigame::Synthesis))
            .unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, SessionPhase::Minigame(Minigame::Collider));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn submission_only_allowed_from_last_stage() {
        let mut sm = SessionStateMachine::new();
        apply(&mut sm, SessionEvent::Begin);
        apply(&mut sm, SessionEvent::HypothesisChosen);

        let err = sm.plan(SessionEvent::PredictionSubmitted).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, SessionPhase::Input);
                assert_eq!(invalid.event, SessionEvent::PredictionSubmitted);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn submitted_is_terminal() {
        let mut sm = SessionStateMachine::new();
        apply(&mut sm, SessionEvent::Begin);
        apply(&mut sm, SessionEvent::HypothesisChosen);
        apply(&mut sm, SessionEvent::InputCompleted);
        apply(&mut sm, SessionEvent::StageCleared(Minigame::Collider));
        apply(&mut sm, SessionEvent::StageCleared(Minigame::Equation));
        apply(&mut sm, SessionEvent::PredictionSubmitted);

        assert!(sm.plan(SessionEvent::Begin).is_err());
        assert!(sm.plan(SessionEvent::DeadlineReached).is_err());
    }

    #[test]
    fn reopen_resets_to_intro_and_clears_pending() {
        let mut sm = SessionStateMachine::new();
        apply(&mut sm, SessionEvent::Begin);
        let _plan = sm.plan(SessionEvent::HypothesisChosen).unwrap();

        sm.reopen();
        assert_eq!(sm.phase(), SessionPhase::Intro);
        assert!(sm.pending.is_none());
        assert_eq!(apply(&mut sm, SessionEvent::Begin), SessionPhase::Hypothesis);
    }

    #[test]
    fn abort_clears_pending() {
        let mut sm = SessionStateMachine::new();
        let plan = sm.plan(SessionEvent::Begin).unwrap();
        sm.abort(plan.id).unwrap();
        assert!(sm.pending.is_none());
    }

    #[test]
    fn plan_while_pending_is_rejected() {
        let mut sm = SessionStateMachine::new();
        let _plan = sm.plan(SessionEvent::Begin).unwrap();
        assert_eq!(
            sm.plan(SessionEvent::DeadlineReached).unwrap_err(),
            PlanError::AlreadyPending
        );
    }
}
