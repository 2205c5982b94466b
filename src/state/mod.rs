pub mod state_machine;

use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::{draft::DraftStore, event_store::EventStore},
    error::ServiceError,
    services::rate_limit::RateLimiter,
    state::state_machine::SessionPhase,
};

pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
use self::state_machine::{SessionEvent, SessionStateMachine};

pub type SharedState = Arc<AppState>;
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Central application state storing the session flow and database handles.
pub struct AppState {
    event_store: RwLock<Option<Arc<dyn EventStore>>>,
    drafts: DraftStore,
    limiter: RateLimiter,
    config: AppConfig,
    session: RwLock<SessionStateMachine>,
    degraded: watch::Sender<bool>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, drafts: DraftStore) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            event_store: RwLock::new(None),
            drafts,
            limiter: RateLimiter::new(),
            config,
            session: RwLock::new(SessionStateMachine::new()),
            degraded: degraded_tx,
            transition_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Obtain a handle to the current event store, if one is installed.
    pub async fn event_store(&self) -> Option<Arc<dyn EventStore>> {
        let guard = self.event_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the event store or fail with a degraded-mode error.
    pub async fn require_event_store(&self) -> Result<Arc<dyn EventStore>, ServiceError> {
        self.event_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new event store implementation and leave degraded mode.
    pub async fn install_event_store(&self, store: Arc<dyn EventStore>) {
        {
            let mut guard = self.event_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current event store and enter degraded mode.
    pub async fn clear_event_store(&self) {
        {
            let mut guard = self.event_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Local draft storage for the in-flight prediction.
    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    /// Shared call rate governor.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Snapshot the current phase of the shared session state machine.
    pub async fn session_phase(&self) -> SessionPhase {
        self.session.read().await.phase()
    }

    /// Reset the session flow to the intro screen without touching the draft.
    pub async fn reopen_session(&self) {
        let mut sm = self.session.write().await;
        sm.reopen();
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub(crate) async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Plan a transition on the shared session state machine, returning the plan.
    async fn plan_transition(&self, event: SessionEvent) -> Result<Plan, PlanError> {
        let mut sm = self.session.write().await;
        sm.plan(event)
    }

    /// Apply the planned transition to the shared session state machine, returning the next phase.
    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<SessionPhase, ApplyError> {
        let mut sm = self.session.write().await;
        sm.apply(plan_id)
    }

    /// Abort a planned transition of the shared session state machine.
    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut sm = self.session.write().await;
        sm.abort(plan_id)
    }

    /// Snapshot the session state machine's phase, version, and pending plan.
    pub async fn snapshot(&self) -> Snapshot {
        let sm = self.session.read().await;
        sm.snapshot()
    }

    /// Run `work` inside a planned phase transition: plan, execute with a
    /// timeout, then apply on success or abort on failure or timeout.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: SessionEvent,
        work: F,
    ) -> Result<(T, SessionPhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(event).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(plan_id).await {
                        warn!(
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}
