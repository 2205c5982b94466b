use serde::Serialize;
use utoipa::ToSchema;

/// Overall service status as reported by `/healthcheck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// The prediction store is reachable and all features are available.
    Ok,
    /// Running without the prediction store; only the local draft flow works.
    Degraded,
}

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: ServiceStatus,
    /// Whether the prediction store answered the last ping.
    pub storage_reachable: bool,
}

impl HealthResponse {
    /// The store answered its ping and nothing is degraded.
    pub fn ok() -> Self {
        Self {
            status: ServiceStatus::Ok,
            storage_reachable: true,
        }
    }

    /// Running in degraded mode, with the outcome of the last store ping.
    pub fn degraded(storage_reachable: bool) -> Self {
        Self {
            status: ServiceStatus::Degraded,
            storage_reachable,
        }
    }
}
