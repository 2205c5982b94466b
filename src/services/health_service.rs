use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping the prediction store and report the overall service status.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let storage_reachable = match state.require_event_store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                false
            }
        },
        Err(_) => {
            warn!("storage unavailable (degraded mode)");
            false
        }
    };

    if !storage_reachable || state.is_degraded().await {
        HealthResponse::degraded(storage_reachable)
    } else {
        HealthResponse::ok()
    }
}
