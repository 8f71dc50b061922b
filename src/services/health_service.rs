use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report `ok` or `degraded`, pinging the store and logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_catalog_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    if state.is_degraded().await {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState, state::test_support::memory_state};

    #[tokio::test]
    async fn reports_ok_with_store_and_degraded_without() {
        let (ready, _store) = memory_state().await;
        assert_eq!(health_status(&ready).await.status, "ok");

        let degraded = AppState::from_config(AppConfig::default());
        assert_eq!(health_status(&degraded).await.status, "degraded");
    }
}
