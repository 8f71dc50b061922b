use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{catalog_store::CatalogStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

fn next_delay(delay: Duration) -> Duration {
    (delay * 2).min(MAX_DELAY)
}

/// Keep a catalog store installed in the shared state, toggling degraded mode while it is unreachable.
///
/// Runs forever: connects with exponential backoff, then polls the store health and
/// reconnects on failure, falling back to a fresh `connect` once reconnects are exhausted.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn CatalogStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_catalog_store(store.clone()).await;
                info!("catalog store connected; leaving degraded mode");
                delay = INITIAL_DELAY;

                watch_health(&state, store.as_ref()).await;
                warn!("catalog store lost; establishing a new connection");
            }
            Err(err) => {
                warn!(error = %err, retry_in = ?delay, "catalog store connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = next_delay(delay);
    }
}

/// Poll the store until it stays unreachable after [`MAX_RECONNECT_ATTEMPTS`] reconnects.
async fn watch_health(state: &SharedState, store: &dyn CatalogStore) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded().await {
                info!("catalog store healthy again; leaving degraded mode");
                state.update_degraded(false).await;
            }
        } else if !reconnect(state, store).await {
            warn!("exhausted catalog store reconnect attempts; staying in degraded mode");
            return;
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// Retry the store's own reconnect. Degraded mode starts with the first failed attempt.
async fn reconnect(state: &SharedState, store: &dyn CatalogStore) -> bool {
    let mut delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "catalog store reconnected after failed health check");
                state.update_degraded(false).await;
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(attempt, error = %err, "catalog store reconnect failed; entering degraded mode");
                    state.update_degraded(true).await;
                } else {
                    warn!(attempt, error = %err, "catalog store reconnect failed");
                }
                sleep(delay).await;
                delay = next_delay(delay);
            }
        }
    }

    false
}
