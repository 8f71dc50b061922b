//! GameVault backend binary entrypoint wiring configuration, storage and the REST API.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gamevault_back::{
    config::{AppConfig, StoreBackend},
    dao::catalog_store::memory::InMemoryCatalogStore,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let port = config.port;
    let backend = config.store_backend;

    let app_state = AppState::from_config(config);
    start_storage(app_state.clone(), backend).await;

    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, ?backend, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the configured catalog store. MongoDB connects in the background while
/// the API answers 503 in degraded mode.
async fn start_storage(state: SharedState, backend: StoreBackend) {
    match backend {
        StoreBackend::Memory => {
            warn!("using the in-memory catalog store; data is lost on restart");
            state
                .install_catalog_store(Arc::new(InMemoryCatalogStore::new()))
                .await;
        }
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => {
            tokio::spawn(mongo::supervise(state));
        }
        #[cfg(not(feature = "mongo-store"))]
        StoreBackend::Mongo => {
            warn!("built without mongo-store; falling back to the in-memory catalog store");
            state
                .install_catalog_store(Arc::new(InMemoryCatalogStore::new()))
                .await;
        }
    }
}

#[cfg(feature = "mongo-store")]
mod mongo {
    use std::sync::Arc;

    use gamevault_back::{
        dao::{
            catalog_store::{
                CatalogStore,
                mongodb::{MongoCatalogStore, MongoConfig},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
        state::SharedState,
    };

    /// Connect to MongoDB, reconnecting and toggling degraded mode for the lifetime of the process.
    pub async fn supervise(state: SharedState) {
        let uri = state.config().mongo_uri.clone();
        let db_name = state.config().mongo_db.clone();

        storage_supervisor::run(state, move || {
            let uri = uri.clone();
            let db_name = db_name.clone();
            async move {
                let config = MongoConfig::from_uri(&uri, db_name.as_deref()).await?;
                let store = MongoCatalogStore::connect(config).await?;
                Ok::<Arc<dyn CatalogStore>, StorageError>(Arc::new(store))
            }
        })
        .await;
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state).layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
