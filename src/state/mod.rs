pub mod locks;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::catalog_store::CatalogStore,
    error::ServiceError,
    services::auth::{Argon2Credentials, CredentialService, JwtTokenService, TokenService},
};

pub use self::locks::{EntityLockGuard, EntityLocks, LockScope};

/// Handle to the application state shared by every handler.
pub type SharedState = Arc<AppState>;

/// Central application state storing the database handle and shared collaborators.
pub struct AppState {
    catalog_store: RwLock<Option<Arc<dyn CatalogStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    credentials: Arc<dyn CredentialService>,
    tokens: Arc<dyn TokenService>,
    locks: EntityLocks,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(
        config: AppConfig,
        credentials: Arc<dyn CredentialService>,
        tokens: Arc<dyn TokenService>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            catalog_store: RwLock::new(None),
            degraded: degraded_tx,
            config,
            credentials,
            tokens,
            locks: EntityLocks::new(),
        })
    }

    /// Build the state with Argon2 credentials and JWT session tokens derived from `config`.
    pub fn from_config(config: AppConfig) -> SharedState {
        let tokens = JwtTokenService::new(&config.jwt_secret, config.token_ttl);
        Self::new(config, Arc::new(Argon2Credentials), Arc::new(tokens))
    }

    /// Obtain a handle to the current catalog store, if one is installed.
    pub async fn catalog_store(&self) -> Option<Arc<dyn CatalogStore>> {
        let guard = self.catalog_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the catalog store or fail with [`ServiceError::Degraded`].
    pub async fn require_catalog_store(&self) -> Result<Arc<dyn CatalogStore>, ServiceError> {
        self.catalog_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new catalog store implementation and leave degraded mode.
    pub async fn install_catalog_store(&self, store: Arc<dyn CatalogStore>) {
        {
            let mut guard = self.catalog_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Configuration the process was started with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Password hashing collaborator.
    pub fn credentials(&self) -> &dyn CredentialService {
        self.credentials.as_ref()
    }

    /// Session token issuer.
    pub fn tokens(&self) -> &dyn TokenService {
        self.tokens.as_ref()
    }

    /// Per-record locks used by the read-modify-write services.
    pub fn locks(&self) -> &EntityLocks {
        &self.locks
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = AppState::from_config(AppConfig::default());
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_catalog_store().await,
            Err(ServiceError::Degraded)
        ));

        let (ready, _store) = test_support::memory_state().await;
        assert!(!ready.is_degraded().await);
        assert!(ready.require_catalog_store().await.is_ok());
    }

    #[tokio::test]
    async fn degraded_watcher_sees_changes() {
        let (state, _store) = test_support::memory_state().await;
        let mut watcher = state.degraded_watcher();
        state.update_degraded(true).await;
        watcher.changed().await.unwrap();
        assert!(*watcher.borrow());
    }
}
