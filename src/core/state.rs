use std::sync::Arc;

use crate::auth::credentials::CredentialStore;
use crate::auth::guard::AuthGuard;
use crate::auth::token::TokenService;
use crate::config::ServerConfig;
use crate::storage::revocation::{create_memory_revocation_store, SharedRevocationStore};
use crate::storage::traits::SharedStorage;

/// Shared application state, constructed once at startup
///
/// The signing key and token TTL live in the config and are read-only for
/// the process lifetime. Cloning the state is cheap; every field is
/// reference counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub tokens: Arc<TokenService>,
    pub credentials: Arc<CredentialStore>,
    pub guard: Arc<AuthGuard>,
    pub storage: SharedStorage,
}

impl AppState {
    /// Build the state with an in-memory revocation set
    pub fn new(config: ServerConfig, storage: SharedStorage) -> Self {
        Self::with_revocation_store(config, storage, create_memory_revocation_store())
    }

    /// Build the state with an injected revocation store
    ///
    /// Multi-instance deployments should pass a store backed by shared
    /// infrastructure here; the default in-memory set is per-process and
    /// empties on restart.
    pub fn with_revocation_store(
        config: ServerConfig,
        storage: SharedStorage,
        revocations: SharedRevocationStore,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(
            &config.token_secret,
            config.token_ttl_secs,
            revocations,
        ));
        let credentials = Arc::new(CredentialStore::new(Arc::clone(&storage)));
        let guard = Arc::new(AuthGuard::new(Arc::clone(&tokens), Arc::clone(&storage)));

        Self {
            config: Arc::new(config),
            tokens,
            credentials,
            guard,
            storage,
        }
    }
}
