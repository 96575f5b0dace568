//! Authentication state handle
//!
//! Credentials are read once when the handle is opened and kept in memory.
//! Changes are persisted only when [`ObjectStoreAuthState::save_creds`] is
//! called. Signal keys are not cached.

use crate::creds::{init_auth_creds, AuthenticationCreds};
use crate::error::AuthResult;
use crate::keys::{ObjectKeyStore, SignalKeyStore};
use keystash_core::StoreConfig;
use keystash_store::KeyedObjectStore;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Logical key of the credentials record
pub const CREDS_KEY: &str = "creds.json";

/// Credentials and key store as handed to the messaging client
#[derive(Clone)]
pub struct AuthenticationState {
    pub creds: Arc<RwLock<AuthenticationCreds>>,
    pub keys: Arc<dyn SignalKeyStore>,
}

impl std::fmt::Debug for AuthenticationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationState").finish_non_exhaustive()
    }
}

/// Auth state persisted in a keyed object store
#[derive(Debug, Clone)]
pub struct ObjectStoreAuthState {
    pub state: AuthenticationState,
    store: Arc<KeyedObjectStore>,
}

impl ObjectStoreAuthState {
    /// Load credentials from `store`, creating fresh ones if none are stored
    ///
    /// Fresh credentials are not saved until [`Self::save_creds`] is called.
    pub async fn open(store: Arc<KeyedObjectStore>) -> AuthResult<Self> {
        let creds = match store.read::<AuthenticationCreds>(CREDS_KEY).await? {
            Some(creds) => {
                debug!(
                    "Loaded credentials from {} (registration id {})",
                    store.object_key(CREDS_KEY),
                    creds.registration_id
                );
                creds
            }
            None => {
                let creds = init_auth_creds();
                info!(
                    "No stored credentials at {}, created new ones (registration id {})",
                    store.object_key(CREDS_KEY),
                    creds.registration_id
                );
                creds
            }
        };

        Ok(Self::with_creds(store, creds))
    }

    /// Wrap credentials the caller already holds
    pub fn with_creds(store: Arc<KeyedObjectStore>, creds: AuthenticationCreds) -> Self {
        let keys: Arc<dyn SignalKeyStore> = Arc::new(ObjectKeyStore::new(Arc::clone(&store)));

        Self {
            state: AuthenticationState {
                creds: Arc::new(RwLock::new(creds)),
                keys,
            },
            store,
        }
    }

    /// Write the in-memory credentials to `creds.json`
    pub async fn save_creds(&self) -> AuthResult<()> {
        let creds = self.state.creds.read().await;
        self.store.write(&*creds, CREDS_KEY).await?;
        info!("Saved credentials to {}", self.store.object_key(CREDS_KEY));
        Ok(())
    }

    /// Snapshot of the in-memory credentials
    pub async fn creds(&self) -> AuthenticationCreds {
        self.state.creds.read().await.clone()
    }

    /// Modify the in-memory credentials. Does not save.
    pub async fn update_creds<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut AuthenticationCreds) -> R,
    {
        let mut creds = self.state.creds.write().await;
        f(&mut creds)
    }

    pub fn keys(&self) -> &Arc<dyn SignalKeyStore> {
        &self.state.keys
    }

    pub fn store(&self) -> &Arc<KeyedObjectStore> {
        &self.store
    }
}

/// Connect to the bucket in `config` and open the auth state stored there
pub async fn use_object_store_auth_state(config: &StoreConfig) -> AuthResult<ObjectStoreAuthState> {
    let store = KeyedObjectStore::connect(config).await?;
    ObjectStoreAuthState::open(Arc::new(store)).await
}
