//! Messaging session auth state backed by a keystash object store
//!
//! Persists long-term credentials under `creds.json` and signal key records
//! under `{category}-{id}.json`, so a client can resume its session after a
//! restart without pairing again.
//!
//! ## Usage
//!
//! ```ignore
//! use keystash_auth::use_object_store_auth_state;
//! use keystash_core::StoreConfig;
//!
//! let config = StoreConfig::new("sessions").with_prefix("alice/");
//! let auth = use_object_store_auth_state(&config).await?;
//!
//! let pre_keys = auth.keys().get("pre-key", &["1".to_string()]).await?;
//! auth.update_creds(|creds| creds.next_pre_key_id += 1).await;
//! auth.save_creds().await?;
//! ```

pub mod creds;
pub mod curve;
pub mod error;
pub mod keys;
pub mod signal;
pub mod state;

pub use creds::{init_auth_creds, AuthenticationCreds, Contact};
pub use curve::{KeyPair, SignedKeyPair};
pub use error::{AuthError, AuthResult};
pub use keys::{record_key, ObjectKeyStore, SignalDataSet, SignalKeyMap, SignalKeyStore};
pub use signal::{AppStateSyncKeyData, SignalDataType, SignalRecord};
pub use state::{use_object_store_auth_state, AuthenticationState, ObjectStoreAuthState, CREDS_KEY};
