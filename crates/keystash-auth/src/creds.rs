//! Long-term authentication credentials
//!
//! Stored as one JSON object under `creds.json`. Field names follow the
//! messaging library's camelCase layout so the object is interchangeable
//! with the file-based store. Fields this crate does not model, at the top
//! level or inside a nested record, land in that record's `extra` map and are
//! written back unchanged.

use crate::curve::{self, KeyPair, SignedKeyPair};
use keystash_store::{Buffer, Value};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Registration ids are 14-bit
const REGISTRATION_ID_MASK: u16 = 0x3FFF;

/// Key id of the signed pre-key created with fresh credentials
const INITIAL_SIGNED_PRE_KEY_ID: u32 = 1;

/// Length of the random ADV secret before base64 encoding
const ADV_SECRET_LENGTH: usize = 32;

/// An account or contact identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Address of a signal session peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolAddress {
    pub name: String,
    pub device_id: u32,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A trusted identity key for a peer address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalIdentity {
    pub identifier: ProtocolAddress,
    pub identifier_key: Buffer,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSettings {
    pub unarchive_chats: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_disappearing_mode: Option<DisappearingMode>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisappearingMode {
    pub ephemeral_expiration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_setting_timestamp: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Credentials needed to re-attach to a messaging session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationCreds {
    pub noise_key: KeyPair,
    pub pairing_ephemeral_key_pair: KeyPair,
    pub signed_identity_key: KeyPair,
    pub signed_pre_key: SignedKeyPair,
    pub registration_id: u16,
    pub adv_secret_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub me: Option<Contact>,
    /// Signed device identity, kept in its stored form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_identities: Option<Vec<SignalIdentity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_app_state_key_id: Option<String>,

    pub first_unuploaded_pre_key_id: u32,
    pub next_pre_key_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_account_sync_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default)]
    pub processed_history_messages: Vec<Value>,
    pub account_sync_counter: u32,
    #[serde(default)]
    pub account_settings: AccountSettings,
    #[serde(default)]
    pub registered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_prop_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_info: Option<Buffer>,

    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AuthenticationCreds {
    /// Whether the session has completed pairing
    pub fn is_paired(&self) -> bool {
        self.me.is_some()
    }

    /// Number of pre-keys generated but not yet uploaded
    pub fn pending_pre_keys(&self) -> u32 {
        self.next_pre_key_id
            .saturating_sub(self.first_unuploaded_pre_key_id)
    }
}

/// Create fresh, unregistered credentials
///
/// Generates new noise, pairing and identity key pairs, a signed pre-key
/// (id 1) signed by the identity key, a 14-bit registration id and a random
/// ADV secret.
pub fn init_auth_creds() -> AuthenticationCreds {
    let identity_private = curve::generate_private_key();
    let identity_key = KeyPair::from_private(identity_private);
    let signed_pre_key = curve::sign_pre_key(&identity_private, INITIAL_SIGNED_PRE_KEY_ID);

    let mut rng = rand::rng();
    let mut id_bytes = [0u8; 2];
    rng.fill_bytes(&mut id_bytes);
    let registration_id = u16::from_be_bytes(id_bytes) & REGISTRATION_ID_MASK;

    let mut adv_secret = [0u8; ADV_SECRET_LENGTH];
    rng.fill_bytes(&mut adv_secret);

    debug!("Generated credentials with registration id {}", registration_id);

    AuthenticationCreds {
        noise_key: KeyPair::generate(),
        pairing_ephemeral_key_pair: KeyPair::generate(),
        signed_pre_key,
        signed_identity_key: identity_key,
        registration_id,
        adv_secret_key: Buffer::from(adv_secret).to_base64(),
        me: None,
        account: None,
        signal_identities: None,
        my_app_state_key_id: None,
        first_unuploaded_pre_key_id: 1,
        next_pre_key_id: 1,
        last_account_sync_timestamp: None,
        platform: None,
        processed_history_messages: Vec::new(),
        account_sync_counter: 0,
        account_settings: AccountSettings::default(),
        registered: false,
        pairing_code: None,
        last_prop_hash: None,
        routing_info: None,
        extra: BTreeMap::new(),
    }
}
