//! Curve25519 key pairs and XEdDSA signatures
//!
//! Keys are X25519 (Montgomery) keys as used by the Signal protocol. Public
//! keys travel with a one-byte type prefix (`0x05`) when signed or sent to
//! the server. Signatures follow libsignal's XEdDSA variant, which carries
//! the Edwards sign bit in the top bit of the last signature byte.

use crate::error::{AuthError, AuthResult};
use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::Scalar;
use keystash_store::{Buffer, Value};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::collections::BTreeMap;

/// Length of private and raw public keys
pub const KEY_LENGTH: usize = 32;

/// Length of an XEdDSA signature
pub const SIGNATURE_LENGTH: usize = 64;

/// Type prefix of a serialized Curve25519 public key
pub const KEY_TYPE_DJB: u8 = 0x05;

/// First hash input of the nonce derivation: 0xFE followed by 31 0xFF bytes
const NONCE_HASH_PREFIX: [u8; 32] = {
    let mut prefix = [0xFFu8; 32];
    prefix[0] = 0xFE;
    prefix
};

/// A Curve25519 key pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public: Buffer,
    pub private: Buffer,
    /// Stored fields not modelled above
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl KeyPair {
    /// Generate a fresh key pair from the thread RNG
    pub fn generate() -> Self {
        Self::from_private(generate_private_key())
    }

    /// Derive the key pair for a private key. The key is clamped first.
    pub fn from_private(private: [u8; KEY_LENGTH]) -> Self {
        let private = clamp(private);
        Self {
            public: Buffer::from(public_key(&private)),
            private: Buffer::from(private),
            extra: BTreeMap::new(),
        }
    }

    /// Private key as a fixed-size array
    pub fn private_key(&self) -> AuthResult<[u8; KEY_LENGTH]> {
        to_key_array(&self.private, "private")
    }

    /// Public key with the `0x05` type prefix
    pub fn signal_public_key(&self) -> Vec<u8> {
        signal_pub_key(&self.public)
    }
}

/// A pre-key signed by the identity key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedKeyPair {
    pub key_pair: KeyPair,
    pub signature: Buffer,
    pub key_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_s: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SignedKeyPair {
    /// Check the signature against an identity public key
    pub fn verify(&self, identity_public: &[u8]) -> bool {
        verify(
            identity_public,
            &self.key_pair.signal_public_key(),
            &self.signature,
        )
    }
}

/// Random clamped private key
pub fn generate_private_key() -> [u8; KEY_LENGTH] {
    let mut bytes = [0u8; KEY_LENGTH];
    rand::rng().fill_bytes(&mut bytes);
    clamp(bytes)
}

fn clamp(mut bytes: [u8; KEY_LENGTH]) -> [u8; KEY_LENGTH] {
    bytes[0] &= 248;
    bytes[31] &= 127;
    bytes[31] |= 64;
    bytes
}

fn public_key(private: &[u8; KEY_LENGTH]) -> [u8; KEY_LENGTH] {
    EdwardsPoint::mul_base(&Scalar::from_bytes_mod_order(*private))
        .to_montgomery()
        .to_bytes()
}

fn to_key_array(bytes: &[u8], what: &str) -> AuthResult<[u8; KEY_LENGTH]> {
    bytes.try_into().map_err(|_| {
        AuthError::invalid_key(format!(
            "{} key must be {} bytes, got {}",
            what,
            KEY_LENGTH,
            bytes.len()
        ))
    })
}

/// Prefix a raw 32-byte public key with its type byte
///
/// Keys that already carry the prefix are returned unchanged.
pub fn signal_pub_key(public: &[u8]) -> Vec<u8> {
    if public.len() == KEY_LENGTH + 1 {
        return public.to_vec();
    }
    let mut prefixed = Vec::with_capacity(KEY_LENGTH + 1);
    prefixed.push(KEY_TYPE_DJB);
    prefixed.extend_from_slice(public);
    prefixed
}

fn strip_key_prefix(public: &[u8]) -> Option<[u8; KEY_LENGTH]> {
    match public.len() {
        KEY_LENGTH => public.try_into().ok(),
        33 if public[0] == KEY_TYPE_DJB => public[1..].try_into().ok(),
        _ => None,
    }
}

fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    Scalar::from_bytes_mod_order_wide(&wide)
}

fn sign_with(private: &[u8; KEY_LENGTH], message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
    let mut random = [0u8; 64];
    rand::rng().fill_bytes(&mut random);

    let a = Scalar::from_bytes_mod_order(*private);
    let ed_public = EdwardsPoint::mul_base(&a).compress();
    let sign_bit = ed_public.as_bytes()[31] & 0b1000_0000;

    let r = hash_to_scalar(&[&NONCE_HASH_PREFIX[..], &private[..], message, &random[..]]);
    let cap_r = EdwardsPoint::mul_base(&r).compress();
    let h = hash_to_scalar(&[&cap_r.as_bytes()[..], &ed_public.as_bytes()[..], message]);
    let s = h * a + r;

    let mut signature = [0u8; SIGNATURE_LENGTH];
    signature[..32].copy_from_slice(cap_r.as_bytes());
    signature[32..].copy_from_slice(s.as_bytes());
    signature[SIGNATURE_LENGTH - 1] &= 0b0111_1111;
    signature[SIGNATURE_LENGTH - 1] |= sign_bit;
    signature
}

/// Sign `message` with a Curve25519 private key
pub fn sign(private: &[u8], message: &[u8]) -> AuthResult<[u8; SIGNATURE_LENGTH]> {
    let private = to_key_array(private, "private")?;
    Ok(sign_with(&private, message))
}

/// Verify an XEdDSA signature. Accepts public keys with or without prefix.
pub fn verify(public: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Some(public) = strip_key_prefix(public) else {
        return false;
    };
    if signature.len() != SIGNATURE_LENGTH {
        return false;
    }

    let sign_bit = (signature[SIGNATURE_LENGTH - 1] & 0b1000_0000) >> 7;
    let Some(ed_public) = MontgomeryPoint(public).to_edwards(sign_bit) else {
        return false;
    };
    let cap_a = ed_public.compress();

    let mut cap_r = [0u8; 32];
    cap_r.copy_from_slice(&signature[..32]);
    let mut s = [0u8; 32];
    s.copy_from_slice(&signature[32..]);
    s[31] &= 0b0111_1111;
    if s[31] & 0b1110_0000 != 0 {
        return false;
    }

    let h = hash_to_scalar(&[&cap_r[..], &cap_a.as_bytes()[..], message]);
    let check = EdwardsPoint::vartime_double_scalar_mul_basepoint(
        &h,
        &(-ed_public),
        &Scalar::from_bytes_mod_order(s),
    )
    .compress();

    check.as_bytes() == &cap_r
}

/// Generate a pre-key and sign its prefixed public key with `identity`
pub fn signed_key_pair(identity: &KeyPair, key_id: u32) -> AuthResult<SignedKeyPair> {
    let identity_private = identity.private_key()?;
    Ok(sign_pre_key(&identity_private, key_id))
}

pub(crate) fn sign_pre_key(identity_private: &[u8; KEY_LENGTH], key_id: u32) -> SignedKeyPair {
    let key_pair = KeyPair::generate();
    let signature = sign_with(identity_private, &key_pair.signal_public_key());
    SignedKeyPair {
        key_pair,
        signature: Buffer::from(signature),
        key_id,
        timestamp_s: None,
        extra: BTreeMap::new(),
    }
}
