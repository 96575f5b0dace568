//! Signal key categories and record decoding

use crate::error::{AuthError, AuthResult};
use keystash_store::{Buffer, Value};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a signal key record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalDataType {
    PreKey,
    Session,
    SenderKey,
    SenderKeyMemory,
    AppStateSyncKey,
    AppStateSyncVersion,
}

impl SignalDataType {
    pub const ALL: [SignalDataType; 6] = [
        SignalDataType::PreKey,
        SignalDataType::Session,
        SignalDataType::SenderKey,
        SignalDataType::SenderKeyMemory,
        SignalDataType::AppStateSyncKey,
        SignalDataType::AppStateSyncVersion,
    ];

    /// Category name as used in object keys
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDataType::PreKey => "pre-key",
            SignalDataType::Session => "session",
            SignalDataType::SenderKey => "sender-key",
            SignalDataType::SenderKeyMemory => "sender-key-memory",
            SignalDataType::AppStateSyncKey => "app-state-sync-key",
            SignalDataType::AppStateSyncVersion => "app-state-sync-version",
        }
    }
}

impl fmt::Display for SignalDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalDataType {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AuthError::UnknownDataType(s.to_string()))
    }
}

/// Fingerprint of an app state sync key
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStateSyncKeyFingerprint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_index: Option<u32>,
    #[serde(default)]
    pub device_indexes: Vec<u32>,
}

/// Key material for app state sync
///
/// Stored records come in the shape the messaging library's protobuf
/// objects serialize to: `keyData` as a tagged Buffer or base64 string and
/// `timestamp` as a number, a decimal string or a `{low, high}` long.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStateSyncKeyData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_data: Option<Buffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<AppStateSyncKeyFingerprint>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,
}

impl AppStateSyncKeyData {
    /// Decode a stored record
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        serde_json::from_value(value.to_json())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampRepr {
    Number(i64),
    Text(String),
    Long { low: i64, high: i64 },
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<TimestampRepr>::deserialize(deserializer)?;
    match repr {
        None => Ok(None),
        Some(TimestampRepr::Number(n)) => Ok(Some(n)),
        Some(TimestampRepr::Text(s)) => s
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid timestamp: {}", s))),
        Some(TimestampRepr::Long { low, high }) => {
            Ok(Some((high << 32) | (low & 0xFFFF_FFFF)))
        }
    }
}

/// A decoded signal key record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignalRecord {
    AppStateSyncKey(AppStateSyncKeyData),
    Value(Value),
}

impl SignalRecord {
    /// Decode a stored value for `category`
    ///
    /// App state sync keys are decoded into [`AppStateSyncKeyData`]; every
    /// other category is returned as stored.
    pub fn decode(category: &str, id: &str, value: Value) -> AuthResult<Self> {
        if category == SignalDataType::AppStateSyncKey.as_str() {
            let data =
                AppStateSyncKeyData::from_value(&value).map_err(|source| AuthError::InvalidRecord {
                    category: category.to_string(),
                    id: id.to_string(),
                    source,
                })?;
            Ok(SignalRecord::AppStateSyncKey(data))
        } else {
            Ok(SignalRecord::Value(value))
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            SignalRecord::Value(value) => Some(value),
            SignalRecord::AppStateSyncKey(_) => None,
        }
    }

    pub fn as_app_state_sync_key(&self) -> Option<&AppStateSyncKeyData> {
        match self {
            SignalRecord::AppStateSyncKey(data) => Some(data),
            SignalRecord::Value(_) => None,
        }
    }

    /// Convert to a plain stored value
    pub fn into_value(self) -> Value {
        match self {
            SignalRecord::Value(value) => value,
            SignalRecord::AppStateSyncKey(data) => serde_json::to_value(&data)
                .ok()
                .and_then(|json| Value::revive(json).ok())
                .unwrap_or_default(),
        }
    }
}

impl From<Value> for SignalRecord {
    fn from(value: Value) -> Self {
        SignalRecord::Value(value)
    }
}

impl From<AppStateSyncKeyData> for SignalRecord {
    fn from(data: AppStateSyncKeyData) -> Self {
        SignalRecord::AppStateSyncKey(data)
    }
}
