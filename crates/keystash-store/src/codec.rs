//! Buffer-aware JSON codec
//!
//! Stored objects are plain JSON with one extension: a byte sequence is
//! written as `{"type":"Buffer","data":[0,1,255]}`. This is the same layout
//! the file-based session store produces, so objects written by either side
//! can be read by the other.
//!
//! Typed records use [`Buffer`] for their binary fields. Records whose shape
//! is not known ahead of time use [`Value`], which revives tagged objects at
//! any depth into [`Value::Bytes`].

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Deref;

/// Value of the `type` field marking a tagged byte sequence
pub const BUFFER_TAG: &str = "Buffer";

/// Standard alphabet, padding optional on decode
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Serialize a value to JSON bytes
pub fn encode<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(value)
}

/// Parse JSON bytes, reviving tagged byte sequences
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    serde_json::from_slice(bytes)
}

/// Whether a JSON object is a tagged byte sequence
pub fn is_buffer_object(map: &serde_json::Map<String, serde_json::Value>) -> bool {
    matches!(map.get("type"), Some(serde_json::Value::String(t)) if t == BUFFER_TAG)
        || matches!(map.get("buffer"), Some(serde_json::Value::Bool(true)))
}

fn serialize_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry("type", BUFFER_TAG)?;
    map.serialize_entry("data", bytes)?;
    map.end()
}

/// A byte sequence stored as a tagged JSON object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Buffer(pub Vec<u8>);

impl Buffer {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// Standard base64 rendering
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        BASE64.decode(encoded).map(Self)
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Buffer {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serialize for Buffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_bytes(&self.0, serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BufferData {
    Bytes(Vec<u8>),
    Base64(String),
}

impl BufferData {
    fn into_bytes<E: de::Error>(self) -> Result<Vec<u8>, E> {
        match self {
            BufferData::Bytes(bytes) => Ok(bytes),
            BufferData::Base64(encoded) => BASE64
                .decode(encoded.as_bytes())
                .map_err(|e| E::custom(format!("invalid base64 buffer: {}", e))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BufferRepr {
    Tagged {
        #[serde(rename = "type")]
        kind: Option<String>,
        #[serde(default)]
        buffer: bool,
        data: Option<BufferData>,
        value: Option<BufferData>,
    },
    Plain(BufferData),
}

impl<'de> Deserialize<'de> for Buffer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match BufferRepr::deserialize(deserializer)? {
            BufferRepr::Tagged {
                kind,
                buffer,
                data,
                value,
            } => {
                if kind.as_deref() != Some(BUFFER_TAG) && !buffer {
                    return Err(de::Error::custom("expected a Buffer object"));
                }
                match data.or(value) {
                    Some(payload) => payload.into_bytes().map(Buffer),
                    None => Ok(Buffer::default()),
                }
            }
            BufferRepr::Plain(payload) => payload.into_bytes().map(Buffer),
        }
    }
}

/// JSON value tree with native byte sequences
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Convert parsed JSON, turning tagged objects into [`Value::Bytes`]
    pub fn revive(json: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::revive)
                    .collect::<serde_json::Result<_>>()?,
            ),
            serde_json::Value::Object(map) if is_buffer_object(&map) => {
                let buffer: Buffer = serde_json::from_value(serde_json::Value::Object(map))?;
                Value::Bytes(buffer.0)
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| Value::revive(v).map(|v| (k, v)))
                    .collect::<serde_json::Result<_>>()?,
            ),
        })
    }

    /// Convert to plain JSON, writing byte sequences in tagged form
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(bytes) => serde_json::json!({ "type": BUFFER_TAG, "data": bytes }),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a field of an object value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(bytes) => serialize_bytes(bytes, serializer),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Object(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Value::revive(json).map_err(de::Error::custom)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = serde_json::Error;

    fn try_from(json: serde_json::Value) -> serde_json::Result<Self> {
        Value::revive(json)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<Buffer> for Value {
    fn from(buffer: Buffer) -> Self {
        Value::Bytes(buffer.0)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl<V: Into<Value>> FromIterator<(String, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}
