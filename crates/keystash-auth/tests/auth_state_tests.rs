//! Integration tests for the object store auth state
//!
//! Tests cover:
//! - Credential creation, saving and reloading
//! - Signal key set/get, including deletes and absent ids
//! - Byte sequences and app state sync keys through the store
//! - Write failures surfacing from `set`
//! - Per-record operations of one call running concurrently
//! - Unmodelled credential fields surviving a save

mod common;

use common::*;
use keystash_auth::{
    AppStateSyncKeyData, AuthError, ObjectStoreAuthState, SignalDataSet, SignalRecord, CREDS_KEY,
};
use keystash_core::KeyEncoding;
use keystash_store::{Buffer, KeyedObjectStore, Value};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

fn data_set(category: &str, records: Vec<(&str, Option<Value>)>) -> SignalDataSet {
    let mut data = SignalDataSet::new();
    data.insert(
        category.to_string(),
        records
            .into_iter()
            .map(|(id, value)| (id.to_string(), value))
            .collect(),
    );
    data
}

#[tokio::test]
async fn test_fresh_state_has_default_creds() {
    let (backend, store) = memory_store();
    let auth = ObjectStoreAuthState::open(store).await.unwrap();

    let creds = auth.creds().await;
    assert_eq!(creds.next_pre_key_id, 1);
    assert_eq!(creds.first_unuploaded_pre_key_id, 1);
    assert_eq!(creds.account_sync_counter, 0);
    assert!(!creds.registered);
    assert!(creds.me.is_none());
    assert!(backend.is_empty().await);
}

#[tokio::test]
async fn test_saved_creds_survive_restart() {
    let (backend, store) = memory_store();
    let first = ObjectStoreAuthState::open(store).await.unwrap();
    first.save_creds().await.unwrap();

    assert!(backend.contains("bots/alice/creds.json").await);

    let second = ObjectStoreAuthState::open(reopen(&backend)).await.unwrap();
    assert_eq!(first.creds().await, second.creds().await);
}

#[tokio::test]
async fn test_creds_mutation_needs_explicit_save() {
    let (backend, store) = memory_store();
    let auth = ObjectStoreAuthState::open(store).await.unwrap();
    auth.save_creds().await.unwrap();

    auth.update_creds(|creds| creds.registered = true).await;
    let reloaded = ObjectStoreAuthState::open(reopen(&backend)).await.unwrap();
    assert!(!reloaded.creds().await.registered);

    auth.save_creds().await.unwrap();
    let reloaded = ObjectStoreAuthState::open(reopen(&backend)).await.unwrap();
    assert!(reloaded.creds().await.registered);
}

#[tokio::test]
async fn test_set_then_get_pre_keys() {
    let (_backend, store) = memory_store();
    let auth = ObjectStoreAuthState::open(store).await.unwrap();

    let foo = Value::revive(json!({"foo": "bar"})).unwrap();
    auth.keys()
        .set(data_set("pre-key", vec![("1", Some(foo.clone())), ("2", None)]))
        .await
        .unwrap();

    let result = auth
        .keys()
        .get("pre-key", &ids(&["1", "2", "3"]))
        .await
        .unwrap();

    let mut expected = BTreeMap::new();
    expected.insert("1".to_string(), Some(SignalRecord::Value(foo)));
    expected.insert("2".to_string(), None);
    expected.insert("3".to_string(), None);
    assert_eq!(result, expected);
}

#[tokio::test]
async fn test_sender_key_bytes_round_trip() {
    let (backend, store) = memory_store();
    let auth = ObjectStoreAuthState::open(store).await.unwrap();

    auth.keys()
        .set(data_set(
            "sender-key",
            vec![("abc", Some(Value::Bytes(vec![0, 1, 255])))],
        ))
        .await
        .unwrap();

    let raw = backend
        .raw("bots/alice/sender-key-abc.json")
        .await
        .unwrap();
    assert_eq!(raw, br#"{"type":"Buffer","data":[0,1,255]}"#.to_vec());

    let result = auth.keys().get("sender-key", &ids(&["abc"])).await.unwrap();
    let value = result["abc"].as_ref().and_then(SignalRecord::as_value).unwrap();
    assert_eq!(value.as_bytes(), Some(&[0u8, 1, 255][..]));
}

#[tokio::test]
async fn test_session_ids_are_sanitized() {
    let (backend, store) = memory_store();
    let auth = ObjectStoreAuthState::open(store).await.unwrap();

    auth.keys()
        .set(data_set(
            "session",
            vec![("123:4@s.whatsapp.net", Some(Value::from("record")))],
        ))
        .await
        .unwrap();

    assert_eq!(
        backend.keys().await,
        vec!["bots/alice/session-123-4@s.whatsapp.net.json".to_string()]
    );
}

#[tokio::test]
async fn test_app_state_sync_key_is_decoded() {
    let (_backend, store) = memory_store();
    let auth = ObjectStoreAuthState::open(store).await.unwrap();

    let stored = Value::revive(json!({
        "keyData": {"type": "Buffer", "data": [7, 7, 7]},
        "fingerprint": {"rawId": 1, "currentIndex": 0, "deviceIndexes": [0]},
        "timestamp": "1700000000000"
    }))
    .unwrap();
    auth.keys()
        .set(data_set("app-state-sync-key", vec![("AAAAAA==", Some(stored))]))
        .await
        .unwrap();

    let result = auth
        .keys()
        .get("app-state-sync-key", &ids(&["AAAAAA==", "missing"]))
        .await
        .unwrap();

    let data: &AppStateSyncKeyData = result["AAAAAA=="]
        .as_ref()
        .and_then(SignalRecord::as_app_state_sync_key)
        .unwrap();
    assert_eq!(data.key_data, Some(Buffer::from(vec![7, 7, 7])));
    assert_eq!(data.timestamp, Some(1_700_000_000_000));
    assert_eq!(result["missing"], None);
}

#[tokio::test]
async fn test_set_reports_write_failure_after_all_complete() {
    let backend = Arc::new(RejectingBackend::new("pre-key-2"));
    let store = Arc::new(KeyedObjectStore::new(
        backend.clone(),
        TEST_PREFIX,
        KeyEncoding::Substitute,
    ));
    let auth = ObjectStoreAuthState::open(store).await.unwrap();

    let err = auth
        .keys()
        .set(data_set(
            "pre-key",
            vec![
                ("1", Some(Value::from("one"))),
                ("2", Some(Value::from("two"))),
                ("3", Some(Value::from("three"))),
            ],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Store(ref e) if e.is_backend()));
    assert!(backend.inner().contains("bots/alice/pre-key-1.json").await);
    assert!(backend.inner().contains("bots/alice/pre-key-3.json").await);
    assert!(!backend.inner().contains("bots/alice/pre-key-2.json").await);
}

#[tokio::test]
async fn test_save_creds_reports_write_failure() {
    let backend = Arc::new(RejectingBackend::new(CREDS_KEY));
    let store = Arc::new(KeyedObjectStore::new(
        backend,
        TEST_PREFIX,
        KeyEncoding::Substitute,
    ));
    let auth = ObjectStoreAuthState::open(store).await.unwrap();

    assert!(auth.save_creds().await.is_err());
}

#[tokio::test]
async fn test_get_many_ids() {
    let (_backend, store) = memory_store();
    let auth = ObjectStoreAuthState::open(store).await.unwrap();

    let records: Vec<(String, Option<Value>)> = (0..50u64)
        .map(|i| (i.to_string(), Some(Value::from(i))))
        .collect();
    let mut data = SignalDataSet::new();
    data.insert("pre-key".to_string(), records.into_iter().collect());
    auth.keys().set(data).await.unwrap();

    let all: Vec<String> = (0..50u64).map(|i| i.to_string()).collect();
    let result = auth.keys().get("pre-key", &all).await.unwrap();
    assert_eq!(result.len(), 50);
    assert!(result.values().all(Option::is_some));
    assert_eq!(
        result["42"].as_ref().and_then(SignalRecord::as_value),
        Some(&Value::from(42u64))
    );
}

#[tokio::test]
async fn test_set_writes_records_concurrently() {
    let backend = Arc::new(GatedBackend::new("pre-key-2"));
    let store = Arc::new(KeyedObjectStore::new(
        backend.clone(),
        TEST_PREFIX,
        KeyEncoding::Substitute,
    ));
    let auth = ObjectStoreAuthState::open(store).await.unwrap();

    let keys = auth.keys().clone();
    let set = tokio::spawn(async move {
        keys.set(data_set(
            "pre-key",
            vec![
                ("1", Some(Value::from("one"))),
                ("2", Some(Value::from("two"))),
                ("3", Some(Value::from("three"))),
            ],
        ))
        .await
    });

    // Records 1 and 3 land while the write of record 2 is still parked
    let inner = backend.clone();
    wait_until(|| {
        let inner = inner.clone();
        async move {
            inner.inner().contains("bots/alice/pre-key-1.json").await
                && inner.inner().contains("bots/alice/pre-key-3.json").await
        }
    })
    .await;
    assert!(!set.is_finished());
    assert!(!backend.inner().contains("bots/alice/pre-key-2.json").await);

    backend.release_one();
    set.await.unwrap().unwrap();
    assert_eq!(backend.inner().len().await, 3);
}

#[tokio::test]
async fn test_get_reads_records_concurrently() {
    let backend = Arc::new(GatedBackend::new("session-b"));
    let store = Arc::new(KeyedObjectStore::new(
        backend.clone(),
        TEST_PREFIX,
        KeyEncoding::Substitute,
    ));
    backend
        .inner()
        .insert_raw("bots/alice/session-a.json", "\"a\"")
        .await;
    let auth = ObjectStoreAuthState::open(store).await.unwrap();

    let keys = auth.keys().clone();
    let get = tokio::spawn(async move { keys.get("session", &ids(&["a", "b", "c"])).await });

    // All three reads are issued while the read of `b` is parked
    let gated = backend.clone();
    wait_until(|| {
        let gated = gated.clone();
        async move {
            gated
                .started()
                .iter()
                .filter(|key| key.contains("session-"))
                .count()
                == 3
        }
    })
    .await;
    assert!(!get.is_finished());

    backend.release_one();
    let result = get.await.unwrap().unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(
        result["a"].as_ref().and_then(SignalRecord::as_value),
        Some(&Value::from("a"))
    );
    assert_eq!(result["b"], None);
    assert_eq!(result["c"], None);
}

#[tokio::test]
async fn test_saved_creds_keep_unmodelled_nested_fields() {
    let (backend, store) = memory_store();
    let fresh = ObjectStoreAuthState::open(store).await.unwrap();
    let mut stored = serde_json::to_value(fresh.creds().await).unwrap();
    stored["me"] = json!({"id": "1@s.whatsapp.net", "phoneNumber": "+1555", "imgUrl": "x"});
    stored["accountSettings"] = json!({"unarchiveChats": false, "futureSetting": 3});
    backend
        .insert_raw(
            "bots/alice/creds.json",
            serde_json::to_vec(&stored).unwrap(),
        )
        .await;

    let auth = ObjectStoreAuthState::open(reopen(&backend)).await.unwrap();
    auth.update_creds(|creds| creds.registered = true).await;
    auth.save_creds().await.unwrap();

    let raw = backend.raw("bots/alice/creds.json").await.unwrap();
    let saved: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(saved["registered"], true);
    assert_eq!(saved["me"]["id"], "1@s.whatsapp.net");
    assert_eq!(saved["me"]["phoneNumber"], "+1555");
    assert_eq!(saved["me"]["imgUrl"], "x");
    assert_eq!(saved["accountSettings"]["unarchiveChats"], false);
    assert_eq!(saved["accountSettings"]["futureSetting"], 3);
}
