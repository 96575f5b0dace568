//! Signal key storage
//!
//! Each record lives in its own object named `{category}-{id}.json`. There is
//! no cache: every `get` and `set` goes to the store, with all per-record
//! operations of one call in flight together.

use crate::error::{AuthError, AuthResult};
use crate::signal::SignalRecord;
use async_trait::async_trait;
use futures::future::join_all;
use keystash_store::{KeyedObjectStore, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Records keyed by id. `None` marks an absent record.
pub type SignalKeyMap = BTreeMap<String, Option<SignalRecord>>;

/// Records to write, by category then id. `None` or a JSON `null` deletes
/// the record.
pub type SignalDataSet = BTreeMap<String, BTreeMap<String, Option<Value>>>;

/// Logical key of a signal record
pub fn record_key(category: &str, id: &str) -> String {
    format!("{}-{}.json", category, id)
}

/// Storage for signal key records
#[async_trait]
pub trait SignalKeyStore: Send + Sync {
    /// Fetch the records for `ids` in `category`
    ///
    /// Every requested id appears in the result; ids with no stored record
    /// map to `None`.
    async fn get(&self, category: &str, ids: &[String]) -> AuthResult<SignalKeyMap>;

    /// Write or delete every record in `data`
    ///
    /// Completes once all operations have finished. Write failures are
    /// reported; delete failures are not.
    async fn set(&self, data: SignalDataSet) -> AuthResult<()>;
}

/// [`SignalKeyStore`] over a [`KeyedObjectStore`]
#[derive(Debug, Clone)]
pub struct ObjectKeyStore {
    store: Arc<KeyedObjectStore>,
}

impl ObjectKeyStore {
    pub fn new(store: Arc<KeyedObjectStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<KeyedObjectStore> {
        &self.store
    }

    async fn get_one(&self, category: &str, id: &str) -> AuthResult<Option<SignalRecord>> {
        let value: Option<Value> = self.store.read(&record_key(category, id)).await?;
        match value {
            Some(value) if !value.is_null() => SignalRecord::decode(category, id, value).map(Some),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl SignalKeyStore for ObjectKeyStore {
    async fn get(&self, category: &str, ids: &[String]) -> AuthResult<SignalKeyMap> {
        debug!("Reading {} {} record(s)", ids.len(), category);

        let results = join_all(ids.iter().map(|id| async move {
            let record = self.get_one(category, id).await;
            (id.clone(), record)
        }))
        .await;

        results
            .into_iter()
            .map(|(id, record)| record.map(|record| (id, record)))
            .collect()
    }

    async fn set(&self, data: SignalDataSet) -> AuthResult<()> {
        let mut operations = Vec::new();
        for (category, records) in &data {
            for (id, value) in records {
                let key = record_key(category, id);
                let store = &self.store;
                operations.push(async move {
                    match value {
                        Some(value) if !value.is_null() => {
                            store.write(value, &key).await.map_err(AuthError::from)
                        }
                        _ => {
                            store.remove(&key).await;
                            Ok(())
                        }
                    }
                });
            }
        }

        debug!("Applying {} signal key operation(s)", operations.len());
        let results = join_all(operations).await;

        let mut failures = results.into_iter().filter_map(Result::err);
        match failures.next() {
            Some(first) => {
                let others = failures.count();
                if others > 0 {
                    warn!("{} further signal key write(s) failed", others);
                }
                Err(first)
            }
            None => Ok(()),
        }
    }
}
