//! `keystash keys`

use anyhow::{bail, Context, Result};
use camino::Utf8Path;
use clap::{Args, Subcommand};
use futures::future::join_all;
use keystash_auth::{record_key, ObjectKeyStore, SignalDataSet, SignalDataType, SignalKeyStore};
use keystash_store::{KeyedObjectStore, StoreError, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cli::StoreArgs;
use crate::output;

#[derive(Subcommand, Debug)]
pub enum KeysCommands {
    /// Print records as JSON
    Get(GetArgs),

    /// Store a record
    Set(SetArgs),

    /// Delete records
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Key category (pre-key, session, sender-key, ...)
    pub category: SignalDataType,

    /// Record ids
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Key category (pre-key, session, sender-key, ...)
    pub category: SignalDataType,

    /// Record id
    pub id: String,

    /// Record as JSON; byte sequences as {"type":"Buffer","data":[...]}
    pub value: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Key category (pre-key, session, sender-key, ...)
    pub category: SignalDataType,

    /// Record ids
    #[arg(required = true)]
    pub ids: Vec<String>,
}

pub async fn run(cmd: KeysCommands, config: Option<&Utf8Path>, overrides: &StoreArgs) -> Result<()> {
    let store = super::connect(config, overrides).await?;
    let keys = ObjectKeyStore::new(Arc::clone(&store));

    match cmd {
        KeysCommands::Get(args) => {
            let records = keys
                .get(args.category.as_str(), &args.ids)
                .await
                .with_context(|| format!("Failed to read {} records", args.category))?;
            output::json(&records)
        }
        KeysCommands::Set(args) => {
            let value = parse_value(&args.value)?;
            let data = single_category(args.category, vec![(args.id.clone(), Some(value))]);
            keys.set(data)
                .await
                .with_context(|| format!("Failed to write {} {}", args.category, args.id))?;
            output::success(&format!("Stored {} {}", args.category, args.id));
            Ok(())
        }
        KeysCommands::Delete(args) => {
            let failures = delete_records(&store, args.category, &args.ids).await;
            let deleted = args.ids.len() - failures.len();
            if deleted > 0 {
                output::success(&format!("Deleted {} {} record(s)", deleted, args.category));
            }
            if failures.is_empty() {
                return Ok(());
            }
            for (id, e) in &failures {
                output::warning(&format!("Failed to delete {} {}: {}", args.category, id, e));
            }
            bail!(
                "Failed to delete {} of {} {} record(s)",
                failures.len(),
                args.ids.len(),
                args.category
            )
        }
    }
}

/// Delete every record in `ids`, returning the ids whose delete failed
async fn delete_records(
    store: &KeyedObjectStore,
    category: SignalDataType,
    ids: &[String],
) -> Vec<(String, StoreError)> {
    let results = join_all(ids.iter().map(|id| async move {
        let result = store.try_remove(&record_key(category.as_str(), id)).await;
        (id, result)
    }))
    .await;

    results
        .into_iter()
        .filter_map(|(id, result)| result.err().map(|e| (id.clone(), e)))
        .collect()
}

fn parse_value(text: &str) -> Result<Value> {
    let json: serde_json::Value = serde_json::from_str(text).context("Record is not valid JSON")?;
    Value::revive(json).context("Record has a malformed Buffer object")
}

fn single_category(category: SignalDataType, records: Vec<(String, Option<Value>)>) -> SignalDataSet {
    let mut data = SignalDataSet::new();
    data.insert(
        category.to_string(),
        records.into_iter().collect::<BTreeMap<_, _>>(),
    );
    data
}
