//! `keystash creds`

use anyhow::{anyhow, Context, Result};
use camino::Utf8Path;
use keystash_auth::{AuthenticationCreds, CREDS_KEY};
use keystash_store::Buffer;
use serde_json::json;

use crate::cli::{CredsArgs, StoreArgs};
use crate::output;

pub async fn run(args: CredsArgs, config: Option<&Utf8Path>, overrides: &StoreArgs) -> Result<()> {
    let store = super::connect(config, overrides).await?;
    let object_key = store.object_key(CREDS_KEY);

    let creds = store
        .try_read::<AuthenticationCreds>(CREDS_KEY)
        .await
        .with_context(|| format!("Failed to read {}", object_key))?
        .ok_or_else(|| anyhow!("No credentials at {}; run `keystash init` first", object_key))?;

    let summary = summarize(&creds);
    if args.json {
        return output::json(&summary);
    }

    output::header(&format!("Credentials ({})", object_key));
    if let Some(fields) = summary.as_object() {
        for (key, value) in fields {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => "-".to_string(),
                other => other.to_string(),
            };
            output::kv(key, &text);
        }
    }
    if !creds.registered {
        output::warning("Session is not registered yet");
    }
    Ok(())
}

/// Non-secret view of the credentials
fn summarize(creds: &AuthenticationCreds) -> serde_json::Value {
    json!({
        "registrationId": creds.registration_id,
        "registered": creds.registered,
        "me": creds.me.as_ref().map(|me| me.id.clone()),
        "platform": creds.platform,
        "identityKey": Buffer::new(creds.signed_identity_key.signal_public_key()).to_base64(),
        "signedPreKeyId": creds.signed_pre_key.key_id,
        "nextPreKeyId": creds.next_pre_key_id,
        "firstUnuploadedPreKeyId": creds.first_unuploaded_pre_key_id,
        "accountSyncCounter": creds.account_sync_counter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystash_auth::init_auth_creds;

    #[test]
    fn test_summary_has_no_private_keys() {
        let creds = init_auth_creds();
        let summary = summarize(&creds).to_string();

        let private = Buffer::new(creds.noise_key.private.to_vec()).to_base64();
        assert!(!summary.contains(&private));
        assert!(!summary.contains(&creds.adv_secret_key));
        assert!(summary.contains("\"nextPreKeyId\":1"));
    }
}
