//! `keystash init`

use anyhow::{Context, Result};
use camino::Utf8Path;
use keystash_auth::{init_auth_creds, AuthenticationCreds, ObjectStoreAuthState, CREDS_KEY};
use keystash_store::Buffer;
use serde_json::json;

use crate::cli::{InitArgs, StoreArgs};
use crate::output;

pub async fn run(args: InitArgs, config: Option<&Utf8Path>, overrides: &StoreArgs) -> Result<()> {
    let store = super::connect(config, overrides).await?;
    let object_key = store.object_key(CREDS_KEY);

    // A failed read must not be mistaken for "no credentials" here, or the
    // stored identity would be overwritten.
    let existing = store
        .try_read::<AuthenticationCreds>(CREDS_KEY)
        .await
        .with_context(|| format!("Failed to read {}", object_key))?;

    let created = existing.is_none();
    let auth = ObjectStoreAuthState::with_creds(store, existing.unwrap_or_else(init_auth_creds));
    if created {
        auth.save_creds()
            .await
            .with_context(|| format!("Failed to save {}", object_key))?;
    }

    let creds = auth.creds().await;
    let identity = Buffer::new(creds.signed_identity_key.signal_public_key()).to_base64();

    if args.json {
        return output::json(&json!({
            "objectKey": object_key,
            "created": created,
            "registrationId": creds.registration_id,
            "identityKey": identity,
        }));
    }

    if created {
        output::success(&format!("Created credentials at {}", object_key));
    } else {
        output::info(&format!("Credentials already stored at {}", object_key));
    }
    output::kv("Registration id", &creds.registration_id.to_string());
    output::kv("Identity key", &identity);
    Ok(())
}
