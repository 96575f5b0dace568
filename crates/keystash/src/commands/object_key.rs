//! `keystash object-key`

use anyhow::Result;
use camino::Utf8Path;
use keystash_store::ObjectKeyResolver;

use crate::cli::{ObjectKeyArgs, StoreArgs};

/// Print the resolved object key. Needs no bucket access.
pub fn run(args: ObjectKeyArgs, config: Option<&Utf8Path>, overrides: &StoreArgs) -> Result<()> {
    let config = super::resolve_config(config, overrides)?;
    let resolver = ObjectKeyResolver::new(config.prefix, config.key_encoding);
    println!("{}", resolver.resolve(&args.key));
    Ok(())
}
