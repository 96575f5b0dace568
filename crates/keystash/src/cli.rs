//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use keystash_core::{KeyEncoding, StoreConfig};

pub use crate::commands::keys::KeysCommands;

/// Keystash - messaging session auth state in object storage
#[derive(Parser, Debug)]
#[command(name = "keystash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to keystash.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load stored credentials, or create and save new ones
    Init(InitArgs),

    /// Show stored credentials (public parts only)
    Creds(CredsArgs),

    /// Signal key records
    #[command(subcommand)]
    Keys(KeysCommands),

    /// Print the object key a logical key is stored under
    ObjectKey(ObjectKeyArgs),
}

/// Store location overrides, applied on top of the config file
#[derive(Args, Debug, Default, Clone)]
pub struct StoreArgs {
    /// Bucket name
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Object key prefix (e.g. "bots/alice/")
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Bucket region
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint (e.g., MinIO)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// How logical keys are turned into object keys
    #[arg(long, global = true, value_enum)]
    pub key_encoding: Option<EncodingArg>,
}

impl StoreArgs {
    /// Apply the flags that were given to `config`
    pub fn apply(&self, config: &mut StoreConfig) {
        if let Some(bucket) = &self.bucket {
            config.bucket = bucket.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(encoding) = self.key_encoding {
            config.key_encoding = encoding.into();
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingArg {
    /// `/` becomes `__`, `:` becomes `-`
    Substitute,
    /// Percent-escape `%`, `/` and `:`
    Percent,
}

impl From<EncodingArg> for KeyEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Substitute => KeyEncoding::Substitute,
            EncodingArg::Percent => KeyEncoding::Percent,
        }
    }
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CredsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ObjectKeyArgs {
    /// Logical key, e.g. "creds.json" or "session-123:4@s.whatsapp.net.json"
    pub key: String,
}
