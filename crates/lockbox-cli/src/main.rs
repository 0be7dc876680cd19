//! lockbox: vault item decryption and autofill from the command line
//!
//! Commands:
//!   decrypt --items <file> (--keys <file> | --email <addr>)  - batch-decrypt items on the worker
//!   encrypt --key <file> [--org <id>] <plaintext>            - print an encrypted string
//!   fill --page <file> --cipher <file>                       - print a fill script
//!   config show                                              - display current configuration

mod passphrase;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lockbox_autofill::{AutofillService, PageDetails};
use lockbox_core::LockboxConfig;
use lockbox_crypto::{EncryptService, KdfParams, RustCryptoFunctions, SymmetricKey};
use lockbox_models::{CipherView, DecryptableItem};
use lockbox_worker::{BatchDecryptor, KeySet};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::passphrase::PassphraseKeyProvider;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "lockbox",
    version,
    about = "Vault item decryption and autofill",
    long_about = "lockbox: decrypt vault items off-thread and build autofill scripts for pages"
)]
struct Cli {
    /// Path to config.toml (default: ~/.config/lockbox/config.toml)
    #[arg(long, short = 'c', env = "LOCKBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides [log].level
    #[arg(long, env = "LOCKBOX_LOG")]
    log: Option<String>,

    /// Log format; overrides [log].format
    #[arg(long, env = "LOCKBOX_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decrypt a JSON array of items and print their views
    Decrypt {
        /// Items file: `[{"typeTag": "Cipher", ...}, ...]`
        #[arg(long)]
        items: PathBuf,

        /// Key set file (`{"keyB64": ...}`, `{"userKey": ..., "orgKeys": {...}}` or `{"<orgId>": ...}`)
        #[arg(long, required_unless_present = "email", conflicts_with = "email")]
        keys: Option<PathBuf>,

        /// Derive the personal key from this account's passphrase instead
        #[arg(long)]
        email: Option<String>,

        /// Organization keys to use alongside the passphrase key (`{"<orgId>": ...}`)
        #[arg(long, requires = "email")]
        org_keys: Option<PathBuf>,

        /// Passphrase for --email (prompted when unset)
        #[arg(long, env = "LOCKBOX_PASSPHRASE", hide_env_values = true, requires = "email")]
        passphrase: Option<String>,
    },

    /// Encrypt a string under a key from a key set file
    Encrypt {
        /// Key set file
        #[arg(long)]
        key: PathBuf,

        /// Use this organization's key instead of the personal key
        #[arg(long)]
        org: Option<String>,

        plaintext: String,
    },

    /// Generate the fill script for a decrypted item on a collected page
    Fill {
        /// Page details collected by the content script
        #[arg(long)]
        page: PathBuf,

        /// Decrypted item (`CipherView` JSON)
        #[arg(long)]
        cipher: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(LockboxConfig::default_path);
    let config = load_config(&config_path)?;

    let format = cli.log_format.clone().unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(cli.log.as_deref().unwrap_or(&config.log.level), &format);

    if !config_path.exists() {
        warn!("config file not found: {}  (using defaults)", config_path.display());
    }

    match cli.command {
        Commands::Decrypt {
            items,
            keys,
            email,
            org_keys,
            passphrase,
        } => {
            let source = match (keys, email) {
                (Some(keys), _) => KeySource::File(keys),
                (None, Some(email)) => KeySource::Passphrase {
                    email,
                    org_keys,
                    passphrase: passphrase.map(SecretString::from),
                },
                (None, None) => anyhow::bail!("one of --keys or --email is required"),
            };
            cmd_decrypt(&config, &items, source).await
        }
        Commands::Encrypt {
            key,
            org,
            plaintext,
        } => cmd_encrypt(&config, &key, org.as_deref(), &plaintext),
        Commands::Fill { page, cipher } => cmd_fill(&config, &page, &cipher),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &config_path),
    }
}

fn load_config(path: &Path) -> Result<LockboxConfig> {
    LockboxConfig::load(path).with_context(|| format!("loading config {}", path.display()))
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {what} {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {what} {}", path.display()))
}

fn encrypt_service(config: &LockboxConfig) -> EncryptService {
    EncryptService::new(Arc::new(RustCryptoFunctions), config.crypto.log_mac_failures)
}

fn kdf_params(config: &LockboxConfig) -> KdfParams {
    KdfParams {
        mem_cost_kib: config.crypto.kdf_mem_cost_kib,
        time_cost: config.crypto.kdf_time_cost,
        parallelism: config.crypto.kdf_parallelism,
    }
}

// ── `lockbox decrypt` ─────────────────────────────────────────────────────────

enum KeySource {
    File(PathBuf),
    Passphrase {
        email: String,
        org_keys: Option<PathBuf>,
        passphrase: Option<SecretString>,
    },
}

async fn cmd_decrypt(config: &LockboxConfig, items_path: &Path, source: KeySource) -> Result<()> {
    let items: Vec<DecryptableItem> = read_json(items_path, "items")?;
    let decryptor = BatchDecryptor::from_config(&config.worker, encrypt_service(config));
    let count = items.len();

    let result = match source {
        KeySource::File(path) => {
            let keys: KeySet = read_json(&path, "key set")?;
            decryptor.submit(items, keys).await
        }
        KeySource::Passphrase {
            email,
            org_keys,
            passphrase,
        } => {
            let organizations: BTreeMap<String, SymmetricKey> = match org_keys {
                Some(path) => read_json(&path, "organization keys")?,
                None => BTreeMap::new(),
            };
            let provider = PassphraseKeyProvider::new(email, kdf_params(config), passphrase)
                .with_organizations(organizations);
            decryptor.decrypt_items(&provider, items).await
        }
    };
    decryptor.terminate_all();

    let views = result.context("batch decryption failed")?;
    let undecryptable = views
        .iter()
        .filter(|v| v.is_undecryptable())
        .count();
    info!(items = count, undecryptable, "batch decrypted");

    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}

// ── `lockbox encrypt` ─────────────────────────────────────────────────────────

fn cmd_encrypt(config: &LockboxConfig, key_path: &Path, org: Option<&str>, plaintext: &str) -> Result<()> {
    let keys: KeySet = read_json(key_path, "key set")?;
    let key = keys.resolve(org).with_context(|| match org {
        Some(org) => format!("no key for organization {org} in {}", key_path.display()),
        None => format!("no personal key in {}", key_path.display()),
    })?;

    let encrypted = encrypt_service(config)
        .encrypt(plaintext, key)
        .context("encrypting")?;
    println!("{encrypted}");
    Ok(())
}

// ── `lockbox fill` ────────────────────────────────────────────────────────────

fn cmd_fill(config: &LockboxConfig, page_path: &Path, cipher_path: &Path) -> Result<()> {
    let page: PageDetails = read_json(page_path, "page details")?;
    let cipher: CipherView = read_json(cipher_path, "cipher view")?;

    let service = AutofillService::from_config(&config.autofill);
    match service.generate_fill_script(&page, &cipher) {
        Some(script) => println!("{}", serde_json::to_string_pretty(&script)?),
        None => anyhow::bail!("item {} has nothing to fill", cipher.id),
    }
    Ok(())
}

// ── `lockbox config show` ─────────────────────────────────────────────────────

fn cmd_config_show(config: &LockboxConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = config.to_toml().context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
