use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LockboxError, LockboxResult};

/// Top-level client configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockboxConfig {
    pub worker: WorkerConfig,
    pub crypto: CryptoConfig,
    pub autofill: AutofillConfig,
    pub log: LogConfig,
}

/// Batch decryption worker pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Idle seconds before the worker is torn down (default: 180)
    pub idle_ttl_secs: u64,
    /// Decrypt threads inside the worker (0 = cpu_count)
    pub decrypt_threads: usize,
    /// Batches smaller than this are decrypted inline (default 1: always use the worker)
    pub min_items_for_worker: usize,
}

impl WorkerConfig {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

/// Envelope decryption and passphrase KDF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Log MAC verification failures at warn level (default: true)
    pub log_mac_failures: bool,
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB)
    pub kdf_mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 3)
    pub kdf_time_cost: u32,
    /// Argon2id parallelism (default: 4)
    pub kdf_parallelism: u32,
}

/// Fill script generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutofillConfig {
    /// Delay the page injector waits between operations (default: 20)
    pub delay_between_operations_ms: u64,
    pub only_visible_fields: bool,
    pub only_empty_fields: bool,
    /// Don't fuzzy-fill a username on pages without a password field
    pub skip_username_only_fill: bool,
    /// Allow filling fields marked `autocomplete="new-password"`
    pub fill_new_password: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: 180,
            decrypt_threads: 0,
            min_items_for_worker: 1,
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            log_mac_failures: true,
            kdf_mem_cost_kib: 65536,
            kdf_time_cost: 3,
            kdf_parallelism: 4,
        }
    }
}

impl Default for AutofillConfig {
    fn default() -> Self {
        Self {
            delay_between_operations_ms: 20,
            only_visible_fields: false,
            only_empty_fields: false,
            skip_username_only_fill: false,
            fill_new_password: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl LockboxConfig {
    /// `~/.config/lockbox/config.toml`, or `./config.toml` without a home directory.
    pub fn default_path() -> PathBuf {
        match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".config/lockbox/config.toml"),
            None => PathBuf::from("config.toml"),
        }
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> LockboxResult<Self> {
        if !path.exists() {
            tracing::warn!(
                "config file not found: {}  (using defaults)",
                path.display()
            );
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LockboxResult<()> {
        if self.worker.idle_ttl_secs == 0 {
            return Err(LockboxError::Config(
                "worker.idle_ttl_secs must be greater than zero".into(),
            ));
        }
        if !matches!(self.log.format.as_str(), "json" | "text") {
            return Err(LockboxError::Config(format!(
                "log.format must be \"json\" or \"text\", got {:?}",
                self.log.format
            )));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> LockboxResult<String> {
        toml::to_string_pretty(self).map_err(|e| LockboxError::Config(e.to_string()))
    }
}
