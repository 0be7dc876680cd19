//! Key derivation: Argon2id passphrase → master key → stretched user key

use argon2::{Algorithm, Argon2, Params, Version};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::key::SymmetricKey;
use crate::KEY_SIZE;

/// Passphrase-derived key. Only ever used to stretch into a [`SymmetricKey`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_SIZE]);

impl MasterKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// HKDF-expand into the 512-bit enc+mac key.
    pub fn stretch(&self) -> anyhow::Result<SymmetricKey> {
        SymmetricKey::new(self.0.to_vec(), None)
            .and_then(|key| key.stretch())
            .map_err(|e| anyhow::anyhow!("stretching master key: {e}"))
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

/// Argon2id cost settings, mirrored from `[crypto]` in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    pub mem_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 64 * 1024,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    fn argon2(&self) -> anyhow::Result<Argon2<'static>> {
        let params = Params::new(self.mem_cost_kib, self.time_cost, self.parallelism, Some(KEY_SIZE))
            .map_err(|e| anyhow::anyhow!("invalid Argon2id params {self:?}: {e}"))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Run Argon2id over `passphrase`, salted with the account identifier.
///
/// The salt is trimmed, lowercased and hashed with SHA-256, so
/// `" Ada@Example.com"` and `"ada@example.com"` derive the same key and any
/// length meets Argon2's salt minimum.
pub fn derive_master_key(
    passphrase: &SecretString,
    salt: &str,
    params: &KdfParams,
) -> anyhow::Result<MasterKey> {
    let salt = Sha256::digest(salt.trim().to_lowercase().as_bytes());

    let mut out = [0u8; KEY_SIZE];
    params
        .argon2()?
        .hash_password_into(passphrase.expose_secret().as_bytes(), &salt, &mut out)
        .map_err(|e| anyhow::anyhow!("Argon2id KDF failed: {e}"))?;

    let key = MasterKey::from_bytes(out);
    out.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::EncryptionScheme;

    fn fast() -> KdfParams {
        KdfParams {
            mem_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_kdf_deterministic() {
        let passphrase = SecretString::from("test-passphrase-123");
        let key1 = derive_master_key(&passphrase, "user@example.com", &fast()).unwrap();
        let key2 = derive_master_key(&passphrase, "user@example.com", &fast()).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes(), "KDF must be deterministic");
    }

    #[test]
    fn test_salt_is_normalized() {
        let passphrase = SecretString::from("hunter2");
        let a = derive_master_key(&passphrase, "User@Example.com ", &fast()).unwrap();
        let b = derive_master_key(&passphrase, "user@example.com", &fast()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_kdf_different_passphrases() {
        let key1 = derive_master_key(&SecretString::from("one"), "salt", &fast()).unwrap();
        let key2 = derive_master_key(&SecretString::from("two"), "salt", &fast()).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = KdfParams {
            mem_cost_kib: 1,
            time_cost: 0,
            parallelism: 0,
        };
        assert!(derive_master_key(&SecretString::from("x"), "salt", &params).is_err());
    }

    #[test]
    fn test_stretch_yields_mac_key() {
        let master = MasterKey::from_bytes([7u8; KEY_SIZE]);
        let user = master.stretch().unwrap();
        assert_eq!(user.scheme(), EncryptionScheme::AesCbc256HmacSha256B64);
        assert!(user.mac_key().is_some());
    }
}
