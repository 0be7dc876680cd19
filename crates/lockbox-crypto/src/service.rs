//! Symmetric encrypt/decrypt over `EncString` and `EncArrayBuffer`
//!
//! Cipher primitives sit behind [`CryptoFunctions`] so the decrypt path can be
//! driven by an instrumented implementation in tests.

use std::borrow::Cow;
use std::sync::Arc;

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use tracing::warn;

use crate::enc_array_buffer::EncArrayBuffer;
use crate::enc_string::EncString;
use crate::error::DecryptError;
use crate::key::SymmetricKey;
use crate::scheme::EncryptionScheme;
use crate::IV_SIZE;

type HmacSha256 = Hmac<Sha256>;

/// Low-level cipher primitives.
pub trait CryptoFunctions: Send + Sync {
    /// AES-CBC with PKCS#7 padding. Key length selects AES-128 or AES-256.
    fn aes_cbc_decrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, DecryptError>;

    fn aes_cbc_encrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, DecryptError>;

    fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, DecryptError>;

    /// Constant-time tag comparison.
    fn verify_hmac_sha256(&self, key: &[u8], data: &[u8], tag: &[u8]) -> bool;

    fn random_bytes(&self, len: usize) -> Vec<u8>;
}

/// RustCrypto-backed primitives.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoFunctions;

impl CryptoFunctions for RustCryptoFunctions {
    fn aes_cbc_decrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, DecryptError> {
        match key.len() {
            16 => cbc::Decryptor::<aes::Aes128>::new_from_slices(key, iv)
                .map_err(cipher_err)?
                .decrypt_padded_vec_mut::<Pkcs7>(data)
                .map_err(cipher_err),
            32 => cbc::Decryptor::<aes::Aes256>::new_from_slices(key, iv)
                .map_err(cipher_err)?
                .decrypt_padded_vec_mut::<Pkcs7>(data)
                .map_err(cipher_err),
            n => Err(DecryptError::Cipher(format!("unsupported AES key length {n}"))),
        }
    }

    fn aes_cbc_encrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, DecryptError> {
        match key.len() {
            16 => Ok(cbc::Encryptor::<aes::Aes128>::new_from_slices(key, iv)
                .map_err(cipher_err)?
                .encrypt_padded_vec_mut::<Pkcs7>(data)),
            32 => Ok(cbc::Encryptor::<aes::Aes256>::new_from_slices(key, iv)
                .map_err(cipher_err)?
                .encrypt_padded_vec_mut::<Pkcs7>(data)),
            n => Err(DecryptError::Cipher(format!("unsupported AES key length {n}"))),
        }
    }

    fn hmac_sha256(&self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, DecryptError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(key).map_err(cipher_err)?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn verify_hmac_sha256(&self, key: &[u8], data: &[u8], tag: &[u8]) -> bool {
        let Ok(mut mac) = <HmacSha256 as Mac>::new_from_slice(key) else {
            return false;
        };
        mac.update(data);
        mac.verify_slice(tag).is_ok()
    }

    fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }
}

fn cipher_err(e: impl std::fmt::Display) -> DecryptError {
    DecryptError::Cipher(e.to_string())
}

/// Anything that carries scheme, IV, ciphertext and optional MAC.
pub trait Encrypted {
    /// `None` when the envelope header could not be read.
    fn scheme(&self) -> Option<EncryptionScheme>;
    fn iv_bytes(&self) -> Result<Option<Vec<u8>>, DecryptError>;
    fn data_bytes(&self) -> Result<Vec<u8>, DecryptError>;
    fn mac_bytes(&self) -> Result<Option<Vec<u8>>, DecryptError>;
}

/// Symmetric envelope encryption.
///
/// Cheap to clone; the primitives are shared.
#[derive(Clone)]
pub struct EncryptService {
    crypto: Arc<dyn CryptoFunctions>,
    log_mac_failures: bool,
}

impl Default for EncryptService {
    fn default() -> Self {
        Self::new(Arc::new(RustCryptoFunctions), true)
    }
}

impl std::fmt::Debug for EncryptService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptService")
            .field("log_mac_failures", &self.log_mac_failures)
            .finish_non_exhaustive()
    }
}

impl EncryptService {
    pub fn new(crypto: Arc<dyn CryptoFunctions>, log_mac_failures: bool) -> Self {
        Self {
            crypto,
            log_mac_failures,
        }
    }

    /// Encrypt text or bytes into an `EncString` under the key's scheme.
    pub fn encrypt(
        &self,
        plaintext: impl AsRef<[u8]>,
        key: &SymmetricKey,
    ) -> anyhow::Result<EncString> {
        let (iv, data, mac) = self.encrypt_parts(plaintext.as_ref(), key)?;
        Ok(EncString::from_bytes(key.scheme(), &data, Some(&iv), mac.as_deref()))
    }

    /// Encrypt raw bytes into the binary envelope.
    pub fn encrypt_to_bytes(
        &self,
        plaintext: &[u8],
        key: &SymmetricKey,
    ) -> anyhow::Result<EncArrayBuffer> {
        let (iv, data, mac) = self.encrypt_parts(plaintext, key)?;
        EncArrayBuffer::from_parts(key.scheme(), &iv, mac.as_deref(), &data)
            .map_err(|e| anyhow::anyhow!("encrypted buffer assembly: {e}"))
    }

    fn encrypt_parts(
        &self,
        plaintext: &[u8],
        key: &SymmetricKey,
    ) -> anyhow::Result<(Vec<u8>, Vec<u8>, Option<Vec<u8>>)> {
        let iv = self.crypto.random_bytes(IV_SIZE);
        let data = self
            .crypto
            .aes_cbc_encrypt(key.enc_key(), &iv, plaintext)
            .map_err(|e| anyhow::anyhow!("encryption failed: {e}"))?;
        let mac = match key.mac_key() {
            Some(mac_key) => Some(
                self.crypto
                    .hmac_sha256(mac_key, &[iv.as_slice(), data.as_slice()].concat())
                    .map_err(|e| anyhow::anyhow!("MAC computation failed: {e}"))?,
            ),
            None => None,
        };
        Ok((iv, data, mac))
    }

    /// Decrypt an envelope and interpret the plaintext as UTF-8.
    pub fn decrypt_to_utf8(
        &self,
        envelope: &dyn Encrypted,
        key: &SymmetricKey,
    ) -> Result<String, DecryptError> {
        let bytes = self.decrypt_to_bytes(envelope, key)?;
        String::from_utf8(bytes).map_err(|_| DecryptError::InvalidUtf8)
    }

    /// Decrypt an envelope to raw bytes.
    ///
    /// Steps: scheme must be symmetric, legacy key reinterpretation, MAC
    /// presence check, scheme agreement, MAC verification over `iv || data`,
    /// then AES-CBC.
    pub fn decrypt_to_bytes(
        &self,
        envelope: &dyn Encrypted,
        key: &SymmetricKey,
    ) -> Result<Vec<u8>, DecryptError> {
        let scheme = envelope
            .scheme()
            .ok_or_else(|| DecryptError::Malformed("unknown envelope scheme".into()))?;
        if !scheme.is_symmetric() {
            return Err(DecryptError::UnsupportedScheme(scheme));
        }

        let key = resolve_legacy_key(key, scheme);
        let iv = envelope
            .iv_bytes()?
            .ok_or_else(|| DecryptError::Malformed("missing iv".into()))?;
        let data = envelope.data_bytes()?;
        let mac = envelope.mac_bytes()?;

        if key.mac_key().is_some() && mac.is_none() {
            return Err(DecryptError::MacRequired);
        }
        if key.scheme() != scheme {
            return Err(DecryptError::SchemeMismatch {
                key: key.scheme(),
                envelope: scheme,
            });
        }

        if let (Some(mac_key), Some(tag)) = (key.mac_key(), mac.as_deref()) {
            let signed = [iv.as_slice(), data.as_slice()].concat();
            if !self.crypto.verify_hmac_sha256(mac_key, &signed, tag) {
                if self.log_mac_failures {
                    warn!(scheme = %scheme, "MAC comparison failed, key or data mismatch");
                }
                return Err(DecryptError::MacMismatch);
            }
        }

        self.crypto.aes_cbc_decrypt(key.enc_key(), &iv, &data)
    }
}

/// Legacy envelopes (scheme 1) are decrypted with a plain 256-bit key
/// reinterpreted under the 128-bit enc/mac split.
pub fn resolve_legacy_key(key: &SymmetricKey, scheme: EncryptionScheme) -> Cow<'_, SymmetricKey> {
    if scheme == EncryptionScheme::AesCbc128HmacSha256B64 {
        if let Some(legacy) = key.as_legacy() {
            return Cow::Owned(legacy);
        }
    }
    Cow::Borrowed(key)
}
