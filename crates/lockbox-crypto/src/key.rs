//! Symmetric key model: encryption/MAC sub-key split, legacy scheme, stretching

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hkdf::Hkdf;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::KeyError;
use crate::scheme::EncryptionScheme;
use crate::KEY_SIZE;

/// A symmetric vault key. Zeroized on drop.
///
/// Layout by scheme:
/// ```text
/// AesCbc256B64            32 bytes  [enc 32]
/// AesCbc128HmacSha256B64  32 bytes  [enc 16][mac 16]   (legacy)
/// AesCbc256HmacSha256B64  64 bytes  [enc 32][mac 32]
/// ```
///
/// Two keys are equal when their bytes and scheme are equal.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "SerializedKey", into = "SerializedKey")]
pub struct SymmetricKey {
    bytes: Vec<u8>,
    scheme: EncryptionScheme,
}

impl SymmetricKey {
    /// Build a key from raw bytes. When `scheme` is `None` it is inferred from
    /// the length: 32 bytes is `AesCbc256B64`, 64 bytes is `AesCbc256HmacSha256B64`.
    pub fn new(bytes: Vec<u8>, scheme: Option<EncryptionScheme>) -> Result<Self, KeyError> {
        let len = bytes.len();
        let scheme = match (scheme, len) {
            (None, 32) | (Some(EncryptionScheme::AesCbc256B64), 32) => {
                EncryptionScheme::AesCbc256B64
            }
            (None, 64) | (Some(EncryptionScheme::AesCbc256HmacSha256B64), 64) => {
                EncryptionScheme::AesCbc256HmacSha256B64
            }
            (Some(EncryptionScheme::AesCbc128HmacSha256B64), 32) => {
                EncryptionScheme::AesCbc128HmacSha256B64
            }
            (scheme, len) => {
                let mut bytes = bytes;
                bytes.zeroize();
                return Err(KeyError::UnsupportedLength { len, scheme });
            }
        };
        Ok(Self { bytes, scheme })
    }

    /// Generate a random 512-bit `AesCbc256HmacSha256B64` key.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; KEY_SIZE * 2];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            bytes,
            scheme: EncryptionScheme::AesCbc256HmacSha256B64,
        }
    }

    pub fn from_b64(encoded: &str) -> Result<Self, KeyError> {
        let bytes = STANDARD.decode(encoded.trim())?;
        Self::new(bytes, None)
    }

    pub fn to_b64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn scheme(&self) -> EncryptionScheme {
        self.scheme
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn enc_key(&self) -> &[u8] {
        match self.scheme {
            EncryptionScheme::AesCbc128HmacSha256B64 => &self.bytes[..16],
            _ => &self.bytes[..KEY_SIZE],
        }
    }

    pub fn mac_key(&self) -> Option<&[u8]> {
        match self.scheme {
            EncryptionScheme::AesCbc128HmacSha256B64 => Some(&self.bytes[16..32]),
            EncryptionScheme::AesCbc256HmacSha256B64 => Some(&self.bytes[KEY_SIZE..]),
            _ => None,
        }
    }

    /// Reinterpret the same 32 bytes under the legacy 128-bit split.
    pub(crate) fn as_legacy(&self) -> Option<Self> {
        if self.scheme != EncryptionScheme::AesCbc256B64 {
            return None;
        }
        Some(Self {
            bytes: self.bytes.clone(),
            scheme: EncryptionScheme::AesCbc128HmacSha256B64,
        })
    }

    /// Expand a 256-bit key into a 512-bit enc+mac key via HKDF-SHA256.
    ///
    /// The input is treated as the PRK: `enc = HKDF-Expand(key, "enc")`,
    /// `mac = HKDF-Expand(key, "mac")`.
    pub fn stretch(&self) -> Result<Self, KeyError> {
        let prk = &self.bytes[..KEY_SIZE];
        let mut stretched = vec![0u8; KEY_SIZE * 2];
        let (enc, mac) = stretched.split_at_mut(KEY_SIZE);
        hkdf_expand(prk, b"enc", enc)?;
        hkdf_expand(prk, b"mac", mac)?;
        Self::new(stretched, Some(EncryptionScheme::AesCbc256HmacSha256B64))
    }
}

fn hkdf_expand(prk: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), KeyError> {
    let hkdf = Hkdf::<Sha256>::from_prk(prk).map_err(|_| KeyError::Hkdf)?;
    hkdf.expand(info, okm).map_err(|_| KeyError::Hkdf)
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme && self.bytes == other.bytes
    }
}

impl Eq for SymmetricKey {}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("scheme", &self.scheme)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// JSON form of a key as it crosses the worker boundary.
#[derive(Serialize, Deserialize)]
struct SerializedKey {
    #[serde(rename = "keyB64")]
    key_b64: String,
}

impl TryFrom<SerializedKey> for SymmetricKey {
    type Error = KeyError;

    fn try_from(mut value: SerializedKey) -> Result<Self, Self::Error> {
        let key = Self::from_b64(&value.key_b64);
        value.key_b64.zeroize();
        key
    }
}

impl From<SymmetricKey> for SerializedKey {
    fn from(key: SymmetricKey) -> Self {
        SerializedKey {
            key_b64: key.to_b64(),
        }
    }
}
