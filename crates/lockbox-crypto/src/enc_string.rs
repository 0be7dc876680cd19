//! `EncString`: the text envelope used for every encrypted vault field
//!
//! Canonical form:
//! ```text
//! {scheme}.{iv}|{data}|{mac}
//! ```
//! Which segments are present depends on the scheme (see
//! [`EncryptionScheme::segment_count`]). A header-less string is a legacy
//! value: three segments mean scheme 1, anything else scheme 0.
//!
//! Parsing never fails. A string whose segment count does not fit its scheme
//! is kept as a *malformed* envelope: the raw string (and scheme, when the
//! header was readable) are retained so the item can still be stored and
//! re-serialized, but decryption always reports [`DecryptError::Malformed`].

use std::fmt;
use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::DecryptError;
use crate::key::SymmetricKey;
use crate::scheme::EncryptionScheme;
use crate::service::{Encrypted, EncryptService};
use crate::DECRYPT_ERROR;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segments {
    iv: Option<String>,
    data: String,
    mac: Option<String>,
}

pub struct EncString {
    raw: String,
    scheme: Option<EncryptionScheme>,
    segments: Option<Segments>,
    decrypted: OnceLock<String>,
}

impl EncString {
    /// Parse a canonical envelope string.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let (scheme, segments) = parse_segments(&raw);
        Self {
            raw,
            scheme,
            segments,
            decrypted: OnceLock::new(),
        }
    }

    /// Build an envelope from base64 segments.
    ///
    /// The canonical string is assembled first and then parsed, so segments
    /// that do not fit the scheme produce a malformed value.
    pub fn from_parts(
        scheme: EncryptionScheme,
        data: &str,
        iv: Option<&str>,
        mac: Option<&str>,
    ) -> Self {
        let mut raw = format!("{scheme}.");
        if let Some(iv) = iv {
            raw.push_str(iv);
            raw.push('|');
        }
        raw.push_str(data);
        if let Some(mac) = mac {
            raw.push('|');
            raw.push_str(mac);
        }
        Self::parse(raw)
    }

    /// Build an envelope from raw ciphertext components.
    pub fn from_bytes(
        scheme: EncryptionScheme,
        data: &[u8],
        iv: Option<&[u8]>,
        mac: Option<&[u8]>,
    ) -> Self {
        let iv = iv.map(|b| STANDARD.encode(b));
        let mac = mac.map(|b| STANDARD.encode(b));
        Self::from_parts(
            scheme,
            &STANDARD.encode(data),
            iv.as_deref(),
            mac.as_deref(),
        )
    }

    /// The canonical wire/storage representation.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> Option<EncryptionScheme> {
        self.scheme
    }

    pub fn is_malformed(&self) -> bool {
        self.segments.is_none()
    }

    pub fn iv(&self) -> Option<&str> {
        self.segments.as_ref().and_then(|s| s.iv.as_deref())
    }

    pub fn data(&self) -> Option<&str> {
        self.segments.as_ref().map(|s| s.data.as_str())
    }

    pub fn mac(&self) -> Option<&str> {
        self.segments.as_ref().and_then(|s| s.mac.as_deref())
    }

    /// Cached plaintext from an earlier [`EncString::decrypt`], if any.
    pub fn decrypted_value(&self) -> Option<&str> {
        self.decrypted.get().map(String::as_str)
    }

    /// Decrypt to UTF-8, caching the outcome.
    ///
    /// The first call runs the cipher; later calls return the cached value
    /// regardless of the key passed. Failures are logged and cached as
    /// [`DECRYPT_ERROR`].
    pub fn decrypt(&self, service: &EncryptService, key: &SymmetricKey) -> &str {
        self.decrypted.get_or_init(|| match service.decrypt_to_utf8(self, key) {
            Ok(plain) => plain,
            Err(e) => {
                warn!(scheme = ?self.scheme, error = %e, "field decryption failed");
                DECRYPT_ERROR.to_string()
            }
        })
    }

    fn segments(&self) -> Result<&Segments, DecryptError> {
        self.segments
            .as_ref()
            .ok_or_else(|| DecryptError::Malformed(format!("unparseable envelope for scheme {:?}", self.scheme)))
    }
}

fn parse_segments(raw: &str) -> (Option<EncryptionScheme>, Option<Segments>) {
    let header: Vec<&str> = raw.split('.').collect();
    let (scheme, body) = if header.len() == 2 {
        match header[0].parse::<u8>().ok().and_then(EncryptionScheme::from_u8) {
            Some(scheme) => (scheme, header[1]),
            None => return (None, None),
        }
    } else {
        let legacy = if raw.split('|').count() == 3 {
            EncryptionScheme::AesCbc128HmacSha256B64
        } else {
            EncryptionScheme::AesCbc256B64
        };
        (legacy, raw)
    };

    let pieces: Vec<&str> = body.split('|').collect();
    if pieces.len() != scheme.segment_count() {
        return (Some(scheme), None);
    }

    let segments = match scheme {
        EncryptionScheme::AesCbc256B64 => Segments {
            iv: Some(pieces[0].to_string()),
            data: pieces[1].to_string(),
            mac: None,
        },
        EncryptionScheme::AesCbc128HmacSha256B64 | EncryptionScheme::AesCbc256HmacSha256B64 => {
            Segments {
                iv: Some(pieces[0].to_string()),
                data: pieces[1].to_string(),
                mac: Some(pieces[2].to_string()),
            }
        }
        EncryptionScheme::Rsa2048OaepSha256B64 | EncryptionScheme::Rsa2048OaepSha1B64 => {
            Segments {
                iv: None,
                data: pieces[0].to_string(),
                mac: None,
            }
        }
        EncryptionScheme::Rsa2048OaepSha256HmacSha256B64
        | EncryptionScheme::Rsa2048OaepSha1HmacSha256B64 => Segments {
            iv: None,
            data: pieces[0].to_string(),
            mac: Some(pieces[1].to_string()),
        },
    };
    (Some(scheme), Some(segments))
}

fn decode_b64(field: &str, value: &str) -> Result<Vec<u8>, DecryptError> {
    STANDARD
        .decode(value)
        .map_err(|e| DecryptError::Malformed(format!("{field} is not valid base64: {e}")))
}

impl Encrypted for EncString {
    fn scheme(&self) -> Option<EncryptionScheme> {
        self.scheme
    }

    fn iv_bytes(&self) -> Result<Option<Vec<u8>>, DecryptError> {
        self.segments()?
            .iv
            .as_deref()
            .map(|iv| decode_b64("iv", iv))
            .transpose()
    }

    fn data_bytes(&self) -> Result<Vec<u8>, DecryptError> {
        decode_b64("data", &self.segments()?.data)
    }

    fn mac_bytes(&self) -> Result<Option<Vec<u8>>, DecryptError> {
        self.segments()?
            .mac
            .as_deref()
            .map(|mac| decode_b64("mac", mac))
            .transpose()
    }
}

impl Clone for EncString {
    fn clone(&self) -> Self {
        let decrypted = OnceLock::new();
        if let Some(value) = self.decrypted.get() {
            let _ = decrypted.set(value.clone());
        }
        Self {
            raw: self.raw.clone(),
            scheme: self.scheme,
            segments: self.segments.clone(),
            decrypted,
        }
    }
}

impl PartialEq for EncString {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for EncString {}

impl fmt::Debug for EncString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncString")
            .field("raw", &self.raw)
            .field("scheme", &self.scheme)
            .field("malformed", &self.is_malformed())
            .finish()
    }
}

impl fmt::Display for EncString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for EncString {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for EncString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for EncString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(raw))
    }
}
