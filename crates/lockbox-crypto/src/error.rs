use thiserror::Error;

use crate::scheme::EncryptionScheme;

/// Failure to turn an envelope back into plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptError {
    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("scheme {0} cannot be decrypted with a symmetric key")]
    UnsupportedScheme(EncryptionScheme),

    #[error("key scheme {key} does not match envelope scheme {envelope}")]
    SchemeMismatch {
        key: EncryptionScheme,
        envelope: EncryptionScheme,
    },

    #[error("key requires a MAC but the envelope carries none")]
    MacRequired,

    #[error("MAC verification failed")]
    MacMismatch,

    #[error("cipher rejected input: {0}")]
    Cipher(String),

    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

/// Failure to construct a `SymmetricKey`.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("unsupported key length {len} for scheme {scheme:?}")]
    UnsupportedLength {
        len: usize,
        scheme: Option<EncryptionScheme>,
    },

    #[error("invalid base64 key material: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("HKDF expand failed")]
    Hkdf,
}

/// Failure to parse the binary envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("encrypted buffer too short: {len} bytes (minimum {min})")]
    TooShort { len: usize, min: usize },

    #[error("empty encrypted buffer")]
    Empty,

    #[error("unsupported scheme byte {0} in encrypted buffer")]
    UnsupportedScheme(u8),

    #[error("{field} has wrong length: {len} bytes (expected {expected})")]
    FieldLength {
        field: &'static str,
        len: usize,
        expected: usize,
    },
}
