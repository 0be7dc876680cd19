//! lockbox-crypto: envelope encryption for vault items
//!
//! Architecture: Encrypt-then-MAC with AES-CBC + HMAC-SHA256
//!
//! Envelope wire form (`EncString`):
//! ```text
//! {scheme}.{iv}|{data}|{mac}     base64 segments, presence depends on scheme
//! 2.q0Xk...==|Lm9v...==|ZW5j...=  AES-256-CBC, HMAC-SHA256 over iv || data
//! ```
//!
//! Key hierarchy:
//! ```text
//! Master Key (256-bit, Argon2id from passphrase)
//!   └── User Key (512-bit, HKDF-expand "enc" || "mac")
//! Organization Keys (512-bit, one per organization, supplied by key providers)
//! ```

pub mod enc_array_buffer;
pub mod enc_string;
pub mod error;
pub mod kdf;
pub mod key;
pub mod scheme;
pub mod service;

pub use enc_array_buffer::EncArrayBuffer;
pub use enc_string::EncString;
pub use error::{DecryptError, EnvelopeError, KeyError};
pub use kdf::{derive_master_key, KdfParams, MasterKey};
pub use key::SymmetricKey;
pub use scheme::EncryptionScheme;
pub use service::{CryptoFunctions, Encrypted, EncryptService, RustCryptoFunctions};

/// Size of an AES-256 key or HMAC-SHA256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of an AES-CBC initialization vector
pub const IV_SIZE: usize = 16;

/// Size of an HMAC-SHA256 tag
pub const MAC_SIZE: usize = 32;

/// Placeholder shown in place of any field that could not be decrypted.
pub const DECRYPT_ERROR: &str = "[error: cannot decrypt]";
